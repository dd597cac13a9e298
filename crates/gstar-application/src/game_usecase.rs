//! Game use case: starting games and advancing the story.
//!
//! Each game is one linear timeline of sessions (locations), each holding
//! an ordered list of scenes. Advancing either appends a scene to the open
//! session or, when the model moves the story elsewhere, closes the session
//! and opens the next one with a fresh background.

use gstar_core::character::{Character, CharacterRepository};
use gstar_core::emotion::EmotionDistribution;
use gstar_core::game::{Game, GameRepository, NewGame};
use gstar_core::progress::PlayProgress;
use gstar_core::scene::{Scene, SceneRepository};
use gstar_core::session::{Session, SessionRepository, SessionSeed};
use gstar_core::story::{BackgroundGenerator, BeatRequest, OpeningRequest, StoryGenerator};
use gstar_core::{GstarError, Result};
use std::sync::Arc;

/// Request to start a new game.
#[derive(Debug, Clone)]
pub struct NewGameCommand {
    pub user_id: i64,
    pub personality: String,
    pub genre: String,
    pub playtime_minutes: u32,
}

/// Identifies the scene being advanced from, plus the player signals.
#[derive(Debug, Clone)]
pub struct ProgressCommand {
    pub user_id: i64,
    pub game_id: i64,
    pub session_id: i64,
    pub scene_id: i64,
    pub emotion: EmotionDistribution,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StartedGame {
    pub game: Game,
    pub main_character: Character,
    pub session: Session,
    pub scene: Scene,
}

/// The session the player is now in and the scene that was just created.
#[derive(Debug, Clone)]
pub struct SceneBundle {
    pub session: Session,
    pub scene: Scene,
}

pub struct GameUseCase {
    characters: Arc<dyn CharacterRepository>,
    games: Arc<dyn GameRepository>,
    sessions: Arc<dyn SessionRepository>,
    scenes: Arc<dyn SceneRepository>,
    story: Arc<dyn StoryGenerator>,
    backgrounds: Arc<dyn BackgroundGenerator>,
    placeholder_url: String,
}

impl GameUseCase {
    pub fn new(
        characters: Arc<dyn CharacterRepository>,
        games: Arc<dyn GameRepository>,
        sessions: Arc<dyn SessionRepository>,
        scenes: Arc<dyn SceneRepository>,
        story: Arc<dyn StoryGenerator>,
        backgrounds: Arc<dyn BackgroundGenerator>,
        placeholder_url: impl Into<String>,
    ) -> Self {
        Self {
            characters,
            games,
            sessions,
            scenes,
            story,
            backgrounds,
            placeholder_url: placeholder_url.into(),
        }
    }

    /// Creates a game with its first session and first scene.
    #[tracing::instrument(skip(self, command), fields(user_id = command.user_id))]
    pub async fn start_game(&self, command: NewGameCommand) -> Result<StartedGame> {
        if command.playtime_minutes == 0 {
            return Err(GstarError::validation("playtime must be greater than 0"));
        }

        let roster = self.characters.list_all().await?;
        if roster.is_empty() {
            return Err(GstarError::internal("Character roster is empty"));
        }

        let opening = self
            .story
            .open_game(&OpeningRequest {
                personality: command.personality.clone(),
                genre: command.genre.clone(),
                playtime_minutes: command.playtime_minutes,
                characters: roster.clone(),
            })
            .await?;

        let main_character = match roster.iter().find(|c| c.id == opening.main_character_id) {
            Some(character) => character.clone(),
            None => {
                tracing::warn!(
                    "Model chose unknown main character {} ('{}'), using {}",
                    opening.main_character_id,
                    opening.main_character_name,
                    roster[0].name
                );
                roster[0].clone()
            }
        };

        let background_url = self.background_or_placeholder(&opening.first_session_content).await;

        let (game, session, scene) = self
            .games
            .create_with_opening(
                &NewGame {
                    user_id: command.user_id,
                    title: opening.title,
                    personality: command.personality,
                    genre: command.genre,
                    playtime_minutes: command.playtime_minutes,
                    main_character_id: main_character.id,
                },
                &SessionSeed {
                    session_number: 1,
                    content: opening.first_session_content,
                    background_url: Some(background_url),
                },
                &opening.first_scene.into_seed(1),
            )
            .await?;

        tracing::info!("Started game {} '{}'", game.id, game.title);
        Ok(StartedGame {
            game,
            main_character,
            session,
            scene,
        })
    }

    /// Generates the scene that follows `command.scene_id`.
    #[tracing::instrument(
        skip(self, command),
        fields(game_id = command.game_id, session_id = command.session_id, scene_id = command.scene_id)
    )]
    pub async fn advance(&self, command: ProgressCommand) -> Result<SceneBundle> {
        let (game, session, _) = self.load_position(&command).await?;
        self.generate_next(&command, game, session, None).await
    }

    /// Records the player's choice on a selection scene, then generates the
    /// reaction to it.
    ///
    /// Submitting the same choice again is accepted so a call that failed
    /// upstream can be retried; a different choice is rejected.
    #[tracing::instrument(
        skip(self, command),
        fields(game_id = command.game_id, session_id = command.session_id, scene_id = command.scene_id)
    )]
    pub async fn advance_after_selection(
        &self,
        command: ProgressCommand,
        selection_id: u32,
    ) -> Result<SceneBundle> {
        let (game, session, scene) = self.load_position(&command).await?;

        let options = scene
            .content
            .options()
            .filter(|options| !options.is_empty())
            .ok_or_else(|| {
                GstarError::bad_request(format!("Scene {} is not a selection scene", scene.id))
            })?;
        let option_text = options
            .get(&selection_id.to_string())
            .cloned()
            .ok_or_else(|| {
                GstarError::bad_request(format!(
                    "Selection {} is not an option of scene {}",
                    selection_id, scene.id
                ))
            })?;

        self.record_selection(&scene, selection_id).await?;
        tracing::debug!("Player chose {selection_id}: {option_text}");

        self.generate_next(&command, game, session, Some(option_text))
            .await
    }

    /// Loads and cross-checks game, session and scene. Anything missing,
    /// mismatched or owned by someone else reads as not found.
    async fn load_position(&self, command: &ProgressCommand) -> Result<(Game, Session, Scene)> {
        command.emotion.validate()?;

        let game = self
            .games
            .find_by_id(command.game_id)
            .await?
            .filter(|game| game.user_id == command.user_id)
            .ok_or_else(|| GstarError::not_found("Game", command.game_id))?;
        let session = self
            .sessions
            .find_by_id(command.session_id)
            .await?
            .filter(|session| session.game_id == game.id)
            .ok_or_else(|| GstarError::not_found("Session", command.session_id))?;
        let scene = self
            .scenes
            .find_by_id(command.scene_id)
            .await?
            .filter(|scene| scene.session_id == session.id)
            .ok_or_else(|| GstarError::not_found("Scene", command.scene_id))?;

        if session.is_completed {
            return Err(GstarError::bad_request(format!(
                "Session {} is already completed",
                session.id
            )));
        }
        Ok((game, session, scene))
    }

    async fn record_selection(&self, scene: &Scene, selection_id: u32) -> Result<()> {
        let existing = match scene.selected_option {
            Some(existing) => Some(existing),
            None => {
                if self.scenes.record_selection(scene.id, selection_id).await? {
                    None
                } else {
                    // Lost a race with another request; look at what was stored.
                    self.scenes
                        .find_by_id(scene.id)
                        .await?
                        .and_then(|stored| stored.selected_option)
                }
            }
        };

        match existing {
            Some(existing) if existing != selection_id => Err(GstarError::bad_request(format!(
                "Scene {} already has selection {}",
                scene.id, existing
            ))),
            _ => Ok(()),
        }
    }

    async fn generate_next(
        &self,
        command: &ProgressCommand,
        game: Game,
        session: Session,
        selected_option: Option<String>,
    ) -> Result<SceneBundle> {
        let characters = self.characters.list_all().await?;
        let main_character = characters
            .iter()
            .find(|c| c.id == game.main_character_id)
            .cloned();
        let transcript = self.scenes.list_by_session(session.id).await?;
        let next_scene_number = transcript.last().map_or(1, |s| s.scene_number + 1);
        let progress = PlayProgress::new(command.elapsed_seconds, game.playtime_minutes);

        tracing::debug!(
            "Progress {:.1}% ({}), emotion {}",
            progress.percent(),
            progress.phase().band(),
            command.emotion.dominant()
        );

        let request = BeatRequest {
            game,
            characters,
            main_character,
            session,
            transcript,
            dominant_emotion: command.emotion.dominant(),
            progress,
            selected_option,
        };
        let beat = self.story.next_beat(&request).await?;
        let BeatRequest { game, session, .. } = request;

        match beat.next_session {
            Some(next_content) => {
                let background_url = self.background_or_placeholder(&next_content).await;
                let next_session_number = self
                    .sessions
                    .latest_for_game(game.id)
                    .await?
                    .map_or(1, |s| s.session_number + 1);
                let (next_session, scene) = self
                    .sessions
                    .open_next(
                        game.id,
                        session.id,
                        &SessionSeed {
                            session_number: next_session_number,
                            content: next_content,
                            background_url: Some(background_url),
                        },
                        &beat.scene.into_seed(1),
                    )
                    .await?;
                tracing::info!(
                    "Game {} moved to session {} ({})",
                    game.id,
                    next_session.session_number,
                    next_session.content
                );
                Ok(SceneBundle {
                    session: next_session,
                    scene,
                })
            }
            None => {
                let scene = self
                    .scenes
                    .append(session.id, &beat.scene.into_seed(next_scene_number))
                    .await?;
                Ok(SceneBundle { session, scene })
            }
        }
    }

    /// Image failures never stop the story.
    async fn background_or_placeholder(&self, description: &str) -> String {
        match self.backgrounds.create_background(description).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Background generation failed, using placeholder: {e}");
                self.placeholder_url.clone()
            }
        }
    }
}
