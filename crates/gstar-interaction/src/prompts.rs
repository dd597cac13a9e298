//! Prompt templates for story generation and background keywords.
//!
//! Every prompt asks for a single JSON object (or a bare keyword) so the
//! reply can be handled by [`crate::response_parser`].

use gstar_core::character::Character;
use gstar_core::progress::{PlayProgress, StoryPhase};
use gstar_core::scene::{Expression, Scene, SceneContent};
use gstar_core::story::{BeatRequest, OpeningRequest};
use gstar_core::{GstarError, Result};
use minijinja::{Environment, context};
use serde::Serialize;

const OPENING: &str = "opening";
const NEXT_BEAT: &str = "next_beat";
const AFTER_SELECTION: &str = "after_selection";
const BACKGROUND_KEYWORD: &str = "background_keyword";
const BEAT_CONTEXT: &str = "beat_context";
const PACING: &str = "pacing";

const OPENING_TEMPLATE: &str = r#"You are the story writer of a Korean dating-sim (visual novel) game.
Design a new game from the following request. Write every title, description and line of dialogue in Korean.

- Desired personality: {{ personality }}
- Genre: {{ genre }}
- Playtime: {{ playtime }} minutes
- Characters:
{% for c in characters %}- ID {{ c.id }}: {{ c.name }} - {{ c.personality }}
{% endfor %}
Reply with this JSON object only:
{
    "title": "game title",
    "main_character_id": <id of the chosen main character, number>,
    "main_character_name": "exact name of the chosen character",
    "first_session_content": "first location. its mood and situation",
    "first_scene": {
        "role": "exact name of the chosen character, or narrator",
        "type": "dialogue",
        "dialogue": "first line",
        "character_id": <id of the chosen main character, number>,
        "emotion": "expression"
    }
}

Rules:
1. Pick the one character from the list that best matches the personality "{{ personality }}". Copy its id and its name exactly as listed. This character is the main character for the whole game.
2. first_session_content must name a concrete place, formatted "place. mood and situation", for example "학교 옥상. 시원한 바람이 부는 점심시간". Vague places like "somewhere in the school" are not allowed.
3. role is the main character's exact name or "narrator"; character_id is the main character's id.
4. emotion is one of: {{ expressions }}, or an empty string for the default expression.
5. Output valid JSON only, with no explanation."#;

const BEAT_CONTEXT_TEMPLATE: &str = r#"You are the story writer of a Korean dating-sim (visual novel) game. Drive a fast, exciting story toward a confession ending. Write every line of dialogue in Korean.

The player is never one of the characters. Choices are the player's actions: they are always type "selection" with role "user".

Game:
- Title: {{ title }}
- Genre: {{ genre }}
- Character personality: {{ personality }}

Characters:
{% for c in characters %}- ID {{ c.id }}: {{ c.name }} - {{ c.personality }}
{% endfor %}* narrator: narration

Main character: {{ main_character_name }} (ID: {{ main_character_id }}). The main character appears most often, but other listed characters may join naturally.

Current session (current location): {{ session_content }}
Scenes so far in this session: {{ scene_count }}

Conversation in this session:
{% for line in transcript %}{{ line }}
{% endfor %}"#;

const PACING_TEMPLATE: &str = r#"Player emotion: {{ emotion }}
Game progress: {{ progress_percent }}% (remaining time: {{ remaining_seconds }} seconds)

Pacing guide (advisory):
{% for phase in phases %}- {{ phase.band }}: {{ phase.guidance }}{% if phase.current %}  <- current phase{% endif %}
{% endfor %}
Current phase: {{ current_band }}. {{ current_guidance }}

Location changes:
- Do not stay in one place too long. When the story moves, set "session_ended": true and "new_session_content": "destination place. short mood".
- Never describe the walk in between (corridors, stairs).

Expressions: pick what the speaking character really feels, one of {{ expressions }}, or an empty string. For user and narrator, character_id and emotion are null."#;

const NEXT_BEAT_TEMPLATE: &str = r#"{% include "beat_context" %}
Line right before this scene: "{{ last_dialogue }}"

{% include "pacing" %}

Write the next scene. Reply with this JSON object only:
{
    "scene": {
        "role": "character name, user or narrator",
        "type": "dialogue or selection",
        "dialogue": "line (dialogue only)",
        "selections": {
            "1": "choice 1, answering the previous line",
            "2": "choice 2, answering the previous line"
        },
        "character_id": <speaking character id, or null>,
        "emotion": "expression, or null"
    },
    "session_ended": false,
    "new_session_content": null
}

Rules:
1. Keep it moving: no repeated topics, minimal small talk, jump to events and actions, plenty of heart-fluttering lines.
2. Choices must respond directly to the line right before them. Offer a choice about once every two or three scenes.
3. If type is "selection", role is "user" and dialogue is null. If type is "dialogue", selections is null or an empty object.
4. Output valid JSON only, with no explanation."#;

const AFTER_SELECTION_TEMPLATE: &str = r#"{% include "beat_context" %}
{% if previous_scene %}Scene before the choice: {{ previous_scene }}
{% endif %}
The player chose: "{{ selected_option }}"

{% include "pacing" %}

Write the reaction to the player's choice. Reply with this JSON object only:
{
    "scene": {
        "role": "character name or narrator",
        "type": "dialogue",
        "dialogue": "reaction line",
        "character_id": <speaking character id, or null>,
        "emotion": "expression, or null"
    },
    "session_ended": false,
    "new_session_content": null
}

Rules:
1. React directly to "{{ selected_option }}" and continue the flow of the conversation. Nothing unrelated to the choice.
2. If the choice means going somewhere else, end the session and describe the destination.
3. Output valid JSON only, with no explanation."#;

const BACKGROUND_KEYWORD_TEMPLATE: &str = r#"I need an English search phrase for a dating-sim background image.
Scene description: {{ description }}

Make an English phrase that captures the place, weather and mood of this scene.
Include the weather whenever it matters (rainy, sunny, cloudy, snowy, ...).
Answer with the phrase only, in English, with no explanation.

Examples:
- 소나기 -> rainy school corridor
- 교실 -> sunny classroom
- 밤 공원 -> night park
- 눈 내리는 거리 -> snowy street

Phrase:"#;

const IMAGE_STYLE: &str = "visual novel style, clean line art, Makoto Shinkai-inspired sky, \
     studio-quality anime background, romantic visual novel scene, NO PEOPLE, NO CHARACTERS, \
     environment only, empty scene";

const ASPECT_INSTRUCTION: &str = "16:9 widescreen aspect ratio, horizontal landscape orientation";

#[derive(Serialize)]
struct PhaseLine {
    band: &'static str,
    guidance: &'static str,
    current: bool,
}

fn phase_lines(progress: &PlayProgress) -> Vec<PhaseLine> {
    let current = progress.phase();
    StoryPhase::ALL
        .iter()
        .map(|phase| PhaseLine {
            band: phase.band(),
            guidance: phase.guidance(),
            current: *phase == current,
        })
        .collect()
}

/// One transcript line, e.g. `[Scene 2] 유나: 안녕`.
pub fn transcript_line(scene: &Scene) -> String {
    let body = match &scene.content {
        SceneContent::Dialogue { dialogue } => dialogue.clone(),
        SceneContent::Selection { selections } => {
            let options = selections
                .iter()
                .map(|(id, text)| format!("{id}) {text}"))
                .collect::<Vec<_>>()
                .join(" | ");
            match scene.selected_option {
                Some(chosen) => format!("(selection) {options} -> chose {chosen}"),
                None => format!("(selection) {options}"),
            }
        }
    };
    format!("[Scene {}] {}: {}", scene.scene_number, scene.role, body)
}

/// The most recent spoken line, skipping a trailing selection scene.
fn last_dialogue(transcript: &[Scene]) -> &str {
    transcript
        .iter()
        .rev()
        .take(2)
        .find_map(|scene| scene.content.dialogue_text())
        .unwrap_or("")
}

/// Renders model prompts from compiled templates.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            (OPENING, OPENING_TEMPLATE),
            (BEAT_CONTEXT, BEAT_CONTEXT_TEMPLATE),
            (PACING, PACING_TEMPLATE),
            (NEXT_BEAT, NEXT_BEAT_TEMPLATE),
            (AFTER_SELECTION, AFTER_SELECTION_TEMPLATE),
            (BACKGROUND_KEYWORD, BACKGROUND_KEYWORD_TEMPLATE),
        ] {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn opening(&self, request: &OpeningRequest) -> Result<String> {
        self.render(
            OPENING,
            context! {
                personality => request.personality,
                genre => request.genre,
                playtime => request.playtime_minutes,
                characters => roster(&request.characters),
                expressions => Expression::catalog(),
            },
        )
    }

    /// Picks the plain or after-selection prompt depending on
    /// `request.selected_option`.
    pub fn next_beat(&self, request: &BeatRequest) -> Result<String> {
        let transcript = &request.transcript;
        let (main_character_name, main_character_id) = match &request.main_character {
            Some(c) => (c.name.clone(), c.id),
            None => ("Unknown".to_string(), request.game.main_character_id),
        };
        let progress = &request.progress;
        let phase = progress.phase();
        let previous_scene = transcript
            .len()
            .checked_sub(2)
            .map(|i| transcript_line(&transcript[i]));

        let ctx = context! {
            title => request.game.title,
            genre => request.game.genre,
            personality => request.game.personality,
            characters => roster(&request.characters),
            main_character_name,
            main_character_id,
            session_content => request.session.content,
            scene_count => transcript.len(),
            transcript => transcript.iter().map(transcript_line).collect::<Vec<_>>(),
            last_dialogue => last_dialogue(transcript),
            previous_scene,
            selected_option => request.selected_option,
            emotion => request.dominant_emotion.to_string(),
            progress_percent => format!("{:.1}", progress.percent()),
            remaining_seconds => progress.remaining_seconds(),
            phases => phase_lines(progress),
            current_band => phase.band(),
            current_guidance => phase.guidance(),
            expressions => Expression::catalog(),
        };

        let template = if request.selected_option.is_some() {
            AFTER_SELECTION
        } else {
            NEXT_BEAT
        };
        self.render(template, ctx)
    }

    pub fn background_keyword(&self, description: &str) -> Result<String> {
        self.render(BACKGROUND_KEYWORD, context! { description })
    }

    /// Full image prompt for a background keyword.
    pub fn image_prompt(&self, keyword: &str) -> String {
        format!(
            "{keyword}, {IMAGE_STYLE}, {ASPECT_INSTRUCTION}, ultra detail, no people, environment background"
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

#[derive(Serialize)]
struct RosterLine<'a> {
    id: i64,
    name: &'a str,
    personality: &'a str,
}

fn roster(characters: &[Character]) -> Vec<RosterLine<'_>> {
    characters
        .iter()
        .map(|c| RosterLine {
            id: c.id,
            name: &c.name,
            personality: &c.personality,
        })
        .collect()
}

fn template_error(err: minijinja::Error) -> GstarError {
    GstarError::internal(format!("Prompt template error: {err}"))
}
