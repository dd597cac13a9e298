//! Turns free-text model replies into validated story values.
//!
//! Replies are expected to contain one JSON object, possibly wrapped in a
//! markdown fence. The JSON is read into loose wire structs first and then
//! converted into [`SceneDraft`], which can only hold a complete dialogue
//! line or a non-empty set of choices.

use crate::error::AgentError;
use gstar_core::scene::Expression;
use gstar_core::story::{GameOpening, NextBeat, SceneDraft};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Locates the JSON payload inside a model reply.
///
/// Tries a ```` ```json ```` fence, then any ```` ``` ```` fence, then the
/// span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(inner) = fenced(text, "```json") {
        return Some(inner);
    }
    if let Some(inner) = fenced(text, "```") {
        return Some(inner);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn fenced<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let after = &text[text.find(opener)? + opener.len()..];
    let end = after.find("```")?;
    let inner = after[..end].trim();
    (!inner.is_empty()).then_some(inner)
}

#[derive(Debug, Deserialize)]
struct WireScene {
    role: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    dialogue: Option<String>,
    selections: Option<BTreeMap<String, Value>>,
    character_id: Option<Value>,
    emotion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireOpening {
    title: Option<String>,
    main_character_id: Option<Value>,
    main_character_name: Option<String>,
    first_session_content: Option<String>,
    first_scene: WireScene,
}

#[derive(Debug, Deserialize)]
struct WireBeat {
    scene: WireScene,
    #[serde(default)]
    session_ended: bool,
    new_session_content: Option<String>,
}

/// Accepts `3`, `"3"` and `null`.
fn loose_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl WireScene {
    fn into_draft(self) -> Result<SceneDraft, AgentError> {
        let kind = non_blank(self.kind)
            .ok_or_else(|| AgentError::parse("scene.type is missing"))?
            .to_lowercase();
        let dialogue = non_blank(self.dialogue);
        let options = self
            .selections
            .unwrap_or_default()
            .into_iter()
            .map(|(id, text)| match text {
                Value::String(text) if !text.trim().is_empty() => Ok((id.trim().to_string(), text)),
                other => Err(AgentError::parse(format!(
                    "scene.selections[{id}] must be a non-empty string, got {other}"
                ))),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        match kind.as_str() {
            "dialogue" => {
                if !options.is_empty() {
                    return Err(AgentError::parse(
                        "dialogue scene must not carry selections",
                    ));
                }
                let dialogue = dialogue
                    .ok_or_else(|| AgentError::parse("dialogue scene has no dialogue"))?;
                let role = non_blank(self.role)
                    .ok_or_else(|| AgentError::parse("dialogue scene has no role"))?;
                Ok(SceneDraft::Dialogue {
                    role,
                    dialogue,
                    character_id: loose_id(self.character_id.as_ref()),
                    expression: self.emotion.as_deref().and_then(Expression::from_tag),
                })
            }
            "selection" => {
                if dialogue.is_some() {
                    return Err(AgentError::parse(
                        "selection scene must not carry dialogue",
                    ));
                }
                if options.is_empty() {
                    return Err(AgentError::parse("selection scene has no selections"));
                }
                Ok(SceneDraft::Selection {
                    role: non_blank(self.role).unwrap_or_else(|| "user".to_string()),
                    options,
                })
            }
            other => Err(AgentError::parse(format!("unknown scene type '{other}'"))),
        }
    }
}

fn payload<'de, T: Deserialize<'de>>(text: &'de str) -> Result<T, AgentError> {
    let json = extract_json(text).ok_or_else(|| AgentError::parse("no JSON object in reply"))?;
    serde_json::from_str(json).map_err(|e| AgentError::parse(format!("invalid JSON: {e}")))
}

/// Parses the reply to the opening prompt.
///
/// An absent or non-numeric `main_character_id` becomes `0`, which matches
/// no roster entry; the caller decides how to resolve it.
pub fn parse_opening(text: &str) -> Result<GameOpening, AgentError> {
    let wire: WireOpening = payload(text)?;
    Ok(GameOpening {
        title: non_blank(wire.title).ok_or_else(|| AgentError::parse("title is missing"))?,
        main_character_id: loose_id(wire.main_character_id.as_ref()).unwrap_or(0),
        main_character_name: non_blank(wire.main_character_name).unwrap_or_default(),
        first_session_content: non_blank(wire.first_session_content)
            .ok_or_else(|| AgentError::parse("first_session_content is missing"))?,
        first_scene: wire.first_scene.into_draft()?,
    })
}

/// Parses the reply to a progression prompt.
///
/// `new_session_content` is only kept when `session_ended` is true and the
/// text is not blank.
pub fn parse_beat(text: &str) -> Result<NextBeat, AgentError> {
    let wire: WireBeat = payload(text)?;
    let next_session = if wire.session_ended {
        non_blank(wire.new_session_content)
    } else {
        None
    };
    Ok(NextBeat {
        scene: wire.scene.into_draft()?,
        next_session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstar_core::scene::SceneKind;

    #[test]
    fn test_extract_json_prefers_json_fence() {
        let text = "Sure!\n```json\n{\"a\": 1}\n```\nand ```{\"b\": 2}```";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_plain_fence_and_braces() {
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), Some("{\"a\": 1}"));
        assert_eq!(extract_json("answer: {\"a\": {\"b\": 2}} done"), Some("{\"a\": {\"b\": 2}}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_dialogue_beat() {
        let reply = r#"```json
        {
            "scene": {
                "role": "유나",
                "type": "dialogue",
                "dialogue": "같이 갈래?",
                "selections": {},
                "character_id": "2",
                "emotion": "blush"
            },
            "session_ended": false,
            "new_session_content": "무시됨"
        }
        ```"#;
        let beat = parse_beat(reply).unwrap();
        assert_eq!(beat.next_session, None);
        assert_eq!(
            beat.scene,
            SceneDraft::Dialogue {
                role: "유나".to_string(),
                dialogue: "같이 갈래?".to_string(),
                character_id: Some(2),
                expression: Some(Expression::Blush),
            }
        );
    }

    #[test]
    fn test_parse_selection_beat_with_transition() {
        let reply = r#"{
            "scene": {"role": "user", "type": "selection", "dialogue": null,
                      "selections": {"1": "응, 가자", "2": "조금만 더 있자"},
                      "character_id": null, "emotion": null},
            "session_ended": true,
            "new_session_content": "공원. 벚꽃이 흩날린다"
        }"#;
        let beat = parse_beat(reply).unwrap();
        assert_eq!(beat.scene.kind(), SceneKind::Selection);
        assert_eq!(beat.next_session.as_deref(), Some("공원. 벚꽃이 흩날린다"));
    }

    #[test]
    fn test_session_end_without_content_stays() {
        let reply = r#"{"scene": {"role": "narrator", "type": "dialogue", "dialogue": "..."},
                        "session_ended": true, "new_session_content": "  "}"#;
        assert_eq!(parse_beat(reply).unwrap().next_session, None);
    }

    #[test]
    fn test_unknown_expression_is_default() {
        let reply = r#"{"scene": {"role": "유나", "type": "dialogue", "dialogue": "흠", "emotion": "기본"}}"#;
        match parse_beat(reply).unwrap().scene {
            SceneDraft::Dialogue { expression, .. } => assert_eq!(expression, None),
            other => panic!("expected dialogue, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_scenes_rejected() {
        let cases = [
            r#"{"scene": {"role": "유나", "type": "monologue", "dialogue": "hi"}}"#,
            r#"{"scene": {"role": "유나", "type": "dialogue", "dialogue": "  "}}"#,
            r#"{"scene": {"role": "user", "type": "selection", "selections": {}}}"#,
            r#"{"scene": {"role": "user", "type": "selection", "dialogue": "hi", "selections": {"1": "a"}}}"#,
            r#"{"scene": {"role": "유나", "type": "dialogue", "dialogue": "hi", "selections": {"1": "a"}}}"#,
            r#"{"scene": {"role": "user", "type": "selection", "selections": {"1": 3}}}"#,
            r#"{"session_ended": false}"#,
            "I cannot answer that.",
        ];
        for case in cases {
            assert!(
                matches!(parse_beat(case), Err(AgentError::Parse(_))),
                "should reject: {case}"
            );
        }
    }

    #[test]
    fn test_parse_opening() {
        let reply = r#"```json
        {
            "title": "봄날의 약속",
            "main_character_id": 1,
            "main_character_name": "아리아나",
            "first_session_content": "학교 옥상. 시원한 바람이 부는 점심시간",
            "first_scene": {"role": "아리아나", "type": "dialogue", "dialogue": "안녕!",
                            "character_id": 1, "emotion": "smile"}
        }
        ```"#;
        let opening = parse_opening(reply).unwrap();
        assert_eq!(opening.title, "봄날의 약속");
        assert_eq!(opening.main_character_id, 1);
        assert_eq!(opening.first_scene.kind(), SceneKind::Dialogue);
    }

    #[test]
    fn test_opening_without_id_uses_zero() {
        let reply = r#"{"title": "t", "main_character_id": "누구", "first_session_content": "교실",
                        "first_scene": {"role": "narrator", "type": "dialogue", "dialogue": "시작"}}"#;
        assert_eq!(parse_opening(reply).unwrap().main_character_id, 0);
    }
}
