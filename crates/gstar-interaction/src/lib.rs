//! Language model and image generation adapters.
//!
//! - `gemini_api_agent`: REST client for Gemini `generateContent`
//! - `prompts`: prompt templates
//! - `response_parser`: turns model replies into validated drafts
//! - `story_agent`: [`StoryGenerator`](gstar_core::story::StoryGenerator) over a text agent
//! - `background`: [`BackgroundGenerator`](gstar_core::story::BackgroundGenerator) over text and image agents

pub mod agent;
pub mod background;
pub mod error;
pub mod gemini_api_agent;
pub mod image_processing;
pub mod prompts;
pub mod response_parser;
pub mod story_agent;

pub use agent::{Agent, ImageAgent};
pub use background::GeminiBackgroundGenerator;
pub use error::AgentError;
pub use gemini_api_agent::GeminiApiAgent;
pub use prompts::PromptBuilder;
pub use story_agent::GeminiStoryGenerator;
