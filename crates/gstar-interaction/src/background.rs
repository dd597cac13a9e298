//! Background image generation.
//!
//! ```text
//! session description ─(text agent)→ keyword ─(cache?)→ image agent
//!     → base64 decode → crop 16:9 → PNG under images.dir → URL
//! ```

use crate::agent::{Agent, ImageAgent};
use crate::image_processing::{
    crop_to_widescreen, keyword_from_filename, sanitize_keyword, timestamp_filename, uuid_filename,
};
use crate::prompts::PromptBuilder;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::Utc;
use gstar_core::config::{ImageNaming, ImageSettings};
use gstar_core::story::BackgroundGenerator;
use gstar_core::{GstarError, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct GeminiBackgroundGenerator {
    text_agent: Arc<dyn Agent>,
    image_agent: Arc<dyn ImageAgent>,
    prompts: PromptBuilder,
    settings: ImageSettings,
}

impl GeminiBackgroundGenerator {
    pub fn new(
        text_agent: Arc<dyn Agent>,
        image_agent: Arc<dyn ImageAgent>,
        settings: ImageSettings,
    ) -> Result<Self> {
        Ok(Self {
            text_agent,
            image_agent,
            prompts: PromptBuilder::new()?,
            settings,
        })
    }

    fn images_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.dir)
    }

    fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.settings.url_prefix.trim_end_matches('/'), filename)
    }

    /// Asks the text model for a short English keyword.
    async fn keyword_for(&self, description: &str) -> Result<String> {
        let prompt = self.prompts.background_keyword(description)?;
        let reply = self.text_agent.execute(&prompt).await?;
        let keyword = reply
            .lines()
            .map(|line| line.trim().trim_matches(|c| c == '"' || c == '\''))
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();
        if keyword.is_empty() {
            return Err(GstarError::upstream("Empty background keyword"));
        }
        Ok(keyword)
    }

    /// Renders (or reuses) a background for an already chosen keyword.
    pub async fn background_for_keyword(&self, keyword: &str) -> Result<String> {
        let sanitized = sanitize_keyword(keyword);
        let dir = self.images_dir();

        if self.settings.naming == ImageNaming::Timestamp && self.settings.reuse_cached {
            if let Some(filename) = find_cached(&dir, &sanitized).await? {
                tracing::info!("Reusing background {filename} for '{keyword}'");
                return Ok(self.url_for(&filename));
            }
        }

        let prompt = self.prompts.image_prompt(keyword);
        tracing::info!("Generating background image for keyword: {keyword}");
        tracing::debug!("Full prompt: {prompt}");
        let encoded = self.image_agent.generate_image(&prompt).await?;

        let filename = match self.settings.naming {
            ImageNaming::Timestamp if !sanitized.is_empty() => {
                timestamp_filename(&sanitized, Utc::now())
            }
            _ => uuid_filename(),
        };
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&filename);

        tokio::task::spawn_blocking(move || save_widescreen_png(&encoded, &path))
            .await
            .map_err(|e| GstarError::internal(format!("Image task failed: {e}")))??;

        tracing::info!("Image saved successfully: {filename}");
        Ok(self.url_for(&filename))
    }
}

#[async_trait]
impl BackgroundGenerator for GeminiBackgroundGenerator {
    async fn create_background(&self, description: &str) -> Result<String> {
        let keyword = self.keyword_for(description).await?;
        tracing::debug!("Background keyword for '{description}': {keyword}");
        self.background_for_keyword(&keyword).await
    }
}

/// Looks for an earlier timestamped file generated for the same keyword.
async fn find_cached(dir: &Path, sanitized: &str) -> Result<Option<String>> {
    if sanitized.is_empty() {
        return Ok(None);
    }
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if keyword_from_filename(&path).as_deref() == Some(sanitized) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                matches.push(name.to_string());
            }
        }
    }
    // Timestamp suffixes sort chronologically; prefer the newest.
    matches.sort();
    Ok(matches.pop())
}

fn save_widescreen_png(encoded: &str, path: &Path) -> Result<()> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| GstarError::upstream(format!("Image data is not valid base64: {e}")))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| GstarError::upstream(format!("Image data could not be decoded: {e}")))?;
    tracing::debug!("Original image size: {}x{}", decoded.width(), decoded.height());

    let cropped = crop_to_widescreen(decoded);
    cropped
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| GstarError::io(format!("Failed to save image file to {}: {e}", path.display())))
}
