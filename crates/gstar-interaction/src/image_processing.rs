//! Background file naming and 16:9 cropping.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const MAX_KEYWORD_LEN: usize = 50;
const TARGET_RATIO: f64 = 16.0 / 9.0;
const RATIO_TOLERANCE: f64 = 0.01;

/// Normalizes a keyword for use in file names and cache lookups.
///
/// Lowercases, trims, joins whitespace runs with `_`, drops everything
/// that is not ASCII alphanumeric or `_`, and keeps at most 50 characters.
pub fn sanitize_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_KEYWORD_LEN)
        .collect()
}

/// `{keyword}_{YYYYMMDD_HHMMSS}.png`
pub fn timestamp_filename(sanitized: &str, at: DateTime<Utc>) -> String {
    format!("{sanitized}_{}.png", at.format("%Y%m%d_%H%M%S"))
}

pub fn uuid_filename() -> String {
    format!("{}.png", uuid::Uuid::new_v4())
}

fn timestamp_suffix() -> Option<&'static Regex> {
    static SUFFIX: OnceLock<Option<Regex>> = OnceLock::new();
    SUFFIX
        .get_or_init(|| Regex::new(r"_\d{8}_\d{6}$").ok())
        .as_ref()
}

/// Recovers the sanitized keyword from a timestamped background file name.
///
/// Returns `None` for anything that is not a `.png` with a timestamp suffix.
pub fn keyword_from_filename(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let found = timestamp_suffix()?.find(stem)?;
    Some(stem[..found.start()].to_string())
}

/// Center-crops to 16:9 when the ratio is off by more than 1%.
pub fn crop_to_widescreen(image: DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return image;
    }
    let ratio = f64::from(width) / f64::from(height);
    if (ratio - TARGET_RATIO).abs() <= RATIO_TOLERANCE {
        return image;
    }

    if ratio > TARGET_RATIO {
        let new_width = (u64::from(height) * 16 / 9) as u32;
        let left = (width - new_width) / 2;
        image.crop_imm(left, 0, new_width, height)
    } else {
        let new_height = (u64::from(width) * 9 / 16) as u32;
        let top = (height - new_height) / 2;
        image.crop_imm(0, top, width, new_height)
    }
}
