pub mod config;
pub mod error;
pub mod server;
pub mod summarize;
pub mod transcript;
pub mod youtube;

#[cfg(test)]
mod testing;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use error::ScriptError;

/// A single captioned segment
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Tone preset for the generated script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    #[default]
    Emotional,
    Humorous,
    Immersive,
    Documentary,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Emotional, Style::Humorous, Style::Immersive, Style::Documentary];

    pub fn name(&self) -> &'static str {
        match self {
            Style::Emotional => "emotional",
            Style::Humorous => "humorous",
            Style::Immersive => "immersive",
            Style::Documentary => "documentary",
        }
    }

    /// Korean label accepted from web clients
    pub fn label(&self) -> &'static str {
        match self {
            Style::Emotional => "감성적",
            Style::Humorous => "유머러스",
            Style::Immersive => "몰입형",
            Style::Documentary => "다큐멘터리",
        }
    }

    /// One-line tonal description embedded in the prompt
    pub fn tone(&self) -> &'static str {
        match self {
            Style::Emotional => "Use heartfelt, inspiring language to evoke deep feelings.",
            Style::Humorous => "Incorporate humor, light-hearted phrasing, or witty remarks.",
            Style::Immersive => "Create vivid, sensory-driven descriptions to captivate the audience.",
            Style::Documentary => "Use factual, authoritative, and narrative-driven language.",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Style {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emotional" | "감성적" => Ok(Style::Emotional),
            "humorous" | "funny" | "유머러스" => Ok(Style::Humorous),
            "immersive" | "몰입형" => Ok(Style::Immersive),
            "documentary" | "다큐멘터리" => Ok(Style::Documentary),
            other => Err(ScriptError::InvalidInput(format!(
                "unknown style '{other}' (expected one of: emotional, humorous, immersive, documentary)"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Generated short-form script; every field is required in the model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortsScript {
    pub title: String,
    pub subtitles: String,
    pub narration: String,
    pub visual_suggestions: String,
}

static VIDEO_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // watch?v=ID, youtu.be/ID, shorts/ID, anything ending in /ID
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid video id pattern"),
        Regex::new(r"(?:embed/)([0-9A-Za-z_-]{11})").expect("valid embed pattern"),
        Regex::new(r"^([0-9A-Za-z_-]{11})$").expect("valid bare id pattern"),
    ]
});

/// Extract video ID from a URL or bare ID; patterns are tried in order and the first match wins
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_video_id() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc12345678"),
            Some("abc12345678".to_string())
        );
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_prefers_query_param() {
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=ABCDEFGHIJK"),
            Some("ABCDEFGHIJK".to_string())
        );
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(extract_video_id("not-a-valid-id"), None);
        assert_eq!(extract_video_id("https://example.com/short"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_style_accepts_korean_and_english() {
        assert_eq!("유머러스".parse::<Style>().unwrap(), Style::Humorous);
        assert_eq!("Documentary".parse::<Style>().unwrap(), Style::Documentary);
        assert_eq!(" funny ".parse::<Style>().unwrap(), Style::Humorous);
        assert_eq!("몰입형".parse::<Style>().unwrap(), Style::Immersive);
    }

    #[test]
    fn test_style_rejects_unknown() {
        let err = "sarcastic".parse::<Style>().unwrap_err();
        assert!(matches!(err, ScriptError::InvalidInput(_)));
    }

    #[test]
    fn test_style_default_is_emotional() {
        assert_eq!(Style::default(), Style::Emotional);
        let s: Style = serde_json::from_str("\"감성적\"").unwrap();
        assert_eq!(s, Style::Emotional);
    }
}
