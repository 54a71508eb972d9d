//! Requested output quality and resolution selection

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Qualities offered when a backend cannot list real formats
pub const DEFAULT_QUALITY_LABELS: &[&str] = &["1080p", "720p", "480p", "360p", "240p"];

/// Requested output quality
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    /// Audio only (mp3)
    Audio,
    /// Best available video
    #[default]
    Best,
    /// Video capped at the given height in pixels
    Resolution(u32),
}

impl Quality {
    /// Parse a requested quality, falling back to `default` for anything unrecognised
    ///
    /// An absent or empty value silently resolves to the default; an
    /// unrecognised value additionally logs a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use tubeproxy::quality::Quality;
    ///
    /// assert_eq!(Quality::parse_or(Some("720p"), Quality::Best), Quality::Resolution(720));
    /// assert_eq!(Quality::parse_or(Some("potato"), Quality::Best), Quality::Best);
    /// assert_eq!(Quality::parse_or(None, Quality::Audio), Quality::Audio);
    /// ```
    pub fn parse_or(requested: Option<&str>, default: Quality) -> Quality {
        match requested.map(str::trim) {
            None | Some("") => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    requested = raw,
                    fallback = %default,
                    "unrecognised quality, using default"
                );
                default
            }),
        }
    }

    /// Whether the output is audio only
    pub fn is_audio(&self) -> bool {
        matches!(self, Quality::Audio)
    }

    /// File extension of the produced artifact
    pub fn extension(&self) -> &'static str {
        if self.is_audio() { "mp3" } else { "mp4" }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Audio => f.write_str("audio"),
            Quality::Best => f.write_str("best"),
            Quality::Resolution(height) => write!(f, "{height}p"),
        }
    }
}

/// Error returned when a quality string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised quality: {0}")]
pub struct ParseQualityError(pub String);

impl FromStr for Quality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "audio" => Ok(Quality::Audio),
            "best" => Ok(Quality::Best),
            other => other
                .strip_suffix('p')
                .unwrap_or(other)
                .parse::<u32>()
                .ok()
                .filter(|h| *h > 0)
                .map(Quality::Resolution)
                .ok_or_else(|| ParseQualityError(s.to_string())),
        }
    }
}

impl Serialize for Quality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Pick the stream height to download for a requested quality
///
/// Returns the highest available height that does not exceed the request.
/// If every available height exceeds the request, the highest available
/// height is used instead. `Best` always picks the highest; `Audio` has no
/// video height and yields `None`, as does an empty list.
///
/// # Examples
///
/// ```
/// use tubeproxy::quality::{select_resolution, Quality};
///
/// let heights = [1080, 720, 360];
/// assert_eq!(select_resolution(&heights, Quality::Resolution(480)), Some(360));
/// assert_eq!(select_resolution(&heights, Quality::Resolution(144)), Some(1080));
/// assert_eq!(select_resolution(&heights, Quality::Best), Some(1080));
/// ```
pub fn select_resolution(available: &[u32], requested: Quality) -> Option<u32> {
    let highest = available.iter().copied().max()?;
    match requested {
        Quality::Audio => None,
        Quality::Best => Some(highest),
        Quality::Resolution(cap) => available
            .iter()
            .copied()
            .filter(|h| *h <= cap)
            .max()
            .or(Some(highest)),
    }
}
