//! Drop payloads and the media palette.
//!
//! A drop payload is the JSON record a host attaches to a drag from the media
//! palette (or from the text tool). Payloads are loosely typed on the wire; this
//! module turns them into a typed [`Item`] with documented defaults, and turns
//! palette entries back into payloads.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FONT_SIZE, DEFAULT_TEXT_CONTENT, FONT_SIZE_MAX, FONT_SIZE_MIN};
use crate::doc::{FontFamily, Item, ItemContent};
use crate::geom::Point;

/// Why a drop payload produced no item.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported item type: {0}")]
    UnsupportedKind(String),
    #[error("{0} payload has no url")]
    MissingUrl(&'static str),
}

/// Serialized record carried by a drag onto a page.
///
/// Every field is optional; the drop point, not the payload, decides where the
/// item lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl DropPayload {
    /// Parse the raw JSON string handed over by the host's drag-and-drop layer.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] when the string is not a JSON object
    /// of the expected shape.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Payload for the explicit "add text" action.
    #[must_use]
    pub fn text() -> Self {
        Self { kind: Some("text".into()), ..Self::default() }
    }

    /// Build the item this payload describes, positioned at `at`.
    ///
    /// Missing sizes default to `default_size`; missing text fields default to
    /// 16px Arial with placeholder content. A fresh id is always generated.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::UnsupportedKind`] for types the editor cannot
    /// place and [`PayloadError::MissingUrl`] for media without a url.
    pub fn into_item(self, at: Point, default_size: f64) -> Result<Item, PayloadError> {
        let kind = self.kind.as_deref().unwrap_or("image").to_ascii_lowercase();
        let content = match kind.as_str() {
            "image" | "clipart" | "background" => ItemContent::Image {
                url: self.url.ok_or(PayloadError::MissingUrl("image"))?,
                name: self.name,
                crop: None,
            },
            "audio" => ItemContent::Audio { url: self.url.ok_or(PayloadError::MissingUrl("audio"))? },
            "text" => ItemContent::Text {
                content: self
                    .content
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_TEXT_CONTENT.to_string()),
                font_size: normalize_font_size(self.font_size),
                font_family: self
                    .font_family
                    .as_deref()
                    .and_then(FontFamily::from_name)
                    .unwrap_or_default(),
            },
            _ => return Err(PayloadError::UnsupportedKind(kind)),
        };
        let width = self.width.unwrap_or(default_size);
        let height = self.height.unwrap_or(default_size);
        Ok(Item::new(at, width, height, content))
    }
}

/// Clamp a font size into the editor's range, defaulting when absent or invalid.
#[must_use]
pub fn normalize_font_size(size: Option<f64>) -> f64 {
    match size {
        Some(s) if s.is_finite() && s > 0.0 => s.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX),
        _ => DEFAULT_FONT_SIZE,
    }
}

// =============================================================================
// MEDIA PALETTE
// =============================================================================

/// Store collection a media entry was uploaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcollection {
    Media,
    Music,
    Background,
    Clipart,
}

impl Subcollection {
    pub const ALL: [Subcollection; 4] = [Self::Media, Self::Music, Self::Background, Self::Clipart];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::Music => "music",
            Self::Background => "background",
            Self::Clipart => "clipart",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

/// Media type recorded at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Clipart,
    Background,
    Video,
    #[serde(other)]
    Other,
}

impl MediaKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Clipart => "clipart",
            Self::Background => "background",
            Self::Video => "video",
            Self::Other => "other",
        }
    }

    /// Parse a stored kind; unknown values map to [`MediaKind::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "clipart" => Self::Clipart,
            "background" => Self::Background,
            "video" => Self::Video,
            _ => Self::Other,
        }
    }
}

/// One draggable entry in the media palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// `None` for built-in entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcollection: Option<Subcollection>,
}

impl MediaEntry {
    /// Whether this entry is one of the built-in demo images.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.subcollection.is_none()
    }

    /// Drop payload produced when this entry is dragged onto a page.
    #[must_use]
    pub fn to_payload(&self) -> DropPayload {
        let kind = if self.subcollection == Some(Subcollection::Music) {
            MediaKind::Audio
        } else {
            self.kind
        };
        DropPayload {
            kind: Some(kind.as_str().to_string()),
            url: Some(self.url.clone()),
            name: Some(self.name.clone()),
            ..DropPayload::default()
        }
    }
}

const LION_URL: &str = "https://classroomclipart.com/image/static2/preview2/cute-animal-lion-clipart-33697.jpg";
const WORLD_MAP_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/8/80/World_map_-_low_resolution.svg/1024px-World_map_-_low_resolution.svg.png";

/// The demo images present in every palette.
#[must_use]
pub fn builtin_media() -> Vec<MediaEntry> {
    vec![
        MediaEntry {
            id: "lion-demo".into(),
            name: "Lion".into(),
            url: LION_URL.into(),
            kind: MediaKind::Image,
            subcollection: None,
        },
        MediaEntry {
            id: "map-demo".into(),
            name: "World Map".into(),
            url: WORLD_MAP_URL.into(),
            kind: MediaKind::Image,
            subcollection: None,
        },
    ]
}

/// User uploads followed by the built-in entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPalette {
    entries: Vec<MediaEntry>,
}

impl MediaPalette {
    /// Merge user uploads with the built-in demo entries.
    #[must_use]
    pub fn merge(uploads: Vec<MediaEntry>) -> Self {
        let mut entries = uploads;
        entries.extend(builtin_media());
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    /// Entries shown under a sidebar tab. The media tab also lists built-ins.
    #[must_use]
    pub fn entries_for(&self, tab: Subcollection) -> Vec<&MediaEntry> {
        self.entries
            .iter()
            .filter(|e| e.subcollection == Some(tab) || (tab == Subcollection::Media && e.is_builtin()))
            .collect()
    }
}
