use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::request::NotificationRequest;

/// Image locator for a tile face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "uri", rename_all = "lowercase")]
pub enum ImageRef {
    /// Package-relative or app-data path.
    Local(String),
    Remote(String),
}

impl ImageRef {
    /// Empty locators mean "no image".
    pub fn parse(locator: &str) -> Option<Self> {
        let locator = locator.trim();
        if locator.is_empty() {
            return None;
        }
        let lower = locator.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(Self::Remote(locator.to_string()))
        } else {
            Some(Self::Local(locator.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(uri) | Self::Remote(uri) => uri,
        }
    }
}

/// One update of the application tile.
///
/// `None` leaves the corresponding element as it is; empty strings clear text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileData {
    pub count: Option<i32>,
    pub back_title: String,
    pub back_content: String,
    pub wide_back_content: String,
    pub small_image: Option<ImageRef>,
    pub image: Option<ImageRef>,
    pub wide_image: Option<ImageRef>,
}

impl TileData {
    pub fn from_request(request: &NotificationRequest) -> Self {
        Self {
            count: request.badge,
            back_title: request.title.clone(),
            back_content: request.short_message.clone(),
            wide_back_content: request.message.clone(),
            small_image: ImageRef::parse(&request.small_image),
            image: ImageRef::parse(&request.image),
            wide_image: ImageRef::parse(&request.wide_image),
        }
    }

    /// The blank tile: zero badge, no text, default artwork.
    pub fn cleared(defaults: &TileDefaults) -> Self {
        Self {
            count: Some(0),
            back_title: String::new(),
            back_content: String::new(),
            wide_back_content: String::new(),
            small_image: ImageRef::parse(&defaults.image),
            image: ImageRef::parse(&defaults.image),
            wide_image: ImageRef::parse(&defaults.wide_image),
        }
    }
}

/// Artwork the tile falls back to when cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefaults {
    pub image: String,
    pub wide_image: String,
}

impl Default for TileDefaults {
    fn default() -> Self {
        Self {
            image: "appdata:Background.png".to_string(),
            wide_image: "/Assets/Tiles/FlipCycleTileLarge.png".to_string(),
        }
    }
}

/// The home-screen tile/badge the host renders.
pub trait PresentationSurface: Send + Sync {
    fn update(&self, data: &TileData) -> Result<(), SurfaceError>;
    fn reset(&self, data: &TileData) -> Result<(), SurfaceError>;
}

/// What a tile currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileFace {
    pub count: i32,
    pub back_title: String,
    pub back_content: String,
    pub wide_back_content: String,
    pub small_image: Option<ImageRef>,
    pub image: Option<ImageRef>,
    pub wide_image: Option<ImageRef>,
}

impl TileFace {
    fn apply(&mut self, data: &TileData) {
        if let Some(count) = data.count {
            self.count = count;
        }
        self.back_title = data.back_title.clone();
        self.back_content = data.back_content.clone();
        self.wide_back_content = data.wide_back_content.clone();
        if let Some(image) = &data.small_image {
            self.small_image = Some(image.clone());
        }
        if let Some(image) = &data.image {
            self.image = Some(image.clone());
        }
        if let Some(image) = &data.wide_image {
            self.wide_image = Some(image.clone());
        }
    }

    /// Zero badge, no text, and every image back on the default artwork.
    pub fn is_cleared(&self, defaults: &TileDefaults) -> bool {
        let mut blank = TileFace::default();
        blank.apply(&TileData::cleared(defaults));
        *self == blank
    }
}

/// In-process tile used by tests and the simulator.
#[derive(Debug, Default)]
pub struct MemoryTile {
    face: Mutex<TileFace>,
    history: Mutex<Vec<TileData>>,
}

impl MemoryTile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(&self) -> TileFace {
        self.face.lock().clone()
    }

    pub fn history(&self) -> Vec<TileData> {
        self.history.lock().clone()
    }
}

impl PresentationSurface for MemoryTile {
    fn update(&self, data: &TileData) -> Result<(), SurfaceError> {
        self.face.lock().apply(data);
        self.history.lock().push(data.clone());
        Ok(())
    }

    fn reset(&self, data: &TileData) -> Result<(), SurfaceError> {
        let mut face = self.face.lock();
        *face = TileFace::default();
        face.apply(data);
        self.history.lock().push(data.clone());
        Ok(())
    }
}
