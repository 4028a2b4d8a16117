use crate::error::ValidationError;
use crate::style::{parse_styles, StyleRule};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 20;
pub const DEFAULT_ZOOM: u8 = 12;

/// Quick-pick zoom levels: world, continent, region, city, streets, buildings.
pub const ZOOM_PRESETS: [u8; 6] = [2, 5, 9, 12, 15, 19];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MapType {
    #[default]
    Roadmap,
    Terrain,
    Satellite,
    Hybrid,
}

impl MapType {
    pub const ALL: [MapType; 4] = [
        MapType::Roadmap,
        MapType::Terrain,
        MapType::Satellite,
        MapType::Hybrid,
    ];

    /// Value of the `maptype` query parameter.
    pub fn as_query(self) -> &'static str {
        match self {
            MapType::Roadmap => "roadmap",
            MapType::Terrain => "terrain",
            MapType::Satellite => "satellite",
            MapType::Hybrid => "hybrid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MapType::Roadmap => "Roadmap",
            MapType::Terrain => "Terrain",
            MapType::Satellite => "Satellite",
            MapType::Hybrid => "Hybrid",
        }
    }
}

/// Everything one run needs, captured once from the form before the run
/// starts and never changed while it is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRequestParams {
    pub location: String,
    pub zoom_level: u8,
    pub map_type: MapType,
    pub include_pin: bool,
    pub raw_styles: Option<String>,
    pub api_key: String,
}

impl MapRequestParams {
    /// Checks location, API key, zoom and style JSON in that order and
    /// returns the parsed style rules.
    pub fn validate(&self) -> Result<Vec<StyleRule>, ValidationError> {
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingLocation);
        }
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingApiKey);
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom_level) {
            return Err(ValidationError::ZoomOutOfRange(self.zoom_level));
        }
        match self.raw_styles.as_deref() {
            Some(raw) => parse_styles(raw).map_err(ValidationError::Styles),
            None => Ok(Vec::new()),
        }
    }

    /// Style text as persisted: absent styles are stored as an empty string.
    pub fn styles_text(&self) -> &str {
        self.raw_styles.as_deref().unwrap_or_default()
    }
}
