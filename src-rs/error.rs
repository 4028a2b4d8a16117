use std::path::PathBuf;

use thiserror::Error;

pub const MISSING_LOCATION_MESSAGE: &str =
    "You did not provide a place or address for your location.";
pub const MISSING_API_KEY_MESSAGE: &str = "Missing Google Static Maps API key. <a href=\"https://developers.google.com/maps/documentation/maps-static/get-api-key\">Generate one!</a>";
pub const STYLES_MESSAGE: &str = "There are errors in styles JSON.";

/// Raw style text that does not describe an array of style rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleParseError {
    #[error("styles are not valid JSON: {0}")]
    Json(String),
    #[error("styles must be a JSON array of rules")]
    NotAnArray,
    #[error("style rule {index}: {message}")]
    Rule { index: usize, message: String },
}

/// Parameter problems caught before any shape is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", MISSING_LOCATION_MESSAGE)]
    MissingLocation,
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,
    #[error("zoom level {0} is outside 1..=20")]
    ZoomOutOfRange(u8),
    #[error("{}", STYLES_MESSAGE)]
    Styles(#[source] StyleParseError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read preferences {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write preferences {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("map request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("map request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("map response is not a usable image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to store map image {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal outcomes of a batch run. Unsupported shapes are not errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
