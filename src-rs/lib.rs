//! Fill design shapes with Google Static Maps images.
//!
//! A run validates [`MapRequestParams`], translates the optional style JSON
//! once, then walks the selection in order: each supported shape gets a map
//! request sized to its fill, the image is fetched and applied as the fill.
//! Unsupported shapes are skipped and reported in the [`RunSummary`].

pub mod dialog;
pub mod document;
pub mod error;
pub mod fetch;
pub mod params;
pub mod prefs;
pub mod request;
pub mod shape;
pub mod style;
pub mod workflow;

pub use error::{FetchError, RunError, StorageError, StyleParseError, ValidationError};
pub use params::{MapRequestParams, MapType};
pub use request::MapRequest;
pub use shape::{Dimensions, TargetShape, UnsupportedShape};
pub use style::StyleRule;
pub use workflow::{generate_map, run, FillOutcome, RunSummary};
