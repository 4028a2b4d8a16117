use url::form_urlencoded;

use crate::params::MapRequestParams;
use crate::shape::Dimensions;

pub const STATIC_MAPS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Static maps always asks for 2x pixel density.
pub const MAP_SCALE: u32 = 2;

/// A GET request against the Static Maps API. Query values are kept
/// decoded; [`MapRequest::url`] encodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRequest {
    pub endpoint: String,
    pub query: Vec<(String, String)>,
}

impl MapRequest {
    pub fn url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{query}", self.endpoint)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn build(params: &MapRequestParams, size: Dimensions, style_fragment: &str) -> MapRequest {
    build_with_endpoint(STATIC_MAPS_ENDPOINT, params, size, style_fragment)
}

pub fn build_with_endpoint(
    endpoint: &str,
    params: &MapRequestParams,
    size: Dimensions,
    style_fragment: &str,
) -> MapRequest {
    let mut query = vec![
        ("center".to_string(), params.location.clone()),
        ("zoom".to_string(), params.zoom_level.to_string()),
        ("size".to_string(), format!("{}x{}", size.width, size.height)),
        ("scale".to_string(), MAP_SCALE.to_string()),
        ("maptype".to_string(), params.map_type.as_query().to_string()),
    ];
    if params.include_pin {
        query.push((
            "markers".to_string(),
            format!("color:red|{}", params.location),
        ));
    }
    query.extend(
        form_urlencoded::parse(style_fragment.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned())),
    );
    query.push(("key".to_string(), params.api_key.clone()));

    MapRequest {
        endpoint: endpoint.to_string(),
        query,
    }
}
