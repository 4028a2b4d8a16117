use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

use crate::error::StyleParseError;

/// One `property:value` pair of a style rule, e.g. `color:0xff0000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styler {
    pub property: String,
    pub value: String,
}

/// A map styling rule as written in the Maps JavaScript style JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRule {
    pub feature_type: Option<String>,
    pub element_type: Option<String>,
    pub stylers: Vec<Styler>,
}

/// Parses style JSON text into rules, rejecting anything that is not an
/// array of rule objects.
///
/// Empty input yields no rules. Whitespace alone is not valid JSON and is
/// rejected like any other malformed text. Styler colors written as
/// `#rrggbb` are rewritten to the `0xrrggbb` form the Static Maps API expects.
pub fn parse_styles(raw: &str) -> Result<Vec<StyleRule>, StyleParseError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|err| StyleParseError::Json(err.to_string()))?;
    let items = value.as_array().ok_or(StyleParseError::NotAnArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_rule(index, item))
        .collect()
}

fn parse_rule(index: usize, item: &Value) -> Result<StyleRule, StyleParseError> {
    let rule_error = |message: String| StyleParseError::Rule { index, message };

    let obj = item
        .as_object()
        .ok_or_else(|| rule_error("expected an object".to_string()))?;

    let feature_type = optional_string(obj, "featureType").map_err(rule_error)?;
    let element_type = optional_string(obj, "elementType").map_err(rule_error)?;

    let stylers = match obj.get("stylers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| {
                parse_styler(entry).map_err(|msg| rule_error(format!("stylers[{pos}]: {msg}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(rule_error("\"stylers\" must be an array".to_string())),
    };

    Ok(StyleRule {
        feature_type,
        element_type,
        stylers,
    })
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("\"{key}\" must be a string")),
    }
}

fn parse_styler(entry: &Value) -> Result<Styler, String> {
    let obj = entry
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;
    if obj.len() != 1 {
        return Err(format!("expected exactly one property, found {}", obj.len()));
    }
    let (property, raw_value) = obj
        .iter()
        .next()
        .ok_or_else(|| "expected exactly one property".to_string())?;
    let value = match raw_value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(format!("\"{property}\" must be a string, number or boolean")),
    };
    Ok(Styler {
        property: property.clone(),
        value: normalize_color(&value),
    })
}

fn normalize_color(value: &str) -> String {
    match value.strip_prefix('#') {
        Some(hex) => format!("0x{hex}"),
        None => value.to_string(),
    }
}

/// Renders rules as `style=` query parameters joined by `&`.
///
/// Rules keep their input order: later rules may override earlier ones with
/// the same selector, so nothing is reordered or merged. Rules with neither
/// selectors nor stylers carry nothing and are left out.
pub fn translate(rules: &[StyleRule]) -> String {
    rules
        .iter()
        .map(rule_value)
        .filter(|value| !value.is_empty())
        .map(|value| format!("style={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn rule_value(rule: &StyleRule) -> String {
    let mut parts = Vec::with_capacity(rule.stylers.len() + 2);
    if let Some(feature) = rule.feature_type.as_deref().filter(|s| !s.is_empty()) {
        parts.push(encode_component(&format!("feature:{feature}")));
    }
    if let Some(element) = rule.element_type.as_deref().filter(|s| !s.is_empty()) {
        parts.push(encode_component(&format!("element:{element}")));
    }
    for styler in &rule.stylers {
        parts.push(encode_component(&format!(
            "{}:{}",
            styler.property, styler.value
        )));
    }
    parts.join("%7C")
}

fn encode_component(input: &str) -> String {
    byte_serialize(input.as_bytes()).collect()
}
