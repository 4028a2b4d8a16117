use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::FetchedImage;
use crate::shape::{Dimensions, TargetShape, UnsupportedShape};

/// Image fill recorded on a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFill {
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// One shape of a JSON design document.
///
/// Geometry fields depend on `kind`: rectangles, polygons, paths and boolean
/// groups use `width`/`height`, ellipses use `radius_x`/`radius_y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeNode {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_y: Option<f64>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<ImageFill>,
    #[serde(default)]
    pub fill_enabled: bool,
}

impl ShapeNode {
    fn unsupported(&self) -> UnsupportedShape {
        UnsupportedShape {
            kind: self.kind.clone(),
        }
    }

    fn sized(&self, width: Option<f64>, height: Option<f64>) -> Result<Dimensions, UnsupportedShape> {
        match (width, height) {
            (Some(w), Some(h)) => Dimensions::from_f64(w, h).ok_or_else(|| self.unsupported()),
            _ => Err(self.unsupported()),
        }
    }
}

impl TargetShape for ShapeNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn fill_dimensions(&self) -> Result<Dimensions, UnsupportedShape> {
        match self.kind.as_str() {
            "Rectangle" | "Polygon" | "Path" | "BooleanGroup" => self.sized(self.width, self.height),
            "Ellipse" => self.sized(
                self.radius_x.map(|r| r * 2.0),
                self.radius_y.map(|r| r * 2.0),
            ),
            _ => Err(self.unsupported()),
        }
    }

    fn apply_image_fill(&mut self, image: &FetchedImage) {
        self.fill = Some(ImageFill {
            image: image.path.clone(),
            width: image.width,
            height: image.height,
        });
        self.fill_enabled = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub shapes: Vec<ShapeNode>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("document not found: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid document JSON: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create parent directory: {}", parent.display())
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write document: {}", path.display()))
    }

    /// Returns the selection in document order: the shapes named in `ids`,
    /// or the shapes flagged `selected` when `ids` is empty.
    pub fn selection_mut(&mut self, ids: &[String]) -> Result<Vec<&mut ShapeNode>> {
        if let Some(missing) = ids
            .iter()
            .find(|id| !self.shapes.iter().any(|shape| &shape.id == *id))
        {
            bail!("no shape with id {missing:?} in document");
        }
        Ok(self
            .shapes
            .iter_mut()
            .filter(|shape| {
                if ids.is_empty() {
                    shape.selected
                } else {
                    ids.contains(&shape.id)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn node(kind: &str) -> ShapeNode {
        ShapeNode {
            id: kind.to_lowercase(),
            kind: kind.to_string(),
            width: None,
            height: None,
            radius_x: None,
            radius_y: None,
            selected: true,
            fill: None,
            fill_enabled: false,
        }
    }

    #[test]
    fn rectangle_uses_width_and_height() {
        let mut rect = node("Rectangle");
        rect.width = Some(400.0);
        rect.height = Some(299.6);
        assert_eq!(rect.fill_dimensions(), Ok(Dimensions::new(400, 300).unwrap()));
    }

    #[test]
    fn ellipse_uses_twice_the_radii() {
        let mut ellipse = node("Ellipse");
        ellipse.radius_x = Some(50.0);
        ellipse.radius_y = Some(25.0);
        assert_eq!(ellipse.fill_dimensions(), Ok(Dimensions::new(100, 50).unwrap()));
    }

    #[test]
    fn unsupported_kinds_report_their_label() {
        let mut text = node("Text");
        text.width = Some(100.0);
        text.height = Some(20.0);
        assert_eq!(
            text.fill_dimensions(),
            Err(UnsupportedShape {
                kind: "Text".to_string()
            })
        );
    }

    #[test]
    fn supported_kind_without_geometry_is_unsupported() {
        assert!(node("Polygon").fill_dimensions().is_err());
        let mut flat = node("Path");
        flat.width = Some(100.0);
        flat.height = Some(0.0);
        assert!(flat.fill_dimensions().is_err());
    }

    #[test]
    fn apply_fill_enables_fill() {
        let mut rect = node("Rectangle");
        rect.apply_image_fill(&FetchedImage {
            path: PathBuf::from("map.png"),
            width: 800,
            height: 600,
        });
        assert!(rect.fill_enabled);
        assert_eq!(rect.fill.as_ref().map(|f| f.width), Some(800));
    }

    #[test]
    fn selection_follows_document_order() {
        let mut doc = Document {
            shapes: vec![node("Rectangle"), node("Ellipse"), node("Text")],
        };
        doc.shapes[1].selected = false;
        let ids: Vec<String> = doc
            .selection_mut(&[])
            .unwrap()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids, ["rectangle", "text"]);

        let explicit = vec!["text".to_string(), "ellipse".to_string()];
        let ids: Vec<String> = doc
            .selection_mut(&explicit)
            .unwrap()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids, ["ellipse", "text"]);
    }

    #[test]
    fn unknown_selection_id_is_an_error() {
        let mut doc = Document {
            shapes: vec![node("Rectangle")],
        };
        assert!(doc.selection_mut(&["nope".to_string()]).is_err());
    }

    #[test]
    fn load_and_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(
            &path,
            r#"{"shapes": [{"id": "hero", "kind": "Rectangle", "width": 400, "height": 300, "selected": true}]}"#,
        )
        .unwrap();
        let mut doc = Document::load(&path).unwrap();
        assert_eq!(doc.shapes[0].fill_dimensions(), Ok(Dimensions::new(400, 300).unwrap()));
        doc.shapes[0].fill_enabled = true;
        let out = dir.path().join("out").join("doc.json");
        doc.save(&out).unwrap();
        assert!(Document::load(&out).unwrap().shapes[0].fill_enabled);
    }
}
