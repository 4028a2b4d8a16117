use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchedImage;

/// Fill size of a shape in document pixels. Both sides are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Rounds fractional document sizes to whole pixels, keeping at least 1.
    /// Non-finite or non-positive sizes have no dimensions.
    pub fn from_f64(width: f64, height: f64) -> Option<Self> {
        let side = |v: f64| {
            if v.is_finite() && v > 0.0 {
                Some(v.round().clamp(1.0, u32::MAX as f64) as u32)
            } else {
                None
            }
        };
        Self::new(side(width)?, side(height)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} is not supported")]
pub struct UnsupportedShape {
    pub kind: String,
}

/// A selected document shape that can receive an image fill.
pub trait TargetShape {
    /// Host kind name, e.g. `Rectangle`, used in skip reports.
    fn kind(&self) -> &str;

    fn fill_dimensions(&self) -> Result<Dimensions, UnsupportedShape>;

    /// Sets the shape's fill to `image` and enables the fill.
    fn apply_image_fill(&mut self, image: &FetchedImage);
}

impl<T: TargetShape + ?Sized> TargetShape for &mut T {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn fill_dimensions(&self) -> Result<Dimensions, UnsupportedShape> {
        (**self).fill_dimensions()
    }

    fn apply_image_fill(&mut self, image: &FetchedImage) {
        (**self).apply_image_fill(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sides_have_no_dimensions() {
        assert_eq!(Dimensions::new(0, 10), None);
        assert_eq!(Dimensions::new(10, 0), None);
        assert!(Dimensions::new(1, 1).is_some());
    }

    #[test]
    fn fractional_sizes_round_with_minimum_of_one() {
        assert_eq!(
            Dimensions::from_f64(399.6, 0.2),
            Dimensions::new(400, 1)
        );
        assert_eq!(Dimensions::from_f64(-5.0, 10.0), None);
        assert_eq!(Dimensions::from_f64(f64::NAN, 10.0), None);
    }
}
