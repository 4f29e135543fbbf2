//! Extracted question items and figure bounding boxes.

use serde::{Deserialize, Serialize};

/// One question extracted from the worksheet by the external OCR service.
///
/// Immutable once received: reordering changes position in the session's
/// item list, never identity or content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Unique within a session, stable across reorder.
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_box: Option<BoundingBox>,
}

impl ExtractedItem {
    /// Whether this item carries a croppable figure.
    pub fn figure_box(&self) -> Option<&BoundingBox> {
        if self.has_image {
            self.image_box.as_ref()
        } else {
            None
        }
    }
}

/// Figure location in source-image pixel space, as reported by the
/// extraction service. Untrusted: coordinates may be negative, inverted,
/// or beyond the image bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// A clamped, always-valid crop region: at least 1x1 pixels and fully
/// contained within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Clamp this box against an image of the given dimensions.
    ///
    /// The minimum corner is clamped into `[0, dim - 1]` and the maximum
    /// corner into `[min + 1, dim]`, so even inverted or fully
    /// out-of-range input yields a non-degenerate region.
    pub fn clamp(&self, image_width: u32, image_height: u32) -> CropRegion {
        let w = image_width.max(1);
        let h = image_height.max(1);

        let xmin = self.xmin.clamp(0.0, (w - 1) as f64);
        let ymin = self.ymin.clamp(0.0, (h - 1) as f64);
        let xmax = self.xmax.clamp(xmin + 1.0, w as f64);
        let ymax = self.ymax.clamp(ymin + 1.0, h as f64);

        let x = xmin.floor() as u32;
        let y = ymin.floor() as u32;
        let width = ((xmax.ceil() as u32).min(w).saturating_sub(x)).max(1);
        let height = ((ymax.ceil() as u32).min(h).saturating_sub(y)).max(1);

        CropRegion {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(bbox: BoundingBox) -> CropRegion {
        bbox.clamp(800, 600)
    }

    #[test]
    fn test_clamp_in_bounds_box_is_unchanged() {
        let r = region(BoundingBox {
            xmin: 10.0,
            ymin: 20.0,
            xmax: 110.0,
            ymax: 220.0,
        });
        assert_eq!(
            r,
            CropRegion {
                x: 10,
                y: 20,
                width: 100,
                height: 200
            }
        );
    }

    #[test]
    fn test_clamp_out_of_range_corner() {
        // Worked example: 800x600 with (-10, 590, 50, 700) -> (0, 590, 50, 10)
        let r = region(BoundingBox {
            xmin: -10.0,
            ymin: 590.0,
            xmax: 50.0,
            ymax: 700.0,
        });
        assert_eq!(
            r,
            CropRegion {
                x: 0,
                y: 590,
                width: 50,
                height: 10
            }
        );
    }

    #[test]
    fn test_clamp_inverted_box_yields_minimal_region() {
        let r = region(BoundingBox {
            xmin: 400.0,
            ymin: 300.0,
            xmax: 100.0,
            ymax: 50.0,
        });
        assert!(r.width >= 1 && r.height >= 1);
        assert!(r.x + r.width <= 800);
        assert!(r.y + r.height <= 600);
        assert_eq!((r.x, r.y), (400, 300));
    }

    #[test]
    fn test_clamp_fully_outside_image() {
        let r = region(BoundingBox {
            xmin: 5000.0,
            ymin: -900.0,
            xmax: 6000.0,
            ymax: -800.0,
        });
        assert!(r.width >= 1 && r.height >= 1);
        assert!(r.x + r.width <= 800);
        assert!(r.y + r.height <= 600);
    }

    #[test]
    fn test_clamp_degenerate_zero_area_box() {
        let r = region(BoundingBox {
            xmin: 50.0,
            ymin: 50.0,
            xmax: 50.0,
            ymax: 50.0,
        });
        assert_eq!(
            r,
            CropRegion {
                x: 50,
                y: 50,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn test_clamp_fractional_coordinates_cover_the_box() {
        let r = region(BoundingBox {
            xmin: 10.6,
            ymin: 20.2,
            xmax: 30.4,
            ymax: 40.9,
        });
        assert_eq!((r.x, r.y), (10, 20));
        assert!(r.x as f64 <= 10.6 && (r.x + r.width) as f64 >= 30.4);
        assert!(r.y as f64 <= 20.2 && (r.y + r.height) as f64 >= 40.9);
    }

    #[test]
    fn test_clamp_against_one_pixel_image() {
        let r = BoundingBox {
            xmin: -3.0,
            ymin: 7.0,
            xmax: 9.0,
            ymax: -2.0,
        }
        .clamp(1, 1);
        assert_eq!(
            r,
            CropRegion {
                x: 0,
                y: 0,
                width: 1,
                height: 1
            }
        );
    }
}
