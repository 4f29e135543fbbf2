//! Figure cropping: clamped sub-regions of the source image rendered as
//! lossless PNG data URIs.

use std::collections::HashMap;
use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tracing::warn;

use super::item::{BoundingBox, ExtractedItem};

/// Crop one figure out of the source image.
///
/// The box is clamped first, so any input produces a valid region. Returns
/// `None` only when the PNG encoder fails; callers treat that as a soft
/// failure and render the item as pending instead of failing the batch.
pub fn crop_data_uri(image: &DynamicImage, bbox: &BoundingBox) -> Option<String> {
    let region = bbox.clamp(image.width(), image.height());
    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);

    let mut buf = Cursor::new(Vec::new());
    if let Err(e) = cropped.write_to(&mut buf, ImageFormat::Png) {
        warn!(
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            error = %e,
            "Failed to encode crop, leaving item pending"
        );
        return None;
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    Some(format!("data:image/png;base64,{}", encoded))
}

/// Compute the full crop set for an item list.
///
/// Only items with a figure box produce entries, so the resulting key set is
/// exactly the croppable subset of the current items. Items whose encode
/// fails are simply absent.
pub fn crop_item_set(image: &DynamicImage, items: &[ExtractedItem]) -> HashMap<i64, String> {
    let mut crops = HashMap::new();
    for item in items {
        if let Some(bbox) = item.figure_box()
            && let Some(data_uri) = crop_data_uri(image, bbox)
        {
            crops.insert(item.id, data_uri);
        }
    }
    crops
}
