//! Worksheet pipeline: extracted items, figure cropping, print layout.
//!
//! This module owns the computational core of the service: clamping
//! untrusted bounding boxes, rendering figure crops from the source image,
//! and slicing the item list into printable pages with drag reordering.

mod crop;
mod item;
mod layout;
mod session;
mod source;

pub use crop::{crop_data_uri, crop_item_set};
pub use item::{BoundingBox, CropRegion, ExtractedItem};
pub use layout::{DragState, Page, clamp_page_size, move_item, paginate};
pub use session::{CropStatus, PaperSession};
pub use source::SourceImage;
