//! Per-upload session state.
//!
//! A session owns one source image, the extracted item list, and the crop
//! cache derived from both. All derived views index items by id, never by
//! position, so they stay correct under reordering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::item::ExtractedItem;
use super::layout::DragState;
use super::source::SourceImage;

/// Crop batch state for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
    /// No batch needed or none started yet.
    Idle,
    /// A batch is in flight.
    Running,
    /// The cache matches the current image/item generation.
    Ready,
    /// The last batch failed; the cache is empty.
    Failed,
}

/// One worksheet upload session.
pub struct PaperSession {
    pub id: String,
    pub source: Option<SourceImage>,
    pub items: Vec<ExtractedItem>,
    pub crops: HashMap<i64, String>,
    pub crop_status: CropStatus,
    /// Bumped whenever the source image or item set changes. Crop batches
    /// capture it at start and may only commit while it still matches.
    pub generation: u64,
    pub drag: DragState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaperSession {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            source: None,
            items: Vec::new(),
            crops: HashMap::new(),
            crop_status: CropStatus::Idle,
            generation: 0,
            drag: DragState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Install a new source image, dropping the previous one (which releases
    /// its spool file) and invalidating everything derived from it.
    pub fn replace_source(&mut self, source: SourceImage) {
        self.source = Some(source);
        self.reset_derived();
    }

    /// Clear the source image; the preview reference becomes empty and all
    /// derived state is invalidated.
    pub fn clear_source(&mut self) {
        self.source = None;
        self.reset_derived();
    }

    /// Replace the item set (a fresh extraction result). Invalidates the
    /// crop cache; identities are new, so stale crops must not survive.
    pub fn replace_items(&mut self, items: Vec<ExtractedItem>) {
        self.items = items;
        self.crops.clear();
        self.crop_status = CropStatus::Idle;
        self.drag = DragState::Idle;
        self.bump();
    }

    /// Apply a new ordering produced by `move_item`. Identity and content
    /// are untouched, so the crop cache stays valid.
    pub fn apply_ordering(&mut self, items: Vec<ExtractedItem>) {
        debug_assert_eq!(items.len(), self.items.len());
        self.items = items;
        self.updated_at = Utc::now();
    }

    fn reset_derived(&mut self) {
        self.items.clear();
        self.crops.clear();
        self.crop_status = CropStatus::Idle;
        self.drag = DragState::Idle;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.updated_at = Utc::now();
    }

    /// Stable preview reference for the current source image, one-to-one
    /// with the spooled file; `None` when no image is set.
    pub fn preview_ref(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|_| format!("/api/paper/{}/preview?rev={}", self.id, self.generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64) -> ExtractedItem {
        ExtractedItem {
            id,
            text: format!("question {}", id),
            has_image: false,
            image_box: None,
        }
    }

    #[test]
    fn test_new_session_has_no_preview() {
        let session = PaperSession::new("s1".to_string());
        assert!(session.preview_ref().is_none());
        assert_eq!(session.crop_status, CropStatus::Idle);
    }

    #[test]
    fn test_replace_items_invalidates_crops_and_bumps_generation() {
        let mut session = PaperSession::new("s1".to_string());
        session.crops.insert(1, "data:image/png;base64,AA==".into());
        session.crop_status = CropStatus::Ready;

        let before = session.generation;
        session.replace_items(vec![item(1), item(2)]);

        assert!(session.crops.is_empty());
        assert_eq!(session.crop_status, CropStatus::Idle);
        assert_eq!(session.generation, before + 1);
        assert_eq!(session.items.len(), 2);
    }

    #[test]
    fn test_clear_source_resets_everything_derived() {
        let mut session = PaperSession::new("s1".to_string());
        session.replace_items(vec![item(1)]);
        session.crops.insert(1, "data:image/png;base64,AA==".into());
        session.drag.start(1);

        let before = session.generation;
        session.clear_source();

        assert!(session.items.is_empty());
        assert!(session.crops.is_empty());
        assert_eq!(session.drag, DragState::Idle);
        assert!(session.preview_ref().is_none());
        assert_eq!(session.generation, before + 1);
    }

    #[test]
    fn test_apply_ordering_keeps_generation_and_crops() {
        let mut session = PaperSession::new("s1".to_string());
        session.replace_items(vec![item(1), item(2)]);
        session.crops.insert(1, "data:image/png;base64,AA==".into());

        let generation = session.generation;
        session.apply_ordering(vec![item(2), item(1)]);

        assert_eq!(session.generation, generation);
        assert!(session.crops.contains_key(&1));
        assert_eq!(session.items[0].id, 2);
    }
}
