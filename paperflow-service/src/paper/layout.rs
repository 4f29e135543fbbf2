//! Print layout: pagination into fixed-size pages and id-based reordering.

use serde::Serialize;

use crate::config::LayoutConfig;

use super::item::ExtractedItem;

/// One printable page: a contiguous slice of the current item ordering.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub items: Vec<ExtractedItem>,
}

/// Clamp a requested page size into the configured range, falling back to
/// the configured default when none was requested.
pub fn clamp_page_size(requested: Option<usize>, layout: &LayoutConfig) -> usize {
    requested
        .unwrap_or(layout.default_page_size)
        .clamp(layout.min_page_size, layout.max_page_size)
}

/// Slice `items` into consecutive pages of `page_size`.
///
/// The final page may be shorter; zero items yields zero pages. Pure: pages
/// are recomputed from the ordering, never mutated in place.
pub fn paginate(items: &[ExtractedItem], page_size: usize) -> Vec<Page> {
    items
        .chunks(page_size.max(1))
        .enumerate()
        .map(|(index, chunk)| Page {
            number: index + 1,
            items: chunk.to_vec(),
        })
        .collect()
}

/// Relocate the element identified by `from_id` to the position currently
/// occupied by `to_id`, preserving all other relative order.
///
/// A no-op returning the input ordering when either id is missing or the
/// ids are equal. Never duplicates or drops an element, and repeating the
/// same call leaves the result unchanged.
pub fn move_item(items: &[ExtractedItem], from_id: i64, to_id: i64) -> Vec<ExtractedItem> {
    let mut result = items.to_vec();
    if from_id == to_id {
        return result;
    }

    let Some(from_index) = result.iter().position(|item| item.id == from_id) else {
        return result;
    };
    let Some(to_index) = result.iter().position(|item| item.id == to_id) else {
        return result;
    };

    let moved = result.remove(from_index);
    // Removing an earlier element shifts the target one slot left.
    let to_index = if from_index < to_index {
        to_index - 1
    } else {
        to_index
    };
    result.insert(to_index, moved);
    result
}

/// Drag interaction state: idle -> dragging (records the dragged id) ->
/// idle on drop or drag-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: i64,
    },
}

impl DragState {
    /// Drag-start: record the dragged id, replacing any stale drag.
    pub fn start(&mut self, item_id: i64) {
        *self = DragState::Dragging { item_id };
    }

    /// Drop: yield the recorded id (if a drag was in progress) and return
    /// to idle.
    pub fn finish_drop(&mut self) -> Option<i64> {
        match std::mem::take(self) {
            DragState::Dragging { item_id } => Some(item_id),
            DragState::Idle => None,
        }
    }

    /// Drag-end without a drop: plain transition back to idle.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn dragging_id(&self) -> Option<i64> {
        match self {
            DragState::Dragging { item_id } => Some(*item_id),
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[i64]) -> Vec<ExtractedItem> {
        ids.iter()
            .map(|&id| ExtractedItem {
                id,
                text: format!("question {}", id),
                has_image: false,
                image_box: None,
            })
            .collect()
    }

    fn ids(items: &[ExtractedItem]) -> Vec<i64> {
        items.iter().map(|item| item.id).collect()
    }

    fn layout() -> LayoutConfig {
        LayoutConfig {
            min_page_size: 4,
            max_page_size: 12,
            default_page_size: 6,
        }
    }

    #[test]
    fn test_paginate_splits_into_chunks() {
        // Worked example: 10 items at page size 6 -> [6, 4]
        let list = items(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let pages = paginate(&list, 6);
        assert_eq!(pages.len(), 2);
        assert_eq!(ids(&pages[0].items), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(ids(&pages[1].items), vec![7, 8, 9, 10]);
        assert_eq!((pages[0].number, pages[1].number), (1, 2));
    }

    #[test]
    fn test_paginate_concatenation_reproduces_ordering() {
        for count in 0..20usize {
            let list = items(&(0..count as i64).collect::<Vec<_>>());
            for page_size in [4, 6, 12] {
                let pages = paginate(&list, page_size);
                assert_eq!(pages.len(), count.div_ceil(page_size));
                let rejoined: Vec<i64> = pages.iter().flat_map(|p| ids(&p.items)).collect();
                assert_eq!(rejoined, ids(&list));
            }
        }
    }

    #[test]
    fn test_paginate_empty_yields_no_pages() {
        assert!(paginate(&[], 6).is_empty());
    }

    #[test]
    fn test_clamp_page_size_range() {
        let layout = layout();
        assert_eq!(clamp_page_size(None, &layout), 6);
        assert_eq!(clamp_page_size(Some(1), &layout), 4);
        assert_eq!(clamp_page_size(Some(8), &layout), 8);
        assert_eq!(clamp_page_size(Some(100), &layout), 12);
    }

    #[test]
    fn test_move_item_to_front() {
        // Worked example: move 4 onto 1 -> [4, 1, 2, 3]
        let list = items(&[1, 2, 3, 4]);
        assert_eq!(ids(&move_item(&list, 4, 1)), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_move_item_forward() {
        let list = items(&[1, 2, 3, 4]);
        assert_eq!(ids(&move_item(&list, 1, 3)), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_move_item_preserves_id_multiset() {
        let list = items(&[5, 9, 2, 7, 1]);
        for from in [5, 9, 2, 7, 1] {
            for to in [5, 9, 2, 7, 1] {
                let mut moved = ids(&move_item(&list, from, to));
                moved.sort_unstable();
                assert_eq!(moved, vec![1, 2, 5, 7, 9]);
            }
        }
    }

    #[test]
    fn test_move_item_noops() {
        let list = items(&[1, 2, 3]);
        assert_eq!(ids(&move_item(&list, 2, 2)), vec![1, 2, 3]);
        assert_eq!(ids(&move_item(&list, 99, 2)), vec![1, 2, 3]);
        assert_eq!(ids(&move_item(&list, 2, 99)), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_item_idempotent() {
        let list = items(&[1, 2, 3, 4]);
        let once = move_item(&list, 1, 3);
        let twice = move_item(&once, 1, 3);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_drag_state_machine() {
        let mut drag = DragState::default();
        assert_eq!(drag.dragging_id(), None);
        assert_eq!(drag.finish_drop(), None);

        drag.start(7);
        assert_eq!(drag.dragging_id(), Some(7));

        // A second drag-start replaces the recorded id.
        drag.start(9);
        assert_eq!(drag.finish_drop(), Some(9));
        assert_eq!(drag, DragState::Idle);

        // Drag-end without a drop is a no-op transition back to idle.
        drag.start(3);
        drag.cancel();
        assert_eq!(drag, DragState::Idle);
        assert_eq!(drag.finish_drop(), None);
    }
}
