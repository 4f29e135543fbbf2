//! Crop batch orchestration.
//!
//! A batch captures the session generation when it starts and runs the
//! raster work on the blocking pool. Results commit only while the token is
//! uncancelled and the generation still matches, so a batch for generation
//! N never writes after a batch for N+1 has started.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::paper::{CropStatus, crop_item_set};
use crate::service::PaperflowService;

impl PaperflowService {
    /// Start a crop batch for the session's current image and item set,
    /// cancelling any batch already in flight for it.
    pub(crate) fn spawn_crop_batch(self: &Arc<Self>, session_id: &str) {
        let (generation, raster, items) = {
            let Some(mut session) = self.sessions.get_mut(session_id) else {
                return;
            };
            let Some(source) = session.source.as_ref() else {
                session.crop_status = CropStatus::Idle;
                return;
            };
            if !session.items.iter().any(|item| item.figure_box().is_some()) {
                // Nothing to crop; the (empty) cache already matches.
                session.crop_status = CropStatus::Ready;
                return;
            }
            let raster = source.raster();
            session.crop_status = CropStatus::Running;
            (session.generation, raster, session.items.clone())
        };

        let token = self.register_crop_token(session_id);
        let service = self.clone();
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            let crops =
                match tokio::task::spawn_blocking(move || crop_item_set(&raster, &items)).await {
                    Ok(crops) => Some(crops),
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Crop batch aborted");
                        None
                    }
                };

            // Checked after the blocking work: a replacement image arriving
            // mid-batch means these results must never be merged.
            if token.is_cancelled() {
                debug!(session_id = %session_id, "Crop batch cancelled, results dropped");
                return;
            }

            service.finish_crop_batch(&session_id, generation, crops);
        });
    }

    /// Commit (or discard) a finished batch. `None` marks a failed batch.
    fn finish_crop_batch(
        &self,
        session_id: &str,
        generation: u64,
        crops: Option<HashMap<i64, String>>,
    ) {
        let Some(mut session) = self.sessions.get_mut(session_id) else {
            return;
        };

        if session.generation != generation {
            debug!(
                session_id = %session_id,
                batch_generation = generation,
                current_generation = session.generation,
                "Stale crop batch discarded"
            );
            return;
        }

        match crops {
            Some(crops) => {
                info!(session_id = %session_id, count = crops.len(), "Crop batch committed");
                session.crops = crops;
                session.crop_status = CropStatus::Ready;
            }
            None => {
                session.crops.clear();
                session.crop_status = CropStatus::Failed;
            }
        }
        self.unregister_crop_token(session_id);
    }

    /// Register a token for a new batch, cancelling any prior batch.
    fn register_crop_token(&self, session_id: &str) -> CancellationToken {
        if let Some((_, old)) = self.crop_tokens.remove(session_id) {
            old.cancel();
        }
        let token = CancellationToken::new();
        self.crop_tokens.insert(session_id.to_string(), token.clone());
        token
    }

    /// Cancel the in-flight batch for a session, if any.
    pub(crate) fn cancel_crop_batch(&self, session_id: &str) -> bool {
        if let Some((_, token)) = self.crop_tokens.remove(session_id) {
            token.cancel();
            debug!(session_id = %session_id, "Crop batch cancellation triggered");
            true
        } else {
            false
        }
    }

    fn unregister_crop_token(&self, session_id: &str) {
        self.crop_tokens.remove(session_id);
    }
}
