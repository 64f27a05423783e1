//! Video synchronization: selection, trim offset, and mark IN/OUT handling.

use thiserror::Error;

use crate::{
    core::store::{ScriptStore, StoreError},
    row::RowPatch,
    timecode::Timecode,
    types::RowId,
};

/// Failures raised by the synchronization layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A mark or seek was requested with no row selected.
    #[error("no row selected")]
    NoRowSelected,
    /// The underlying store rejected the edit.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkApplied {
    /// Row that received the mark.
    pub id: RowId,
    /// Timecode written, after trim.
    pub timecode: Timecode,
    /// Row auto-selected by the OUT-to-IN chain, when one exists.
    pub advanced_to: Option<RowId>,
}

#[derive(Debug, Clone, Copy)]
struct HoldState {
    last_ms: u64,
}

/// Selection and mark state driving video-synchronized edits.
///
/// Every incoming video position is trimmed by the configured offset, clamped
/// at zero, before it is encoded. Marks land on the selected row; marking OUT
/// chains the same position into the next row's IN and advances the selection.
#[derive(Debug, Default)]
pub struct Synchronizer {
    trim_ms: u64,
    selected: Option<RowId>,
    hold: Option<HoldState>,
}

impl Synchronizer {
    /// Creates a synchronizer with the given trim offset in milliseconds.
    pub fn new(trim_ms: u64) -> Self {
        Self {
            trim_ms,
            ..Self::default()
        }
    }

    /// Current trim offset in milliseconds.
    pub fn trim_ms(&self) -> u64 {
        self.trim_ms
    }

    /// Replaces the trim offset.
    pub fn set_trim(&mut self, ms: u64) {
        self.trim_ms = ms;
    }

    /// Replaces the selection; `None` clears it.
    pub fn select(&mut self, id: Option<RowId>) {
        self.selected = id;
    }

    /// Currently selected row id, if any.
    pub fn selected(&self) -> Option<RowId> {
        self.selected
    }

    /// Display index of the selected row, if it still exists.
    pub fn selected_index(&self, store: &ScriptStore) -> Option<usize> {
        self.selected.and_then(|id| store.index_of(id))
    }

    /// True while a held-key OUT tracking session is active.
    pub fn is_holding(&self) -> bool {
        self.hold.is_some()
    }

    /// Writes the trimmed position into the selected row's IN field.
    pub fn mark_in(
        &mut self,
        store: &mut ScriptStore,
        position_ms: u64,
    ) -> Result<MarkApplied, SyncError> {
        let id = self.require_selected(store)?;
        let tc = self.trimmed(position_ms);
        store.edit_row(id, RowPatch::in_time(tc))?;
        Ok(MarkApplied {
            id,
            timecode: tc,
            advanced_to: None,
        })
    }

    /// Writes the trimmed position into the selected row's OUT field, then
    /// selects the next row (if any) and writes the same position into its IN
    /// field.
    pub fn mark_out(
        &mut self,
        store: &mut ScriptStore,
        position_ms: u64,
    ) -> Result<MarkApplied, SyncError> {
        let id = self.require_selected(store)?;
        let tc = self.trimmed(position_ms);
        store.edit_row(id, RowPatch::out_time(tc))?;
        let advanced_to = self.advance_from(store, id, tc)?;
        Ok(MarkApplied {
            id,
            timecode: tc,
            advanced_to,
        })
    }

    /// Starts held-key OUT tracking, marking the current position immediately.
    pub fn hold_begin(
        &mut self,
        store: &mut ScriptStore,
        position_ms: u64,
    ) -> Result<MarkApplied, SyncError> {
        if self.hold.is_some() {
            tracing::warn!("hold_begin while a hold is active, re-marking");
        }
        let id = self.require_selected(store)?;
        let tc = self.trimmed(position_ms);
        store.edit_row(id, RowPatch::out_time(tc))?;
        self.hold = Some(HoldState { last_ms: position_ms });
        tracing::debug!(position_ms, "hold started");
        Ok(MarkApplied {
            id,
            timecode: tc,
            advanced_to: None,
        })
    }

    /// Re-marks OUT with the live position while a hold is active.
    ///
    /// A tick that would not change the stored value records nothing. A tick
    /// whose selection has vanished cancels the hold and surfaces the error.
    pub fn hold_tick(
        &mut self,
        store: &mut ScriptStore,
        position_ms: u64,
    ) -> Result<Option<MarkApplied>, SyncError> {
        if self.hold.is_none() {
            return Ok(None);
        }
        let id = match self.require_selected(store) {
            Ok(id) => id,
            Err(err) => {
                self.hold = None;
                return Err(err);
            }
        };
        let tc = self.trimmed(position_ms);
        if store.get(id).map(|row| row.out_time) == Some(tc) {
            self.hold = Some(HoldState { last_ms: position_ms });
            return Ok(None);
        }
        match store.edit_row(id, RowPatch::out_time(tc)) {
            Ok(()) => {
                self.hold = Some(HoldState { last_ms: position_ms });
                Ok(Some(MarkApplied {
                    id,
                    timecode: tc,
                    advanced_to: None,
                }))
            }
            Err(err) => {
                self.hold = None;
                Err(err.into())
            }
        }
    }

    /// Stops held-key tracking and performs the advance step exactly once,
    /// using the last marked position.
    ///
    /// Returns `Ok(None)` when no hold was active.
    pub fn hold_end(&mut self, store: &mut ScriptStore) -> Result<Option<MarkApplied>, SyncError> {
        let Some(hold) = self.hold.take() else {
            return Ok(None);
        };
        let id = self.require_selected(store)?;
        let tc = self.trimmed(hold.last_ms);
        let advanced_to = self.advance_from(store, id, tc)?;
        tracing::debug!(?advanced_to, "hold released");
        Ok(Some(MarkApplied {
            id,
            timecode: tc,
            advanced_to,
        }))
    }

    /// Millisecond position of a row's IN timestamp, for a read-only seek.
    pub fn seek_in(&self, store: &ScriptStore, id: RowId) -> Result<u64, SyncError> {
        let row = store
            .get(id)
            .ok_or(SyncError::Store(StoreError::MissingRow(id)))?;
        Ok(row.in_time.millis())
    }

    /// Millisecond position of a row's OUT timestamp, for a read-only seek.
    pub fn seek_out(&self, store: &ScriptStore, id: RowId) -> Result<u64, SyncError> {
        let row = store
            .get(id)
            .ok_or(SyncError::Store(StoreError::MissingRow(id)))?;
        Ok(row.out_time.millis())
    }

    fn trimmed(&self, position_ms: u64) -> Timecode {
        Timecode::from_millis(position_ms.saturating_sub(self.trim_ms))
    }

    fn require_selected(&mut self, store: &ScriptStore) -> Result<RowId, SyncError> {
        match self.selected {
            Some(id) if store.get(id).is_some() => Ok(id),
            Some(_) => {
                // Selected row vanished from the document.
                self.selected = None;
                Err(SyncError::NoRowSelected)
            }
            None => Err(SyncError::NoRowSelected),
        }
    }

    fn advance_from(
        &mut self,
        store: &mut ScriptStore,
        id: RowId,
        tc: Timecode,
    ) -> Result<Option<RowId>, SyncError> {
        let Some(index) = store.index_of(id) else {
            return Ok(None);
        };
        let Some(next) = store.row_at(index + 1).map(|row| row.id) else {
            return Ok(None);
        };
        self.selected = Some(next);
        store.edit_row(next, RowPatch::in_time(tc))?;
        tracing::debug!(from = id, to = next, "selection advanced");
        Ok(Some(next))
    }
}
