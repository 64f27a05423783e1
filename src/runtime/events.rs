//! Change notifications published by the editor task.

use crate::types::RowId;

/// Document and selection changes broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    /// A whole script replaced the document.
    Loaded {
        /// Number of rows after the load.
        rows: usize,
    },
    /// A new row was inserted.
    RowInserted {
        /// Inserted row id.
        id: RowId,
        /// Display index the row landed at.
        index: usize,
    },
    /// An existing row changed fields.
    RowUpdated {
        /// Updated row id.
        id: RowId,
    },
    /// Rows left the document.
    RowsRemoved {
        /// Removed row ids.
        ids: Vec<RowId>,
    },
    /// A row swapped places with a neighbor.
    RowMoved {
        /// Previous display index.
        from: usize,
        /// New display index.
        to: usize,
    },
    /// The selected row changed.
    SelectionChanged {
        /// Newly selected row, if any.
        selected: Option<RowId>,
    },
    /// The most recent command was reverted.
    UndoApplied,
    /// A previously undone command was reapplied.
    RedoApplied,
    /// The editor asked the video player to jump.
    SeekRequested {
        /// Target position in milliseconds.
        position_ms: u64,
    },
}
