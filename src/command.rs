//! Reversible command model for the undo/redo log.

use crate::{
    row::{Row, RowPatch},
    types::RowId,
};

/// A single reversible document mutation.
///
/// Commands carry every piece of state their revert needs; applying one through
/// the store yields its exact inverse, so undo and redo are just applications
/// of previously returned commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a fully materialized row at a display index.
    Insert {
        /// Position in display order, `0..=len`.
        index: usize,
        /// Inserted row, id already assigned.
        row: Row,
    },
    /// Remove rows by id, capturing them for the inverse.
    Remove {
        /// Ids to remove, in ascending display order.
        ids: Vec<RowId>,
    },
    /// Reinsert previously captured rows at their original indices.
    Restore {
        /// `(display index, row)` pairs in ascending index order.
        rows: Vec<(usize, Row)>,
    },
    /// Move a row between two adjacent display indices.
    Move {
        /// Current index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// Patch the fields of one row.
    Edit {
        /// Row id to mutate.
        id: RowId,
        /// Sparse forward patch; the inverse is captured at apply time.
        patch: RowPatch,
    },
    /// Apply several commands as one history entry.
    ///
    /// The inverse is the reversed list of sub-inverses; a batch never pushes
    /// its parts onto the outer undo/redo stacks.
    Batch {
        /// Sub-commands in application order.
        commands: Vec<Command>,
    },
}

impl Command {
    /// Short label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::Remove { .. } => "remove",
            Command::Restore { .. } => "restore",
            Command::Move { .. } => "move",
            Command::Edit { .. } => "edit",
            Command::Batch { .. } => "batch",
        }
    }
}
