use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    command::Command,
    core::indices::VecIndex,
    fields::delegate_for,
    row::{DEFAULT_SCENE, Row, RowPatch},
    text::reflow_dialogue,
    timecode::{Timecode, TimecodeError},
    types::{Field, Revision, RowId},
};

/// Failures raised by store operations.
///
/// Every variant is checked before a command is recorded, so a returned error
/// means the document and the history are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row carries the given id.
    #[error("no row with id {0}")]
    MissingRow(RowId),
    /// A row with the given id is already present.
    #[error("row id {0} already exists")]
    AlreadyExists(RowId),
    /// A display index fell outside the document.
    #[error("index {index} is out of bounds for {len} rows")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Document length at the time of the call.
        len: usize,
    },
    /// A move between non-adjacent indices was requested.
    #[error("rows {from} and {to} are not adjacent")]
    NotAdjacent {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// A move would push the row past the document edge.
    #[error("row at index {0} is already at the document edge")]
    MoveAtEdge(usize),
    /// A batch operation was called with no rows selected.
    #[error("no rows selected")]
    EmptySelection,
    /// An edit would leave a row without a character name.
    #[error("character name cannot be empty")]
    EmptyCharacter,
    /// Editor input was not a readable timecode.
    #[error(transparent)]
    Timecode(#[from] TimecodeError),
    /// The split cursor was not strictly before the dialogue end.
    #[error("split position {cursor} is not before the end of the dialogue ({len} characters)")]
    SplitAtEnd {
        /// Requested cursor position, in characters.
        cursor: usize,
        /// Dialogue length, in characters.
        len: usize,
    },
    /// The selected row has no row below it.
    #[error("selected row has no row below it")]
    NoNextRow,
    /// Merge rejected because the rows belong to different characters.
    #[error("rows belong to different characters ({current} vs {next})")]
    CharacterMismatch {
        /// Character of the selected row.
        current: String,
        /// Character of the row below.
        next: String,
    },
    /// Merge rejected because both dialogues are blank.
    #[error("both dialogues are empty")]
    NothingToMerge,
    /// Find and replace rejected because the search text is empty.
    #[error("search text cannot be empty")]
    EmptySearch,
    /// Undo requested with an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Redo requested with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,
    /// An imported record carried an unreadable timecode.
    #[error("record {row}: {source}")]
    BadRecordTimecode {
        /// Zero-based record index in the imported sequence.
        row: usize,
        /// Underlying codec rejection.
        source: TimecodeError,
    },
}

/// Interchange record exchanged with import/export collaborators.
///
/// Ids are internal and never cross this boundary; `scene` may be absent and
/// defaults to [`DEFAULT_SCENE`] on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Optional scene label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    /// IN timestamp as `HH:MM:SS:FF` text.
    #[serde(rename = "in")]
    pub in_time: String,
    /// OUT timestamp as `HH:MM:SS:FF` text.
    #[serde(rename = "out")]
    pub out_time: String,
    /// Character name.
    pub character: String,
    /// Dialogue text.
    pub dialogue: String,
}

/// Fields searched by [`ScriptStore::find_and_replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceScope {
    /// Replace inside character names.
    pub character: bool,
    /// Replace inside dialogue text.
    pub dialogue: bool,
}

impl Default for ReplaceScope {
    fn default() -> Self {
        Self {
            character: true,
            dialogue: true,
        }
    }
}

/// Authoritative in-memory script document with a linear undo/redo log.
#[derive(Debug, Default)]
pub struct ScriptStore {
    records: HashMap<RowId, Row>,
    order: Vec<RowId>,
    pos: HashMap<RowId, usize>,
    by_character: VecIndex<String>,
    undo: Vec<Command>,
    redo: Vec<Command>,
    next_row_id: RowId,
    revision: Revision,
}

impl ScriptStore {
    /// Creates an empty document; ids start at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from interchange records, assigning fresh sequential
    /// ids from 0.
    ///
    /// The first unreadable timecode fails the whole load; no partial document
    /// is produced. History starts empty.
    pub fn from_records(records: Vec<RawRecord>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for (row_index, raw) in records.into_iter().enumerate() {
            let in_time = raw
                .in_time
                .parse()
                .map_err(|source| StoreError::BadRecordTimecode { row: row_index, source })?;
            let out_time = raw
                .out_time
                .parse()
                .map_err(|source| StoreError::BadRecordTimecode { row: row_index, source })?;
            let id = store.take_next_row_id();
            let row = Row {
                id,
                scene: raw.scene.unwrap_or_else(|| DEFAULT_SCENE.to_string()),
                in_time,
                out_time,
                character: raw.character,
                dialogue: raw.dialogue,
            };
            let end = store.order.len();
            store.insert_row_at(end, row)?;
        }
        tracing::debug!(rows = store.order.len(), "document imported");
        Ok(store)
    }

    /// Exports the document in display order, omitting internal ids.
    pub fn export_records(&self) -> Vec<RawRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|row| RawRecord {
                scene: Some(row.scene.clone()),
                in_time: row.in_time.to_string(),
                out_time: row.out_time.to_string(),
                character: row.character.clone(),
                dialogue: row.dialogue.clone(),
            })
            .collect()
    }

    /// Applies a sparse patch to one row as a single reversible command.
    ///
    /// An empty patch records nothing; a patch that would blank the character
    /// name is rejected at this boundary.
    pub fn edit_row(&mut self, id: RowId, patch: RowPatch) -> Result<(), StoreError> {
        if !self.records.contains_key(&id) {
            return Err(StoreError::MissingRow(id));
        }
        if patch.is_empty() {
            return Ok(());
        }
        if let Some(character) = &patch.character {
            if character.trim().is_empty() {
                return Err(StoreError::EmptyCharacter);
            }
        }
        self.push(Command::Edit { id, patch })
    }

    /// Writes editor text into one field, validating through its delegate.
    pub fn edit_text(&mut self, id: RowId, field: Field, input: &str) -> Result<(), StoreError> {
        let patch = delegate_for(field).write_value(input)?;
        self.edit_row(id, patch)
    }

    /// Inserts a default row at `index` and returns its fresh id.
    pub fn add_row(&mut self, index: usize) -> Result<RowId, StoreError> {
        if index > self.order.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            });
        }
        let id = self.take_next_row_id();
        let row = Row::with_defaults(id);
        self.push(Command::Insert { index, row })?;
        Ok(id)
    }

    /// Removes the rows at the given display indices as one command.
    ///
    /// Returns the removed rows in ascending index order.
    pub fn remove_rows(&mut self, indices: &[usize]) -> Result<Vec<Row>, StoreError> {
        if indices.is_empty() {
            return Err(StoreError::EmptySelection);
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut ids = Vec::with_capacity(sorted.len());
        let mut removed = Vec::with_capacity(sorted.len());
        for index in sorted {
            let id = self
                .order
                .get(index)
                .copied()
                .ok_or(StoreError::IndexOutOfBounds {
                    index,
                    len: self.order.len(),
                })?;
            let row = self
                .records
                .get(&id)
                .cloned()
                .ok_or(StoreError::MissingRow(id))?;
            ids.push(id);
            removed.push(row);
        }
        self.push(Command::Remove { ids })?;
        Ok(removed)
    }

    /// Moves a row between two adjacent display indices.
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let len = self.order.len();
        if from >= len {
            return Err(StoreError::IndexOutOfBounds { index: from, len });
        }
        if to >= len {
            return Err(StoreError::IndexOutOfBounds { index: to, len });
        }
        if from.abs_diff(to) != 1 {
            return Err(StoreError::NotAdjacent { from, to });
        }
        self.push(Command::Move { from, to })
    }

    /// Swaps the row at `index` with the row above it.
    pub fn move_row_up(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.order.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            });
        }
        let to = index.checked_sub(1).ok_or(StoreError::MoveAtEdge(index))?;
        self.move_row(index, to)
    }

    /// Swaps the row at `index` with the row below it.
    pub fn move_row_down(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.order.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            });
        }
        if index + 1 >= self.order.len() {
            return Err(StoreError::MoveAtEdge(index));
        }
        self.move_row(index, index + 1)
    }

    /// Splits a row's dialogue at a character cursor position.
    ///
    /// The source row keeps the text before the cursor; a new row inheriting
    /// scene and character, with default timestamps, takes the rest and lands
    /// immediately below. Returns the new row's id.
    pub fn split_intervention(&mut self, id: RowId, cursor: usize) -> Result<RowId, StoreError> {
        let index = self.index_of(id).ok_or(StoreError::MissingRow(id))?;
        let source = self
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::MissingRow(id))?;
        let len = source.dialogue.chars().count();
        if cursor >= len {
            return Err(StoreError::SplitAtEnd { cursor, len });
        }
        let byte = source
            .dialogue
            .char_indices()
            .nth(cursor)
            .map(|(b, _)| b)
            .unwrap_or(source.dialogue.len());

        let new_id = self.take_next_row_id();
        let new_row = Row {
            id: new_id,
            scene: source.scene.clone(),
            in_time: Timecode::ZERO,
            out_time: Timecode::ZERO,
            character: source.character.clone(),
            dialogue: source.dialogue[byte..].to_string(),
        };
        self.push(Command::Batch {
            commands: vec![
                Command::Edit {
                    id,
                    patch: RowPatch::dialogue(&source.dialogue[..byte]),
                },
                Command::Insert {
                    index: index + 1,
                    row: new_row,
                },
            ],
        })?;
        Ok(new_id)
    }

    /// Merges a row with the row below it.
    ///
    /// Both rows must belong to the same character and at least one dialogue
    /// must be non-blank; the merged text is `"{current} {next}"` trimmed.
    pub fn merge_interventions(&mut self, id: RowId) -> Result<(), StoreError> {
        let index = self.index_of(id).ok_or(StoreError::MissingRow(id))?;
        let next_id = self
            .order
            .get(index + 1)
            .copied()
            .ok_or(StoreError::NoNextRow)?;
        let current = self.records.get(&id).ok_or(StoreError::MissingRow(id))?;
        let next = self
            .records
            .get(&next_id)
            .ok_or(StoreError::MissingRow(next_id))?;
        if current.character != next.character {
            return Err(StoreError::CharacterMismatch {
                current: current.character.clone(),
                next: next.character.clone(),
            });
        }
        let current_text = current.dialogue.trim();
        let next_text = next.dialogue.trim();
        if current_text.is_empty() && next_text.is_empty() {
            return Err(StoreError::NothingToMerge);
        }
        let merged = format!("{current_text} {next_text}").trim().to_string();
        self.push(Command::Batch {
            commands: vec![
                Command::Edit {
                    id,
                    patch: RowPatch::dialogue(merged),
                },
                Command::Remove { ids: vec![next_id] },
            ],
        })
    }

    /// Replaces every occurrence of `search` across the scoped fields.
    ///
    /// Matching is case-sensitive. Each touched row contributes one edit to a
    /// single batch command; zero matches record nothing. Returns the number
    /// of rows touched.
    pub fn find_and_replace(
        &mut self,
        search: &str,
        replace: &str,
        scope: ReplaceScope,
    ) -> Result<usize, StoreError> {
        if search.is_empty() {
            return Err(StoreError::EmptySearch);
        }
        let mut commands = Vec::new();
        for id in &self.order {
            let Some(row) = self.records.get(id) else {
                continue;
            };
            let mut patch = RowPatch::default();
            if scope.character && row.character.contains(search) {
                let replaced = row.character.replace(search, replace);
                if replaced.trim().is_empty() {
                    return Err(StoreError::EmptyCharacter);
                }
                patch.character = Some(replaced);
            }
            if scope.dialogue && row.dialogue.contains(search) {
                patch.dialogue = Some(row.dialogue.replace(search, replace));
            }
            if !patch.is_empty() {
                commands.push(Command::Edit { id: *id, patch });
            }
        }
        if commands.is_empty() {
            return Ok(0);
        }
        let touched = commands.len();
        self.push(Command::Batch { commands })?;
        Ok(touched)
    }

    /// Renames a character across the whole document as one command.
    ///
    /// Returns the number of rows touched.
    pub fn rename_character(&mut self, old: &str, new: &str) -> Result<usize, StoreError> {
        if new.trim().is_empty() {
            return Err(StoreError::EmptyCharacter);
        }
        if old == new {
            return Ok(0);
        }
        let mut ids: Vec<RowId> = self.by_character.get(old).cloned().unwrap_or_default();
        ids.sort_by_key(|id| self.pos.get(id).copied().unwrap_or(usize::MAX));
        if ids.is_empty() {
            return Ok(0);
        }
        let commands: Vec<Command> = ids
            .iter()
            .map(|id| Command::Edit {
                id: *id,
                patch: RowPatch {
                    character: Some(new.to_string()),
                    ..RowPatch::default()
                },
            })
            .collect();
        let touched = commands.len();
        self.push(Command::Batch { commands })?;
        Ok(touched)
    }

    /// Copies a row's IN and OUT timestamps into the row below it.
    pub fn copy_in_out_to_next(&mut self, id: RowId) -> Result<(), StoreError> {
        let index = self.index_of(id).ok_or(StoreError::MissingRow(id))?;
        let next_id = self
            .order
            .get(index + 1)
            .copied()
            .ok_or(StoreError::NoNextRow)?;
        let source = self.records.get(&id).ok_or(StoreError::MissingRow(id))?;
        let patch = RowPatch {
            in_time: Some(source.in_time),
            out_time: Some(source.out_time),
            ..RowPatch::default()
        };
        self.push(Command::Edit { id: next_id, patch })
    }

    /// Rewraps every dialogue at the standard line width as one command.
    ///
    /// Returns the number of rows whose text changed.
    pub fn adjust_dialogues(&mut self) -> Result<usize, StoreError> {
        let mut commands = Vec::new();
        for id in &self.order {
            let Some(row) = self.records.get(id) else {
                continue;
            };
            let wrapped = reflow_dialogue(&row.dialogue);
            if wrapped != row.dialogue {
                commands.push(Command::Edit {
                    id: *id,
                    patch: RowPatch::dialogue(wrapped),
                });
            }
        }
        if commands.is_empty() {
            return Ok(0);
        }
        let touched = commands.len();
        self.push(Command::Batch { commands })?;
        Ok(touched)
    }

    /// Reverts the most recent command.
    pub fn undo(&mut self) -> Result<(), StoreError> {
        let command = self.undo.pop().ok_or(StoreError::NothingToUndo)?;
        let inverse = self.apply(command)?;
        self.redo.push(inverse);
        self.revision += 1;
        tracing::debug!(
            undo_depth = self.undo.len(),
            redo_depth = self.redo.len(),
            "undo applied"
        );
        Ok(())
    }

    /// Reapplies the most recently undone command.
    pub fn redo(&mut self) -> Result<(), StoreError> {
        let command = self.redo.pop().ok_or(StoreError::NothingToRedo)?;
        let inverse = self.apply(command)?;
        self.undo.push(inverse);
        self.revision += 1;
        tracing::debug!(
            undo_depth = self.undo.len(),
            redo_depth = self.redo.len(),
            "redo applied"
        );
        Ok(())
    }

    /// Borrowing lookup by id.
    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.records.get(&id)
    }

    /// Cloning lookup by id.
    pub fn get_cloned(&self, id: RowId) -> Option<Row> {
        self.get(id).cloned()
    }

    /// Borrowing lookup by display index.
    pub fn row_at(&self, index: usize) -> Option<&Row> {
        self.order.get(index).and_then(|id| self.records.get(id))
    }

    /// All rows in display order.
    pub fn rows(&self) -> Vec<&Row> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Cloned rows in display order.
    pub fn rows_cloned(&self) -> Vec<Row> {
        self.rows().into_iter().cloned().collect()
    }

    /// Number of rows in the document.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the document has no rows.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row ids in display order.
    pub fn ordered_ids(&self) -> &[RowId] {
        &self.order
    }

    /// Display index of a row id.
    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.pos.get(&id).copied()
    }

    /// Rows spoken by `name`, in display order.
    pub fn by_character(&self, name: &str) -> Vec<&Row> {
        let mut ids: Vec<RowId> = self.by_character.get(name).cloned().unwrap_or_default();
        ids.sort_by_key(|id| self.pos.get(id).copied().unwrap_or(usize::MAX));
        ids.iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Cloned rows spoken by `name`, in display order.
    pub fn by_character_cloned(&self, name: &str) -> Vec<Row> {
        self.by_character(name).into_iter().cloned().collect()
    }

    /// Intervention counts per character, most frequent first.
    pub fn character_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for id in &self.order {
            if let Some(row) = self.records.get(id) {
                *counts.entry(row.character.clone()).or_default() += 1;
            }
        }
        let mut out: Vec<(String, usize)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Ids of rows whose character or dialogue contains `needle`, ignoring
    /// case, in display order.
    pub fn search(&self, needle: &str) -> Vec<RowId> {
        if needle.is_empty() {
            return Vec::new();
        }
        let needle = needle.to_lowercase();
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.records.get(id).is_some_and(|row| {
                    row.character.to_lowercase().contains(&needle)
                        || row.dialogue.to_lowercase().contains(&needle)
                })
            })
            .collect()
    }

    /// True when at least one command can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// True when at least one command can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo stack depth.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Redo stack depth.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Monotonic revision, bumped once per applied command, undo, or redo.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    fn push(&mut self, command: Command) -> Result<(), StoreError> {
        let kind = command.kind();
        let inverse = self.apply(command)?;
        self.undo.push(inverse);
        self.redo.clear();
        self.revision += 1;
        tracing::debug!(
            kind,
            undo_depth = self.undo.len(),
            revision = self.revision,
            "command applied"
        );
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<Command, StoreError> {
        match command {
            Command::Insert { index, row } => {
                let id = row.id;
                self.insert_row_at(index, row)?;
                Ok(Command::Remove { ids: vec![id] })
            }
            Command::Remove { ids } => self.apply_remove(ids),
            Command::Restore { rows } => self.apply_restore(rows),
            Command::Move { from, to } => self.apply_move(from, to),
            Command::Edit { id, patch } => self.apply_edit(id, patch),
            Command::Batch { commands } => self.apply_batch(commands),
        }
    }

    fn apply_remove(&mut self, ids: Vec<RowId>) -> Result<Command, StoreError> {
        let mut captured = Vec::with_capacity(ids.len());
        for id in &ids {
            let index = *self.pos.get(id).ok_or(StoreError::MissingRow(*id))?;
            captured.push(index);
        }
        captured.sort_unstable();

        // Remove in descending index order so earlier indices stay valid;
        // the inverse reinserts in ascending order.
        let mut rows = Vec::with_capacity(captured.len());
        for index in captured.iter().rev() {
            let row = self.remove_row_at(*index)?;
            rows.push((*index, row));
        }
        rows.reverse();
        Ok(Command::Restore { rows })
    }

    fn apply_restore(&mut self, rows: Vec<(usize, Row)>) -> Result<Command, StoreError> {
        let mut ids = Vec::with_capacity(rows.len());
        for (index, row) in rows {
            ids.push(row.id);
            self.insert_row_at(index, row)?;
        }
        Ok(Command::Remove { ids })
    }

    fn apply_move(&mut self, from: usize, to: usize) -> Result<Command, StoreError> {
        let len = self.order.len();
        if from >= len {
            return Err(StoreError::IndexOutOfBounds { index: from, len });
        }
        if to >= len {
            return Err(StoreError::IndexOutOfBounds { index: to, len });
        }
        if from.abs_diff(to) != 1 {
            return Err(StoreError::NotAdjacent { from, to });
        }
        self.order.swap(from, to);
        let a = self.order[from];
        let b = self.order[to];
        self.pos.insert(a, from);
        self.pos.insert(b, to);
        Ok(Command::Move { from: to, to: from })
    }

    fn apply_edit(&mut self, id: RowId, patch: RowPatch) -> Result<Command, StoreError> {
        let row = self.records.get_mut(&id).ok_or(StoreError::MissingRow(id))?;
        let old_character = row.character.clone();

        let prev = patch.capture_inverse_for(row);
        patch.apply_to(row);

        if row.character != old_character {
            let new_character = row.character.clone();
            Self::remove_from_vec_index(self.by_character.entry(old_character).or_default(), id);
            self.by_character.entry(new_character).or_default().push(id);
        }

        Ok(Command::Edit { id, patch: prev })
    }

    fn apply_batch(&mut self, commands: Vec<Command>) -> Result<Command, StoreError> {
        let mut inverses = Vec::with_capacity(commands.len());
        for command in commands {
            match self.apply(command) {
                Ok(inverse) => inverses.push(inverse),
                Err(err) => {
                    // Unwind the applied prefix; a failed batch must leave no trace.
                    while let Some(inverse) = inverses.pop() {
                        if let Err(rollback_err) = self.apply(inverse) {
                            tracing::warn!(error = %rollback_err, "batch rollback step failed");
                        }
                    }
                    return Err(err);
                }
            }
        }
        inverses.reverse();
        Ok(Command::Batch { commands: inverses })
    }

    fn insert_row_at(&mut self, index: usize, row: Row) -> Result<(), StoreError> {
        if index > self.order.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            });
        }
        if self.records.contains_key(&row.id) {
            return Err(StoreError::AlreadyExists(row.id));
        }

        let id = row.id;
        self.next_row_id = self.next_row_id.max(id.saturating_add(1));
        self.by_character
            .entry(row.character.clone())
            .or_default()
            .push(id);
        self.order.insert(index, id);
        self.records.insert(id, row);
        self.reindex_from(index);
        Ok(())
    }

    fn remove_row_at(&mut self, index: usize) -> Result<Row, StoreError> {
        if index >= self.order.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.order.len(),
            });
        }
        let id = self.order.remove(index);
        self.pos.remove(&id);
        let row = self.records.remove(&id).ok_or(StoreError::MissingRow(id))?;
        Self::remove_from_vec_index(
            self.by_character.entry(row.character.clone()).or_default(),
            id,
        );
        self.reindex_from(index);
        Ok(row)
    }

    fn reindex_from(&mut self, start: usize) {
        for offset in start..self.order.len() {
            self.pos.insert(self.order[offset], offset);
        }
    }

    fn remove_from_vec_index(v: &mut Vec<RowId>, id: RowId) {
        if let Some(pos) = v.iter().position(|x| *x == id) {
            v.remove(pos);
        }
    }

    fn take_next_row_id(&mut self) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(character: &str, dialogue: &str) -> RawRecord {
        RawRecord {
            scene: None,
            in_time: "00:00:01:00".to_string(),
            out_time: "00:00:02:00".to_string(),
            character: character.to_string(),
            dialogue: dialogue.to_string(),
        }
    }

    // Every public operation validates before it pushes, so a mid-batch
    // failure can only be staged through the private seam.
    #[test]
    fn failed_batch_rolls_back_the_applied_prefix() {
        let mut store =
            ScriptStore::from_records(vec![record("ANA", "Hola."), record("JUAN", "Buenas.")])
                .unwrap();
        let before = store.rows_cloned();
        let revision = store.revision();

        let err = store
            .push(Command::Batch {
                commands: vec![
                    Command::Edit {
                        id: 0,
                        patch: RowPatch::dialogue("Cambiado."),
                    },
                    Command::Remove { ids: vec![99] },
                ],
            })
            .unwrap_err();

        assert_eq!(err, StoreError::MissingRow(99));
        assert_eq!(store.rows_cloned(), before);
        assert_eq!(store.revision(), revision);
        assert!(!store.can_undo());
        assert_eq!(store.by_character("ANA").len(), 1);
    }
}
