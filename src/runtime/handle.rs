use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    core::store::{RawRecord, ReplaceScope, ScriptStore, StoreError},
    row::{Row, RowPatch},
    sync::{MarkApplied, SyncError, Synchronizer},
    types::{Field, RowId},
};

use super::events::ScriptEvent;

/// Failures surfaced through [`EditorHandle`] calls.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The document rejected the command.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The mark protocol rejected the command.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// A video-dependent command arrived with no video source attached.
    #[error("no video source attached")]
    VideoUnavailable,
    /// The editor task is gone.
    #[error("editor runtime channel closed")]
    ChannelClosed,
}

/// Pull interface to the video collaborator.
///
/// The runtime polls it on every mark command and on each hold tick; it never
/// drives playback. Outgoing seek positions clamp to `duration_ms` when known.
pub trait VideoSource: Send {
    /// Current playback position in milliseconds.
    fn position_ms(&self) -> u64;
    /// Total media duration in milliseconds, when known.
    fn duration_ms(&self) -> Option<u64>;
}

/// Tuning knobs for the editor task.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Trim offset applied to every incoming video position.
    pub trim_ms: u64,
    /// Interval between hold-mode re-marks, in milliseconds.
    pub hold_tick_ms: u64,
    /// Bound of the command queue feeding the editor task.
    pub cmd_queue_bound: usize,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trim_ms: 0,
            hold_tick_ms: 40,
            cmd_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable front door to the editor task.
///
/// All methods are request/response over the command channel; [`subscribe`]
/// taps the broadcast event stream.
///
/// [`subscribe`]: EditorHandle::subscribe
pub struct EditorHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<ScriptEvent>,
}

impl Clone for EditorHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    LoadRecords {
        records: Vec<RawRecord>,
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    ExportRecords {
        resp: oneshot::Sender<Vec<RawRecord>>,
    },
    Rows {
        resp: oneshot::Sender<Vec<Row>>,
    },
    Get {
        id: RowId,
        resp: oneshot::Sender<Option<Row>>,
    },
    ByCharacter {
        character: String,
        resp: oneshot::Sender<Vec<Row>>,
    },
    Selection {
        resp: oneshot::Sender<Option<RowId>>,
    },
    Select {
        index: Option<usize>,
        resp: oneshot::Sender<Result<Option<RowId>, RuntimeError>>,
    },
    Edit {
        id: RowId,
        patch: RowPatch,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    EditText {
        id: RowId,
        field: Field,
        value: String,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    AddRow {
        resp: oneshot::Sender<Result<RowId, RuntimeError>>,
    },
    RemoveRows {
        indices: Vec<usize>,
        resp: oneshot::Sender<Result<Vec<Row>, RuntimeError>>,
    },
    MoveUp {
        index: usize,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    MoveDown {
        index: usize,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Split {
        id: RowId,
        cursor: usize,
        resp: oneshot::Sender<Result<RowId, RuntimeError>>,
    },
    Merge {
        id: RowId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    FindReplace {
        search: String,
        replace: String,
        scope: ReplaceScope,
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    RenameCharacter {
        old: String,
        new: String,
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    CopyInOutToNext {
        id: RowId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    AdjustDialogues {
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    Undo {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Redo {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    MarkIn {
        resp: oneshot::Sender<Result<MarkApplied, RuntimeError>>,
    },
    MarkOut {
        resp: oneshot::Sender<Result<MarkApplied, RuntimeError>>,
    },
    HoldBegin {
        resp: oneshot::Sender<Result<MarkApplied, RuntimeError>>,
    },
    HoldEnd {
        resp: oneshot::Sender<Result<Option<MarkApplied>, RuntimeError>>,
    },
    SeekRowIn {
        index: usize,
        resp: oneshot::Sender<Result<u64, RuntimeError>>,
    },
    SeekRowOut {
        index: usize,
        resp: oneshot::Sender<Result<u64, RuntimeError>>,
    },
    SetTrim {
        ms: u64,
        resp: oneshot::Sender<()>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer editor task and returns its handle.
///
/// One tokio task owns the store and the synchronizer; commands are applied
/// in arrival order. While a hold is active the task also wakes on a timer
/// to re-mark OUT from the video position.
pub fn spawn_editor(
    store: ScriptStore,
    video: Option<Box<dyn VideoSource>>,
    config: RuntimeConfig,
) -> EditorHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.cmd_queue_bound);
    let (events_tx, _) = broadcast::channel::<ScriptEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        let mut sync = Synchronizer::new(config.trim_ms);
        let mut hold_deadline = Instant::now();

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    let done = handle_command(
                        cmd,
                        &mut store,
                        &mut sync,
                        video.as_deref(),
                        &events_tx_loop,
                        &mut hold_deadline,
                        &config,
                    );
                    if done {
                        break;
                    }
                }
                _ = tokio::time::sleep_until(hold_deadline), if sync.is_holding() => {
                    if let Some(video) = video.as_deref() {
                        match sync.hold_tick(&mut store, video.position_ms()) {
                            Ok(Some(mark)) => {
                                let _ = events_tx_loop.send(ScriptEvent::RowUpdated { id: mark.id });
                            }
                            Ok(None) => {}
                            Err(err) => {
                                tracing::warn!(error = %err, "hold tick failed, hold cancelled");
                            }
                        }
                    }
                    hold_deadline = Instant::now() + Duration::from_millis(config.hold_tick_ms);
                }
            }
        }
    });

    EditorHandle { cmd_tx, events_tx }
}

impl EditorHandle {
    /// Opens a fresh subscription to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ScriptEvent> {
        self.events_tx.subscribe()
    }

    /// Replaces the document with imported records; returns the row count.
    pub async fn load_records(&self, records: Vec<RawRecord>) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::LoadRecords { records, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Exports the document as interchange records in display order.
    pub async fn export_records(&self) -> Result<Vec<RawRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ExportRecords { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Clones every row in display order.
    pub async fn rows(&self) -> Result<Vec<Row>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Rows { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Clones one row by id.
    pub async fn get(&self, id: RowId) -> Result<Option<Row>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Get { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Clones every row spoken by `character`, in display order.
    pub async fn by_character(&self, character: impl Into<String>) -> Result<Vec<Row>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ByCharacter {
                character: character.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Currently selected row id, if any.
    pub async fn selection(&self) -> Result<Option<RowId>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Selection { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Selects the row at a display index, or clears the selection.
    pub async fn select(&self, index: Option<usize>) -> Result<Option<RowId>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Select { index, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Applies a typed patch to one row.
    pub async fn edit(&self, id: RowId, patch: RowPatch) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Edit { id, patch, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Writes editor text into one field after delegate validation.
    pub async fn edit_text(
        &self,
        id: RowId,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::EditText {
                id,
                field,
                value: value.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Inserts a default row below the selection (or at the end).
    pub async fn add_row(&self) -> Result<RowId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AddRow { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Removes the rows at the given display indices as one undoable step.
    pub async fn remove_rows(&self, indices: Vec<usize>) -> Result<Vec<Row>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RemoveRows { indices, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Swaps the row at `index` with the row above it.
    pub async fn move_row_up(&self, index: usize) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MoveUp { index, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Swaps the row at `index` with the row below it.
    pub async fn move_row_down(&self, index: usize) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MoveDown { index, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Splits a row's dialogue at a character cursor; returns the new row id.
    pub async fn split_intervention(&self, id: RowId, cursor: usize) -> Result<RowId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Split { id, cursor, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Merges a row with the row below it.
    pub async fn merge_interventions(&self, id: RowId) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Merge { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Replaces text across the document; returns the number of rows touched.
    pub async fn find_and_replace(
        &self,
        search: impl Into<String>,
        replace: impl Into<String>,
        scope: ReplaceScope,
    ) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FindReplace {
                search: search.into(),
                replace: replace.into(),
                scope,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Renames a character everywhere; returns the number of rows touched.
    pub async fn rename_character(
        &self,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RenameCharacter {
                old: old.into(),
                new: new.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Copies a row's IN/OUT pair onto the row below it.
    pub async fn copy_in_out_to_next(&self, id: RowId) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::CopyInOutToNext { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Reflows every dialogue to the line-length limit; returns rows touched.
    pub async fn adjust_dialogues(&self) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AdjustDialogues { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Reverts the most recent command.
    pub async fn undo(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Undo { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Re-applies the most recently undone command.
    pub async fn redo(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Redo { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stamps the video position into the selected row's IN.
    pub async fn mark_in(&self) -> Result<MarkApplied, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MarkIn { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stamps the video position into the selected row's OUT and advances.
    pub async fn mark_out(&self) -> Result<MarkApplied, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MarkOut { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Marks OUT now and keeps re-marking it on a timer until [`hold_end`].
    ///
    /// [`hold_end`]: EditorHandle::hold_end
    pub async fn hold_begin(&self) -> Result<MarkApplied, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::HoldBegin { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Releases an active hold and advances the selection once.
    ///
    /// Returns `None` when no hold was active.
    pub async fn hold_end(&self) -> Result<Option<MarkApplied>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::HoldEnd { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Asks the video player to jump to a row's IN; returns the position.
    pub async fn seek_row_in(&self, index: usize) -> Result<u64, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SeekRowIn { index, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Asks the video player to jump to a row's OUT; returns the position.
    pub async fn seek_row_out(&self, index: usize) -> Result<u64, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SeekRowOut { index, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Changes the trim offset for every mark from now on.
    pub async fn set_trim(&self, ms: u64) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetTrim { ms, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the editor task after the queued commands drain.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    store: &mut ScriptStore,
    sync: &mut Synchronizer,
    video: Option<&dyn VideoSource>,
    events_tx: &broadcast::Sender<ScriptEvent>,
    hold_deadline: &mut Instant,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::LoadRecords { records, resp } => {
            let res = match ScriptStore::from_records(records) {
                Ok(loaded) => {
                    let had_selection = sync.selected().is_some();
                    let trim_ms = sync.trim_ms();
                    *store = loaded;
                    *sync = Synchronizer::new(trim_ms);
                    let rows = store.len();
                    let _ = events_tx.send(ScriptEvent::Loaded { rows });
                    if had_selection {
                        let _ = events_tx.send(ScriptEvent::SelectionChanged { selected: None });
                    }
                    Ok(rows)
                }
                Err(err) => Err(RuntimeError::from(err)),
            };
            let _ = resp.send(res);
        }
        Command::ExportRecords { resp } => {
            let _ = resp.send(store.export_records());
        }
        Command::Rows { resp } => {
            let _ = resp.send(store.rows_cloned());
        }
        Command::Get { id, resp } => {
            let _ = resp.send(store.get_cloned(id));
        }
        Command::ByCharacter { character, resp } => {
            let _ = resp.send(store.by_character_cloned(&character));
        }
        Command::Selection { resp } => {
            let _ = resp.send(sync.selected());
        }
        Command::Select { index, resp } => {
            let res = match index {
                None => {
                    sync.select(None);
                    Ok(None)
                }
                Some(index) => match store.row_at(index) {
                    Some(row) => {
                        let id = row.id;
                        sync.select(Some(id));
                        Ok(Some(id))
                    }
                    None => Err(StoreError::IndexOutOfBounds {
                        index,
                        len: store.len(),
                    }
                    .into()),
                },
            };
            if let Ok(selected) = &res {
                let _ = events_tx.send(ScriptEvent::SelectionChanged {
                    selected: *selected,
                });
            }
            let _ = resp.send(res);
        }
        Command::Edit { id, patch, resp } => {
            let res = store.edit_row(id, patch).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id });
            }
            let _ = resp.send(res);
        }
        Command::EditText {
            id,
            field,
            value,
            resp,
        } => {
            let res = store.edit_text(id, field, &value).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id });
            }
            let _ = resp.send(res);
        }
        Command::AddRow { resp } => {
            let index = match sync.selected_index(store) {
                Some(selected) => selected + 1,
                None => store.len(),
            };
            let res = store.add_row(index).map_err(RuntimeError::from);
            if let Ok(id) = &res {
                let _ = events_tx.send(ScriptEvent::RowInserted { id: *id, index });
            }
            let _ = resp.send(res);
        }
        Command::RemoveRows { indices, resp } => {
            let res = store.remove_rows(&indices).map_err(RuntimeError::from);
            if let Ok(rows) = &res {
                let ids: Vec<RowId> = rows.iter().map(|row| row.id).collect();
                let _ = events_tx.send(ScriptEvent::RowsRemoved { ids });
                clear_stale_selection(store, sync, events_tx);
            }
            let _ = resp.send(res);
        }
        Command::MoveUp { index, resp } => {
            let res = store.move_row_up(index).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RowMoved {
                    from: index,
                    to: index - 1,
                });
            }
            let _ = resp.send(res);
        }
        Command::MoveDown { index, resp } => {
            let res = store.move_row_down(index).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RowMoved {
                    from: index,
                    to: index + 1,
                });
            }
            let _ = resp.send(res);
        }
        Command::Split { id, cursor, resp } => {
            let res = store.split_intervention(id, cursor).map_err(RuntimeError::from);
            if let Ok(new_id) = &res {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id });
                if let Some(index) = store.index_of(*new_id) {
                    let _ = events_tx.send(ScriptEvent::RowInserted { id: *new_id, index });
                }
            }
            let _ = resp.send(res);
        }
        Command::Merge { id, resp } => {
            let next_id = store
                .index_of(id)
                .and_then(|index| store.row_at(index + 1))
                .map(|row| row.id);
            let res = store.merge_interventions(id).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id });
                if let Some(next_id) = next_id {
                    let _ = events_tx.send(ScriptEvent::RowsRemoved { ids: vec![next_id] });
                }
                clear_stale_selection(store, sync, events_tx);
            }
            let _ = resp.send(res);
        }
        Command::FindReplace {
            search,
            replace,
            scope,
            resp,
        } => {
            let res = store
                .find_and_replace(&search, &replace, scope)
                .map_err(RuntimeError::from);
            let _ = resp.send(res);
        }
        Command::RenameCharacter { old, new, resp } => {
            let ids: Vec<RowId> = store.by_character(&old).iter().map(|row| row.id).collect();
            let res = store.rename_character(&old, &new).map_err(RuntimeError::from);
            if res.is_ok() {
                for id in ids {
                    let _ = events_tx.send(ScriptEvent::RowUpdated { id });
                }
            }
            let _ = resp.send(res);
        }
        Command::CopyInOutToNext { id, resp } => {
            let next_id = store
                .index_of(id)
                .and_then(|index| store.row_at(index + 1))
                .map(|row| row.id);
            let res = store.copy_in_out_to_next(id).map_err(RuntimeError::from);
            if res.is_ok() {
                if let Some(next_id) = next_id {
                    let _ = events_tx.send(ScriptEvent::RowUpdated { id: next_id });
                }
            }
            let _ = resp.send(res);
        }
        Command::AdjustDialogues { resp } => {
            let res = store.adjust_dialogues().map_err(RuntimeError::from);
            let _ = resp.send(res);
        }
        Command::Undo { resp } => {
            let res = store.undo().map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::UndoApplied);
                clear_stale_selection(store, sync, events_tx);
            }
            let _ = resp.send(res);
        }
        Command::Redo { resp } => {
            let res = store.redo().map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(ScriptEvent::RedoApplied);
                clear_stale_selection(store, sync, events_tx);
            }
            let _ = resp.send(res);
        }
        Command::MarkIn { resp } => {
            let res = match video {
                Some(video) => sync
                    .mark_in(store, video.position_ms())
                    .map_err(RuntimeError::from),
                None => Err(RuntimeError::VideoUnavailable),
            };
            if let Ok(mark) = &res {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id: mark.id });
            }
            let _ = resp.send(res);
        }
        Command::MarkOut { resp } => {
            let res = match video {
                Some(video) => sync
                    .mark_out(store, video.position_ms())
                    .map_err(RuntimeError::from),
                None => Err(RuntimeError::VideoUnavailable),
            };
            if let Ok(mark) = &res {
                emit_mark(events_tx, mark);
            }
            let _ = resp.send(res);
        }
        Command::HoldBegin { resp } => {
            let res = match video {
                Some(video) => sync
                    .hold_begin(store, video.position_ms())
                    .map_err(RuntimeError::from),
                None => Err(RuntimeError::VideoUnavailable),
            };
            if let Ok(mark) = &res {
                let _ = events_tx.send(ScriptEvent::RowUpdated { id: mark.id });
                *hold_deadline = Instant::now() + Duration::from_millis(config.hold_tick_ms);
            }
            let _ = resp.send(res);
        }
        Command::HoldEnd { resp } => {
            let res = sync.hold_end(store).map_err(RuntimeError::from);
            if let Ok(Some(mark)) = &res {
                emit_mark(events_tx, mark);
            }
            let _ = resp.send(res);
        }
        Command::SeekRowIn { index, resp } => {
            let res = match store.row_at(index) {
                Some(row) => sync
                    .seek_in(store, row.id)
                    .map_err(RuntimeError::from)
                    .map(|position_ms| clamp_to_duration(position_ms, video)),
                None => Err(StoreError::IndexOutOfBounds {
                    index,
                    len: store.len(),
                }
                .into()),
            };
            if let Ok(position_ms) = &res {
                let _ = events_tx.send(ScriptEvent::SeekRequested {
                    position_ms: *position_ms,
                });
            }
            let _ = resp.send(res);
        }
        Command::SeekRowOut { index, resp } => {
            let res = match store.row_at(index) {
                Some(row) => sync
                    .seek_out(store, row.id)
                    .map_err(RuntimeError::from)
                    .map(|position_ms| clamp_to_duration(position_ms, video)),
                None => Err(StoreError::IndexOutOfBounds {
                    index,
                    len: store.len(),
                }
                .into()),
            };
            if let Ok(position_ms) = &res {
                let _ = events_tx.send(ScriptEvent::SeekRequested {
                    position_ms: *position_ms,
                });
            }
            let _ = resp.send(res);
        }
        Command::SetTrim { ms, resp } => {
            sync.set_trim(ms);
            let _ = resp.send(());
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

/// Publishes the row updates behind one mark, including the OUT-to-IN chain.
fn emit_mark(events_tx: &broadcast::Sender<ScriptEvent>, mark: &MarkApplied) {
    let _ = events_tx.send(ScriptEvent::RowUpdated { id: mark.id });
    if let Some(next) = mark.advanced_to {
        let _ = events_tx.send(ScriptEvent::RowUpdated { id: next });
        let _ = events_tx.send(ScriptEvent::SelectionChanged {
            selected: Some(next),
        });
    }
}

fn clamp_to_duration(position_ms: u64, video: Option<&dyn VideoSource>) -> u64 {
    match video.and_then(|video| video.duration_ms()) {
        Some(duration) => position_ms.min(duration),
        None => position_ms,
    }
}

/// Drops a selection whose row no longer exists and tells subscribers.
fn clear_stale_selection(
    store: &ScriptStore,
    sync: &mut Synchronizer,
    events_tx: &broadcast::Sender<ScriptEvent>,
) {
    let Some(selected) = sync.selected() else {
        return;
    };
    if store.get(selected).is_none() {
        sync.select(None);
        let _ = events_tx.send(ScriptEvent::SelectionChanged { selected: None });
    }
}
