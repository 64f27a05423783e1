//! Edit engine for dubbing scripts synchronized with video playback.
//!
//! The document is an ordered list of dialogue rows with stable ids and
//! frame-exact 25 fps timecodes. Every mutation goes through a reversible
//! command log, so undo and redo restore exact prior states, ids included.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::ScriptStore`]:
//! ```
//! use dubscript::{core::store::ScriptStore, row::RowPatch};
//!
//! let mut store = ScriptStore::new();
//! let id = store.add_row(0).expect("add row");
//! assert_eq!(id, 0);
//!
//! store.edit_row(id, RowPatch {
//!     character: Some("ANA".to_string()),
//!     dialogue: Some("Hola.".to_string()),
//!     ..RowPatch::default()
//! }).expect("edit");
//! assert_eq!(store.get(id).map(|row| row.dialogue.as_str()), Some("Hola."));
//!
//! store.undo().expect("undo");
//! assert_eq!(store.get(id).map(|row| row.dialogue.as_str()), Some(""));
//! ```
//!
//! Async usage behind the single-writer runtime:
//! ```no_run
//! use dubscript::{
//!     core::store::ScriptStore,
//!     runtime::handle::{spawn_editor, RuntimeConfig},
//!     types::Field,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let handle = spawn_editor(ScriptStore::new(), None, RuntimeConfig::default());
//! let id = handle.add_row().await.expect("add row");
//! handle.edit_text(id, Field::Dialogue, "Hola.").await.expect("edit");
//! handle.undo().await.expect("undo");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Reversible command model applied by the store.
pub mod command;
/// Persisted configuration loading.
pub mod config;
/// Core in-memory document store and index helpers.
pub mod core;
/// Per-field editing delegates shared by every text entry path.
pub mod fields;
/// Row and sparse patch types.
pub mod row;
/// Async editor task, handle, and event stream.
pub mod runtime;
/// Video mark protocol and selection state.
pub mod sync;
/// Dialogue line-length accounting and reflow.
pub mod text;
/// Frame-exact timecode codec.
pub mod timecode;
/// Row ids and field addressing shared across modules.
pub mod types;
