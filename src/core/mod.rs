//! In-memory authoritative document store and index helpers.

/// Secondary index aliases.
pub mod indices;
/// Authoritative script store and undo/redo engine.
pub mod store;
