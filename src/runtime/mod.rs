//! Single-writer editor task, its handle, and the change event stream.

/// Broadcast event payloads.
pub mod events;
/// Editor handle, command loop, and video source trait.
pub mod handle;
