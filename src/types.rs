//! Shared primitive IDs and field addressing.

/// Stable row identifier, assigned once and never reused within a session.
pub type RowId = u64;
/// Monotonic document revision number, bumped on every applied command.
pub type Revision = u64;

/// Editable columns of a script row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Scene label.
    Scene,
    /// IN timecode.
    InTime,
    /// OUT timecode.
    OutTime,
    /// Character (speaker) name.
    Character,
    /// Dialogue text.
    Dialogue,
}

impl Field {
    /// All fields in display-column order.
    pub const ALL: [Field; 5] = [
        Field::Scene,
        Field::InTime,
        Field::OutTime,
        Field::Character,
        Field::Dialogue,
    ];

    /// True for the two timecode columns.
    pub fn is_timecode(self) -> bool {
        matches!(self, Field::InTime | Field::OutTime)
    }
}
