//! Script row and sparse patch types.

use crate::timecode::Timecode;
use crate::types::RowId;

/// Scene label given to rows that arrive without one.
pub const DEFAULT_SCENE: &str = "1";

/// Fully materialized dialogue intervention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Stable row identifier.
    pub id: RowId,
    /// Scene label.
    pub scene: String,
    /// Frame-exact IN timestamp.
    pub in_time: Timecode,
    /// Frame-exact OUT timestamp.
    pub out_time: Timecode,
    /// Character (speaker) name.
    pub character: String,
    /// Dialogue text, possibly spanning several lines.
    pub dialogue: String,
}

impl Row {
    /// Builds a row with default field values and the given id.
    pub fn with_defaults(id: RowId) -> Self {
        Self {
            id,
            scene: DEFAULT_SCENE.to_string(),
            in_time: Timecode::ZERO,
            out_time: Timecode::ZERO,
            character: String::new(),
            dialogue: String::new(),
        }
    }
}

/// Sparse patch where each `Some` field overwrites the row value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowPatch {
    /// Optional replacement for the scene label.
    pub scene: Option<String>,
    /// Optional replacement for the IN timestamp.
    pub in_time: Option<Timecode>,
    /// Optional replacement for the OUT timestamp.
    pub out_time: Option<Timecode>,
    /// Optional replacement for the character name.
    pub character: Option<String>,
    /// Optional replacement for the dialogue text.
    pub dialogue: Option<String>,
}

impl RowPatch {
    /// True when the patch touches no fields.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Captures an inverse patch for all fields present in `self`.
    pub fn capture_inverse_for(&self, row: &Row) -> Self {
        Self {
            scene: self.scene.as_ref().map(|_| row.scene.clone()),
            in_time: self.in_time.map(|_| row.in_time),
            out_time: self.out_time.map(|_| row.out_time),
            character: self.character.as_ref().map(|_| row.character.clone()),
            dialogue: self.dialogue.as_ref().map(|_| row.dialogue.clone()),
        }
    }

    /// Applies this patch in place to `row`.
    pub fn apply_to(&self, row: &mut Row) {
        if let Some(v) = &self.scene {
            row.scene = v.clone();
        }
        if let Some(v) = self.in_time {
            row.in_time = v;
        }
        if let Some(v) = self.out_time {
            row.out_time = v;
        }
        if let Some(v) = &self.character {
            row.character = v.clone();
        }
        if let Some(v) = &self.dialogue {
            row.dialogue = v.clone();
        }
    }

    /// Patch that only sets the dialogue text.
    pub fn dialogue(text: impl Into<String>) -> Self {
        Self {
            dialogue: Some(text.into()),
            ..Self::default()
        }
    }

    /// Patch that only sets the IN timestamp.
    pub fn in_time(tc: Timecode) -> Self {
        Self {
            in_time: Some(tc),
            ..Self::default()
        }
    }

    /// Patch that only sets the OUT timestamp.
    pub fn out_time(tc: Timecode) -> Self {
        Self {
            out_time: Some(tc),
            ..Self::default()
        }
    }
}
