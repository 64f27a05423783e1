//! Per-field edit delegates used at the editor boundary.
//!
//! The core never sees a concrete widget; editors program against
//! [`FieldDelegate`] and the store routes text input through
//! [`delegate_for`] so each column carries its own validation.

use crate::{
    core::store::StoreError,
    row::{Row, RowPatch},
    timecode::Timecode,
    types::Field,
};

/// Capability surface one editable column presents to an editor.
pub trait FieldDelegate: Send + Sync {
    /// Current display text for the field.
    fn read_value(&self, row: &Row) -> String;

    /// Checks editor input without mutating anything.
    fn validate(&self, input: &str) -> Result<(), StoreError>;

    /// Builds the sparse patch that writes `input` into the field.
    fn write_value(&self, input: &str) -> Result<RowPatch, StoreError>;
}

/// Returns the delegate for a field.
pub fn delegate_for(field: Field) -> &'static dyn FieldDelegate {
    match field {
        Field::Scene => &SCENE,
        Field::InTime => &IN_TIME,
        Field::OutTime => &OUT_TIME,
        Field::Character => &CHARACTER,
        Field::Dialogue => &DIALOGUE,
    }
}

struct TextDelegate {
    read: fn(&Row) -> &str,
    write: fn(&mut RowPatch, String),
}

impl FieldDelegate for TextDelegate {
    fn read_value(&self, row: &Row) -> String {
        (self.read)(row).to_string()
    }

    fn validate(&self, _input: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn write_value(&self, input: &str) -> Result<RowPatch, StoreError> {
        let mut patch = RowPatch::default();
        (self.write)(&mut patch, input.to_string());
        Ok(patch)
    }
}

struct TimecodeDelegate {
    read: fn(&Row) -> Timecode,
    write: fn(&mut RowPatch, Timecode),
}

impl FieldDelegate for TimecodeDelegate {
    fn read_value(&self, row: &Row) -> String {
        (self.read)(row).to_string()
    }

    fn validate(&self, input: &str) -> Result<(), StoreError> {
        input.trim().parse::<Timecode>()?;
        Ok(())
    }

    fn write_value(&self, input: &str) -> Result<RowPatch, StoreError> {
        let tc: Timecode = input.trim().parse()?;
        let mut patch = RowPatch::default();
        (self.write)(&mut patch, tc);
        Ok(patch)
    }
}

struct CharacterDelegate;

impl FieldDelegate for CharacterDelegate {
    fn read_value(&self, row: &Row) -> String {
        row.character.clone()
    }

    fn validate(&self, input: &str) -> Result<(), StoreError> {
        if input.trim().is_empty() {
            return Err(StoreError::EmptyCharacter);
        }
        Ok(())
    }

    fn write_value(&self, input: &str) -> Result<RowPatch, StoreError> {
        self.validate(input)?;
        Ok(RowPatch {
            character: Some(input.trim().to_string()),
            ..RowPatch::default()
        })
    }
}

static SCENE: TextDelegate = TextDelegate {
    read: |row| &row.scene,
    write: |patch, v| patch.scene = Some(v),
};

static IN_TIME: TimecodeDelegate = TimecodeDelegate {
    read: |row| row.in_time,
    write: |patch, tc| patch.in_time = Some(tc),
};

static OUT_TIME: TimecodeDelegate = TimecodeDelegate {
    read: |row| row.out_time,
    write: |patch, tc| patch.out_time = Some(tc),
};

static CHARACTER: CharacterDelegate = CharacterDelegate;

static DIALOGUE: TextDelegate = TextDelegate {
    read: |row| &row.dialogue,
    write: |patch, v| patch.dialogue = Some(v),
};
