use dubscript::{
    core::store::{RawRecord, ScriptStore},
    sync::{SyncError, Synchronizer},
    timecode::Timecode,
};

fn record(in_time: &str, out_time: &str, character: &str, dialogue: &str) -> RawRecord {
    RawRecord {
        scene: None,
        in_time: in_time.to_string(),
        out_time: out_time.to_string(),
        character: character.to_string(),
        dialogue: dialogue.to_string(),
    }
}

fn two_row_store() -> ScriptStore {
    ScriptStore::from_records(vec![
        record("00:00:01:00", "00:00:02:10", "ANA", "Hola."),
        record("00:00:03:00", "00:00:04:00", "JUAN", "Buenos dias."),
    ])
    .unwrap()
}

fn tc(text: &str) -> Timecode {
    text.parse().unwrap()
}

#[test]
fn marks_require_a_selection() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);

    assert_eq!(
        sync.mark_in(&mut store, 1_000).unwrap_err(),
        SyncError::NoRowSelected
    );
    assert_eq!(
        sync.mark_out(&mut store, 1_000).unwrap_err(),
        SyncError::NoRowSelected
    );
    assert!(!store.can_undo());
}

#[test]
fn mark_in_writes_the_trimmed_position() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(500);
    sync.select(Some(0));

    let mark = sync.mark_in(&mut store, 2_500).unwrap();
    assert_eq!(mark.id, 0);
    assert_eq!(mark.timecode, tc("00:00:02:00"));
    assert_eq!(mark.advanced_to, None);
    assert_eq!(store.get(0).unwrap().in_time, tc("00:00:02:00"));
    assert_eq!(sync.selected(), Some(0));
}

#[test]
fn trim_clamps_at_zero() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(1_000);
    sync.select(Some(0));

    let mark = sync.mark_in(&mut store, 400).unwrap();
    assert_eq!(mark.timecode, Timecode::ZERO);
}

#[test]
fn mark_out_chains_into_the_next_row_and_advances() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    let mark = sync.mark_out(&mut store, 2_500).unwrap();
    assert_eq!(mark.id, 0);
    assert_eq!(mark.timecode, tc("00:00:02:12"));
    assert_eq!(mark.advanced_to, Some(1));

    assert_eq!(store.get(0).unwrap().out_time, tc("00:00:02:12"));
    assert_eq!(store.get(1).unwrap().in_time, tc("00:00:02:12"));
    assert_eq!(sync.selected(), Some(1));

    // The OUT mark and the chained IN are two discrete undo steps.
    assert_eq!(store.undo_len(), 2);
    store.undo().unwrap();
    assert_eq!(store.get(1).unwrap().in_time, tc("00:00:03:00"));
    store.undo().unwrap();
    assert_eq!(store.get(0).unwrap().out_time, tc("00:00:02:10"));
}

#[test]
fn mark_out_on_the_last_row_does_not_advance() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(1));

    let mark = sync.mark_out(&mut store, 5_000).unwrap();
    assert_eq!(mark.advanced_to, None);
    assert_eq!(sync.selected(), Some(1));
    assert_eq!(store.undo_len(), 1);
}

#[test]
fn stale_selection_is_cleared_on_use() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    store.remove_rows(&[0]).unwrap();
    assert_eq!(
        sync.mark_in(&mut store, 1_000).unwrap_err(),
        SyncError::NoRowSelected
    );
    assert_eq!(sync.selected(), None);
}

#[test]
fn hold_marks_immediately_then_tracks_frame_changes() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    let mark = sync.hold_begin(&mut store, 1_000).unwrap();
    assert!(sync.is_holding());
    assert_eq!(mark.timecode, tc("00:00:01:00"));
    assert_eq!(store.get(0).unwrap().out_time, tc("00:00:01:00"));

    let tick = sync.hold_tick(&mut store, 1_500).unwrap();
    assert_eq!(tick.map(|m| m.timecode), Some(tc("00:00:01:12")));

    // Same frame: nothing recorded, position still remembered.
    assert_eq!(sync.hold_tick(&mut store, 1_510).unwrap(), None);

    let tick = sync.hold_tick(&mut store, 1_540).unwrap();
    assert_eq!(tick.map(|m| m.timecode), Some(tc("00:00:01:13")));

    let released = sync.hold_end(&mut store).unwrap().unwrap();
    assert!(!sync.is_holding());
    assert_eq!(released.timecode, tc("00:00:01:13"));
    assert_eq!(released.advanced_to, Some(1));
    assert_eq!(store.get(1).unwrap().in_time, tc("00:00:01:13"));
    assert_eq!(sync.selected(), Some(1));

    // begin + two effective ticks + chained IN.
    assert_eq!(store.undo_len(), 4);
}

#[test]
fn hold_end_without_a_hold_is_a_noop() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    assert_eq!(sync.hold_end(&mut store).unwrap(), None);
    assert_eq!(sync.hold_tick(&mut store, 1_000).unwrap(), None);
    assert!(!store.can_undo());
}

#[test]
fn hold_cancels_when_the_selection_vanishes() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    sync.hold_begin(&mut store, 1_000).unwrap();
    store.remove_rows(&[0]).unwrap();

    assert_eq!(
        sync.hold_tick(&mut store, 2_000).unwrap_err(),
        SyncError::NoRowSelected
    );
    assert!(!sync.is_holding());
    assert_eq!(sync.selected(), None);
}

#[test]
fn seeks_read_positions_without_touching_history() {
    let store = two_row_store();
    let sync = Synchronizer::new(250);
    let revision = store.revision();

    assert_eq!(sync.seek_in(&store, 0).unwrap(), 1_000);
    assert_eq!(sync.seek_out(&store, 0).unwrap(), 2_400);
    assert_eq!(sync.seek_in(&store, 1).unwrap(), 3_000);
    assert_eq!(store.revision(), revision);

    assert!(matches!(
        sync.seek_in(&store, 99),
        Err(SyncError::Store(_))
    ));
}

#[test]
fn set_trim_applies_to_subsequent_marks() {
    let mut store = two_row_store();
    let mut sync = Synchronizer::new(0);
    sync.select(Some(0));

    sync.mark_in(&mut store, 2_000).unwrap();
    assert_eq!(store.get(0).unwrap().in_time, tc("00:00:02:00"));

    sync.set_trim(1_000);
    assert_eq!(sync.trim_ms(), 1_000);
    sync.mark_in(&mut store, 2_000).unwrap();
    assert_eq!(store.get(0).unwrap().in_time, tc("00:00:01:00"));
}
