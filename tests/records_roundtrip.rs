use dubscript::{
    core::store::{RawRecord, ScriptStore, StoreError},
    row::RowPatch,
};

fn record(
    scene: Option<&str>,
    in_time: &str,
    out_time: &str,
    character: &str,
    dialogue: &str,
) -> RawRecord {
    RawRecord {
        scene: scene.map(str::to_string),
        in_time: in_time.to_string(),
        out_time: out_time.to_string(),
        character: character.to_string(),
        dialogue: dialogue.to_string(),
    }
}

#[test]
fn import_fills_the_default_scene() {
    let store = ScriptStore::from_records(vec![
        record(Some("12"), "00:00:01:00", "00:00:02:00", "ANA", "Hola."),
        record(None, "00:00:03:00", "00:00:04:00", "JUAN", "Buenas."),
    ])
    .unwrap();

    assert_eq!(store.get(0).unwrap().scene, "12");
    assert_eq!(store.get(1).unwrap().scene, "1");
}

#[test]
fn import_rejects_the_whole_load_on_a_bad_timecode() {
    let err = ScriptStore::from_records(vec![
        record(None, "00:00:01:00", "00:00:02:00", "ANA", "Hola."),
        record(None, "1:2", "00:00:04:00", "JUAN", "Mal."),
    ])
    .unwrap_err();
    assert!(matches!(err, StoreError::BadRecordTimecode { row: 1, .. }));
}

#[test]
fn export_walks_display_order_and_always_carries_a_scene() {
    let mut store = ScriptStore::from_records(vec![
        record(None, "00:00:01:00", "00:00:02:00", "ANA", "Hola."),
        record(None, "00:00:03:00", "00:00:04:00", "JUAN", "Buenas."),
    ])
    .unwrap();
    store.move_row_up(1).unwrap();

    let exported = store.export_records();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].character, "JUAN");
    assert_eq!(exported[1].character, "ANA");
    assert_eq!(exported[0].scene.as_deref(), Some("1"));
}

#[test]
fn export_reflects_the_current_state() {
    let mut store = ScriptStore::from_records(vec![record(
        None,
        "00:00:01:00",
        "00:00:02:00",
        "ANA",
        "Hola.",
    )])
    .unwrap();
    store.edit_row(0, RowPatch::dialogue("Adios.")).unwrap();

    let exported = store.export_records();
    assert_eq!(exported[0].dialogue, "Adios.");
    assert_eq!(exported[0].in_time, "00:00:01:00");
}

#[test]
fn wire_names_are_in_and_out() {
    let json =
        serde_json::to_value(record(None, "00:00:01:00", "00:00:02:00", "ANA", "Hola.")).unwrap();
    assert_eq!(json["in"], "00:00:01:00");
    assert_eq!(json["out"], "00:00:02:00");
    assert!(json.get("scene").is_none());
    assert!(json.get("id").is_none());

    let parsed: RawRecord = serde_json::from_str(
        r#"{"in":"00:00:01:00","out":"00:00:02:00","character":"ANA","dialogue":"Hola."}"#,
    )
    .unwrap();
    assert_eq!(parsed.scene, None);
    assert_eq!(parsed.in_time, "00:00:01:00");
}

#[test]
fn json_round_trip_preserves_the_document() {
    let store = ScriptStore::from_records(vec![
        record(Some("3"), "00:00:01:00", "00:00:02:10", "ANA", "Hola.\nAdios."),
        record(None, "00:00:03:00", "00:00:04:00", "JUAN", "Buenas."),
    ])
    .unwrap();

    let json = serde_json::to_string_pretty(&store.export_records()).unwrap();
    let parsed: Vec<RawRecord> = serde_json::from_str(&json).unwrap();
    let reloaded = ScriptStore::from_records(parsed).unwrap();

    assert_eq!(reloaded.rows_cloned(), store.rows_cloned());
}
