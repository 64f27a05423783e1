use std::io::Write;

use tempfile::NamedTempFile;

use dubscript::{
    config::{ConfigError, EditorConfigV1},
    timecode::FRAME_RATE,
};

#[test]
fn defaults_apply_to_missing_fields() {
    let config = EditorConfigV1::from_json("{}").unwrap();
    assert_eq!(config.trim_ms, 0);
    assert_eq!(config.frame_rate, FRAME_RATE);
    assert_eq!(config, EditorConfigV1::default());
}

#[test]
fn trim_is_read_and_bridged_into_the_runtime_config() {
    let config = EditorConfigV1::from_json(r#"{"trim_ms":120}"#).unwrap();
    assert_eq!(config.trim_ms, 120);

    let runtime = config.runtime_config();
    assert_eq!(runtime.trim_ms, 120);
    assert_eq!(runtime.hold_tick_ms, 40);
}

#[test]
fn foreign_frame_rates_are_rejected() {
    let err = EditorConfigV1::from_json(r#"{"frame_rate":30}"#).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFrameRate { found: 30 }));
}

#[test]
fn load_reads_a_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"trim_ms":80,"frame_rate":25}}"#).unwrap();

    let config = EditorConfigV1::load(file.path()).unwrap();
    assert_eq!(config.trim_ms, 80);
    assert_eq!(config.frame_rate, 25);
}

#[test]
fn io_and_parse_failures_are_distinguished() {
    assert!(matches!(
        EditorConfigV1::load("/definitely/not/here.json"),
        Err(ConfigError::Io(_))
    ));
    assert!(matches!(
        EditorConfigV1::from_json("not json"),
        Err(ConfigError::Parse(_))
    ));
}
