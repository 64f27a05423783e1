use dubscript::timecode::{FRAME_MS, FRAME_RATE, Timecode, TimecodeError, decode, encode};

#[test]
fn frame_constants_hold() {
    assert_eq!(FRAME_RATE, 25);
    assert_eq!(FRAME_MS, 40);
}

#[test]
fn decode_reads_all_four_groups() {
    assert_eq!(decode("00:00:00:00").unwrap(), 0);
    assert_eq!(decode("00:00:00:01").unwrap(), 40);
    assert_eq!(decode("00:00:01:00").unwrap(), 1_000);
    assert_eq!(decode("00:00:02:12").unwrap(), 2_480);
    assert_eq!(decode("01:02:03:04").unwrap(), 3_723_160);
}

#[test]
fn encode_floors_to_the_frame_boundary() {
    assert_eq!(encode(0).to_string(), "00:00:00:00");
    assert_eq!(encode(39).to_string(), "00:00:00:00");
    assert_eq!(encode(40).to_string(), "00:00:00:01");
    assert_eq!(encode(2_500).to_string(), "00:00:02:12");
    assert_eq!(encode(2_480).to_string(), "00:00:02:12");
}

#[test]
fn one_round_trip_stabilizes() {
    let first = encode(2_500);
    assert_eq!(first.millis(), 2_480);
    let second = encode(first.millis());
    assert_eq!(second, first);
}

#[test]
fn shape_is_validated_but_group_values_are_not() {
    for bad in [
        "",
        "00",
        "00:00:02",
        "0:00:02:10",
        "00:00:02:10:05",
        "00:00:2a:10",
        "00 00 02 10",
        "-1:00:00:00",
    ] {
        assert_eq!(
            bad.parse::<Timecode>(),
            Err(TimecodeError::BadShape),
            "{bad:?} should be rejected"
        );
    }

    // Out-of-range groups pass the shape check and convert arithmetically.
    assert_eq!(decode("00:00:00:99").unwrap(), 3_960);
    assert_eq!(decode("00:99:00:00").unwrap(), 5_940_000);
}

#[test]
fn display_pads_every_group_to_two_digits() {
    let tc = Timecode {
        hours: 1,
        minutes: 2,
        seconds: 3,
        frames: 4,
    };
    assert_eq!(tc.to_string(), "01:02:03:04");
    assert_eq!(tc.to_string().parse::<Timecode>().unwrap(), tc);
}

#[test]
fn hours_saturate_at_the_display_limit() {
    let tc = encode(500 * 3_600_000);
    assert_eq!(tc.hours, 99);
}
