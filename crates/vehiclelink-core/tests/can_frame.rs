//! Tests for CAN TX frame building

use pretty_assertions::assert_eq;
use vehiclelink_core::protocol::frame::{format_data_bytes, normalize_id, parse_data_bytes};
use vehiclelink_core::protocol::{
    build_tx_message, CanFrame, CanFrameType, CanIdType, FrameError, FramePayload,
};

fn std_data(id: &str, data: &str) -> Result<String, FrameError> {
    build_tx_message(id, CanIdType::Standard, CanFrameType::Data, data, 0)
}

#[test]
fn test_every_standard_id_rebuilds_identically() {
    for v in 0..=0x7FFu32 {
        let first = std_data(&format!("{:x}", v), "01").unwrap();
        let id = format!("{:X}", v);
        let second = std_data(&id, "01").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, format!("TX STD DATA {} 01", id));
    }
}

#[test]
fn test_data_tokens_are_normalized() {
    let msg = std_data("7B8", "0x3 61,a 0XfF").unwrap();
    assert_eq!(msg, "TX STD DATA 7B8 03 61 0A FF");
}

#[test]
fn test_token_count_is_preserved() {
    let inputs = ["", "1", "1 2", "aa bb cc", "0 1 2 3 4 5 6 7"];
    for input in inputs {
        let msg = std_data("1", input).unwrap();
        let expected = input.split_whitespace().count();
        let tokens: Vec<&str> = msg.split(' ').skip(4).collect();
        assert_eq!(tokens.len(), expected, "input {:?}", input);
        for t in tokens {
            assert_eq!(t.len(), 2);
            assert_eq!(t, t.to_uppercase());
        }
    }
}

#[test]
fn test_empty_data_has_no_trailing_space() {
    assert_eq!(std_data("7B8", "   ").unwrap(), "TX STD DATA 7B8");
}

#[test]
fn test_standard_id_out_of_range() {
    let err = std_data("800", "00").unwrap_err();
    assert!(matches!(err, FrameError::InvalidId { ref id, .. } if id == "800"));

    assert!(matches!(std_data("1234", "00"), Err(FrameError::InvalidId { .. })));
    assert!(matches!(std_data("", "00"), Err(FrameError::InvalidId { .. })));
    assert!(matches!(std_data("7G8", "00"), Err(FrameError::InvalidId { .. })));
}

#[test]
fn test_extended_ids() {
    let msg = build_tx_message(
        "0x1fffffff",
        CanIdType::Extended,
        CanFrameType::Data,
        "01 02",
        0,
    )
    .unwrap();
    assert_eq!(msg, "TX EXT DATA 1FFFFFFF 01 02");

    let err = normalize_id("20000000", CanIdType::Extended).unwrap_err();
    assert!(matches!(err, FrameError::InvalidId { id_type: CanIdType::Extended, .. }));
    assert!(normalize_id("123456789", CanIdType::Extended).is_err());
}

#[test]
fn test_nine_bytes_rejected() {
    assert_eq!(
        std_data("7B8", "00 01 02 03 04 05 06 07 08"),
        Err(FrameError::TooManyBytes(9))
    );
    // too many wins over a bad token
    assert_eq!(
        std_data("7B8", "00 01 02 03 04 05 06 07 zz"),
        Err(FrameError::TooManyBytes(9))
    );
}

#[test]
fn test_bad_byte_reports_index() {
    assert_eq!(
        std_data("7B8", "00 123 00"),
        Err(FrameError::InvalidByte {
            index: 1,
            token: "123".to_string()
        })
    );
    assert_eq!(
        parse_data_bytes("0x"),
        Err(FrameError::InvalidByte {
            index: 0,
            token: "0x".to_string()
        })
    );
}

#[test]
fn test_remote_frames() {
    let msg = build_tx_message("7b8", CanIdType::Standard, CanFrameType::Remote, "ignored", 8)
        .unwrap();
    assert_eq!(msg, "TX STD RTR 7B8 8");

    assert_eq!(
        build_tx_message("7B8", CanIdType::Standard, CanFrameType::Remote, "", 9),
        Err(FrameError::InvalidDlc(9))
    );

    let frame = CanFrame::build("10", CanIdType::Extended, CanFrameType::Remote, "", 0).unwrap();
    assert_eq!(frame.payload(), &FramePayload::Remote { dlc: 0 });
    assert_eq!(frame.to_tx_line(), "TX EXT RTR 10 0");
}

#[test]
fn test_frame_from_bytes() {
    let frame = CanFrame::data("7B8", CanIdType::Standard, &[0x03, 0x61, 0x42, 0x10]).unwrap();
    assert_eq!(frame.frame_type(), CanFrameType::Data);
    assert_eq!(frame.to_tx_line(), "TX STD DATA 7B8 03 61 42 10");
    assert_eq!(format_data_bytes(&[0x0a, 0xff]), "0A FF");
    assert!(CanFrame::data("7B8", CanIdType::Standard, &[0; 9]).is_err());
}
