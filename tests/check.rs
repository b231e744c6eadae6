use freehub::crc;

#[test]
fn empty_input_is_zero() {
    assert_eq!(crc::compute(0, &[]), 0);
}

#[test]
fn byte_order_matters() {
    assert_ne!(crc::compute(0, &[0x01, 0x02]), crc::compute(0, &[0x02, 0x01]));
}

#[test]
fn incremental_updates_match_batch() {
    let bytes = [0x0E, 0x20, 0x8B, 0x08, 0x00, 0x00, 0x2E, 0x46, 0x49, 0x54];

    let incremental = bytes.iter().fold(0, |acc, b| crc::update(acc, *b));
    assert_eq!(incremental, crc::compute(0, &bytes));
}

#[test]
fn matches_the_arc_check_value() {
    // The protocol's CRC is CRC-16/ARC; its standard check value applies.
    assert_eq!(crc::compute(0, b"123456789"), 0xBB3D);
}
