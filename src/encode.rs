use num_bigint::BigUint;

/// Interprets a byte string as a big-endian integer.
pub fn from_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Decodes the big-endian byte representation of `value` into ASCII text.
/// Returns None when any byte falls outside ASCII.
pub fn to_ascii(value: &BigUint) -> Option<String> {
    let bytes = value.to_bytes_be();
    String::from_utf8(bytes).ok().filter(|text| text.is_ascii())
}

#[test]
fn test_ascii_round_trip() {
    let value = from_bytes(b"hunter2");
    assert_eq!(to_ascii(&value).as_deref(), Some("hunter2"));
}

#[test]
fn test_rejects_non_ascii() {
    assert_eq!(to_ascii(&BigUint::from(0xffu32)), None);
    assert_eq!(to_ascii(&from_bytes(&[0xc3, 0x28])), None);
}
