//! Tests for boundary codecs

use bytes::Bytes;

use super::*;

#[test]
fn test_encode_decode_round_trip() {
    let payload = Bytes::from_static(&[0x00, 0xff, 0x10, 0x7f, 0x80]);
    let encoded = encode(&payload);
    let decoded = decode(&encoded).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn test_encode_empty() {
    assert_eq!(encode(b""), "");
    assert_eq!(decode("").unwrap(), Bytes::new());
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(decode("not base64 at all!").is_err());
}

#[test]
fn test_text_to_binary_is_utf8() {
    let bytes = text_to_binary("héllo".to_string());
    assert_eq!(bytes, Bytes::from("héllo".as_bytes().to_vec()));
}

#[test]
fn test_encode_iter_is_lazy_and_ordered() {
    let records = vec![Bytes::from_static(b"a"), Bytes::from_static(b"bc")];
    let encoded: Vec<String> = encode_iter(records.iter()).collect();
    assert_eq!(encoded.len(), 2);
    assert_eq!(decode(&encoded[0]).unwrap(), records[0]);
    assert_eq!(decode(&encoded[1]).unwrap(), records[1]);
}

#[test]
fn test_decode_all_round_trip() {
    let records = vec![
        Bytes::from_static(b"one"),
        Bytes::from_static(b""),
        Bytes::from_static(&[1, 2, 3]),
    ];
    let encoded: Vec<String> = encode_iter(records.iter()).collect();
    let decoded = decode_all(encoded).unwrap();
    assert_eq!(decoded, records);
}

#[test]
fn test_decode_all_fails_on_first_bad_record() {
    let mixed = vec![encode(b"fine"), "!!!".to_string(), encode(b"unreached")];
    assert!(decode_all(mixed).is_err());
}
