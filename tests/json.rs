//! JSON interchange tests.

use bpack::{BpackBuf, BuildError, TypeTag};

#[test]
fn test_parse_scalars() {
    let buf = BpackBuf::parse_json("null").unwrap();
    assert!(buf.as_slice().is_null());

    let buf = BpackBuf::parse_json("true").unwrap();
    assert!(buf.as_slice().as_bool().unwrap());

    let buf = BpackBuf::parse_json("-42").unwrap();
    assert_eq!(buf.as_slice().as_int().unwrap(), -42);

    let buf = BpackBuf::parse_json("18446744073709551615").unwrap();
    assert_eq!(buf.as_slice().as_uint().unwrap(), u64::MAX);

    let buf = BpackBuf::parse_json("3.25").unwrap();
    assert_eq!(buf.as_slice().as_double().unwrap(), 3.25);

    let buf = BpackBuf::parse_json(r#""hello""#).unwrap();
    assert_eq!(buf.as_slice().as_str().unwrap(), "hello");
}

#[test]
fn test_parse_containers() {
    let buf = BpackBuf::parse_json(r#"{"b": 1, "a": [true, null, "x"]}"#).unwrap();

    let object = buf.as_slice().object().unwrap();
    assert_eq!(object.len().unwrap(), 2);
    assert_eq!(object.get("b").unwrap().unwrap().as_int().unwrap(), 1);

    let array = object.get("a").unwrap().unwrap().array().unwrap();
    assert_eq!(array.len().unwrap(), 3);
    assert!(array.at(0).unwrap().as_bool().unwrap());
    assert!(array.at(1).unwrap().is_null());
    assert_eq!(array.at(2).unwrap().as_str().unwrap(), "x");
}

#[test]
fn test_parse_produces_canonical_objects() {
    let buf = BpackBuf::parse_json(r#"{"z": 1, "a": 2}"#).unwrap();
    // objects come out sorted and indexed
    assert_eq!(buf.as_bytes()[0], 0x0b);
    let keys: Vec<_> = buf.as_slice().object().unwrap().keys().map(|k| k.unwrap()).collect();
    assert_eq!(keys, ["a", "z"]);
}

#[test]
fn test_parse_error() {
    let err = BpackBuf::parse_json("{invalid").unwrap_err();
    assert!(matches!(err, BuildError::JsonError(_)));
}

#[test]
fn test_round_trip() {
    let json = r#"{"a":[true,null,"x\ny"],"b":-7,"c":{"d":1.5}}"#;
    let buf = BpackBuf::parse_json(json).unwrap();
    assert_eq!(buf.as_slice().to_json().unwrap(), json);
}

#[test]
fn test_try_from_json_value() {
    let value = serde_json::json!({"a": 1, "b": [2, 3]});
    let buf = BpackBuf::try_from(&value).unwrap();

    let object = buf.as_slice().object().unwrap();
    assert_eq!(object.get("a").unwrap().unwrap().as_int().unwrap(), 1);
    let array = object.get("b").unwrap().unwrap().array().unwrap();
    assert_eq!(array.len().unwrap(), 2);
    assert_eq!(array.at(1).unwrap().as_int().unwrap(), 3);
}

#[test]
fn test_mixed_document() {
    let buf = BpackBuf::parse_json(r#"{"a": 1, "b": [true]}"#).unwrap();
    let object = buf.as_slice().object().unwrap();
    assert_eq!(object.get("a").unwrap().unwrap().tag(), TypeTag::SmallInt);
    let b = object.get("b").unwrap().unwrap().array().unwrap();
    assert!(b.at(0).unwrap().as_bool().unwrap());
}
