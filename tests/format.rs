//! JSON rendering tests.

use bpack::{BpackBuf, Builder, FormatError, Options, TypeTag, Value};

#[test]
fn test_compact_object() {
    let buf = BpackBuf::parse_json(r#"{"a": 1, "b": [true, null]}"#).unwrap();
    assert_eq!(buf.as_slice().to_json().unwrap(), r#"{"a":1,"b":[true,null]}"#);
    assert_eq!(buf.as_slice().format().to_string(), r#"{"a":1,"b":[true,null]}"#);
}

#[test]
fn test_pretty_object() {
    let buf = BpackBuf::parse_json(r#"{"a": 1}"#).unwrap();
    assert_eq!(buf.as_slice().format_pretty().to_string(), "{\n  \"a\" : 1\n}");
}

#[test]
fn test_pretty_array() {
    let buf = BpackBuf::parse_json("[1, 2]").unwrap();
    assert_eq!(buf.as_slice().format_pretty().to_string(), "[\n  1,\n  2\n]");

    let buf = BpackBuf::parse_json("[]").unwrap();
    assert_eq!(buf.as_slice().format_pretty().to_string(), "[\n]");
}

#[test]
fn test_pretty_nested() {
    let buf = BpackBuf::parse_json(r#"{"a": [1]}"#).unwrap();
    assert_eq!(
        buf.as_slice().format_pretty().to_string(),
        "{\n  \"a\" : \n  [\n    1\n  ]\n}"
    );
}

#[test]
fn test_string_escapes() {
    let buf = BpackBuf::parse_json(r#""a\"b\\c\nd""#).unwrap();
    assert_eq!(buf.as_slice().to_json().unwrap(), r#""a\"b\\c\nd""#);
}

#[test]
fn test_date_rendering() {
    let mut builder = Builder::new();
    builder.add_value(Value::UTCDate(1_000_000_000_000)).unwrap();
    let buf = builder.finish().unwrap();

    assert_eq!(buf.as_slice().to_json().unwrap(), "\"2001-09-09T01:46:40.000Z\"");

    let mut options = Options::new();
    options.dates_as_integers = true;
    assert_eq!(
        buf.as_slice().format_with(options, false).to_string(),
        "1000000000000"
    );
}

#[test]
fn test_binary_rendering() {
    let mut builder = Builder::new();
    builder.add_value(Value::Binary(&[0x01, 0x02, 0xff])).unwrap();
    let buf = builder.finish().unwrap();

    // not representable by default
    let err = buf.as_slice().to_json().unwrap_err();
    assert!(matches!(err, FormatError::Unrepresentable(TypeTag::Binary)));

    let mut options = Options::new();
    options.binary_as_hex = true;
    assert_eq!(buf.as_slice().format_with(options, false).to_string(), "\"0102ff\"");
}

#[test]
fn test_sentinels_unrepresentable() {
    for value in [Value::MinKey, Value::MaxKey] {
        let mut builder = Builder::new();
        builder.add_value(value).unwrap();
        let buf = builder.finish().unwrap();
        assert!(matches!(
            buf.as_slice().to_json().unwrap_err(),
            FormatError::Unrepresentable(_)
        ));
    }
}

#[test]
fn test_doubles_render_plainly() {
    let buf = BpackBuf::parse_json("[1.5, -0.25, 1e3]").unwrap();
    assert_eq!(buf.as_slice().to_json().unwrap(), "[1.5,-0.25,1000]");
}
