//! Scalar encode and read tests.

use bpack::{BpackBuf, Builder, SliceError, TypeTag, Value};

fn build(value: Value) -> BpackBuf {
    let mut builder = Builder::new();
    builder.add_value(value).unwrap();
    builder.finish().unwrap()
}

#[test]
fn test_null() {
    let buf = build(Value::Null);
    assert_eq!(buf.as_bytes(), &[0x18]);
    assert!(buf.as_slice().is_null());
    assert_eq!(buf.as_slice().tag(), TypeTag::Null);
}

#[test]
fn test_bool() {
    let buf = build(Value::Bool(true));
    assert_eq!(buf.as_bytes(), &[0x1a]);
    assert!(buf.as_slice().as_bool().unwrap());

    let buf = build(Value::Bool(false));
    assert_eq!(buf.as_bytes(), &[0x19]);
    assert!(!buf.as_slice().as_bool().unwrap());

    let err = buf.as_slice().as_int().unwrap_err();
    assert!(matches!(err, SliceError::UnexpectedType { .. }));
}

#[test]
fn test_small_int() {
    for value in -6..=9i64 {
        let buf = build(Value::Int(value));
        assert_eq!(buf.as_bytes().len(), 1);
        assert_eq!(buf.as_slice().tag(), TypeTag::SmallInt);
        assert_eq!(buf.as_slice().as_int().unwrap(), value);
    }
    assert_eq!(build(Value::Int(0)).as_bytes(), &[0x30]);
    assert_eq!(build(Value::Int(9)).as_bytes(), &[0x39]);
    assert_eq!(build(Value::Int(-1)).as_bytes(), &[0x3f]);
    assert_eq!(build(Value::Int(-6)).as_bytes(), &[0x3a]);
}

#[test]
fn test_int_widths() {
    let buf = build(Value::Int(10));
    assert_eq!(buf.as_bytes(), &[0x20, 0x0a]);
    assert_eq!(buf.as_slice().as_int().unwrap(), 10);

    let buf = build(Value::Int(-7));
    assert_eq!(buf.as_bytes(), &[0x20, 0xf9]);
    assert_eq!(buf.as_slice().as_int().unwrap(), -7);

    let buf = build(Value::Int(i64::MAX));
    assert_eq!(buf.as_bytes().len(), 9);
    assert_eq!(buf.as_slice().as_int().unwrap(), i64::MAX);

    let buf = build(Value::Int(i64::MIN));
    assert_eq!(buf.as_slice().as_int().unwrap(), i64::MIN);

    // one payload byte per extra magnitude step
    assert_eq!(build(Value::Int(0x7f)).as_bytes().len(), 2);
    assert_eq!(build(Value::Int(0x80)).as_bytes().len(), 3);
    assert_eq!(build(Value::Int(-0x80)).as_bytes().len(), 2);
    assert_eq!(build(Value::Int(-0x81)).as_bytes().len(), 3);
}

#[test]
fn test_uint() {
    let buf = build(Value::UInt(300));
    assert_eq!(buf.as_bytes(), &[0x29, 0x2c, 0x01]);
    assert_eq!(buf.as_slice().as_uint().unwrap(), 300);

    let buf = build(Value::UInt(u64::MAX));
    assert_eq!(buf.as_bytes().len(), 9);
    assert_eq!(buf.as_slice().as_uint().unwrap(), u64::MAX);
}

#[test]
fn test_numeric_cross_reads() {
    // unsigned within signed range reads as int
    let buf = build(Value::UInt(300));
    assert_eq!(buf.as_slice().as_int().unwrap(), 300);

    // unsigned above i64::MAX does not
    let buf = build(Value::UInt(u64::MAX));
    assert_eq!(buf.as_slice().as_int().unwrap_err(), SliceError::NumericOverflow);

    // negative values never read as uint
    let buf = build(Value::Int(-1));
    assert_eq!(buf.as_slice().as_uint().unwrap_err(), SliceError::NumericOverflow);

    // non-negative signed reads as uint
    let buf = build(Value::Int(42));
    assert_eq!(buf.as_slice().as_uint().unwrap(), 42);
}

#[test]
fn test_double() {
    let buf = build(Value::Double(3.25));
    let mut expected = vec![0x1b];
    expected.extend_from_slice(&3.25f64.to_bits().to_le_bytes());
    assert_eq!(buf.as_bytes(), &expected[..]);
    assert_eq!(buf.as_slice().as_double().unwrap(), 3.25);

    let buf = build(Value::Double(-0.0));
    assert!(buf.as_slice().as_double().unwrap().is_sign_negative());
}

#[test]
fn test_string() {
    let buf = build(Value::String("abc"));
    assert_eq!(buf.as_bytes(), &[0x43, b'a', b'b', b'c']);
    assert_eq!(buf.as_slice().as_str().unwrap(), "abc");

    let buf = build(Value::String(""));
    assert_eq!(buf.as_bytes(), &[0x40]);
    assert_eq!(buf.as_slice().as_str().unwrap(), "");

    // short form fits up to 126 bytes
    let s = "x".repeat(126);
    let buf = build(Value::String(&s));
    assert_eq!(buf.as_bytes()[0], 0xbe);
    assert_eq!(buf.as_bytes().len(), 127);
    assert_eq!(buf.as_slice().as_str().unwrap(), s);

    // 127 bytes needs the long form
    let s = "x".repeat(127);
    let buf = build(Value::String(&s));
    assert_eq!(buf.as_bytes()[0], 0xbf);
    assert_eq!(buf.as_bytes().len(), 1 + 8 + 127);
    assert_eq!(buf.as_slice().as_str().unwrap(), s);

    // multi-byte characters count in bytes, not chars
    let buf = build(Value::String("héllo"));
    assert_eq!(buf.as_bytes()[0], 0x40 + 6);
    assert_eq!(buf.as_slice().as_str().unwrap(), "héllo");
}

#[test]
fn test_binary() {
    let buf = build(Value::Binary(&[1, 2, 0xff]));
    assert_eq!(buf.as_bytes(), &[0xc0, 0x03, 0x01, 0x02, 0xff]);
    assert_eq!(buf.as_slice().as_binary().unwrap(), &[1, 2, 0xff]);

    // length field widens with the payload
    let data = vec![0u8; 300];
    let buf = build(Value::Binary(&data));
    assert_eq!(buf.as_bytes()[0], 0xc1);
    assert_eq!(buf.as_slice().as_binary().unwrap(), &data[..]);
}

#[test]
fn test_utc_date() {
    let buf = build(Value::UTCDate(1_000_000_000_000));
    assert_eq!(buf.as_bytes().len(), 9);
    assert_eq!(buf.as_bytes()[0], 0x1c);
    assert_eq!(buf.as_slice().as_utc_date().unwrap(), 1_000_000_000_000);

    let buf = build(Value::UTCDate(-1));
    assert_eq!(buf.as_slice().as_utc_date().unwrap(), -1);
}

#[test]
fn test_sentinels() {
    let buf = build(Value::MinKey);
    assert_eq!(buf.as_bytes(), &[0x1e]);
    assert_eq!(buf.as_slice().tag(), TypeTag::MinKey);

    let buf = build(Value::MaxKey);
    assert_eq!(buf.as_bytes(), &[0x1f]);
    assert_eq!(buf.as_slice().tag(), TypeTag::MaxKey);
}

#[test]
fn test_external() {
    let target = [0x18u8];
    let buf = build(Value::External(target.as_ptr()));
    assert_eq!(buf.as_bytes().len(), 9);
    assert_eq!(buf.as_bytes()[0], 0x1d);
    assert_eq!(buf.as_slice().as_external().unwrap(), target.as_ptr());
}

#[test]
fn test_value_bytes() {
    let buf = build(Value::String("abc"));
    assert_eq!(buf.as_slice().value_bytes().unwrap(), buf.as_bytes());
    assert_eq!(buf.as_slice().byte_size().unwrap(), 4);
}
