//! JSON interchange.
//!
//! The inverse direction, rendering an encoded value as JSON text, lives in
//! [`dump`](crate::dump) and is reached through [`Slice::format`](crate::Slice::format).

use crate::builder::BuildResult;
use crate::{BpackBuf, BuildError, Builder, Options, Value};
use serde_json::Value as JsonValue;

impl BpackBuf {
    /// Parses a JSON document into an encoded buffer.
    ///
    /// Arrays are built indexed; objects are built indexed and sorted, which
    /// is the canonical form. `serde_json` keeps the last value of a
    /// repeated key, so the input reaching the builder is duplicate-free.
    #[inline]
    pub fn parse_json(json: &str) -> BuildResult<BpackBuf> {
        BpackBuf::parse_json_with(json, Options::new())
    }

    /// Like [`parse_json`](BpackBuf::parse_json), with explicit policies.
    pub fn parse_json_with(json: &str, options: Options) -> BuildResult<BpackBuf> {
        let value: JsonValue = serde_json::from_str(json).map_err(BuildError::JsonError)?;
        let mut builder = Builder::with_options(options);
        write_json(&mut builder, &value)?;
        builder.finish()
    }
}

impl TryFrom<&JsonValue> for BpackBuf {
    type Error = BuildError;

    #[inline]
    fn try_from(value: &JsonValue) -> BuildResult<BpackBuf> {
        let mut builder = Builder::new();
        write_json(&mut builder, value)?;
        builder.finish()
    }
}

fn write_json(builder: &mut Builder, value: &JsonValue) -> BuildResult<()> {
    match value {
        JsonValue::Null => {
            builder.add_value(Value::Null)?;
        }
        JsonValue::Bool(v) => {
            builder.add_value(Value::Bool(*v))?;
        }
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                builder.add_value(Value::Int(v))?;
            } else if let Some(v) = n.as_u64() {
                builder.add_value(Value::UInt(v))?;
            } else {
                // json numbers are always finite, so this cannot fall back
                // to a rejected double
                match n.as_f64() {
                    Some(v) => builder.add_value(Value::Double(v))?,
                    None => return Err(BuildError::NonFiniteDouble),
                };
            }
        }
        JsonValue::String(s) => {
            builder.add_value(Value::String(s))?;
        }
        JsonValue::Array(items) => {
            builder.open_array(true)?;
            for item in items {
                write_json(builder, item)?;
            }
            builder.close()?;
        }
        JsonValue::Object(map) => {
            builder.open_object(true, true)?;
            for (key, member) in map {
                builder.add_key(key)?;
                write_json(builder, member)?;
            }
            builder.close()?;
        }
    }
    Ok(())
}
