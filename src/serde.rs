//! Impl the `serde::Serialize` and `serde::Deserialize` traits.

use crate::{BpackBuf, Options, Validator};
use std::fmt::Formatter;

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for BpackBuf {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        if serializer.is_human_readable() {
            let json = self.as_slice().to_json().map_err(serde::ser::Error::custom)?;
            json.serialize(serializer)
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for BpackBuf {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct BpackBufVisitor;

        impl<'de> serde::de::Visitor<'de> for BpackBufVisitor {
            type Value = BpackBuf;

            #[inline]
            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                write!(formatter, "an encoded value")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<BpackBuf, E>
            where
                E: serde::de::Error,
            {
                BpackBuf::parse_json(v).map_err(serde::de::Error::custom)
            }

            /// Bytes come from outside the process, so they are validated
            /// before being adopted.
            #[inline]
            fn visit_bytes<E>(self, v: &[u8]) -> Result<BpackBuf, E>
            where
                E: serde::de::Error,
            {
                Validator::new(Options::new()).validate(v).map_err(serde::de::Error::custom)?;
                let mut buf = Vec::new();
                buf.try_reserve(v.len()).map_err(serde::de::Error::custom)?;
                buf.extend_from_slice(v);
                let res = unsafe { BpackBuf::new_unchecked(buf) };
                Ok(res)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BpackBufVisitor)
        } else {
            deserializer.deserialize_bytes(BpackBufVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde() {
        let buf = BpackBuf::parse_json(r#"[123, true, null, "abc"]"#).unwrap();

        let bin = bincode::serialize(&buf).unwrap();
        let bin_buf: BpackBuf = bincode::deserialize(&bin).unwrap();

        assert_eq!(bin_buf, buf);
    }
}
