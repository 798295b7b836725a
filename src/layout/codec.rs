use super::{Field, Fields, Layout, Value};
use crate::core::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

impl Layout {
    /// Decodes from the start of `data`, returning the value and the number of
    /// bytes consumed. Fails before reading anything if `data` is shorter than
    /// the layout span.
    pub fn decode(&self, data: &[u8]) -> Result<(Value, usize)> {
        let span = self.span()?;
        if data.len() < span {
            return Err(Error::truncated(span, data.len()));
        }
        let mut offset = 0;
        let value = decode_at(self, data, &mut offset, None, "")?;
        Ok((value, offset))
    }

    /// Appends the encoding of `value`. Nothing is appended on error.
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        self.span()?;
        let mut scratch = Vec::new();
        encode_into(self, value, None, "", &mut scratch)?;
        out.extend_from_slice(&scratch);
        Ok(())
    }

    pub fn encode_to_vec(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(value, &mut out)?;
        Ok(out)
    }
}

fn path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn take<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| Error::truncated(usize::MAX, data.len()))?;
    let bytes = data
        .get(*offset..end)
        .ok_or_else(|| Error::truncated(end, data.len()))?;
    *offset = end;
    Ok(bytes)
}

fn take_array<const N: usize>(data: &[u8], offset: &mut usize) -> Result<[u8; N]> {
    let bytes = take(data, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

fn decode_at(
    layout: &Layout,
    data: &[u8],
    offset: &mut usize,
    siblings: Option<&Fields>,
    name: &str,
) -> Result<Value> {
    let value = match layout {
        Layout::U8 => Value::Uint(take_array::<1>(data, offset)?[0] as u128),
        Layout::U16 => Value::Uint(u16::from_le_bytes(take_array(data, offset)?) as u128),
        Layout::U32 => Value::Uint(u32::from_le_bytes(take_array(data, offset)?) as u128),
        Layout::U64 => Value::Uint(u64::from_le_bytes(take_array(data, offset)?) as u128),
        Layout::U128 => Value::Uint(u128::from_le_bytes(take_array(data, offset)?)),
        Layout::I64 => Value::Int(i64::from_le_bytes(take_array(data, offset)?) as i128),
        Layout::Bool => Value::Bool(take_array::<1>(data, offset)?[0] != 0),
        Layout::Pubkey => Value::Pubkey(Pubkey::new_from_array(take_array(data, offset)?)),
        Layout::Blob(n) => Value::Bytes(take(data, offset, *n)?.to_vec()),
        Layout::Struct(fields) => Value::Struct(decode_struct(fields, data, offset, name)?),
        Layout::Array(item, n) => Value::List(decode_items(item, *n, data, offset, name)?),
        Layout::Vec(item) => {
            let count = u32::from_le_bytes(take_array(data, offset)?) as usize;
            Value::List(decode_items(item, count, data, offset, name)?)
        }
        Layout::Seq { item, count } => {
            let siblings = siblings.ok_or_else(|| {
                Error::InvalidLayout(format!("sequence '{}' outside of a struct", name))
            })?;
            let count = usize::try_from(siblings.uint(count)?)
                .map_err(|_| Error::malformed(format!("count of '{}' does not fit usize", name)))?;
            Value::List(decode_items(item, count, data, offset, name)?)
        }
    };
    Ok(value)
}

fn decode_struct(
    fields: &[Field],
    data: &[u8],
    offset: &mut usize,
    parent: &str,
) -> Result<Fields> {
    let mut out = Fields::new();
    for f in fields {
        let name = path(parent, f.name);
        let value = decode_at(&f.layout, data, offset, Some(&out), &name)?;
        out.set(f.name, value);
    }
    Ok(out)
}

fn decode_items(
    item: &Layout,
    count: usize,
    data: &[u8],
    offset: &mut usize,
    name: &str,
) -> Result<Vec<Value>> {
    // Reject impossible counts before allocating for them.
    let width = item.span()?;
    let needed = width
        .checked_mul(count)
        .and_then(|n| n.checked_add(*offset))
        .ok_or_else(|| Error::truncated(usize::MAX, data.len()))?;
    if needed > data.len() {
        return Err(Error::truncated(needed, data.len()));
    }
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        items.push(decode_at(item, data, offset, None, &format!("{}[{}]", name, i))?);
    }
    Ok(items)
}

fn overflow(name: &str, value: impl ToString, width: usize) -> Error {
    Error::FieldOverflow {
        field: name.to_string(),
        value: value.to_string(),
        width,
    }
}

fn mismatch(name: &str, expected: &'static str) -> Error {
    Error::TypeMismatch {
        field: name.to_string(),
        expected,
    }
}

fn uint_of(value: &Value, name: &str, max: u128, width: usize) -> Result<u128> {
    match value {
        Value::Uint(v) if *v <= max => Ok(*v),
        Value::Uint(v) => Err(overflow(name, v, width)),
        _ => Err(mismatch(name, "unsigned integer")),
    }
}

fn encode_into(
    layout: &Layout,
    value: &Value,
    siblings: Option<&Fields>,
    name: &str,
    out: &mut Vec<u8>,
) -> Result<()> {
    match layout {
        Layout::U8 => out.push(uint_of(value, name, u8::MAX as u128, 1)? as u8),
        Layout::U16 => {
            let v = uint_of(value, name, u16::MAX as u128, 2)? as u16;
            out.extend_from_slice(&v.to_le_bytes());
        }
        Layout::U32 => {
            let v = uint_of(value, name, u32::MAX as u128, 4)? as u32;
            out.extend_from_slice(&v.to_le_bytes());
        }
        Layout::U64 => {
            let v = uint_of(value, name, u64::MAX as u128, 8)? as u64;
            out.extend_from_slice(&v.to_le_bytes());
        }
        Layout::U128 => {
            let v = uint_of(value, name, u128::MAX, 16)?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        Layout::I64 => match value {
            Value::Int(v) => {
                let v = i64::try_from(*v).map_err(|_| overflow(name, v, 8))?;
                out.extend_from_slice(&v.to_le_bytes());
            }
            _ => return Err(mismatch(name, "signed integer")),
        },
        Layout::Bool => match value {
            Value::Bool(b) => out.push(u8::from(*b)),
            _ => return Err(mismatch(name, "bool")),
        },
        Layout::Pubkey => match value {
            Value::Pubkey(key) => out.extend_from_slice(key.as_ref()),
            _ => return Err(mismatch(name, "pubkey")),
        },
        Layout::Blob(n) => match value {
            Value::Bytes(bytes) if bytes.len() == *n => out.extend_from_slice(bytes),
            Value::Bytes(bytes) if bytes.len() > *n => {
                return Err(overflow(name, format!("of {} bytes", bytes.len()), *n))
            }
            _ => return Err(mismatch(name, "bytes of the declared width")),
        },
        Layout::Struct(fields) => {
            let values = match value {
                Value::Struct(values) => values,
                _ => return Err(mismatch(name, "struct")),
            };
            for f in fields.iter() {
                let child = path(name, f.name);
                let v = values
                    .get(f.name)
                    .map_err(|_| Error::MissingField(child.clone()))?;
                encode_into(&f.layout, v, Some(values), &child, out)?;
            }
        }
        Layout::Array(item, n) => {
            let items = list_of(value, name)?;
            if items.len() != *n {
                return Err(mismatch(name, "list of the declared length"));
            }
            encode_items(item, items, name, out)?;
        }
        Layout::Vec(item) => {
            let items = list_of(value, name)?;
            let len = u32::try_from(items.len()).map_err(|_| overflow(name, items.len(), 4))?;
            out.extend_from_slice(&len.to_le_bytes());
            encode_items(item, items, name, out)?;
        }
        Layout::Seq { item, count } => {
            let items = list_of(value, name)?;
            let siblings = siblings.ok_or_else(|| {
                Error::InvalidLayout(format!("sequence '{}' outside of a struct", name))
            })?;
            if siblings.uint(count)? != items.len() as u128 {
                return Err(mismatch(name, "list length equal to its count field"));
            }
            encode_items(item, items, name, out)?;
        }
    }
    Ok(())
}

fn list_of<'a>(value: &'a Value, name: &str) -> Result<&'a [Value]> {
    match value {
        Value::List(items) => Ok(items),
        _ => Err(mismatch(name, "list")),
    }
}

fn encode_items(item: &Layout, items: &[Value], name: &str, out: &mut Vec<u8>) -> Result<()> {
    for (i, v) in items.iter().enumerate() {
        encode_into(item, v, None, &format!("{}[{}]", name, i), out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::field;
    use proptest::prelude::*;

    const ENTRY: Layout =
        Layout::Struct(&[field("reserve", Layout::Pubkey), field("amount", Layout::U64)]);
    const SAMPLE: Layout = Layout::Struct(&[
        field("version", Layout::U8),
        field("flag", Layout::Bool),
        field("delta", Layout::I64),
        field("wads", Layout::U128),
        field("pair", Layout::Array(&Layout::U16, 2)),
        field("len", Layout::U8),
        field("entries", Layout::Seq { item: &ENTRY, count: "len" }),
    ]);

    fn sample(entries: usize) -> Fields {
        let list = (0..entries)
            .map(|i| {
                Value::Struct(
                    Fields::new()
                        .with("reserve", Pubkey::new_from_array([i as u8 + 1; 32]))
                        .with("amount", 10 * i as u64),
                )
            })
            .collect();
        Fields::new()
            .with("version", 1u8)
            .with("flag", true)
            .with("delta", -42i64)
            .with("wads", 7u128 * 10u128.pow(18))
            .with("pair", Value::List(vec![Value::Uint(3), Value::Uint(4)]))
            .with("len", entries as u8)
            .with("entries", Value::List(list))
    }

    #[test]
    fn test_offsets_are_little_endian_and_packed() {
        let bytes = SAMPLE.encode_to_vec(&Value::Struct(sample(1))).unwrap();
        assert_eq!(bytes.len(), 1 + 1 + 8 + 16 + 4 + 1 + 40);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[2..10], &(-42i64).to_le_bytes());
        assert_eq!(&bytes[26..28], &3u16.to_le_bytes());
        assert_eq!(bytes[30], 1);
        assert_eq!(&bytes[31..63], &[1u8; 32]);
    }

    #[test]
    fn test_decode_matches_encode() {
        let fields = sample(2);
        let bytes = SAMPLE.encode_to_vec(&Value::Struct(fields.clone())).unwrap();
        let (value, consumed) = SAMPLE.decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(value, Value::Struct(fields));
    }

    #[test]
    fn test_nonzero_bool_is_true() {
        let (value, _) = Layout::Bool.decode(&[7]).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_short_buffer_is_truncated() {
        let bytes = SAMPLE.encode_to_vec(&Value::Struct(sample(0))).unwrap();
        let err = SAMPLE.decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err, Error::truncated(bytes.len(), bytes.len() - 1));
    }

    #[test]
    fn test_seq_count_overrunning_buffer_is_truncated() {
        let mut bytes = SAMPLE.encode_to_vec(&Value::Struct(sample(1))).unwrap();
        bytes[30] = 200;
        assert!(matches!(SAMPLE.decode(&bytes), Err(Error::TruncatedBuffer { .. })));
    }

    #[test]
    fn test_u8_overflow_rejected() {
        const ARGS: Layout = Layout::Struct(&[field("bump", Layout::U8)]);
        let mut out = vec![0xAA];
        let err = ARGS
            .encode(&Value::Struct(Fields::new().with("bump", 256u64)), &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            Error::FieldOverflow {
                field: "bump".to_string(),
                value: "256".to_string(),
                width: 1
            }
        );
        assert_eq!(out, vec![0xAA]);
    }

    #[test]
    fn test_encode_reports_missing_nested_field() {
        let mut fields = sample(1);
        fields.set("entries", Value::List(vec![Value::Struct(Fields::new().with("amount", 1u64))]));
        let err = SAMPLE.encode_to_vec(&Value::Struct(fields)).unwrap_err();
        assert_eq!(err, Error::MissingField("entries[0].reserve".to_string()));
    }

    #[test]
    fn test_seq_count_must_match_list() {
        let mut fields = sample(2);
        fields.set("len", 3u8);
        assert!(matches!(
            SAMPLE.encode_to_vec(&Value::Struct(fields)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_vec_is_u32_prefixed() {
        const V: Layout = Layout::Vec(&Layout::U16);
        let bytes = V.encode_to_vec(&Value::List(vec![Value::Uint(1), Value::Uint(2)])).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 1, 0, 2, 0]);
        let (value, consumed) = V.decode(&bytes).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(value, Value::List(vec![Value::Uint(1), Value::Uint(2)]));
    }

    #[test]
    fn test_blob_width_enforced() {
        let err = Layout::Blob(4).encode_to_vec(&Value::Bytes(vec![0; 5])).unwrap_err();
        assert!(matches!(err, Error::FieldOverflow { width: 4, .. }));
        let err = Layout::Blob(4).encode_to_vec(&Value::Bytes(vec![0; 3])).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    proptest! {
        #[test]
        fn decode_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 70..120)) {
            let first = SAMPLE.decode(&bytes);
            let second = SAMPLE.decode(&bytes);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn u64_field_survives(v in any::<u64>()) {
            let bytes = Layout::U64.encode_to_vec(&Value::Uint(v as u128)).unwrap();
            prop_assert_eq!(Layout::U64.decode(&bytes).unwrap(), (Value::Uint(v as u128), 8));
        }
    }
}
