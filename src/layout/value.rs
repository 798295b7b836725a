use crate::core::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

/// A decoded field value. Integers are widened so one variant covers every width;
/// the layout decides how many bytes they occupy on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u128),
    Int(i128),
    Bool(bool),
    Pubkey(Pubkey),
    Bytes(Vec<u8>),
    Struct(Fields),
    List(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uint(_) => "unsigned integer",
            Value::Int(_) => "signed integer",
            Value::Bool(_) => "bool",
            Value::Pubkey(_) => "pubkey",
            Value::Bytes(_) => "bytes",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
        }
    }

    pub fn into_struct(self, name: &str) -> Result<Fields> {
        match self {
            Value::Struct(fields) => Ok(fields),
            _ => Err(Error::TypeMismatch {
                field: name.to_string(),
                expected: "struct",
            }),
        }
    }
}

macro_rules! value_from_uint {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Uint(v as u128)
            }
        })*
    };
}

value_from_uint!(u8, u16, u32, u64, u128);

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v as i128)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Pubkey> for Value {
    fn from(v: Pubkey) -> Self {
        Value::Pubkey(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Value::Struct(v)
    }
}

/// Ordered name -> value list produced by a struct layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(&'static str, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Fields::set`].
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Replaces the value under `name`, or appends it when absent.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::MissingField(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::MissingField(name.to_string()))
    }

    /// Any unsigned field regardless of its declared width.
    pub fn uint(&self, name: &str) -> Result<u128> {
        match self.get(name)? {
            Value::Uint(v) => Ok(*v),
            _ => Err(mismatch(name, "unsigned integer")),
        }
    }

    pub fn u8(&self, name: &str) -> Result<u8> {
        u8::try_from(self.uint(name)?).map_err(|_| mismatch(name, "u8"))
    }

    pub fn u16(&self, name: &str) -> Result<u16> {
        u16::try_from(self.uint(name)?).map_err(|_| mismatch(name, "u16"))
    }

    pub fn u32(&self, name: &str) -> Result<u32> {
        u32::try_from(self.uint(name)?).map_err(|_| mismatch(name, "u32"))
    }

    pub fn u64(&self, name: &str) -> Result<u64> {
        u64::try_from(self.uint(name)?).map_err(|_| mismatch(name, "u64"))
    }

    pub fn u128(&self, name: &str) -> Result<u128> {
        self.uint(name)
    }

    pub fn i64(&self, name: &str) -> Result<i64> {
        match self.get(name)? {
            Value::Int(v) => i64::try_from(*v).map_err(|_| mismatch(name, "i64")),
            _ => Err(mismatch(name, "signed integer")),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            Value::Bool(v) => Ok(*v),
            _ => Err(mismatch(name, "bool")),
        }
    }

    pub fn pubkey(&self, name: &str) -> Result<Pubkey> {
        match self.get(name)? {
            Value::Pubkey(v) => Ok(*v),
            _ => Err(mismatch(name, "pubkey")),
        }
    }

    pub fn bytes(&self, name: &str) -> Result<&[u8]> {
        match self.get(name)? {
            Value::Bytes(v) => Ok(v),
            _ => Err(mismatch(name, "bytes")),
        }
    }

    pub fn record(&self, name: &str) -> Result<&Fields> {
        match self.get(name)? {
            Value::Struct(v) => Ok(v),
            _ => Err(mismatch(name, "struct")),
        }
    }

    pub fn record_mut(&mut self, name: &str) -> Result<&mut Fields> {
        match self.get_mut(name)? {
            Value::Struct(v) => Ok(v),
            _ => Err(mismatch(name, "struct")),
        }
    }

    pub fn list(&self, name: &str) -> Result<&[Value]> {
        match self.get(name)? {
            Value::List(v) => Ok(v),
            _ => Err(mismatch(name, "list")),
        }
    }
}

fn mismatch(field: &str, expected: &'static str) -> Error {
    Error::TypeMismatch {
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let key = Pubkey::new_unique();
        let fields = Fields::new()
            .with("bump", 254u8)
            .with("amount", 1_000u64)
            .with("ts", -5i64)
            .with("owner", key)
            .with("paused", true);

        assert_eq!(fields.u8("bump").unwrap(), 254);
        assert_eq!(fields.u64("amount").unwrap(), 1_000);
        assert_eq!(fields.i64("ts").unwrap(), -5);
        assert_eq!(fields.pubkey("owner").unwrap(), key);
        assert!(fields.bool("paused").unwrap());
        assert_eq!(
            fields.names().collect::<Vec<_>>(),
            vec!["bump", "amount", "ts", "owner", "paused"]
        );
    }

    #[test]
    fn test_missing_and_mismatched() {
        let fields = Fields::new().with("amount", 300u64);
        assert_eq!(fields.u64("nope"), Err(Error::MissingField("nope".to_string())));
        assert!(matches!(fields.u8("amount"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(fields.pubkey("amount"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut fields = Fields::new().with("a", 1u8).with("b", 2u8);
        fields.set("a", 9u8);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.u8("a").unwrap(), 9);
        assert_eq!(fields.names().next(), Some("a"));
    }
}
