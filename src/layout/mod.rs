//! Static account/instruction schema.
//!
//! Layouts are `const` trees of [`Layout`] nodes; [`codec`] walks them to turn
//! raw account bytes into [`Fields`] and back.

pub mod codec;
pub mod discriminator;
pub mod instruction;
pub mod record;
pub mod value;

pub use discriminator::Discriminator;
pub use instruction::{decode_args, InstructionSpec};
pub use record::AccountRecord;
pub use value::{Fields, Value};

use crate::core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    U8,
    U16,
    U32,
    U64,
    U128,
    I64,
    /// One byte, nonzero is true.
    Bool,
    Pubkey,
    Blob(usize),
    Struct(&'static [Field]),
    Array(&'static Layout, usize),
    /// u32 little-endian count followed by the items.
    Vec(&'static Layout),
    /// Items counted by an earlier sibling field of the enclosing struct.
    Seq {
        item: &'static Layout,
        count: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub layout: Layout,
}

pub const fn field(name: &'static str, layout: Layout) -> Field {
    Field { name, layout }
}

impl Layout {
    /// True when the encoded width depends on the data.
    pub fn is_variable(&self) -> bool {
        match self {
            Layout::Vec(_) | Layout::Seq { .. } => true,
            Layout::Array(item, _) => item.is_variable(),
            Layout::Struct(fields) => fields.iter().any(|f| f.layout.is_variable()),
            _ => false,
        }
    }

    /// Byte width of a fixed layout. For a layout that ends in a variable
    /// field this is the width of everything before it plus any length prefix.
    pub fn span(&self) -> Result<usize> {
        match self {
            Layout::U8 | Layout::Bool => Ok(1),
            Layout::U16 => Ok(2),
            Layout::U32 => Ok(4),
            Layout::U64 | Layout::I64 => Ok(8),
            Layout::U128 => Ok(16),
            Layout::Pubkey => Ok(32),
            Layout::Blob(n) => Ok(*n),
            Layout::Array(item, n) => {
                if item.is_variable() {
                    return Err(Error::InvalidLayout(
                        "array items must have a fixed width".to_string(),
                    ));
                }
                item.span()?
                    .checked_mul(*n)
                    .ok_or_else(|| Error::InvalidLayout("array span overflows usize".to_string()))
            }
            Layout::Vec(item) => {
                fixed_item(item)?;
                Ok(4)
            }
            Layout::Seq { item, .. } => {
                fixed_item(item)?;
                Ok(0)
            }
            Layout::Struct(fields) => {
                let mut total = 0usize;
                for (i, f) in fields.iter().enumerate() {
                    if f.layout.is_variable() && i + 1 != fields.len() {
                        return Err(Error::InvalidLayout(format!(
                            "variable-length field '{}' must be the last field",
                            f.name
                        )));
                    }
                    if let Layout::Seq { count, .. } = f.layout {
                        if !fields[..i].iter().any(|prev| prev.name == count) {
                            return Err(Error::InvalidLayout(format!(
                                "sequence '{}' counts by '{}' which is not an earlier field",
                                f.name, count
                            )));
                        }
                    }
                    total += f.layout.span()?;
                }
                Ok(total)
            }
        }
    }

    /// Width of the fixed part before any variable tail, length prefix excluded.
    pub fn min_span(&self) -> Result<usize> {
        self.span()?;
        match self {
            Layout::Vec(_) | Layout::Seq { .. } => Ok(0),
            Layout::Struct(fields) => fields
                .iter()
                .map(|f| if f.layout.is_variable() { f.layout.min_span() } else { f.layout.span() })
                .sum(),
            _ => self.span(),
        }
    }

    /// All-zero value of this layout; variable-length parts are empty.
    pub fn zeroed(&self) -> Value {
        match self {
            Layout::U8 | Layout::U16 | Layout::U32 | Layout::U64 | Layout::U128 => Value::Uint(0),
            Layout::I64 => Value::Int(0),
            Layout::Bool => Value::Bool(false),
            Layout::Pubkey => Value::Pubkey(solana_sdk::pubkey::Pubkey::default()),
            Layout::Blob(n) => Value::Bytes(vec![0; *n]),
            Layout::Struct(fields) => {
                let mut out = Fields::new();
                for f in fields.iter() {
                    out.set(f.name, f.layout.zeroed());
                }
                Value::Struct(out)
            }
            Layout::Array(item, n) => Value::List((0..*n).map(|_| item.zeroed()).collect()),
            Layout::Vec(_) | Layout::Seq { .. } => Value::List(Vec::new()),
        }
    }

    /// [`Layout::zeroed`] for a struct layout, unwrapped.
    pub fn zeroed_fields(&self) -> Result<Fields> {
        self.zeroed().into_struct("layout")
    }
}

fn fixed_item(item: &Layout) -> Result<()> {
    if item.is_variable() {
        return Err(Error::InvalidLayout(
            "sequence items must have a fixed width".to_string(),
        ));
    }
    item.span().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INNER: Layout = Layout::Struct(&[field("a", Layout::U64), field("b", Layout::Pubkey)]);
    const OUTER: Layout = Layout::Struct(&[
        field("version", Layout::U8),
        field("inner", INNER),
        field("pair", Layout::Array(&Layout::U16, 2)),
        field("pad", Layout::Blob(5)),
    ]);

    #[test]
    fn test_fixed_spans() {
        assert_eq!(INNER.span().unwrap(), 40);
        assert_eq!(OUTER.span().unwrap(), 1 + 40 + 4 + 5);
        assert!(!OUTER.is_variable());
    }

    #[test]
    fn test_variable_field_must_be_last() {
        const BAD: Layout = Layout::Struct(&[
            field("items", Layout::Vec(&Layout::U8)),
            field("after", Layout::U8),
        ]);
        assert!(matches!(BAD.span(), Err(Error::InvalidLayout(_))));

        const GOOD: Layout = Layout::Struct(&[
            field("after", Layout::U8),
            field("items", Layout::Vec(&Layout::U64)),
        ]);
        assert_eq!(GOOD.span().unwrap(), 5);
        assert_eq!(GOOD.min_span().unwrap(), 1);
        assert_eq!(OUTER.min_span().unwrap(), OUTER.span().unwrap());
        assert!(GOOD.is_variable());
    }

    #[test]
    fn test_seq_count_must_precede() {
        const BAD: Layout = Layout::Struct(&[
            field("items", Layout::Seq { item: &Layout::U8, count: "len" }),
        ]);
        assert!(matches!(BAD.span(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_zeroed_shape() {
        let fields = OUTER.zeroed_fields().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields.record("inner").unwrap().u64("a").unwrap(), 0);
        assert_eq!(fields.list("pair").unwrap().len(), 2);
        assert_eq!(fields.bytes("pad").unwrap(), &[0u8; 5]);
    }
}
