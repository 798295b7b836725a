use super::{Discriminator, Field, Fields, Layout, Value};
use crate::core::error::{Error, Result};
use borsh::BorshDeserialize;

/// Wire description of one program instruction: tag plus ordered arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionSpec {
    pub name: &'static str,
    pub discriminator: Discriminator,
    pub args: &'static [Field],
}

impl InstructionSpec {
    pub const fn new(
        name: &'static str,
        discriminator: Discriminator,
        args: &'static [Field],
    ) -> Self {
        Self {
            name,
            discriminator,
            args,
        }
    }

    pub const fn args_layout(&self) -> Layout {
        Layout::Struct(self.args)
    }

    /// Discriminator followed by the little-endian arguments.
    pub fn encode(&self, args: &Fields) -> Result<Vec<u8>> {
        let layout = self.args_layout();
        let mut data = Vec::with_capacity(self.discriminator.width() + layout.span()?);
        self.discriminator.write(&mut data);
        layout.encode(&Value::Struct(args.clone()), &mut data)?;
        Ok(data)
    }

    /// Inverse of [`InstructionSpec::encode`] through the schema.
    pub fn decode(&self, data: &[u8]) -> Result<Fields> {
        let body = self.discriminator.strip(data, self.name)?;
        let (value, consumed) = self.args_layout().decode(body)?;
        if consumed != body.len() {
            return Err(Error::malformed(format!(
                "{}: {} trailing bytes after arguments",
                self.name,
                body.len() - consumed
            )));
        }
        value.into_struct(self.name)
    }
}

/// Decodes the argument portion of `data` into a borsh type, independently
/// of the schema encoder.
pub fn decode_args<T: BorshDeserialize>(spec: &InstructionSpec, data: &[u8]) -> Result<T> {
    let body = spec.discriminator.strip(data, spec.name)?;
    T::try_from_slice(body).map_err(|e| Error::malformed(format!("{} arguments: {}", spec.name, e)))
}
