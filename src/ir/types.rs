//! Value types carried by variables and expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar class of a value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    Int,
    UInt,
    Float,
    /// Opaque pointer or buffer reference.
    Handle,
}

/// A value type: scalar class, bit width and vector lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub code: TypeCode,
    pub bits: u8,
    pub lanes: u16,
}

impl DataType {
    pub const fn new(code: TypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const fn int(bits: u8) -> Self {
        Self::new(TypeCode::Int, bits, 1)
    }

    pub const fn uint(bits: u8) -> Self {
        Self::new(TypeCode::UInt, bits, 1)
    }

    pub const fn float(bits: u8) -> Self {
        Self::new(TypeCode::Float, bits, 1)
    }

    pub const fn bool() -> Self {
        Self::uint(1)
    }

    pub const fn handle() -> Self {
        Self::new(TypeCode::Handle, 64, 1)
    }

    /// Vector variant of this type with `lanes` lanes.
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self::new(self.code, self.bits, lanes)
    }

    pub fn is_handle(&self) -> bool {
        self.code == TypeCode::Handle
    }

    pub fn is_float(&self) -> bool {
        self.code == TypeCode::Float
    }

    pub fn is_bool(&self) -> bool {
        self.code == TypeCode::UInt && self.bits == 1
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            TypeCode::Handle => return write!(f, "handle"),
            TypeCode::UInt if self.bits == 1 => write!(f, "bool")?,
            TypeCode::Int => write!(f, "int{}", self.bits)?,
            TypeCode::UInt => write!(f, "uint{}", self.bits)?,
            TypeCode::Float => write!(f, "float{}", self.bits)?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(DataType::int(32).to_string(), "int32");
        assert_eq!(DataType::float(16).with_lanes(4).to_string(), "float16x4");
        assert_eq!(DataType::bool().to_string(), "bool");
        assert_eq!(DataType::handle().to_string(), "handle");
    }

    #[test]
    fn test_handle_classification() {
        assert!(DataType::handle().is_handle());
        assert!(!DataType::int(64).is_handle());
        assert!(!DataType::float(32).is_handle());
    }

    #[test]
    fn test_unsigned_and_float_classification() {
        assert_eq!(DataType::uint(8).to_string(), "uint8");
        assert!(!DataType::uint(8).is_bool());
        assert_eq!(DataType::uint(1), DataType::bool());
        assert!(DataType::float(64).is_float());
        assert!(!DataType::uint(32).is_float());
    }
}
