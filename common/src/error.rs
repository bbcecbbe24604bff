use std::fmt;

use thiserror::Error;

// Which dispatch table a fetched opcode was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeTable {
    Root,
    Bits,
    Extended,
    Indexed,
    IndexedBits,
}

impl fmt::Display for OpcodeTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpcodeTable::IndexedBits => write!(f, "indexed bits"),
            _ => write!(f, "{}", format!("{:?}", self).to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulatorError {
    #[error("Unrecognized opcode {opcode:#04x} in the {table} table")]
    UnrecognizedOpcode { opcode: u16, table: OpcodeTable },

    #[error("Illegal port {0:#04x}")]
    IllegalPort(u16),

    #[error("Programming error: {0}")]
    ProgrammingError(String),

    #[error("Unable to parse breakpoint from line {0:?}")]
    InvalidBreakpoint(String),

    #[error("Pop from an empty stack")]
    StackUnderflow,
}

impl EmulatorError {
    pub fn unrecognized(opcode: impl Into<u16>, table: OpcodeTable) -> Self {
        EmulatorError::UnrecognizedOpcode { opcode: opcode.into(), table }
    }

    pub fn programming(msg: impl Into<String>) -> Self {
        EmulatorError::ProgrammingError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EmulatorError>;
