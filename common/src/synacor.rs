use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::decoder::{Decoded, Source};
use crate::error::{EmulatorError, OpcodeTable, Result};

pub const MEMORY_SIZE: usize = 1 << 15;
pub const MODULUS: u16 = 1 << 15;
pub const NUM_REGS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    Halt = 0,
    Set,
    Push,
    Pop,
    Eq,
    Gt,
    Jmp,
    Jt,
    Jf,
    Add,
    Mult,
    Mod,
    And,
    Or,
    Not,
    Rmem,
    Wmem,
    Call,
    Ret,
    Out,
    In,
    Noop,
}

impl Opcode {
    pub fn num_args(self) -> usize {
        use Opcode::*;
        match self {
            Halt | Ret | Noop => 0,
            Push | Pop | Jmp | Call | Out | In => 1,
            Set | Jt | Jf | Not | Rmem | Wmem => 2,
            Eq | Gt | Add | Mult | Mod | And | Or => 3,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// Values 0..=32767 are literals, 32768..=32775 name registers 0..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Lit(u16),
    Reg(u8),
}

impl Arg {
    pub fn from_word(word: u16) -> Option<Arg> {
        match word {
            0..MODULUS => Some(Arg::Lit(word)),
            _ if ((word - MODULUS) as usize) < NUM_REGS => Some(Arg::Reg((word - MODULUS) as u8)),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arg::Lit(n) => write!(f, "{n}"),
            Arg::Reg(r) => write!(f, "r{r}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ins {
    pub op: Opcode,
    pub args: Vec<Arg>,
}

impl Ins {
    // The register a destination operand names.
    pub fn dst(&self) -> Result<usize> {
        match self.args.first() {
            Some(Arg::Reg(r)) => Ok(*r as usize),
            _ => Err(EmulatorError::unrecognized(self.op as u16, OpcodeTable::Root)),
        }
    }

    pub fn len(&self) -> u16 {
        1 + self.args.len() as u16
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            // `out` takes a character.
            match (self.op, arg) {
                (Opcode::Out, Arg::Lit(c)) if (0x20..0x7f).contains(c) => {
                    write!(f, "{sep}'{}'", *c as u8 as char)?
                }
                (Opcode::Out, Arg::Lit(10)) => write!(f, "{sep}'\\n'")?,
                _ => write!(f, "{sep}{arg}")?,
            }
        }
        Ok(())
    }
}

pub fn decode(src: &mut impl Source<u16>) -> Result<Decoded<Ins>> {
    let word = src.next_opcode();
    let op = Opcode::from_u16(word)
        .ok_or(EmulatorError::unrecognized(word, OpcodeTable::Root))?;
    let mut args = Vec::with_capacity(op.num_args());
    for _ in 0..op.num_args() {
        let arg = Arg::from_word(src.next())
            .ok_or(EmulatorError::unrecognized(word, OpcodeTable::Root))?;
        args.push(arg);
    }
    Ok(Decoded::root(Ins { op, args }, word as u8))
}
