use std::fmt;

use crate::decoder::{Decoded, Source};
use crate::error::{EmulatorError, OpcodeTable, Result};

pub const MEMORY_SIZE: usize = 100;
pub const MAX_VALUE: u16 = 999;

// Mailbox instructions. Addresses are cell numbers 0..=99.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Hlt,
    // A 0xx cell with a nonzero argument is data, but still halts if run.
    Dat(u16),
    Add(u8),
    Sub(u8),
    Sta(u8),
    Lda(u8),
    Bra(u8),
    Brz(u8),
    Brp(u8),
    Inp,
    Out,
    Otc,
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Ins::*;
        match self {
            Hlt => write!(f, "hlt"),
            Dat(n) => write!(f, "dat {n}"),
            Add(addr) => write!(f, "add {addr:02}"),
            Sub(addr) => write!(f, "sub {addr:02}"),
            Sta(addr) => write!(f, "sta {addr:02}"),
            Lda(addr) => write!(f, "lda {addr:02}"),
            Bra(addr) => write!(f, "bra {addr:02}"),
            Brz(addr) => write!(f, "brz {addr:02}"),
            Brp(addr) => write!(f, "brp {addr:02}"),
            Inp => write!(f, "inp"),
            Out => write!(f, "out"),
            Otc => write!(f, "otc"),
        }
    }
}

pub fn decode(src: &mut impl Source<u16>) -> Result<Decoded<Ins>> {
    let word = src.next_opcode();
    decode_word(word)
}

pub fn decode_word(word: u16) -> Result<Decoded<Ins>> {
    if word > MAX_VALUE {
        return Err(EmulatorError::unrecognized(word, OpcodeTable::Root));
    }
    let opcode = (word / 100) as u8;
    let addr = (word % 100) as u8;
    let ins = match opcode {
        0 if addr == 0 => Ins::Hlt,
        0 => Ins::Dat(word),
        1 => Ins::Add(addr),
        2 => Ins::Sub(addr),
        3 => Ins::Sta(addr),
        5 => Ins::Lda(addr),
        6 => Ins::Bra(addr),
        7 => Ins::Brz(addr),
        8 => Ins::Brp(addr),
        9 => match addr {
            1 => Ins::Inp,
            2 => Ins::Out,
            22 => Ins::Otc,
            _ => return Err(EmulatorError::unrecognized(word, OpcodeTable::Root)),
        },
        _ => return Err(EmulatorError::unrecognized(word, OpcodeTable::Root)),
    };
    Ok(Decoded::root(ins, opcode))
}
