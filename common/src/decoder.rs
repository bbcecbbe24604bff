use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::error::{EmulatorError, OpcodeTable, Result};
use crate::misc::to_u16;

// Where a decoder pulls its bytes (or words) from. The executor implements
// this over live memory and the program counter, the disassembler over a
// plain slice, so both walk instructions identically.
pub trait Source<D = u8> {
    fn next(&mut self) -> D;

    // An M1 (opcode) fetch. Only differs from `next` on cores that count them.
    fn next_opcode(&mut self) -> D {
        self.next()
    }
}

pub trait ByteSource: Source<u8> {
    fn next_word(&mut self) -> u16 {
        let low = self.next();
        let high = self.next();
        to_u16(high, low)
    }
}

impl<T: Source<u8> + ?Sized> ByteSource for T {}

////////////////////////////////////////////////////////////////////////////////

// Reads past the end yield the default value.
pub struct SliceSource<'a, D> {
    input: &'a [D],
    pos: usize,
}

impl<'a, D: Copy + Default> SliceSource<'a, D> {
    pub fn new(input: &'a [D]) -> Self {
        SliceSource { input, pos: 0 }
    }

    pub fn at(input: &'a [D], pos: usize) -> Self {
        SliceSource { input, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<D: Copy + Default> Source<D> for SliceSource<'_, D> {
    fn next(&mut self) -> D {
        let val = self.input.get(self.pos).copied().unwrap_or_default();
        self.pos += 1;
        val
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<I> {
    pub ins: I,
    pub table: OpcodeTable,
    pub opcode: u8,
}

impl<I> Decoded<I> {
    pub fn root(ins: I, opcode: u8) -> Self {
        Decoded { ins, table: OpcodeTable::Root, opcode }
    }
}

////////////////////////////////////////////////////////////////////////////////

pub trait FmtWithPc {
    fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result;

    fn display_with_pc(&self, pc: u16) -> WithPc<'_, Self>
    where
        Self: Sized,
    {
        WithPc { ins: self, pc }
    }
}

pub struct WithPc<'a, I> {
    ins: &'a I,
    pc: u16,
}

impl<I: FmtWithPc> fmt::Display for WithPc<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.ins.fmt_with_pc(f, self.pc)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Operand fields shared by the 8080 family. Discriminants are the 3-bit
// encodings in the opcode.

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum AluOp {
    Add = 0,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Cond {
    Nz = 0,
    Z,
    Nc,
    C,
    Po,
    Pe,
    P,
    M,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// Sll is undocumented on the Z80; the LR35902 puts Swap in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RotOp {
    Rlc = 0,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

impl fmt::Display for RotOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// Splits an opcode into the x/y/z/p/q fields the 8080 family encodes with.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub p: u8,
    pub q: u8,
}

impl Fields {
    pub fn of(opcode: u8) -> Self {
        let y = (opcode >> 3) & 0x7;
        Fields { x: opcode >> 6, y, z: opcode & 0x7, p: y >> 1, q: y & 0x1 }
    }
}

// Looks up an opcode field in one of the enums above.
pub fn field<T: FromPrimitive>(val: u8, opcode: u8, table: OpcodeTable) -> Result<T> {
    T::from_u8(val).ok_or(EmulatorError::unrecognized(opcode, table))
}
