use std::fmt;
use std::marker::PhantomData;

use common::decoder::{FmtWithPc, SliceSource};
use common::error::Result;
use common::misc::words_from_bytes;
use common::{i8080, lmc, lr35902, synacor, z80};

use clap::ValueEnum;

// One instruction set's view of a binary. The decoders are the same ones the
// emulator executes with.
pub trait Decoder {
    type Data: Copy + Default;

    // Decodes the instruction at `addr`, leaving `src` after it.
    fn decode(src: &mut SliceSource<'_, Self::Data>, addr: u16) -> Result<String>;

    // Shown for a value that doesn't decode.
    fn unknown(val: Self::Data) -> String;

    // Decimal addresses instead of hex.
    const DECIMAL: bool = false;
}

pub struct I8080;
pub struct Z80;
pub struct Lr35902;
pub struct Lmc;
pub struct Synacor;

impl Decoder for I8080 {
    type Data = u8;

    fn decode(src: &mut SliceSource<'_, u8>, _addr: u16) -> Result<String> {
        Ok(i8080::decode(src)?.ins.to_string())
    }

    fn unknown(val: u8) -> String {
        format!("db {val:#04x}")
    }
}

impl Decoder for Z80 {
    type Data = u8;

    fn decode(src: &mut SliceSource<'_, u8>, addr: u16) -> Result<String> {
        Ok(z80::decode(src)?.ins.display_with_pc(addr).to_string())
    }

    fn unknown(val: u8) -> String {
        format!("db {val:#04x}")
    }
}

impl Decoder for Lr35902 {
    type Data = u8;

    fn decode(src: &mut SliceSource<'_, u8>, addr: u16) -> Result<String> {
        Ok(lr35902::decode(src)?.ins.display_with_pc(addr).to_string())
    }

    fn unknown(val: u8) -> String {
        format!("db {val:#04x}")
    }
}

impl Decoder for Lmc {
    type Data = u16;
    const DECIMAL: bool = true;

    fn decode(src: &mut SliceSource<'_, u16>, _addr: u16) -> Result<String> {
        Ok(lmc::decode(src)?.ins.to_string())
    }

    fn unknown(val: u16) -> String {
        format!("dat {val}")
    }
}

impl Decoder for Synacor {
    type Data = u16;

    fn decode(src: &mut SliceSource<'_, u16>, _addr: u16) -> Result<String> {
        Ok(synacor::decode(src)?.ins.to_string())
    }

    fn unknown(val: u16) -> String {
        format!("dw {val}")
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub addr: u16,
    pub text: String,
    decimal: bool,
}

// "address\tmnemonic", the form breakpoints are parsed from.
impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.decimal {
            write!(f, "{:02}\t{}", self.addr, self.text)
        } else {
            write!(f, "{:04x}\t{}", self.addr, self.text)
        }
    }
}

// A binary to walk. Each call to `disassemble` starts again from the top.
pub struct Disassembler<'a, T: Decoder> {
    input: &'a [T::Data],
    origin: u16,
}

impl<'a, T: Decoder> Disassembler<'a, T> {
    pub fn new(input: &'a [T::Data], origin: u16) -> Self {
        Disassembler { input, origin }
    }

    pub fn disassemble(&self) -> Disassembly<'a, T> {
        Disassembly { input: self.input, origin: self.origin, pos: 0, _isa: PhantomData }
    }
}

pub struct Disassembly<'a, T: Decoder> {
    input: &'a [T::Data],
    origin: u16,
    pos: usize,
    _isa: PhantomData<T>,
}

impl<T: Decoder> Iterator for Disassembly<'_, T> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let val = *self.input.get(self.pos)?;
        let addr = self.origin.wrapping_add(self.pos as u16);
        let mut src = SliceSource::at(self.input, self.pos);
        let text = match T::decode(&mut src, addr) {
            Ok(text) => {
                self.pos = src.pos();
                text
            }
            Err(_) => {
                self.pos += 1;
                T::unknown(val)
            }
        };
        Some(Line { addr, text, decimal: T::DECIMAL })
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Isa {
    I8080,
    Z80,
    Lr35902,
    Lmc,
    Synacor,
}

// Disassembles a raw file. The word machines store little-endian words.
pub fn disassemble(isa: Isa, bin: &[u8], origin: u16) -> Vec<Line> {
    match isa {
        Isa::I8080 => Disassembler::<I8080>::new(bin, origin).disassemble().collect(),
        Isa::Z80 => Disassembler::<Z80>::new(bin, origin).disassemble().collect(),
        Isa::Lr35902 => Disassembler::<Lr35902>::new(bin, origin).disassemble().collect(),
        Isa::Lmc => {
            let words = words_from_bytes(bin);
            Disassembler::<Lmc>::new(&words, origin).disassemble().collect()
        }
        Isa::Synacor => {
            let words = words_from_bytes(bin);
            Disassembler::<Synacor>::new(&words, origin).disassemble().collect()
        }
    }
}
