use std::fmt;

use derive_more::IsVariant;
use num_derive::{FromPrimitive, ToPrimitive};

use crate::decoder::{field, AluOp, ByteSource, Cond, Decoded, Fields, FmtWithPc, RotOp};
use crate::error::{EmulatorError, OpcodeTable, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    I,
    R,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum Index {
    Ix,
    Iy,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pair {
    Bc,
    De,
    Hl,
    Sp,
    Af,
    Ix,
    Iy,
}

impl Pair {
    pub fn of_index(index: Index) -> Pair {
        match index {
            Index::Ix => Pair::Ix,
            Index::Iy => Pair::Iy,
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// An 8-bit location or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Operand {
    Reg(Reg),
    Imm(u8),
    Ind(Pair),
    Idx(Index, i8),
    Abs(u16),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::Imm(n) => write!(f, "{n:#04x}"),
            Operand::Ind(p) => write!(f, "({p})"),
            Operand::Idx(index, d) if *d < 0 => write!(f, "({index}-{:#04x})", d.unsigned_abs()),
            Operand::Idx(index, d) => write!(f, "({index}+{d:#04x})"),
            Operand::Abs(nn) => write!(f, "({nn:#06x})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum BlockKind {
    Ld = 0,
    Cp,
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub dec: bool,
    pub repeat: bool,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dir = if self.dec { 'd' } else { 'i' };
        let repeat = if self.repeat { "r" } else { "" };
        match (self.kind, self.repeat) {
            (BlockKind::Out, true) => write!(f, "ot{dir}r"),
            (BlockKind::Out, false) => write!(f, "out{dir}"),
            (kind, _) => write!(f, "{}{dir}{repeat}", format!("{kind:?}").to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Nop,
    Halt,
    Ld(Operand, Operand),
    LdPairImm(Pair, u16),
    LdPairInd(Pair, u16),
    StPair(u16, Pair),
    LdSp(Pair),
    Push(Pair),
    Pop(Pair),
    ExAf,
    Exx,
    ExDeHl,
    ExSp(Pair),
    Alu(AluOp, Operand),
    Inc(Operand),
    Dec(Operand),
    IncPair(Pair),
    DecPair(Pair),
    AddPair(Pair, Pair),
    AdcPair(Pair),
    SbcPair(Pair),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Neg,
    // The register is the undocumented DDCB/FDCB copy-back target.
    Rot(RotOp, Operand, Option<Reg>),
    Bit(u8, Operand),
    Res(u8, Operand, Option<Reg>),
    Set(u8, Operand, Option<Reg>),
    Rld,
    Rrd,
    Jp(Option<Cond>, u16),
    JpInd(Pair),
    Jr(Option<Cond>, i8),
    Djnz(i8),
    Call(Option<Cond>, u16),
    Ret(Option<Cond>),
    Reti,
    Retn,
    Rst(u8),
    InImm(u8),
    InC(Option<Reg>),
    OutImm(u8),
    OutC(Option<Reg>),
    Di,
    Ei,
    Im(u8),
    Block(Block),
}

impl Ins {
    fn fmt_target(f: &mut fmt::Formatter, pc: Option<u16>, d: i8) -> fmt::Result {
        let off = (d as i16) + 2;
        match pc {
            Some(pc) => write!(f, "{:#06x}", pc.wrapping_add(off as u16)),
            None if off < 0 => write!(f, "$-{:#x}", off.unsigned_abs()),
            None => write!(f, "$+{off:#x}"),
        }
    }

    fn fmt_copy(f: &mut fmt::Formatter, copy: &Option<Reg>) -> fmt::Result {
        match copy {
            Some(r) => write!(f, ", {r}"),
            None => Ok(()),
        }
    }

    fn fmt_opt_pc(&self, f: &mut fmt::Formatter, pc: Option<u16>) -> fmt::Result {
        use Ins::*;
        match self {
            Nop => write!(f, "nop"),
            Halt => write!(f, "halt"),
            Ld(dst, src) => write!(f, "ld {dst}, {src}"),
            LdPairImm(p, nn) => write!(f, "ld {p}, {nn:#06x}"),
            LdPairInd(p, nn) => write!(f, "ld {p}, ({nn:#06x})"),
            StPair(nn, p) => write!(f, "ld ({nn:#06x}), {p}"),
            LdSp(p) => write!(f, "ld sp, {p}"),
            Push(p) => write!(f, "push {p}"),
            Pop(p) => write!(f, "pop {p}"),
            ExAf => write!(f, "ex af, af'"),
            Exx => write!(f, "exx"),
            ExDeHl => write!(f, "ex de, hl"),
            ExSp(p) => write!(f, "ex (sp), {p}"),
            Alu(op @ (AluOp::Add | AluOp::Adc | AluOp::Sbc), src) => write!(f, "{op} a, {src}"),
            Alu(op, src) => write!(f, "{op} {src}"),
            Inc(op) => write!(f, "inc {op}"),
            Dec(op) => write!(f, "dec {op}"),
            IncPair(p) => write!(f, "inc {p}"),
            DecPair(p) => write!(f, "dec {p}"),
            AddPair(dst, src) => write!(f, "add {dst}, {src}"),
            AdcPair(p) => write!(f, "adc hl, {p}"),
            SbcPair(p) => write!(f, "sbc hl, {p}"),
            Rlca => write!(f, "rlca"),
            Rrca => write!(f, "rrca"),
            Rla => write!(f, "rla"),
            Rra => write!(f, "rra"),
            Daa => write!(f, "daa"),
            Cpl => write!(f, "cpl"),
            Scf => write!(f, "scf"),
            Ccf => write!(f, "ccf"),
            Neg => write!(f, "neg"),
            Rot(op, target, copy) => {
                write!(f, "{op} {target}")?;
                Self::fmt_copy(f, copy)
            }
            Bit(b, target) => write!(f, "bit {b}, {target}"),
            Res(b, target, copy) => {
                write!(f, "res {b}, {target}")?;
                Self::fmt_copy(f, copy)
            }
            Set(b, target, copy) => {
                write!(f, "set {b}, {target}")?;
                Self::fmt_copy(f, copy)
            }
            Rld => write!(f, "rld"),
            Rrd => write!(f, "rrd"),
            Jp(None, nn) => write!(f, "jp {nn:#06x}"),
            Jp(Some(cc), nn) => write!(f, "jp {cc}, {nn:#06x}"),
            JpInd(p) => write!(f, "jp ({p})"),
            Jr(None, d) => {
                write!(f, "jr ")?;
                Self::fmt_target(f, pc, *d)
            }
            Jr(Some(cc), d) => {
                write!(f, "jr {cc}, ")?;
                Self::fmt_target(f, pc, *d)
            }
            Djnz(d) => {
                write!(f, "djnz ")?;
                Self::fmt_target(f, pc, *d)
            }
            Call(None, nn) => write!(f, "call {nn:#06x}"),
            Call(Some(cc), nn) => write!(f, "call {cc}, {nn:#06x}"),
            Ret(None) => write!(f, "ret"),
            Ret(Some(cc)) => write!(f, "ret {cc}"),
            Reti => write!(f, "reti"),
            Retn => write!(f, "retn"),
            Rst(n) => write!(f, "rst {n:#04x}"),
            InImm(port) => write!(f, "in a, ({port:#04x})"),
            InC(Some(r)) => write!(f, "in {r}, (c)"),
            InC(None) => write!(f, "in (c)"),
            OutImm(port) => write!(f, "out ({port:#04x}), a"),
            OutC(Some(r)) => write!(f, "out (c), {r}"),
            OutC(None) => write!(f, "out (c), 0"),
            Di => write!(f, "di"),
            Ei => write!(f, "ei"),
            Im(mode) => write!(f, "im {mode}"),
            Block(block) => write!(f, "{block}"),
        }
    }
}

impl FmtWithPc for Ins {
    fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result {
        self.fmt_opt_pc(f, Some(pc))
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_opt_pc(f, None)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Decoding

const IM_MODES: [u8; 8] = [0, 0, 1, 2, 0, 0, 1, 2];

fn plain_reg(code: u8, opcode: u8, table: OpcodeTable) -> Result<Reg> {
    Ok(match code {
        0 => Reg::B,
        1 => Reg::C,
        2 => Reg::D,
        3 => Reg::E,
        4 => Reg::H,
        5 => Reg::L,
        7 => Reg::A,
        _ => return Err(EmulatorError::unrecognized(opcode, table)),
    })
}

// The r[] table, with H/L/(HL) swapped for the index register halves and
// (IX+d) when a DD/FD prefix is in effect.
fn reg_operand(
    code: u8,
    index: Option<Index>,
    opcode: u8,
    src: &mut impl ByteSource,
) -> Result<Operand> {
    Ok(match (code, index) {
        (4, Some(Index::Ix)) => Operand::Reg(Reg::Ixh),
        (5, Some(Index::Ix)) => Operand::Reg(Reg::Ixl),
        (4, Some(Index::Iy)) => Operand::Reg(Reg::Iyh),
        (5, Some(Index::Iy)) => Operand::Reg(Reg::Iyl),
        (6, Some(index)) => Operand::Idx(index, src.next() as i8),
        (6, None) => Operand::Ind(Pair::Hl),
        (code, _) => Operand::Reg(plain_reg(code, opcode, OpcodeTable::Root)?),
    })
}

fn hl(index: Option<Index>) -> Pair {
    index.map(Pair::of_index).unwrap_or(Pair::Hl)
}

fn rp(p: u8, index: Option<Index>) -> Pair {
    match p {
        0 => Pair::Bc,
        1 => Pair::De,
        2 => hl(index),
        _ => Pair::Sp,
    }
}

fn rp2(p: u8, index: Option<Index>) -> Pair {
    match p {
        3 => Pair::Af,
        p => rp(p, index),
    }
}

pub fn decode(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    decode_opcode(opcode, src)
}

// Decodes with an opcode that was supplied rather than fetched (interrupt
// mode 0). Any further bytes still come from `src`.
pub fn decode_opcode(opcode: u8, src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    match opcode {
        0xcb => decode_bits(src),
        0xed => decode_extended(src),
        0xdd => decode_indexed(Index::Ix, src),
        0xfd => decode_indexed(Index::Iy, src),
        _ => Ok(Decoded::root(decode_main(opcode, None, src)?, opcode)),
    }
}

fn decode_indexed(index: Index, src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    match opcode {
        0xcb => decode_indexed_bits(index, src),
        // Chained prefixes are not supported.
        0xdd | 0xed | 0xfd => Err(EmulatorError::unrecognized(opcode, OpcodeTable::Indexed)),
        _ => {
            let ins = decode_main(opcode, Some(index), src)?;
            Ok(Decoded { ins, table: OpcodeTable::Indexed, opcode })
        }
    }
}

// The unprefixed table. With an index register, HL-based operands are
// substituted; opcodes that don't touch HL decode as their unprefixed twin.
fn decode_main(opcode: u8, index: Option<Index>, src: &mut impl ByteSource) -> Result<Ins> {
    let table = if index.is_some() { OpcodeTable::Indexed } else { OpcodeTable::Root };
    let Fields { x, y, z, p, q } = Fields::of(opcode);
    let cond = |code: u8| field::<Cond>(code, opcode, table);
    let alu = |code: u8| field::<AluOp>(code, opcode, table);

    let ins = match x {
        0 => match z {
            0 => match y {
                0 => Ins::Nop,
                1 => Ins::ExAf,
                2 => Ins::Djnz(src.next() as i8),
                3 => Ins::Jr(None, src.next() as i8),
                _ => Ins::Jr(Some(cond(y - 4)?), src.next() as i8),
            },
            1 if q == 0 => Ins::LdPairImm(rp(p, index), src.next_word()),
            1 => Ins::AddPair(hl(index), rp(p, index)),
            2 => match (q, p) {
                (0, 0) => Ins::Ld(Operand::Ind(Pair::Bc), Operand::Reg(Reg::A)),
                (0, 1) => Ins::Ld(Operand::Ind(Pair::De), Operand::Reg(Reg::A)),
                (0, 2) => Ins::StPair(src.next_word(), hl(index)),
                (0, _) => Ins::Ld(Operand::Abs(src.next_word()), Operand::Reg(Reg::A)),
                (_, 0) => Ins::Ld(Operand::Reg(Reg::A), Operand::Ind(Pair::Bc)),
                (_, 1) => Ins::Ld(Operand::Reg(Reg::A), Operand::Ind(Pair::De)),
                (_, 2) => Ins::LdPairInd(hl(index), src.next_word()),
                (_, _) => Ins::Ld(Operand::Reg(Reg::A), Operand::Abs(src.next_word())),
            },
            3 if q == 0 => Ins::IncPair(rp(p, index)),
            3 => Ins::DecPair(rp(p, index)),
            4 => Ins::Inc(reg_operand(y, index, opcode, src)?),
            5 => Ins::Dec(reg_operand(y, index, opcode, src)?),
            6 => {
                let dst = reg_operand(y, index, opcode, src)?;
                Ins::Ld(dst, Operand::Imm(src.next()))
            }
            _ => [
                Ins::Rlca,
                Ins::Rrca,
                Ins::Rla,
                Ins::Rra,
                Ins::Daa,
                Ins::Cpl,
                Ins::Scf,
                Ins::Ccf,
            ][y as usize],
        },
        1 => match (y, z) {
            (6, 6) => Ins::Halt,
            // With a memory operand the other side keeps plain H/L.
            (6, _) => {
                let dst = reg_operand(6, index, opcode, src)?;
                Ins::Ld(dst, reg_operand(z, None, opcode, src)?)
            }
            (_, 6) => {
                let dst = reg_operand(y, None, opcode, src)?;
                Ins::Ld(dst, reg_operand(6, index, opcode, src)?)
            }
            _ => {
                let dst = reg_operand(y, index, opcode, src)?;
                Ins::Ld(dst, reg_operand(z, index, opcode, src)?)
            }
        },
        2 => Ins::Alu(alu(y)?, reg_operand(z, index, opcode, src)?),
        _ => match z {
            0 => Ins::Ret(Some(cond(y)?)),
            1 if q == 0 => Ins::Pop(rp2(p, index)),
            1 => match p {
                0 => Ins::Ret(None),
                1 => Ins::Exx,
                2 => Ins::JpInd(hl(index)),
                _ => Ins::LdSp(hl(index)),
            },
            2 => Ins::Jp(Some(cond(y)?), src.next_word()),
            3 => match y {
                0 => Ins::Jp(None, src.next_word()),
                1 => return Err(EmulatorError::unrecognized(opcode, table)),
                2 => Ins::OutImm(src.next()),
                3 => Ins::InImm(src.next()),
                4 => Ins::ExSp(hl(index)),
                5 => Ins::ExDeHl,
                6 => Ins::Di,
                _ => Ins::Ei,
            },
            4 => Ins::Call(Some(cond(y)?), src.next_word()),
            5 if q == 0 => Ins::Push(rp2(p, index)),
            5 if p == 0 => Ins::Call(None, src.next_word()),
            5 => return Err(EmulatorError::unrecognized(opcode, table)),
            6 => Ins::Alu(alu(y)?, Operand::Imm(src.next())),
            _ => Ins::Rst(y * 8),
        },
    };
    Ok(ins)
}

fn bit_ins(opcode: u8, target: Operand, copy: Option<Reg>, table: OpcodeTable) -> Result<Ins> {
    let Fields { x, y, .. } = Fields::of(opcode);
    Ok(match x {
        0 => Ins::Rot(field::<RotOp>(y, opcode, table)?, target, copy),
        1 => Ins::Bit(y, target),
        2 => Ins::Res(y, target, copy),
        _ => Ins::Set(y, target, copy),
    })
}

fn decode_bits(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    let target = reg_operand(opcode & 0x7, None, opcode, src)?;
    let ins = bit_ins(opcode, target, None, OpcodeTable::Bits)?;
    Ok(Decoded { ins, table: OpcodeTable::Bits, opcode })
}

// DD CB d op: the displacement comes before the opcode, and the opcode byte
// is not an M1 fetch.
fn decode_indexed_bits(index: Index, src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let d = src.next() as i8;
    let opcode = src.next();
    let z = opcode & 0x7;
    let copy = if z == 6 { None } else { Some(plain_reg(z, opcode, OpcodeTable::IndexedBits)?) };
    let ins = bit_ins(opcode, Operand::Idx(index, d), copy, OpcodeTable::IndexedBits)?;
    Ok(Decoded { ins, table: OpcodeTable::IndexedBits, opcode })
}

fn decode_extended(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    let table = OpcodeTable::Extended;
    let Fields { x, y, z, p, q } = Fields::of(opcode);
    let ins = match (x, z) {
        (1, 0) if y == 6 => Ins::InC(None),
        (1, 0) => Ins::InC(Some(plain_reg(y, opcode, table)?)),
        (1, 1) if y == 6 => Ins::OutC(None),
        (1, 1) => Ins::OutC(Some(plain_reg(y, opcode, table)?)),
        (1, 2) if q == 0 => Ins::SbcPair(rp(p, None)),
        (1, 2) => Ins::AdcPair(rp(p, None)),
        (1, 3) if q == 0 => Ins::StPair(src.next_word(), rp(p, None)),
        (1, 3) => Ins::LdPairInd(rp(p, None), src.next_word()),
        (1, 4) => Ins::Neg,
        (1, 5) if y == 1 => Ins::Reti,
        (1, 5) => Ins::Retn,
        (1, 6) => Ins::Im(IM_MODES[y as usize]),
        (1, _) => match y {
            0 => Ins::Ld(Operand::Reg(Reg::I), Operand::Reg(Reg::A)),
            1 => Ins::Ld(Operand::Reg(Reg::R), Operand::Reg(Reg::A)),
            2 => Ins::Ld(Operand::Reg(Reg::A), Operand::Reg(Reg::I)),
            3 => Ins::Ld(Operand::Reg(Reg::A), Operand::Reg(Reg::R)),
            4 => Ins::Rrd,
            5 => Ins::Rld,
            _ => Ins::Nop,
        },
        (2, 0..=3) if y >= 4 => Ins::Block(Block {
            kind: field::<BlockKind>(z, opcode, table)?,
            dec: y & 0x1 != 0,
            repeat: y >= 6,
        }),
        _ => return Err(EmulatorError::unrecognized(opcode, table)),
    };
    Ok(Decoded { ins, table, opcode })
}
