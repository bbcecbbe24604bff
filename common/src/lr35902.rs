use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};

use crate::decoder::{field, AluOp, ByteSource, Cond, Decoded, Fields, FmtWithPc, RotOp};
use crate::error::{EmulatorError, OpcodeTable, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum Reg {
    B = 0,
    C,
    D,
    E,
    H,
    L,
    A = 7,
}

impl fmt::Display for Reg {
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
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(u8),
    Ind(Pair),
    // (HL+) and (HL-): HL is adjusted after the access.
    HlInc,
    HlDec,
    Abs(u16),
    // 0xff00 page, by immediate or by C.
    High(u8),
    HighC,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::Imm(n) => write!(f, "{n:#04x}"),
            Operand::Ind(p) => write!(f, "({p})"),
            Operand::HlInc => write!(f, "(hl+)"),
            Operand::HlDec => write!(f, "(hl-)"),
            Operand::Abs(nn) => write!(f, "({nn:#06x})"),
            Operand::High(n) => write!(f, "(0xff00+{n:#04x})"),
            Operand::HighC => write!(f, "(0xff00+c)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Nop,
    Stop,
    Halt,
    Ld(Operand, Operand),
    LdPairImm(Pair, u16),
    StSp(u16),
    LdSpHl,
    LdHlSp(i8),
    AddHl(Pair),
    AddSp(i8),
    IncPair(Pair),
    DecPair(Pair),
    Inc(Operand),
    Dec(Operand),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Alu(AluOp, Operand),
    Rot(RotOp, Operand),
    Swap(Operand),
    Bit(u8, Operand),
    Res(u8, Operand),
    Set(u8, Operand),
    Jp(Option<Cond>, u16),
    JpHl,
    Jr(Option<Cond>, i8),
    Call(Option<Cond>, u16),
    Ret(Option<Cond>),
    Reti,
    Rst(u8),
    Push(Pair),
    Pop(Pair),
    Di,
    Ei,
}

impl Ins {
    fn fmt_opt_pc(&self, f: &mut fmt::Formatter, pc: Option<u16>) -> fmt::Result {
        use Ins::*;
        match self {
            Nop => write!(f, "nop"),
            Stop => write!(f, "stop"),
            Halt => write!(f, "halt"),
            Ld(dst, src) => write!(f, "ld {dst}, {src}"),
            LdPairImm(p, nn) => write!(f, "ld {p}, {nn:#06x}"),
            StSp(nn) => write!(f, "ld ({nn:#06x}), sp"),
            LdSpHl => write!(f, "ld sp, hl"),
            LdHlSp(e) => write!(f, "ld hl, sp{e:+}"),
            AddHl(p) => write!(f, "add hl, {p}"),
            AddSp(e) => write!(f, "add sp, {e}"),
            IncPair(p) => write!(f, "inc {p}"),
            DecPair(p) => write!(f, "dec {p}"),
            Inc(op) => write!(f, "inc {op}"),
            Dec(op) => write!(f, "dec {op}"),
            Rlca => write!(f, "rlca"),
            Rrca => write!(f, "rrca"),
            Rla => write!(f, "rla"),
            Rra => write!(f, "rra"),
            Daa => write!(f, "daa"),
            Cpl => write!(f, "cpl"),
            Scf => write!(f, "scf"),
            Ccf => write!(f, "ccf"),
            Alu(op @ (AluOp::Add | AluOp::Adc | AluOp::Sbc), src) => write!(f, "{op} a, {src}"),
            Alu(op, src) => write!(f, "{op} {src}"),
            Rot(op, target) => write!(f, "{op} {target}"),
            Swap(target) => write!(f, "swap {target}"),
            Bit(b, target) => write!(f, "bit {b}, {target}"),
            Res(b, target) => write!(f, "res {b}, {target}"),
            Set(b, target) => write!(f, "set {b}, {target}"),
            Jp(None, nn) => write!(f, "jp {nn:#06x}"),
            Jp(Some(cc), nn) => write!(f, "jp {cc}, {nn:#06x}"),
            JpHl => write!(f, "jp hl"),
            Jr(cc, d) => {
                write!(f, "jr ")?;
                if let Some(cc) = cc {
                    write!(f, "{cc}, ")?;
                }
                let off = (*d as i16) + 2;
                match pc {
                    Some(pc) => write!(f, "{:#06x}", pc.wrapping_add(off as u16)),
                    None if off < 0 => write!(f, "$-{:#x}", off.unsigned_abs()),
                    None => write!(f, "$+{off:#x}"),
                }
            }
            Call(None, nn) => write!(f, "call {nn:#06x}"),
            Call(Some(cc), nn) => write!(f, "call {cc}, {nn:#06x}"),
            Ret(None) => write!(f, "ret"),
            Ret(Some(cc)) => write!(f, "ret {cc}"),
            Reti => write!(f, "reti"),
            Rst(n) => write!(f, "rst {n:#04x}"),
            Push(p) => write!(f, "push {p}"),
            Pop(p) => write!(f, "pop {p}"),
            Di => write!(f, "di"),
            Ei => write!(f, "ei"),
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

fn reg_operand(code: u8, opcode: u8, table: OpcodeTable) -> Result<Operand> {
    if code == 6 {
        return Ok(Operand::Ind(Pair::Hl));
    }
    Ok(Operand::Reg(field::<Reg>(code, opcode, table)?))
}

fn rp(p: u8) -> Pair {
    [Pair::Bc, Pair::De, Pair::Hl, Pair::Sp][p as usize]
}

fn rp2(p: u8) -> Pair {
    [Pair::Bc, Pair::De, Pair::Hl, Pair::Af][p as usize]
}

pub fn decode(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    if opcode == 0xcb {
        return decode_bits(src);
    }

    let table = OpcodeTable::Root;
    let Fields { x, y, z, p, q } = Fields::of(opcode);
    let r = |code: u8| reg_operand(code, opcode, table);
    let cond = |code: u8| field::<Cond>(code, opcode, table);
    let alu = |code: u8| field::<AluOp>(code, opcode, table);
    let a = Operand::Reg(Reg::A);

    let ins = match x {
        0 => match z {
            0 => match y {
                0 => Ins::Nop,
                1 => Ins::StSp(src.next_word()),
                2 => {
                    // STOP is two bytes long.
                    src.next();
                    Ins::Stop
                }
                3 => Ins::Jr(None, src.next() as i8),
                _ => Ins::Jr(Some(cond(y - 4)?), src.next() as i8),
            },
            1 if q == 0 => Ins::LdPairImm(rp(p), src.next_word()),
            1 => Ins::AddHl(rp(p)),
            2 => {
                let mem = match p {
                    0 => Operand::Ind(Pair::Bc),
                    1 => Operand::Ind(Pair::De),
                    2 => Operand::HlInc,
                    _ => Operand::HlDec,
                };
                if q == 0 { Ins::Ld(mem, a) } else { Ins::Ld(a, mem) }
            }
            3 if q == 0 => Ins::IncPair(rp(p)),
            3 => Ins::DecPair(rp(p)),
            4 => Ins::Inc(r(y)?),
            5 => Ins::Dec(r(y)?),
            6 => Ins::Ld(r(y)?, Operand::Imm(src.next())),
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
        1 if y == 6 && z == 6 => Ins::Halt,
        1 => Ins::Ld(r(y)?, r(z)?),
        2 => Ins::Alu(alu(y)?, r(z)?),
        _ => match z {
            0 => match y {
                0..=3 => Ins::Ret(Some(cond(y)?)),
                4 => Ins::Ld(Operand::High(src.next()), a),
                5 => Ins::AddSp(src.next() as i8),
                6 => Ins::Ld(a, Operand::High(src.next())),
                _ => Ins::LdHlSp(src.next() as i8),
            },
            1 if q == 0 => Ins::Pop(rp2(p)),
            1 => match p {
                0 => Ins::Ret(None),
                1 => Ins::Reti,
                2 => Ins::JpHl,
                _ => Ins::LdSpHl,
            },
            2 => match y {
                0..=3 => Ins::Jp(Some(cond(y)?), src.next_word()),
                4 => Ins::Ld(Operand::HighC, a),
                5 => Ins::Ld(Operand::Abs(src.next_word()), a),
                6 => Ins::Ld(a, Operand::HighC),
                _ => Ins::Ld(a, Operand::Abs(src.next_word())),
            },
            3 => match y {
                0 => Ins::Jp(None, src.next_word()),
                6 => Ins::Di,
                7 => Ins::Ei,
                _ => return Err(EmulatorError::unrecognized(opcode, table)),
            },
            4 if y < 4 => Ins::Call(Some(cond(y)?), src.next_word()),
            5 if q == 0 => Ins::Push(rp2(p)),
            5 if p == 0 => Ins::Call(None, src.next_word()),
            6 => Ins::Alu(alu(y)?, Operand::Imm(src.next())),
            7 => Ins::Rst(y * 8),
            _ => return Err(EmulatorError::unrecognized(opcode, table)),
        },
    };
    Ok(Decoded::root(ins, opcode))
}

fn decode_bits(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    let table = OpcodeTable::Bits;
    let Fields { x, y, z, .. } = Fields::of(opcode);
    let target = reg_operand(z, opcode, table)?;
    let ins = match x {
        0 if y == 6 => Ins::Swap(target),
        0 => Ins::Rot(field::<RotOp>(y, opcode, table)?, target),
        1 => Ins::Bit(y, target),
        2 => Ins::Res(y, target),
        _ => Ins::Set(y, target),
    };
    Ok(Decoded { ins, table, opcode })
}
