use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};

use crate::decoder::{field, AluOp, ByteSource, Cond, Decoded, Fields};
use crate::error::{OpcodeTable, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Reg {
    B = 0,
    C,
    D,
    E,
    H,
    L,
    M, // (HL)
    A,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RegPair {
    B = 0,
    D,
    H,
    Sp,
}

impl fmt::Display for RegPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum StackPair {
    B = 0,
    D,
    H,
    Psw,
}

impl fmt::Display for StackPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ins {
    Nop,
    Lxi(RegPair, u16),
    Stax(RegPair),
    Ldax(RegPair),
    Shld(u16),
    Lhld(u16),
    Sta(u16),
    Lda(u16),
    Inx(RegPair),
    Dcx(RegPair),
    Inr(Reg),
    Dcr(Reg),
    Mvi(Reg, u8),
    Dad(RegPair),
    Rlc,
    Rrc,
    Ral,
    Rar,
    Daa,
    Cma,
    Stc,
    Cmc,
    Mov(Reg, Reg),
    Hlt,
    Alu(AluOp, Reg),
    AluImm(AluOp, u8),
    Ret(Option<Cond>),
    Jmp(Option<Cond>, u16),
    Call(Option<Cond>, u16),
    Pop(StackPair),
    Push(StackPair),
    Rst(u8),
    Pchl,
    Sphl,
    Xthl,
    Xchg,
    Out(u8),
    In(u8),
    Di,
    Ei,
}

fn alu_mnemonic(op: AluOp, imm: bool) -> &'static str {
    use AluOp::*;
    match (op, imm) {
        (Add, false) => "add",
        (Adc, false) => "adc",
        (Sub, false) => "sub",
        (Sbc, false) => "sbb",
        (And, false) => "ana",
        (Xor, false) => "xra",
        (Or, false) => "ora",
        (Cp, false) => "cmp",
        (Add, true) => "adi",
        (Adc, true) => "aci",
        (Sub, true) => "sui",
        (Sbc, true) => "sbi",
        (And, true) => "ani",
        (Xor, true) => "xri",
        (Or, true) => "ori",
        (Cp, true) => "cpi",
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Ins::*;
        match self {
            Nop => write!(f, "nop"),
            Lxi(rp, nn) => write!(f, "lxi {rp}, {nn:#06x}"),
            Stax(rp) => write!(f, "stax {rp}"),
            Ldax(rp) => write!(f, "ldax {rp}"),
            Shld(nn) => write!(f, "shld {nn:#06x}"),
            Lhld(nn) => write!(f, "lhld {nn:#06x}"),
            Sta(nn) => write!(f, "sta {nn:#06x}"),
            Lda(nn) => write!(f, "lda {nn:#06x}"),
            Inx(rp) => write!(f, "inx {rp}"),
            Dcx(rp) => write!(f, "dcx {rp}"),
            Inr(r) => write!(f, "inr {r}"),
            Dcr(r) => write!(f, "dcr {r}"),
            Mvi(r, n) => write!(f, "mvi {r}, {n:#04x}"),
            Dad(rp) => write!(f, "dad {rp}"),
            Rlc => write!(f, "rlc"),
            Rrc => write!(f, "rrc"),
            Ral => write!(f, "ral"),
            Rar => write!(f, "rar"),
            Daa => write!(f, "daa"),
            Cma => write!(f, "cma"),
            Stc => write!(f, "stc"),
            Cmc => write!(f, "cmc"),
            Mov(dst, src) => write!(f, "mov {dst}, {src}"),
            Hlt => write!(f, "hlt"),
            Alu(op, r) => write!(f, "{} {r}", alu_mnemonic(*op, false)),
            AluImm(op, n) => write!(f, "{} {n:#04x}", alu_mnemonic(*op, true)),
            Ret(None) => write!(f, "ret"),
            Ret(Some(cc)) => write!(f, "r{cc}"),
            Jmp(None, nn) => write!(f, "jmp {nn:#06x}"),
            Jmp(Some(cc), nn) => write!(f, "j{cc} {nn:#06x}"),
            Call(None, nn) => write!(f, "call {nn:#06x}"),
            Call(Some(cc), nn) => write!(f, "c{cc} {nn:#06x}"),
            Pop(sp) => write!(f, "pop {sp}"),
            Push(sp) => write!(f, "push {sp}"),
            Rst(n) => write!(f, "rst {n}"),
            Pchl => write!(f, "pchl"),
            Sphl => write!(f, "sphl"),
            Xthl => write!(f, "xthl"),
            Xchg => write!(f, "xchg"),
            Out(port) => write!(f, "out {port:#04x}"),
            In(port) => write!(f, "in {port:#04x}"),
            Di => write!(f, "di"),
            Ei => write!(f, "ei"),
        }
    }
}

// Every one of the 256 opcodes decodes; the undocumented ones alias their
// documented twins (0x08 etc. are NOPs, 0xcb is JMP, 0xd9 is RET, and
// 0xdd/0xed/0xfd are CALL).
pub fn decode(src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let opcode = src.next_opcode();
    decode_opcode(opcode, src)
}

// Decodes with an opcode that has already been supplied, e.g. by an
// interrupting device. Operands still come from `src`.
pub fn decode_opcode(opcode: u8, src: &mut impl ByteSource) -> Result<Decoded<Ins>> {
    let Fields { x, y, z, p, q } = Fields::of(opcode);
    let reg = |code: u8| field::<Reg>(code, opcode, OpcodeTable::Root);
    let pair = |code: u8| field::<RegPair>(code, opcode, OpcodeTable::Root);
    let stack = |code: u8| field::<StackPair>(code, opcode, OpcodeTable::Root);
    let cond = |code: u8| field::<Cond>(code, opcode, OpcodeTable::Root);
    let alu = |code: u8| field::<AluOp>(code, opcode, OpcodeTable::Root);

    let ins = match x {
        0 => match z {
            0 => Ins::Nop,
            1 if q == 0 => Ins::Lxi(pair(p)?, src.next_word()),
            1 => Ins::Dad(pair(p)?),
            2 => match (q, p) {
                (0, 0) => Ins::Stax(RegPair::B),
                (0, 1) => Ins::Stax(RegPair::D),
                (0, 2) => Ins::Shld(src.next_word()),
                (0, _) => Ins::Sta(src.next_word()),
                (_, 0) => Ins::Ldax(RegPair::B),
                (_, 1) => Ins::Ldax(RegPair::D),
                (_, 2) => Ins::Lhld(src.next_word()),
                (_, _) => Ins::Lda(src.next_word()),
            },
            3 if q == 0 => Ins::Inx(pair(p)?),
            3 => Ins::Dcx(pair(p)?),
            4 => Ins::Inr(reg(y)?),
            5 => Ins::Dcr(reg(y)?),
            6 => Ins::Mvi(reg(y)?, src.next()),
            _ => [Ins::Rlc, Ins::Rrc, Ins::Ral, Ins::Rar, Ins::Daa, Ins::Cma, Ins::Stc, Ins::Cmc]
                [y as usize],
        },
        1 if y == 6 && z == 6 => Ins::Hlt,
        1 => Ins::Mov(reg(y)?, reg(z)?),
        2 => Ins::Alu(alu(y)?, reg(z)?),
        _ => match z {
            0 => Ins::Ret(Some(cond(y)?)),
            1 if q == 0 => Ins::Pop(stack(p)?),
            1 => match p {
                0 | 1 => Ins::Ret(None),
                2 => Ins::Pchl,
                _ => Ins::Sphl,
            },
            2 => Ins::Jmp(Some(cond(y)?), src.next_word()),
            3 => match y {
                0 | 1 => Ins::Jmp(None, src.next_word()),
                2 => Ins::Out(src.next()),
                3 => Ins::In(src.next()),
                4 => Ins::Xthl,
                5 => Ins::Xchg,
                6 => Ins::Di,
                _ => Ins::Ei,
            },
            4 => Ins::Call(Some(cond(y)?), src.next_word()),
            5 if q == 0 => Ins::Push(stack(p)?),
            5 => Ins::Call(None, src.next_word()),
            6 => Ins::AluImm(alu(y)?, src.next()),
            _ => Ins::Rst(y),
        },
    };
    Ok(Decoded::root(ins, opcode))
}
