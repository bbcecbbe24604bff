use common::OpcodeTable;
use common::decoder::Decoded;
use common::z80::{Ins, Operand};

use crate::cpu::Cycles;

// Unprefixed opcodes, conditional forms at their not-taken cost.
#[rustfmt::skip]
const ROOT: [u8; 256] = [
//  0   1   2   3   4   5   6   7   8   9   a   b   c   d   e   f
    4, 10,  7,  6,  4,  4,  7,  4,  4, 11,  7,  6,  4,  4,  7,  4, // 0
    8, 10,  7,  6,  4,  4,  7,  4, 12, 11,  7,  6,  4,  4,  7,  4, // 1
    7, 10, 16,  6,  4,  4,  7,  4,  7, 11, 16,  6,  4,  4,  7,  4, // 2
    7, 10, 13,  6, 11, 11, 10,  4,  7, 11, 13,  6,  4,  4,  7,  4, // 3
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 4
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 5
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 6
    7,  7,  7,  7,  7,  7,  4,  7,  4,  4,  4,  4,  4,  4,  7,  4, // 7
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 8
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 9
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // a
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // b
    5, 10, 10, 10, 10, 11,  7, 11,  5, 10, 10,  0, 10, 17,  7, 11, // c
    5, 10, 10, 11, 10, 11,  7, 11,  5,  4, 10, 11, 10,  0,  7, 11, // d
    5, 10, 10, 19, 10, 11,  7, 11,  5,  4, 10,  4, 10,  0,  7, 11, // e
    5, 10, 10,  4, 10, 11,  7, 11,  5,  6, 10,  4, 10,  0,  7, 11, // f
];

// Added when a conditional branch is taken.
pub const RET_TAKEN: Cycles = 6;
pub const CALL_TAKEN: Cycles = 7;
pub const JR_TAKEN: Cycles = 5;

// Added when a repeating block instruction goes round again.
pub const BLOCK_REPEAT: Cycles = 5;

pub const HALTED: Cycles = 4;
pub const NMI: Cycles = 11;
pub const INTERRUPT_MODE_0: Cycles = 13;
pub const INTERRUPT_MODE_1: Cycles = 13;
pub const INTERRUPT_MODE_2: Cycles = 19;

fn has_displacement(ins: &Ins) -> bool {
    use Ins::*;
    match ins {
        Ld(dst, src) => dst.is_idx() || src.is_idx(),
        Alu(_, op) | Inc(op) | Dec(op) => op.is_idx(),
        _ => false,
    }
}

fn bits(ins: &Ins) -> Cycles {
    match ins {
        Ins::Bit(_, Operand::Ind(_)) => 12,
        Ins::Bit(..) => 8,
        Ins::Rot(_, Operand::Ind(_), _) | Ins::Res(_, Operand::Ind(_), _) | Ins::Set(_, Operand::Ind(_), _) => 15,
        _ => 8,
    }
}

fn extended(ins: &Ins) -> Cycles {
    use Ins::*;
    match ins {
        InC(_) | OutC(_) => 12,
        AdcPair(_) | SbcPair(_) => 15,
        StPair(..) | LdPairInd(..) => 20,
        Retn | Reti => 14,
        Ld(..) => 9,
        Rld | Rrd => 18,
        Block(_) => 16,
        _ => 8,
    }
}

// Base cost of a decoded instruction. Taken branches and repeating block
// instructions add their extra at execution.
pub fn of(decoded: &Decoded<Ins>) -> Cycles {
    match decoded.table {
        OpcodeTable::Root => ROOT[decoded.opcode as usize] as Cycles,
        OpcodeTable::Bits => bits(&decoded.ins),
        OpcodeTable::Extended => extended(&decoded.ins),
        OpcodeTable::IndexedBits => match decoded.ins {
            Ins::Bit(..) => 20,
            _ => 23,
        },
        // The prefix costs 4; working out IX+d costs 8 more, except for
        // LD (IX+d), n, whose displacement overlaps the immediate fetch.
        OpcodeTable::Indexed => {
            let base = ROOT[decoded.opcode as usize] as Cycles + 4;
            match decoded.ins {
                Ins::Ld(Operand::Idx(..), Operand::Imm(_)) => base + 5,
                ins if has_displacement(&ins) => base + 8,
                _ => base,
            }
        }
    }
}
