use common::OpcodeTable;
use common::decoder::Decoded;
use common::lr35902::{Ins, Operand};

use crate::cpu::Cycles;

// Clock cycles of the unprefixed opcodes, conditional forms not taken.
// Holes are zero.
#[rustfmt::skip]
const ROOT: [u8; 256] = [
//  0   1   2   3   4   5   6   7   8   9   a   b   c   d   e   f
    4, 12,  8,  8,  4,  4,  8,  4, 20,  8,  8,  8,  4,  4,  8,  4, // 0
    4, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4, // 1
    8, 12,  8,  8,  4,  4,  8,  4,  8,  8,  8,  8,  4,  4,  8,  4, // 2
    8, 12,  8,  8, 12, 12, 12,  4,  8,  8,  8,  8,  4,  4,  8,  4, // 3
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 4
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 5
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 6
    8,  8,  8,  8,  8,  8,  4,  8,  4,  4,  4,  4,  4,  4,  8,  4, // 7
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 8
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 9
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // a
    4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // b
    8, 12, 12, 16, 12, 16,  8, 16,  8, 16, 12,  0, 12, 24,  8, 16, // c
    8, 12, 12,  0, 12, 16,  8, 16,  8, 16, 12,  0, 12,  0,  8, 16, // d
   12, 12,  8,  0,  0, 16,  8, 16, 16,  4, 16,  0,  0,  0,  8, 16, // e
   12, 12,  8,  4,  0, 16,  8, 16, 12,  8, 16,  4,  0,  0,  8, 16, // f
];

pub const RET_TAKEN: Cycles = 12;
pub const JP_TAKEN: Cycles = 4;
pub const CALL_TAKEN: Cycles = 12;
pub const JR_TAKEN: Cycles = 4;

pub const HALTED: Cycles = 4;
pub const INTERRUPT: Cycles = 20;

pub fn of(decoded: &Decoded<Ins>) -> Cycles {
    match decoded.table {
        OpcodeTable::Bits => match decoded.ins {
            Ins::Bit(_, Operand::Ind(_)) => 12,
            Ins::Bit(..) => 8,
            Ins::Rot(_, Operand::Ind(_))
            | Ins::Swap(Operand::Ind(_))
            | Ins::Res(_, Operand::Ind(_))
            | Ins::Set(_, Operand::Ind(_)) => 16,
            _ => 8,
        },
        _ => ROOT[decoded.opcode as usize] as Cycles,
    }
}
