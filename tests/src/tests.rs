#![cfg(test)]

mod flags;

mod cpm;
mod debugger;
mod driver;
mod i8080;
mod interrupts;
mod lmc;
mod lr35902;
mod memory;
mod synacor;
mod z80;

use common::mem::Memory;
use emu_lib::z80::Flags;
use emu_lib::{Cpu, I8080, Z80};

pub const S: u8 = Flags::S;
pub const Z: u8 = Flags::Z;
pub const H: u8 = Flags::H;
pub const PV: u8 = Flags::PV;
pub const N: u8 = Flags::N;
pub const C: u8 = Flags::C;

// Expected Z80 flags, ignoring the undocumented X and Y bits.
pub fn flags(set: &[u8]) -> u8 {
    set.iter().fold(0, |acc, f| acc | f)
}

pub fn check_flags(cpu: &Z80, exp: u8) {
    let f = *cpu.flags();
    assert_eq!(f.get_sign(), exp & S != 0, "sign flag");
    assert_eq!(f.get_zero(), exp & Z != 0, "zero flag");
    assert_eq!(f.get_half_carry(), exp & H != 0, "half carry flag");
    assert_eq!(f.get_parity_overflow(), exp & PV != 0, "parity/overflow flag");
    assert_eq!(f.get_add_sub(), exp & N != 0, "add/subtract flag");
    assert_eq!(f.get_carry(), exp & C != 0, "carry flag");
}

pub fn z80_with(program: &[u8], at: u16) -> Z80 {
    let mut mem = Memory::with_size(emu_lib::z80::MEMORY_SIZE);
    mem.load(program, at);
    let mut cpu = Z80::new(mem, at);
    cpu.start();
    cpu
}

pub fn i8080_with(program: &[u8], at: u16) -> I8080 {
    let mut mem = Memory::with_size(emu_lib::i8080::MEMORY_SIZE);
    mem.load(program, at);
    let mut cpu = I8080::new(mem, at);
    cpu.start();
    cpu
}
