use common::mem::Memory;
use emu_lib::{Cpu, I8080};

use crate::i8080_with;

#[test]
fn compare_immediate_exhaustive() {
    let mut cpu = I8080::new(Memory::with_size(16), 0);
    cpu.start();
    cpu.memory_mut().load(&[0xfe, 0x00], 0);

    for a in 0..=255u8 {
        for v in 0..=255u8 {
            cpu.regs_mut().pc = 0;
            cpu.regs_mut().a = a;
            cpu.memory_mut().write(1, v);

            assert_eq!(cpu.step().unwrap(), 7, "CPI {v:#04x} with A={a:#04x}");
            let diff = a.wrapping_sub(v);
            let f = cpu.flags();
            assert_eq!(f.sign, diff > 127, "sign, A={a:#04x} v={v:#04x}");
            assert_eq!(f.zero, diff == 0, "zero, A={a:#04x} v={v:#04x}");
            assert_eq!(f.carry, a < v, "carry, A={a:#04x} v={v:#04x}");
            assert_eq!(f.parity, diff.count_ones() % 2 == 0, "parity, A={a:#04x} v={v:#04x}");
            assert_eq!(cpu.regs().a, a);
            assert_eq!(cpu.pc(), 2);
        }
    }
}

#[test]
fn add_exhaustive() {
    let mut cpu = I8080::new(Memory::with_size(16), 0);
    cpu.start();
    cpu.memory_mut().load(&[0x80], 0);

    for a in 0..=255u8 {
        for b in 0..=255u8 {
            cpu.regs_mut().pc = 0;
            cpu.regs_mut().a = a;
            cpu.regs_mut().b = b;

            assert_eq!(cpu.step().unwrap(), 4);
            let sum = a as u16 + b as u16;
            let f = cpu.flags();
            assert_eq!(cpu.regs().a, sum as u8);
            assert_eq!(f.carry, sum > 0xff, "carry, {a:#04x} + {b:#04x}");
            assert_eq!(f.aux_carry, (a & 0xf) + (b & 0xf) > 0xf, "aux carry, {a:#04x} + {b:#04x}");
            assert_eq!(f.zero, sum as u8 == 0);
            assert_eq!(f.sign, sum as u8 & 0x80 != 0);
        }
    }
}

#[test]
fn conditional_jump_costs() {
    // JZ 0x0010 not taken, JNZ 0x0010 taken.
    let mut cpu = i8080_with(&[0xca, 0x10, 0x00, 0xc2, 0x10, 0x00], 0);
    assert_eq!(cpu.step().unwrap(), 10);
    assert_eq!(cpu.pc(), 3);
    assert_eq!(cpu.step().unwrap(), 10);
    assert_eq!(cpu.pc(), 0x10);
}

#[test]
fn conditional_return_costs() {
    // CALL 0x0010; at 0x10: RZ (not taken), RNZ (taken).
    let mut cpu = i8080_with(&[0xcd, 0x10, 0x00], 0);
    cpu.memory_mut().load(&[0xc8, 0xc0], 0x10);
    cpu.regs_mut().sp = 0x100;
    assert_eq!(cpu.step().unwrap(), 17);
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.step().unwrap(), 11);
    assert_eq!(cpu.pc(), 3);
    assert_eq!(cpu.regs().sp, 0x100);
}

#[test]
fn halt_until_interrupt() {
    // EI; HLT
    let mut cpu = i8080_with(&[0xfb, 0x76], 0);
    cpu.regs_mut().sp = 0x100;
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.is_halted());
    let pc = cpu.pc();
    for _ in 0..10 {
        assert_eq!(cpu.step().unwrap(), 4);
        assert_eq!(cpu.pc(), pc);
    }

    // RST 2
    cpu.interrupt(0xd7);
    cpu.step().unwrap();
    assert!(!cpu.is_halted());
    assert!(!cpu.is_interrupt_enabled());
    assert_eq!(cpu.pc(), 0x10);
    assert_eq!(cpu.memory().direct_read(0xfe), pc as u8);
}

#[test]
fn interrupt_held_while_disabled() {
    // NOP; NOP; EI; NOP
    let mut cpu = i8080_with(&[0x00, 0x00, 0xfb, 0x00], 0);
    cpu.regs_mut().sp = 0x100;
    // RST 1
    cpu.interrupt(0xcf);
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc(), 1);
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc(), 2);
    assert_eq!(cpu.regs().sp, 0x100);

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 3);
    assert_eq!(cpu.step().unwrap(), 11);
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.memory().direct_read(0xfe), 0x03);
    assert!(!cpu.is_interrupt_enabled());

    // Serviced once; 0x08 holds a NOP.
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc(), 0x09);
}

#[test]
fn ports() {
    // IN 0x10; OUT 0x20
    let mut cpu = i8080_with(&[0xdb, 0x10, 0xd3, 0x20], 0);
    cpu.input(0x10, 0x5a);
    cpu.step().unwrap();
    assert_eq!(cpu.regs().a, 0x5a);
    cpu.step().unwrap();
    assert_eq!(cpu.ports().last_out(0x20), 0x5a);
}

#[test]
fn undocumented_aliases() {
    // 0xcb is JMP and 0x08 is NOP.
    let mut cpu = i8080_with(&[0xcb, 0x10, 0x00], 0);
    cpu.memory_mut().write(0x10, 0x08);
    assert_eq!(cpu.step().unwrap(), 10);
    assert_eq!(cpu.pc(), 0x10);
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc(), 0x11);
}
