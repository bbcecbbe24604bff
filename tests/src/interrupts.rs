use emu_lib::z80::InterruptMode;
use emu_lib::{Cpu, Z80};

use crate::z80_with;

const START: u16 = 0x200;

// NOPs at START, the stack at 0x8000.
fn z80(mode: InterruptMode, enabled: bool) -> Z80 {
    let mut cpu = z80_with(&[0x00; 16], START);
    cpu.regs_mut().sp = 0x8000;
    cpu.set_interrupt_mode(mode);
    cpu.set_iff(enabled, enabled);
    cpu
}

fn return_address(cpu: &Z80) -> u16 {
    let sp = cpu.regs().sp;
    let mem = cpu.memory();
    mem.direct_read(sp) as u16 | (mem.direct_read(sp.wrapping_add(1)) as u16) << 8
}

#[test]
fn nmi_beats_maskable() {
    let mut cpu = z80(InterruptMode::One, true);
    // RETN
    cpu.memory_mut().load(&[0xed, 0x45], 0x66);
    cpu.interrupt(0xff);
    cpu.nmi_interrupt();

    assert_eq!(cpu.step().unwrap(), 11);
    assert_eq!(cpu.pc(), 0x66);
    assert_eq!(return_address(&cpu), START);
    assert!(!cpu.iff1());
    assert!(cpu.iff2());

    // The maskable request waits behind the cleared IFF1.
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), START);
    assert!(cpu.iff1());

    assert_eq!(cpu.step().unwrap(), 13);
    assert_eq!(cpu.pc(), 0x38);
}

#[test]
fn nmi_while_disabled() {
    let mut cpu = z80(InterruptMode::Two, false);
    cpu.nmi_interrupt();
    assert_eq!(cpu.step().unwrap(), 11);
    assert_eq!(cpu.pc(), 0x66);
    assert!(!cpu.iff2());
}

#[test]
fn maskable_never_while_disabled() {
    let mut cpu = z80(InterruptMode::One, false);
    cpu.interrupt(0xff);
    for i in 1..=8 {
        assert_eq!(cpu.step().unwrap(), 4);
        assert_eq!(cpu.pc(), START + i);
    }
    assert_eq!(cpu.regs().sp, 0x8000);
}

#[test]
fn request_honoured_after_ei() {
    let mut cpu = z80(InterruptMode::One, false);
    // EI
    cpu.memory_mut().write(START, 0xfb);
    cpu.interrupt(0xff);
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.step().unwrap(), 13);
    assert_eq!(cpu.pc(), 0x38);
    assert_eq!(return_address(&cpu), START + 1);
    assert!(!cpu.iff1() && !cpu.iff2());
}

#[test]
fn mode_zero_runs_supplied_instruction() {
    let mut cpu = z80(InterruptMode::Zero, true);
    // RST 0x28
    cpu.interrupt(0xef);
    assert_eq!(cpu.step().unwrap(), 13);
    assert_eq!(cpu.pc(), 0x28);
    assert_eq!(return_address(&cpu), START);
    assert!(!cpu.iff1());
}

#[test]
fn mode_zero_other_instructions() {
    let mut cpu = z80(InterruptMode::Zero, true);
    cpu.regs_mut().b = 0x41;
    // LD A, B
    cpu.interrupt(0x78);
    assert_eq!(cpu.step().unwrap(), 13);
    assert_eq!(cpu.regs().a, 0x41);
    assert_eq!(cpu.pc(), START);
    assert_eq!(cpu.regs().sp, 0x8000);
}

#[test]
fn mode_one_ignores_byte() {
    for byte in [0x00, 0xc7, 0xff] {
        let mut cpu = z80(InterruptMode::One, true);
        cpu.interrupt(byte);
        assert_eq!(cpu.step().unwrap(), 13);
        assert_eq!(cpu.pc(), 0x38);
    }
}

#[test]
fn mode_two_vector_table() {
    let mut cpu = z80(InterruptMode::Two, true);
    cpu.regs_mut().i = 0x12;
    cpu.memory_mut().load(&[0x78, 0x56], 0x1234);
    cpu.interrupt(0x34);

    assert_eq!(cpu.step().unwrap(), 19);
    assert_eq!(cpu.pc(), 0x5678);
    assert_eq!(return_address(&cpu), START);
    assert_eq!(cpu.regs().sp, 0x7ffe);
}

#[test]
fn one_interrupt_per_step() {
    let mut cpu = z80(InterruptMode::One, true);
    cpu.interrupt(0xff);
    cpu.nmi_interrupt();
    cpu.step().unwrap();
    assert_eq!(cpu.regs().sp, 0x7ffe);
    assert_eq!(cpu.pc(), 0x66);
}

#[test]
fn im_instructions() {
    // IM 2; IM 1; IM 0
    let mut cpu = z80_with(&[0xed, 0x5e, 0xed, 0x56, 0xed, 0x46], 0);
    cpu.step().unwrap();
    assert_eq!(cpu.interrupt_mode(), InterruptMode::Two);
    cpu.step().unwrap();
    assert_eq!(cpu.interrupt_mode(), InterruptMode::One);
    cpu.step().unwrap();
    assert_eq!(cpu.interrupt_mode(), InterruptMode::Zero);
}
