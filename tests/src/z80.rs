use std::sync::{Arc, Mutex};

use common::error::Result;
use common::io::IoObserver;
use common::mem::Memory;
use common::{EmulatorError, OpcodeTable};
use emu_lib::z80::{Flags, InterruptMode};
use emu_lib::{Cpu, Z80};

use crate::{C, H, N, PV, S, Z, check_flags, flags, z80_with};

fn small_z80(program: &[u8]) -> Z80 {
    let mut mem = Memory::with_size(16);
    mem.load(program, 0);
    Z80::new(mem, 0)
}

#[test]
fn add_immediate_exhaustive() {
    let mut cpu = small_z80(&[0xc6, 0x00]);
    for a in 0..=255u8 {
        for v in 0..=255u8 {
            cpu.regs_mut().pc = 0;
            cpu.regs_mut().a = a;
            cpu.memory_mut().write(1, v);

            assert_eq!(cpu.step().unwrap(), 7);
            let res = a.wrapping_add(v);
            let signed = a as i8 as i16 + v as i8 as i16;
            let mut exp = 0;
            if res & 0x80 != 0 {
                exp |= S;
            }
            if res == 0 {
                exp |= Z;
            }
            if (a & 0xf) + (v & 0xf) > 0xf {
                exp |= H;
            }
            if !(-128..=127).contains(&signed) {
                exp |= PV;
            }
            if a as u16 + v as u16 > 0xff {
                exp |= C;
            }
            assert_eq!(cpu.regs().a, res);
            check_flags(&cpu, exp);
            assert_eq!(cpu.flags().get_x(), res & 0x08 != 0);
            assert_eq!(cpu.flags().get_y(), res & 0x20 != 0);
        }
    }
}

#[test]
fn compare_immediate_exhaustive() {
    let mut cpu = small_z80(&[0xfe, 0x00]);
    for a in 0..=255u8 {
        for v in 0..=255u8 {
            cpu.regs_mut().pc = 0;
            cpu.regs_mut().a = a;
            cpu.memory_mut().write(1, v);

            assert_eq!(cpu.step().unwrap(), 7);
            let res = a.wrapping_sub(v);
            let signed = a as i8 as i16 - v as i8 as i16;
            let mut exp = N;
            if res & 0x80 != 0 {
                exp |= S;
            }
            if res == 0 {
                exp |= Z;
            }
            if a & 0xf < v & 0xf {
                exp |= H;
            }
            if !(-128..=127).contains(&signed) {
                exp |= PV;
            }
            if a < v {
                exp |= C;
            }
            assert_eq!(cpu.regs().a, a);
            check_flags(&cpu, exp);
            assert_eq!(cpu.flags().get_x(), v & 0x08 != 0);
            assert_eq!(cpu.flags().get_y(), v & 0x20 != 0);
        }
    }
}

#[test]
fn conditional_costs() {
    let mut cpu = z80_with(
        &[
            0x20, 0x02, // jr nz, +2
            0x28, 0x02, // jr z, +2
            0x00, 0x00, // nop; nop
            0x10, 0xfe, // djnz -2
            0xc4, 0x00, 0x01, // call nz, 0x0100
            0xcc, 0x00, 0x01, // call z, 0x0100
        ],
        0,
    );
    // ret nz; ret z
    cpu.memory_mut().load(&[0xc0, 0xc8], 0x100);
    cpu.regs_mut().sp = 0x8000;
    cpu.regs_mut().b = 2;
    cpu.flags_mut().set_zero(true);

    let expected: [(u64, u16); 8] = [
        (7, 0x02),
        (12, 0x06),
        (13, 0x06),
        (8, 0x08),
        (10, 0x0b),
        (17, 0x100),
        (5, 0x101),
        (11, 0x0e),
    ];
    for (i, (cycles, pc)) in expected.into_iter().enumerate() {
        assert_eq!(cpu.step().unwrap(), cycles, "instruction {i}");
        assert_eq!(cpu.pc(), pc, "instruction {i}");
    }
    assert_eq!(cpu.regs().sp, 0x8000);
}

#[test]
fn wide_carries() {
    let mut cpu = z80_with(
        &[
            0x21, 0xff, 0xff, // ld hl, 0xffff
            0x01, 0x01, 0x00, // ld bc, 0x0001
            0x09, // add hl, bc
            0xed, 0x5a, // adc hl, de
            0xed, 0x42, // sbc hl, bc
        ],
        0,
    );
    *cpu.flags_mut() = Flags::from_raw(0);
    cpu.regs_mut().set_de(0);

    assert_eq!(cpu.step().unwrap(), 10);
    assert_eq!(cpu.step().unwrap(), 10);
    assert_eq!(cpu.step().unwrap(), 11);
    assert_eq!(cpu.regs().hl(), 0x0000);
    check_flags(&cpu, flags(&[H, C]));

    assert_eq!(cpu.step().unwrap(), 15);
    assert_eq!(cpu.regs().hl(), 0x0001);
    check_flags(&cpu, flags(&[]));

    assert_eq!(cpu.step().unwrap(), 15);
    assert_eq!(cpu.regs().hl(), 0x0000);
    check_flags(&cpu, flags(&[Z, N]));
}

#[test]
fn halt_end_to_end() {
    let mut cpu = z80_with(&[0x76, 0x00], 0);
    cpu.regs_mut().sp = 0x8000;
    assert_eq!(cpu.step().unwrap(), 4);
    assert!(cpu.is_halted());
    assert_eq!(cpu.pc(), 1);
    for _ in 0..100 {
        assert_eq!(cpu.step().unwrap(), 4);
        assert_eq!(cpu.pc(), 1);
    }

    cpu.set_iff(true, true);
    cpu.set_interrupt_mode(InterruptMode::One);
    cpu.interrupt(0xff);
    assert_eq!(cpu.step().unwrap(), 13);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc(), 0x38);
    assert_eq!(cpu.memory().direct_read(0x7ffe), 0x01);
    assert_eq!(cpu.memory().direct_read(0x7fff), 0x00);
}

#[test]
fn unrecognized_opcodes() {
    let mut cpu = z80_with(&[0xed, 0x00], 0);
    assert_eq!(
        cpu.step(),
        Err(EmulatorError::unrecognized(0x00u8, OpcodeTable::Extended))
    );
    assert_eq!(cpu.pc(), 0);

    let mut cpu = z80_with(&[0xdd, 0xdd], 0);
    assert_eq!(
        cpu.step(),
        Err(EmulatorError::unrecognized(0xddu8, OpcodeTable::Indexed))
    );
    assert_eq!(cpu.pc(), 0);
}

struct PortPlusOne;

impl IoObserver for PortPlusOne {
    fn in_requested(&mut self, port: u8) -> Result<Option<u8>> {
        Ok(Some(port.wrapping_add(1)))
    }
}

#[test]
fn ports() {
    // in a, (0x10); out (c), a; in b, (c)
    let mut cpu = z80_with(&[0xdb, 0x10, 0xed, 0x79, 0xed, 0x40], 0);
    cpu.regs_mut().c = 0x42;

    cpu.input(0x10, 0x99);
    cpu.step().unwrap();
    assert_eq!(cpu.regs().a, 0x99);
    cpu.step().unwrap();
    assert_eq!(cpu.ports().last_out(0x42), 0x99);

    cpu.add_io_observer(Arc::new(Mutex::new(PortPlusOne)));
    assert_eq!(cpu.step().unwrap(), 12);
    assert_eq!(cpu.regs().b, 0x43);
    assert!(!cpu.flags().get_zero());
}

#[test]
fn snapshots() {
    let mut cpu = z80_with(&[0x00], 0x1234);
    cpu.regs_mut().shadow.a = 0x12;
    let regs = cpu.register_snapshot();
    assert!(regs.contains(&("pc", 0x1234)));
    assert!(regs.contains(&("sp", 0xffff)));
    assert!(regs.iter().any(|(name, val)| *name == "af'" && val >> 8 == 0x12));

    let names: Vec<&str> = cpu.flag_snapshot().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["s", "z", "y", "h", "x", "p", "n", "c"]);
}
