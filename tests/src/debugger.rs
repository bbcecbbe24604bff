use common::EmulatorError;
use common::mem::Memory;
use disassembler::{Disassembler, Isa, Line, disassemble};
use emu_lib::{Breakpoint, Cpu, Debugger, Lmc};

use crate::z80_with;

const Z80_PROGRAM: [u8; 17] = [
    0x3e, 0x05, // ld a, 0x05
    0x41, // ld b, c
    0xdd, 0x21, 0x00, 0x40, // ld ix, 0x4000
    0xdd, 0x77, 0x02, // ld (ix+0x02), a
    0xed, 0x44, // neg
    0xcb, 0x27, // sla a
    0xdd, 0xcb, 0x01,
];

#[test]
fn round_trip() {
    let lines = disassemble(Isa::Z80, &Z80_PROGRAM[..14], 0x100);
    let mut debugger = Debugger::new();
    for line in lines.iter() {
        let bp = Breakpoint::from_line(&line.to_string(), 16).unwrap();
        assert_eq!(bp.address(), line.addr);
        debugger.add_breakpoint(bp);
        assert!(debugger.has_breakpoint(line.addr), "{line}");
        assert_eq!(debugger.breakpoint(line.addr).map(|bp| bp.line()), Some(line.to_string().as_str()));
    }
    assert_eq!(debugger.breakpoints().count(), lines.len());

    for line in lines.iter() {
        assert!(debugger.remove_breakpoint(line.addr).is_some());
        assert!(!debugger.has_breakpoint(line.addr));
    }
}

// Disassembled addresses are exactly where the executor fetches.
#[test]
fn addresses_match_fetches() {
    let program = &Z80_PROGRAM[..14];
    let lines: Vec<Line> =
        Disassembler::<disassembler::Z80>::new(program, 0x100).disassemble().collect();
    let mut cpu = z80_with(program, 0x100);
    for line in lines.iter() {
        assert_eq!(cpu.pc(), line.addr, "{line}");
        cpu.step().unwrap();
    }
    assert_eq!(cpu.pc(), 0x100 + program.len() as u16);
}

#[test]
fn truncated_instruction() {
    // The trailing DD CB 01 runs off the end; it still gets a line.
    let lines = disassemble(Isa::Z80, &Z80_PROGRAM, 0);
    let last = lines.last().unwrap();
    assert_eq!(last.addr, 14);
    assert!(Breakpoint::from_line(&last.to_string(), 16).is_ok());
}

#[test]
fn lmc_round_trip() {
    // INP; OUT; HLT
    let words = [901u16, 902, 0];
    let lines: Vec<Line> = Disassembler::<disassembler::Lmc>::new(&words, 0).disassemble().collect();
    assert_eq!(lines[2].to_string(), "02\thlt");

    let mut debugger = Debugger::new();
    debugger.set_debug_mode(true);
    for line in lines.iter() {
        debugger.add_breakpoint(Breakpoint::from_line(&line.to_string(), 10).unwrap());
    }

    let mut mem = Memory::with_size(emu_lib::lmc::MEMORY_SIZE);
    mem.load(&words, 0);
    let mut cpu = Lmc::new(mem, 0);
    cpu.input(7);
    while cpu.can_run_next_instruction() {
        assert!(debugger.should_break(cpu.pc()));
        cpu.step().unwrap();
    }
    assert_eq!(cpu.acc(), 7);
}

#[test]
fn debug_mode_gates_breaks() {
    let mut debugger = Debugger::new();
    debugger.add_breakpoint(Breakpoint::new(0x10));
    assert!(!debugger.should_break(0x10));
    debugger.set_debug_mode(true);
    assert!(debugger.should_break(0x10));
    assert!(!debugger.should_break(0x11));
}

#[test]
fn malformed_line() {
    assert_eq!(
        Breakpoint::from_line("zzzz\tnop", 16),
        Err(EmulatorError::InvalidBreakpoint("zzzz\tnop".to_string()))
    );
    assert!(Breakpoint::from_line("", 16).is_err());
}
