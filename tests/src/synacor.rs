use std::sync::{Arc, Mutex};

use common::EmulatorError;
use common::mem::Memory;
use common::misc::words_from_bytes;
use emu_lib::io::console::{ConsolePorts, PipeConsole};
use emu_lib::synacor::{CONSOLE_PORT, MEMORY_SIZE};
use emu_lib::{Cpu, Synacor};

const R0: u16 = 32768;
const R1: u16 = 32769;
const R2: u16 = 32770;

// Images come off disk as little-endian bytes.
fn image(program: &[u16]) -> Vec<u8> {
    program.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn synacor_with(program: &[u16]) -> Synacor {
    let mut mem = Memory::with_size(MEMORY_SIZE);
    mem.load(&words_from_bytes(&image(program)), 0);
    Synacor::new(mem, 0)
}

fn run(cpu: &mut Synacor) {
    while cpu.can_run_next_instruction() {
        cpu.step().unwrap();
    }
}

#[test]
fn echoes_a_line() {
    // in r0; out r0; eq r1 r0 '\n'; jf r1 0; halt
    let mut cpu = synacor_with(&[20, R0, 19, R0, 4, R1, R0, 10, 8, R1, 0, 0]);
    let pipe = Arc::new(PipeConsole::default());
    cpu.add_io_observer(Arc::new(Mutex::new(ConsolePorts::new(pipe.clone(), CONSOLE_PORT, None))));

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0);
    assert!(pipe.is_out_empty());

    pipe.write_input(b"ok\n");
    run(&mut cpu);
    assert_eq!(pipe.take_output_string(), "ok\n");
    assert!(cpu.is_halted());
    assert_eq!(cpu.pc(), 12);
}

#[test]
fn queued_input_without_a_console() {
    // in r0; in r1; halt
    let mut cpu = synacor_with(&[20, R0, 20, R1, 0]);
    cpu.input(b"ab");
    run(&mut cpu);
    assert_eq!(cpu.regs()[0], b'a' as u16);
    assert_eq!(cpu.regs()[1], b'b' as u16);
}

#[test]
fn memory_and_stack() {
    // set r0 100; wmem r0 42; rmem r1 r0; push r1; pop r2; halt
    let mut cpu = synacor_with(&[1, R0, 100, 16, R0, 42, 15, R1, R0, 2, R1, 3, R2, 0]);
    run(&mut cpu);
    assert_eq!(cpu.memory().direct_read(100), 42);
    assert_eq!(cpu.regs()[1], 42);
    assert_eq!(cpu.regs()[2], 42);
    assert!(cpu.stack().is_empty());
}

#[test]
fn modulo_by_zero() {
    // mod r0 5 0
    let mut cpu = synacor_with(&[11, R0, 5, 0]);
    assert!(matches!(cpu.step(), Err(EmulatorError::ProgrammingError(_))));
}

#[test]
fn snapshot_names_registers() {
    let mut cpu = synacor_with(&[1, R2, 7, 0]);
    cpu.step().unwrap();
    let regs = cpu.register_snapshot();
    assert!(regs.contains(&("r2", 7)));
    assert!(regs.contains(&("pc", 3)));
    assert!(cpu.flag_snapshot().is_empty());
}
