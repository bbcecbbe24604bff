use std::sync::{Arc, Mutex};

use common::mem::Memory;
use emu_lib::driver::{NoInput, NoScreen, Unpaced};
use emu_lib::io::console::{LmcConsole, PipeConsole};
use emu_lib::lmc::MEMORY_SIZE;
use emu_lib::{Cpu, Driver, DriverConfig, Lmc};

// INP; OUT; SUB 08; BRZ 05; BRA 01; OUT; HLT; DAT 0; DAT 1
const COUNTDOWN: [u16; 9] = [901, 902, 208, 705, 601, 902, 0, 0, 1];

fn lmc_with(program: &[u16], pipe: &Arc<PipeConsole>) -> Lmc {
    let mut mem = Memory::with_size(MEMORY_SIZE);
    mem.load(program, 0);
    let mut cpu = Lmc::new(mem, 0);
    cpu.add_io_observer(Arc::new(Mutex::new(LmcConsole::new(pipe.clone()))));
    cpu
}

#[test]
fn countdown_under_driver() {
    let pipe = Arc::new(PipeConsole::default());
    pipe.write_input(b"3\n");
    let cpu = lmc_with(&COUNTDOWN, &pipe);
    let config = DriverConfig { cycles_per_tick: 5, interrupt_byte: None, run_once: true, debug_mode: false };
    let mut driver = Driver::new(cpu, Unpaced, NoInput, NoScreen, config);

    driver.run().unwrap();
    assert_eq!(pipe.take_output_string(), "3\n2\n1\n0\n");
    assert!(driver.cpu().is_halted());
    assert_eq!(driver.cpu().pc(), 7);
    // One cycle per instruction: INP, two full loops, the exit, OUT and HLT.
    assert_eq!(driver.total_cycles(), 1 + 2 * 4 + 3 + 2);
}

#[test]
fn waits_for_a_whole_line() {
    let pipe = Arc::new(PipeConsole::default());
    let mut cpu = lmc_with(&COUNTDOWN, &pipe);

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0);
    assert!(cpu.is_waiting_for_input());

    pipe.write_input(b"1");
    cpu.step().unwrap();
    assert!(cpu.is_waiting_for_input());

    pipe.write_input(b"5\n");
    cpu.step().unwrap();
    assert_eq!(cpu.acc(), 15);
    assert!(!cpu.is_waiting_for_input());
}

#[test]
fn character_output() {
    // LDA 04; OTC; HLT; HLT; DAT 72
    let pipe = Arc::new(PipeConsole::default());
    let mut cpu = lmc_with(&[504, 922, 0, 0, 72], &pipe);
    while cpu.can_run_next_instruction() {
        cpu.step().unwrap();
    }
    assert_eq!(pipe.take_output_string(), "H");
}

#[test]
fn arithmetic_wraps_at_a_thousand() {
    // LDA 05; ADD 06; BRP 04; HLT; SUB 06; DAT 999; DAT 2
    let mut mem = Memory::with_size(MEMORY_SIZE);
    mem.load(&[505u16, 106, 804, 0, 206, 999, 2], 0);
    let mut cpu = Lmc::new(mem, 0);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.acc(), 1);
    assert!(!cpu.is_negative());
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 4);

    cpu.step().unwrap();
    assert_eq!(cpu.acc(), 999);
    assert!(cpu.is_negative());
}
