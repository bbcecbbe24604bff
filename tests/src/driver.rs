use std::collections::VecDeque;

use common::error::Result;
use common::mem::Memory;
use emu_lib::debugger::Breakpoint;
use emu_lib::driver::{Governor, Input, InputRequest, NoInput, NoScreen, Screen, Unpaced};
use emu_lib::{Cpu, Driver, DriverConfig, Event, I8080, State, Z80};

// Plays back one request per poll, then nothing.
#[derive(Default)]
struct Script {
    requests: VecDeque<InputRequest>,
}

impl Script {
    fn new(requests: &[InputRequest]) -> Self {
        Script { requests: requests.iter().copied().collect() }
    }
}

impl Input for Script {
    fn read(&mut self, request: &mut InputRequest) -> Result<()> {
        if let Some(next) = self.requests.pop_front() {
            *request = next;
        }
        Ok(())
    }
}

// Says yes every other time.
#[derive(Default)]
struct Alternate {
    calls: usize,
}

impl Governor for Alternate {
    fn is_time_to_update(&mut self) -> bool {
        self.calls += 1;
        self.calls % 2 == 0
    }
}

#[derive(Default)]
struct Recorder {
    frames: Vec<(State, u16)>,
    debug_frames: usize,
}

impl<C: Cpu> Screen<C> for Recorder {
    fn update_screen(&mut self, cpu: &C, state: State) {
        self.frames.push((state, cpu.pc()));
    }

    fn update_debug_only(&mut self, _cpu: &C) {
        self.debug_frames += 1;
    }
}

const QUIT: InputRequest = InputRequest {
    quit: true,
    toggle_pause: false,
    step_instruction: false,
    step_cycle: false,
    continue_running: false,
};

fn request(f: impl FnOnce(&mut InputRequest)) -> InputRequest {
    let mut req = InputRequest::default();
    f(&mut req);
    req
}

fn nops(size: usize) -> Z80 {
    Z80::new(Memory::with_size(size), 0)
}

fn config(cycles_per_tick: u64, debug_mode: bool) -> DriverConfig {
    DriverConfig { cycles_per_tick, interrupt_byte: None, run_once: true, debug_mode }
}

#[test]
fn runs_program_to_the_end() {
    let mut mem = Memory::with_size(8);
    mem.load(&[0x3e, 0x07], 0);
    let cpu = I8080::new(mem, 0);
    let mut driver = Driver::new(cpu, Unpaced, NoInput, NoScreen, config(100, false));

    driver.run().unwrap();
    assert_eq!(driver.state(), State::Stopped);
    assert!(driver.is_exit_state());
    assert_eq!(driver.cpu().regs().a, 0x07);
    // MVI, then six NOPs.
    assert_eq!(driver.total_cycles(), 7 + 6 * 4);

    assert!(driver.run().is_err());
}

#[test]
fn budget_per_tick() {
    let mut driver = Driver::new(nops(0x100), Unpaced, NoInput, Recorder::default(), config(10, false));
    driver.perform().unwrap();
    // Three NOPs reach the budget of ten.
    assert_eq!(driver.total_cycles(), 12);
    driver.perform().unwrap();
    assert_eq!(driver.total_cycles(), 24);
    assert_eq!(driver.screen().frames, vec![(State::Running, 3), (State::Running, 6)]);
}

#[test]
fn governor_gates_ticks() {
    let mut driver = Driver::new(nops(0x100), Alternate::default(), NoInput, NoScreen, config(4, false));
    driver.perform().unwrap();
    assert_eq!(driver.total_cycles(), 0);
    driver.perform().unwrap();
    assert_eq!(driver.total_cycles(), 4);
}

#[test]
fn pause_and_resume() {
    let toggle = request(|r| r.toggle_pause = true);
    let script = Script::new(&[toggle, InputRequest::default(), toggle, QUIT]);
    let mut driver = Driver::new(nops(0x100), Unpaced, script, NoScreen, config(8, false));

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Paused);
    assert_eq!(driver.total_cycles(), 8);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Paused);
    assert_eq!(driver.total_cycles(), 8);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Running);
    assert_eq!(driver.total_cycles(), 8);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
    assert_eq!(driver.total_cycles(), 16);

    // Stopped is a no-op.
    driver.perform().unwrap();
    assert_eq!(driver.total_cycles(), 16);
}

#[test]
fn breakpoint_then_step_then_continue() {
    let step = request(|r| r.step_instruction = true);
    let cont = request(|r| r.continue_running = true);
    let script = Script::new(&[step, cont]);
    let mut driver = Driver::new(nops(8), Unpaced, script, Recorder::default(), config(1000, true));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(2));

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    assert_eq!(driver.cpu().pc(), 2);
    // The rest of the tick was abandoned and nothing was drawn.
    assert!(driver.screen().frames.is_empty());

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    assert_eq!(driver.cpu().pc(), 3);
    assert_eq!(driver.screen().debug_frames, 1);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Running);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
    assert_eq!(driver.cpu().pc(), 8);
    assert_eq!(driver.total_cycles(), 8 * 4);
}

#[test]
fn continue_runs_the_breakpoint_instruction() {
    let cont = request(|r| r.continue_running = true);
    let mut driver = Driver::new(nops(8), Unpaced, Script::new(&[cont]), NoScreen, config(1000, true));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(4));

    driver.perform().unwrap();
    assert_eq!(driver.cpu().pc(), 4);
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Running);
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
    assert_eq!(driver.cpu().pc(), 8);
}

#[test]
fn pause_from_breakpoint_then_resume() {
    let toggle = request(|r| r.toggle_pause = true);
    let script = Script::new(&[toggle, toggle]);
    let mut driver = Driver::new(nops(8), Unpaced, script, NoScreen, config(1000, true));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(2));

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Paused);
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Running);
    assert_eq!(driver.cpu().pc(), 2);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
    assert_eq!(driver.cpu().pc(), 8);
}

#[test]
fn breakpoints_ignored_outside_debug_mode() {
    let mut driver = Driver::new(nops(8), Unpaced, NoInput, NoScreen, config(1000, false));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(2));
    driver.run().unwrap();
    assert_eq!(driver.cpu().pc(), 8);
}

#[test]
fn step_cycle_runs_out_the_tick() {
    let cycle = request(|r| r.step_cycle = true);
    let script = Script::new(&[cycle, QUIT]);
    let mut driver = Driver::new(nops(0x100), Unpaced, script, NoScreen, config(16, true));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(1));

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    assert_eq!(driver.total_cycles(), 4);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    assert_eq!(driver.total_cycles(), 16);

    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
}

#[test]
fn interrupt_at_end_of_tick() {
    // EI; IM 1; then NOPs
    let mut mem = Memory::with_size(emu_lib::z80::MEMORY_SIZE);
    mem.load(&[0xfb, 0xed, 0x56], 0);
    let cpu = Z80::new(mem, 0);
    let cfg = DriverConfig { interrupt_byte: Some(0xff), ..config(12, false) };
    let mut driver = Driver::new(cpu, Unpaced, NoInput, NoScreen, cfg);

    driver.perform().unwrap();
    assert_eq!(driver.cpu().pc(), 3);
    assert!(driver.cpu().iff1());

    driver.perform().unwrap();
    assert_eq!(driver.cpu().pc(), 0x38);
    assert!(!driver.cpu().iff1());
}

#[test]
fn no_interrupt_while_disabled() {
    let cfg = DriverConfig { interrupt_byte: Some(0xff), ..config(8, false) };
    let mut driver = Driver::new(nops(0x100), Unpaced, NoInput, NoScreen, cfg);
    driver.perform().unwrap();
    driver.perform().unwrap();
    assert_eq!(driver.cpu().pc(), 4);
}

#[test]
fn quit_while_stepping() {
    let script = Script::new(&[QUIT]);
    let mut driver = Driver::new(nops(8), Unpaced, script, NoScreen, config(100, true));
    driver.debugger().lock().unwrap().add_breakpoint(Breakpoint::new(0));
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stepping);
    driver.perform().unwrap();
    assert_eq!(driver.state(), State::Stopped);
}

#[test]
fn invalid_transitions() {
    let mut driver = Driver::new(nops(8), Unpaced, NoInput, NoScreen, config(100, false));
    assert!(driver.transition(Event::Continue).is_err());
    assert_eq!(driver.state(), State::Running);
    driver.transition(Event::TogglePause).unwrap();
    assert!(driver.transition(Event::BreakpointHit).is_err());
    driver.transition(Event::Stop).unwrap();
    for event in [Event::TogglePause, Event::Stop, Event::Continue, Event::BreakpointHit] {
        assert!(driver.transition(event).is_err());
        assert_eq!(driver.state(), State::Stopped);
    }
}
