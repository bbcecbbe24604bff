use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::error::{EmulatorError, Result};

use derive_more::IsVariant;
use log::{info, warn};

use crate::cpu::{Cpu, Cycles};
use crate::debugger::Debugger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum State {
    Running,
    Paused,
    Stepping,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    TogglePause,
    Stop,
    Continue,
    BreakpointHit,
}

impl State {
    // None where the event isn't valid in this state.
    pub fn on(self, event: Event) -> Option<State> {
        use Event::*;
        use State::*;
        match (self, event) {
            (Running, TogglePause) => Some(Paused),
            (Running, BreakpointHit) => Some(Stepping),
            (Running, Stop) => Some(Stopped),
            (Paused, TogglePause) => Some(Running),
            (Paused, Stop) => Some(Stopped),
            (Stepping, Continue) => Some(Running),
            (Stepping, TogglePause) => Some(Paused),
            (Stepping, Stop) => Some(Stopped),
            _ => None,
        }
    }

    pub fn is_exit_state(self) -> bool {
        self == State::Stopped
    }
}

////////////////////////////////////////////////////////////////////////////////
// Collaborators

// Filled in by an `Input` each time it's polled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputRequest {
    pub quit: bool,
    pub toggle_pause: bool,
    pub step_instruction: bool,
    pub step_cycle: bool,
    pub continue_running: bool,
}

pub trait Governor {
    fn is_time_to_update(&mut self) -> bool;
}

pub trait Input {
    fn read(&mut self, request: &mut InputRequest) -> Result<()>;

    // Polled while stepping, when only the debugger's controls matter.
    fn read_debug_only(&mut self, request: &mut InputRequest) -> Result<()> {
        self.read(request)
    }
}

pub trait Screen<C> {
    fn update_screen(&mut self, cpu: &C, state: State);

    fn update_debug_only(&mut self, _cpu: &C) {}
}

// Paces ticks to a fixed rate off a monotonic clock.
pub struct FrameGovernor {
    period: Duration,
    next: Instant,
}

impl FrameGovernor {
    pub fn new(ticks_per_second: u32) -> Self {
        let period = Duration::from_secs(1) / ticks_per_second.max(1);
        FrameGovernor { period, next: Instant::now() }
    }
}

impl Governor for FrameGovernor {
    fn is_time_to_update(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next {
            self.next = now + self.period;
            return true;
        }
        thread::sleep((self.next - now).min(Duration::from_millis(1)));
        false
    }
}

// Every tick runs; for headless sessions and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unpaced;

impl Governor for Unpaced {
    fn is_time_to_update(&mut self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl Input for NoInput {
    fn read(&mut self, _request: &mut InputRequest) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoScreen;

impl<C> Screen<C> for NoScreen {
    fn update_screen(&mut self, _cpu: &C, _state: State) {}
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    // The per-tick cycle budget.
    pub cycles_per_tick: Cycles,
    // Requested at the end of each tick when the core accepts interrupts.
    pub interrupt_byte: Option<u8>,
    // Stop once the core can't run any further.
    pub run_once: bool,
    pub debug_mode: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        // A 2 MHz part at 60 ticks per second.
        DriverConfig { cycles_per_tick: 33_333, interrupt_byte: None, run_once: true, debug_mode: false }
    }
}

pub struct Driver<C, G, I, S> {
    cpu: C,
    governor: G,
    input: I,
    screen: S,
    debugger: Arc<Mutex<Debugger>>,
    config: DriverConfig,
    state: State,
    // Spent so far in the current tick.
    tick_cycles: Cycles,
    total_cycles: Cycles,
    // Set on leaving Stepping so the instruction under the breakpoint runs,
    // whether Running resumes directly or after a pause.
    resume_past_breakpoint: bool,
}

impl<C: Cpu, G: Governor, I: Input, S: Screen<C>> Driver<C, G, I, S> {
    pub fn new(cpu: C, governor: G, input: I, screen: S, config: DriverConfig) -> Self {
        let mut debugger = Debugger::new();
        debugger.set_debug_mode(config.debug_mode);
        Driver {
            cpu,
            governor,
            input,
            screen,
            debugger: Arc::new(Mutex::new(debugger)),
            config,
            state: State::Running,
            tick_cycles: 0,
            total_cycles: 0,
            resume_past_breakpoint: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_exit_state(&self) -> bool {
        self.state.is_exit_state()
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // Shared with whatever UI edits breakpoints.
    pub fn debugger(&self) -> Arc<Mutex<Debugger>> {
        self.debugger.clone()
    }

    pub fn total_cycles(&self) -> Cycles {
        self.total_cycles
    }

    pub fn transition(&mut self, event: Event) -> Result<()> {
        let Some(next) = self.state.on(event) else {
            return Err(EmulatorError::programming(format!(
                "no transition from {} on {event:?}",
                self.state
            )));
        };
        info!("Driver: {} -> {next}", self.state);
        // Paused on the way back still leaves the breakpoint behind.
        if self.state.is_stepping() && !next.is_stopped() {
            self.resume_past_breakpoint = true;
        }
        self.state = next;
        Ok(())
    }

    // Drives `perform` until the session stops.
    pub fn run(&mut self) -> Result<()> {
        if self.is_exit_state() {
            return Err(EmulatorError::programming("driver has already stopped"));
        }
        self.cpu.start();
        while !self.is_exit_state() {
            self.perform()?;
        }
        Ok(())
    }

    // One tick's work for the current state.
    pub fn perform(&mut self) -> Result<()> {
        match self.state {
            State::Running => self.perform_running(),
            State::Paused => self.perform_paused(),
            State::Stepping => self.perform_stepping(),
            State::Stopped => Ok(()),
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn step_cpu(&mut self) -> Result<()> {
        let cycles = self.cpu.step()?;
        self.tick_cycles += cycles;
        self.total_cycles += cycles;
        Ok(())
    }

    fn end_tick(&mut self) {
        self.tick_cycles = 0;
        if let Some(byte) = self.config.interrupt_byte {
            if self.cpu.is_interrupt_enabled() {
                self.cpu.interrupt(byte);
            }
        }
    }

    // Runs what is left of the tick's budget. Returns false if it ended the
    // session or hit a breakpoint instead.
    fn run_budget(&mut self) -> Result<bool> {
        while self.tick_cycles < self.config.cycles_per_tick {
            if !self.cpu.can_run_next_instruction() {
                if self.config.run_once {
                    self.transition(Event::Stop)?;
                    return Ok(false);
                }
                break;
            }
            let check = !std::mem::take(&mut self.resume_past_breakpoint);
            if check && self.debugger.lock().unwrap().should_break(self.cpu.pc()) {
                self.transition(Event::BreakpointHit)?;
                return Ok(false);
            }
            self.step_cpu()?;
        }
        self.end_tick();
        Ok(true)
    }

    fn perform_running(&mut self) -> Result<()> {
        if !self.governor.is_time_to_update() {
            return Ok(());
        }
        if !self.run_budget()? {
            return Ok(());
        }

        let mut request = InputRequest::default();
        self.input.read(&mut request)?;
        if request.quit {
            return self.transition(Event::Stop);
        }
        if request.toggle_pause {
            return self.transition(Event::TogglePause);
        }
        if request.step_instruction || request.step_cycle || request.continue_running {
            warn!("Driver: ignoring a debugger request while running");
        }
        self.screen.update_screen(&self.cpu, self.state);
        Ok(())
    }

    fn perform_paused(&mut self) -> Result<()> {
        if !self.governor.is_time_to_update() {
            return Ok(());
        }
        let mut request = InputRequest::default();
        self.input.read(&mut request)?;
        if request.quit {
            return self.transition(Event::Stop);
        }
        if request.toggle_pause {
            self.transition(Event::TogglePause)?;
        }
        self.screen.update_screen(&self.cpu, self.state);
        Ok(())
    }

    // One iteration of the debugger's poll loop.
    fn perform_stepping(&mut self) -> Result<()> {
        let mut request = InputRequest::default();
        self.input.read_debug_only(&mut request)?;
        if request.quit {
            return self.transition(Event::Stop);
        }
        if request.toggle_pause {
            return self.transition(Event::TogglePause);
        }
        if request.continue_running {
            return self.transition(Event::Continue);
        }

        if request.step_instruction {
            if self.cpu.can_run_next_instruction() {
                self.step_cpu()?;
            }
            if self.tick_cycles >= self.config.cycles_per_tick {
                self.end_tick();
            }
        } else if request.step_cycle {
            // Runs out the tick without stopping at breakpoints.
            while self.tick_cycles < self.config.cycles_per_tick
                && self.cpu.can_run_next_instruction()
            {
                self.step_cpu()?;
            }
            self.end_tick();
        }
        self.screen.update_debug_only(&self.cpu);
        Ok(())
    }
}
