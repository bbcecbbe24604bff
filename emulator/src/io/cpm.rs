use std::sync::{Arc, Mutex};

use common::error::{EmulatorError, Result};
use common::io::{IoObserver, SharedObserver};
use common::mem::Memory;
use common::misc::low_byte;

use log::{debug, info, warn};

use crate::cpu::{Cpu, Cycles};
use crate::i8080::I8080;
use crate::io::console::Console;
use crate::z80::Z80;

// Just enough CP/M to run the classic instruction exercisers: programs load
// at 0x100, call BDOS at 0x0005 and finish by jumping to 0x0000.
pub const PROGRAM_START: u16 = 0x100;
pub const MEMORY_SIZE: usize = 0x10000;

const BOOT: u16 = 0x0000;
const BDOS: u16 = 0x0005;
const FINISH_PORT: u8 = 0;
const BDOS_PORT: u8 = 1;

// BDOS functions, selected by C.
const C_WRITE: u8 = 2;
const C_WRITESTR: u8 = 9;

// The zero page, the program, then zeroes to the top of memory, with the
// warm boot and BDOS entry points patched to trap out through ports.
pub fn memory_image(program: &[u8]) -> Memory<u16, u8> {
    let mut mem = Memory::with_size(MEMORY_SIZE);
    let len = program.len().min(MEMORY_SIZE - PROGRAM_START as usize);
    mem.load(&program[..len], PROGRAM_START);
    // OUT 0
    mem.load(&[0xd3, FINISH_PORT], BOOT);
    // OUT 1; RET
    mem.load(&[0xd3, BDOS_PORT, 0xc9], BDOS);
    mem
}

// What the harness needs from a core beyond `Cpu`.
pub trait CpmMachine: Cpu {
    // C and DE at the BDOS call.
    fn bdos_args(&self) -> (u8, u16);
    fn peek(&self, addr: u16) -> u8;
    fn add_io_observer(&mut self, observer: SharedObserver);
}

impl CpmMachine for I8080 {
    fn bdos_args(&self) -> (u8, u16) {
        (self.regs().c, self.regs().de())
    }

    fn peek(&self, addr: u16) -> u8 {
        self.memory().direct_read(addr)
    }

    fn add_io_observer(&mut self, observer: SharedObserver) {
        I8080::add_io_observer(self, observer);
    }
}

impl CpmMachine for Z80 {
    fn bdos_args(&self) -> (u8, u16) {
        (self.regs().c, self.regs().de())
    }

    fn peek(&self, addr: u16) -> u8 {
        self.memory().direct_read(addr)
    }

    fn add_io_observer(&mut self, observer: SharedObserver) {
        Z80::add_io_observer(self, observer);
    }
}

////////////////////////////////////////////////////////////////////////////////

// Notes which trap fired. The session acts on it after the instruction, since
// the observer can't reach back into the core.
#[derive(Debug, Default)]
struct Traps {
    pending: Option<u8>,
}

impl IoObserver for Traps {
    fn in_requested(&mut self, port: u8) -> Result<Option<u8>> {
        Err(EmulatorError::IllegalPort(port as u16))
    }

    fn out_changed(&mut self, port: u8, _val: u8) -> Result<()> {
        match port {
            FINISH_PORT | BDOS_PORT => {
                self.pending = Some(port);
                Ok(())
            }
            _ => Err(EmulatorError::IllegalPort(port as u16)),
        }
    }
}

pub struct CpmSession<C> {
    cpu: C,
    console: Arc<dyn Console>,
    traps: Arc<Mutex<Traps>>,
    has_run: bool,
    finished: bool,
    cycles: Cycles,
}

impl CpmSession<I8080> {
    pub fn i8080(program: &[u8], console: Arc<dyn Console>) -> Self {
        Self::new(I8080::new(memory_image(program), PROGRAM_START), console)
    }
}

impl CpmSession<Z80> {
    pub fn z80(program: &[u8], console: Arc<dyn Console>) -> Self {
        Self::new(Z80::new(memory_image(program), PROGRAM_START), console)
    }
}

impl<C: CpmMachine> CpmSession<C> {
    // The core must already hold a CP/M image.
    pub fn new(mut cpu: C, console: Arc<dyn Console>) -> Self {
        let traps = Arc::new(Mutex::new(Traps::default()));
        cpu.add_io_observer(traps.clone());
        CpmSession { cpu, console, traps, has_run: false, finished: false, cycles: 0 }
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cycles(&self) -> Cycles {
        self.cycles
    }

    // Runs the program to completion. A session runs once.
    pub fn run(&mut self) -> Result<()> {
        if self.has_run {
            return Err(EmulatorError::programming("CP/M session has already run"));
        }
        self.has_run = true;
        self.cpu.start();

        while self.cpu.can_run_next_instruction() {
            if self.cpu.is_halted() && !self.cpu.is_interrupt_enabled() {
                warn!("CP/M: halted with interrupts disabled at {:#06x}", self.cpu.pc());
                break;
            }
            self.cycles += self.cpu.step()?;

            let trap = self.traps.lock().unwrap().pending.take();
            match trap {
                Some(FINISH_PORT) => {
                    info!("CP/M: program finished after {} cycles", self.cycles);
                    self.finished = true;
                    break;
                }
                Some(_) => self.bdos(),
                None => (),
            }
        }
        self.cpu.stop();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        Err(EmulatorError::programming("CP/M sessions can't be paused"))
    }

    pub fn stop(&mut self) -> Result<()> {
        Err(EmulatorError::programming("CP/M sessions can't be stopped"))
    }

    fn bdos(&mut self) {
        let (function, de) = self.cpu.bdos_args();
        match function {
            C_WRITE => self.console.handle_output(low_byte(de)),
            C_WRITESTR => {
                let mut addr = de;
                for _ in 0..MEMORY_SIZE {
                    let ch = self.cpu.peek(addr);
                    if ch == b'$' {
                        break;
                    }
                    self.console.handle_output(ch);
                    addr = addr.wrapping_add(1);
                }
            }
            _ => debug!("CP/M: ignoring BDOS function {function}"),
        }
    }
}
