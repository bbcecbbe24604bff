use std::fmt;

use common::decoder::Decoded;
use common::error::Result;
use common::io::{Observers, SharedObserver};
use common::lmc::{Ins, MAX_VALUE, decode_word};
use common::mem::Memory;

use log::{debug, trace, warn};

use crate::cpu::{Cpu, Cycles};

pub use common::lmc::MEMORY_SIZE;

const MODULUS: u16 = MAX_VALUE + 1;

// Every mailbox instruction takes one step.
const CYCLES: Cycles = 1;

// The LMC's I/O is a single in-basket and two out-baskets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Inp,
    Out,
    Otc,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

pub struct Lmc {
    acc: u16,
    pc: u8,
    negative: bool,
    halted: bool,
    stopped: bool,
    // The next value INP will take, when no observer supplies one.
    input: Option<u16>,
    initial_pc: u8,
    mem: Memory<u8, u16>,
    observers: Observers<Port, u16>,
}

impl Lmc {
    pub fn new(mem: Memory<u8, u16>, initial_pc: u8) -> Self {
        let mut cpu = Lmc {
            acc: 0,
            pc: initial_pc,
            negative: false,
            halted: false,
            stopped: false,
            input: None,
            initial_pc,
            mem,
            observers: Observers::new(),
        };
        cpu.reset_state();
        cpu
    }

    pub fn reset_state(&mut self) {
        self.acc = 0;
        self.pc = self.initial_pc;
        self.negative = false;
        self.halted = false;
        self.input = None;
    }

    pub fn acc(&self) -> u16 {
        self.acc
    }

    pub fn set_acc(&mut self, val: u16) {
        self.acc = val % MODULUS;
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn memory(&self) -> &Memory<u8, u16> {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory<u8, u16> {
        &mut self.mem
    }

    pub fn add_io_observer(&mut self, observer: SharedObserver<Port, u16>) {
        self.observers.add(observer);
    }

    pub fn input(&mut self, val: u16) {
        self.input = Some(val % MODULUS);
    }

    // True while an INP is stalled for lack of input.
    pub fn is_waiting_for_input(&self) -> bool {
        !self.halted && self.mem.direct_read(self.pc) == 901 && self.input.is_none()
    }

    fn load(&mut self, val: u16) {
        self.acc = val;
        self.negative = false;
    }

    fn exec(&mut self, decoded: &Decoded<Ins>) -> Result<Cycles> {
        use Ins::*;
        match decoded.ins {
            Hlt | Dat(_) => {
                debug!("LMC: halted at {:02}", self.pc.wrapping_sub(1));
                self.halted = true;
            }
            Add(addr) => {
                let val = self.mem.read(addr) % MODULUS;
                self.load((self.acc + val) % MODULUS);
            }
            Sub(addr) => {
                let val = self.mem.read(addr) % MODULUS;
                self.negative = self.acc < val;
                self.acc = (self.acc + MODULUS - val) % MODULUS;
            }
            Sta(addr) => self.mem.write(addr, self.acc),
            Lda(addr) => {
                let val = self.mem.read(addr);
                self.load(val % MODULUS);
            }
            Bra(addr) => self.pc = addr,
            Brz(addr) => {
                if self.acc == 0 {
                    self.pc = addr;
                }
            }
            Brp(addr) => {
                if !self.negative {
                    self.pc = addr;
                }
            }
            Inp => {
                let supplied = self.observers.notify_in(Port::Inp)?;
                match supplied.or_else(|| self.input.take()) {
                    Some(val) => self.load(val % MODULUS),
                    // Try again next step.
                    None => self.pc = self.pc.wrapping_sub(1),
                }
            }
            Out => self.observers.notify_out(Port::Out, self.acc)?,
            Otc => self.observers.notify_out(Port::Otc, self.acc)?,
        }
        Ok(CYCLES)
    }
}

impl fmt::Debug for Lmc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Lmc")
            .field("acc", &self.acc)
            .field("pc", &self.pc)
            .field("negative", &self.negative)
            .field("halted", &self.halted)
            .finish()
    }
}

impl Cpu for Lmc {
    fn step(&mut self) -> Result<Cycles> {
        if self.halted {
            return Ok(CYCLES);
        }
        let pc = self.pc;
        let decoded = decode_word(self.mem.read(pc))?;
        self.pc = pc.wrapping_add(1);
        trace!("{pc:02}: {}", decoded.ins);
        self.exec(&decoded)
    }

    fn pc(&self) -> u16 {
        self.pc as u16
    }

    fn can_run_next_instruction(&self) -> bool {
        !self.stopped && !self.halted && (self.pc as usize) < MEMORY_SIZE
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn is_interrupt_enabled(&self) -> bool {
        false
    }

    fn interrupt(&mut self, byte: u8) {
        warn!("LMC: no interrupts, ignoring {byte:#04x}");
    }

    fn reset(&mut self) {
        self.reset_state();
    }

    fn start(&mut self) {
        self.stopped = false;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn register_snapshot(&self) -> Vec<(&'static str, u16)> {
        vec![("acc", self.acc), ("pc", self.pc as u16)]
    }

    fn flag_snapshot(&self) -> Vec<(&'static str, bool)> {
        vec![("n", self.negative)]
    }
}
