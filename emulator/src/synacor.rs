use std::collections::VecDeque;
use std::fmt;

use common::decoder::Decoded;
use common::error::{EmulatorError, Result};
use common::io::{Observers, SharedObserver};
use common::mem::Memory;
use common::synacor::{Arg, Ins, MODULUS, NUM_REGS, Opcode, decode};

use log::{debug, trace, warn};

use crate::cpu::{Cpu, Cycles, Fetcher};

pub use common::synacor::MEMORY_SIZE;

// The machine has a single character console.
pub const CONSOLE_PORT: u8 = 0;

const CYCLES: Cycles = 1;

const REG_NAMES: [&str; NUM_REGS] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

pub struct Synacor {
    regs: [u16; NUM_REGS],
    pc: u16,
    stack: Vec<u16>,
    halted: bool,
    stopped: bool,
    input: VecDeque<u8>,
    initial_pc: u16,
    mem: Memory<u16, u16>,
    observers: Observers,
}

impl Synacor {
    pub fn new(mem: Memory<u16, u16>, initial_pc: u16) -> Self {
        Synacor {
            regs: [0; NUM_REGS],
            pc: initial_pc,
            stack: Vec::new(),
            halted: false,
            stopped: false,
            input: VecDeque::new(),
            initial_pc,
            mem,
            observers: Observers::new(),
        }
    }

    pub fn reset_state(&mut self) {
        self.regs = [0; NUM_REGS];
        self.pc = self.initial_pc;
        self.stack.clear();
        self.halted = false;
        self.input.clear();
    }

    pub fn regs(&self) -> &[u16; NUM_REGS] {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut [u16; NUM_REGS] {
        &mut self.regs
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn memory(&self) -> &Memory<u16, u16> {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory<u16, u16> {
        &mut self.mem
    }

    pub fn add_io_observer(&mut self, observer: SharedObserver) {
        self.observers.add(observer);
    }

    // Queues characters for `in`.
    pub fn input(&mut self, text: &[u8]) {
        self.input.extend(text);
    }

    fn value(&self, arg: Arg) -> u16 {
        match arg {
            Arg::Lit(n) => n,
            Arg::Reg(r) => self.regs[r as usize],
        }
    }

    fn arg(&self, ins: &Ins, i: usize) -> u16 {
        ins.args.get(i).map(|a| self.value(*a)).unwrap_or_default()
    }

    fn exec(&mut self, ins: &Ins) -> Result<Cycles> {
        use Opcode::*;
        let b = self.arg(ins, 1);
        let c = self.arg(ins, 2);
        match ins.op {
            Halt => {
                debug!("Synacor: halted at {:#06x}", self.pc.wrapping_sub(ins.len()));
                self.halted = true;
            }
            Set => self.regs[ins.dst()?] = b,
            Push => self.stack.push(self.arg(ins, 0)),
            Pop => {
                let val = self.stack.pop().ok_or(EmulatorError::StackUnderflow)?;
                self.regs[ins.dst()?] = val;
            }
            Eq => self.regs[ins.dst()?] = (b == c) as u16,
            Gt => self.regs[ins.dst()?] = (b > c) as u16,
            Jmp => self.pc = self.arg(ins, 0),
            Jt => {
                if self.arg(ins, 0) != 0 {
                    self.pc = b;
                }
            }
            Jf => {
                if self.arg(ins, 0) == 0 {
                    self.pc = b;
                }
            }
            Add => self.regs[ins.dst()?] = (b + c) % MODULUS,
            Mult => self.regs[ins.dst()?] = ((b as u32 * c as u32) % MODULUS as u32) as u16,
            Mod => {
                if c == 0 {
                    return Err(EmulatorError::programming("mod by zero"));
                }
                self.regs[ins.dst()?] = b % c;
            }
            And => self.regs[ins.dst()?] = b & c,
            Or => self.regs[ins.dst()?] = b | c,
            Not => self.regs[ins.dst()?] = !b & (MODULUS - 1),
            Rmem => {
                let val = self.mem.read(b);
                self.regs[ins.dst()?] = val;
            }
            Wmem => {
                let addr = self.arg(ins, 0);
                self.mem.write(addr, b);
            }
            Call => {
                self.stack.push(self.pc);
                self.pc = self.arg(ins, 0);
            }
            Ret => match self.stack.pop() {
                Some(addr) => self.pc = addr,
                None => {
                    debug!("Synacor: ret with an empty stack, halting");
                    self.halted = true;
                }
            },
            Out => self.observers.notify_out(CONSOLE_PORT, self.arg(ins, 0) as u8)?,
            In => {
                let supplied = self.observers.notify_in(CONSOLE_PORT)?;
                match supplied.or_else(|| self.input.pop_front()) {
                    Some(ch) => self.regs[ins.dst()?] = ch as u16,
                    // Wait for input.
                    None => self.pc = self.pc.wrapping_sub(ins.len()),
                }
            }
            Noop => (),
        }
        Ok(CYCLES)
    }
}

impl fmt::Debug for Synacor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Synacor")
            .field("regs", &self.regs)
            .field("pc", &self.pc)
            .field("stack", &self.stack.len())
            .field("halted", &self.halted)
            .finish()
    }
}

impl Cpu for Synacor {
    fn step(&mut self) -> Result<Cycles> {
        if self.halted {
            return Ok(CYCLES);
        }
        let pc = self.pc;
        let decoded: Result<Decoded<Ins>> = decode(&mut Fetcher::new(&mut self.mem, &mut self.pc));
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                self.pc = pc;
                return Err(err);
            }
        };
        trace!("{pc:#06x}: {}", decoded.ins);
        self.exec(&decoded.ins)
    }

    fn pc(&self) -> u16 {
        self.pc
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
        warn!("Synacor: no interrupts, ignoring {byte:#04x}");
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
        let mut regs: Vec<_> = REG_NAMES.iter().copied().zip(self.regs).collect();
        regs.push(("pc", self.pc));
        regs.push(("sp", self.stack.len() as u16));
        regs
    }

    fn flag_snapshot(&self) -> Vec<(&'static str, bool)> {
        Vec::new()
    }
}
