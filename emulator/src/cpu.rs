use std::fmt;

use common::decoder::Source;
use common::error::Result;
use common::mem::Memory;

use delegate::delegate;

use crate::i8080::I8080;
use crate::lmc::Lmc;
use crate::lr35902::Lr35902;
use crate::synacor::Synacor;
use crate::z80::Z80;

// Clock cycles (T-states on the Z80).
pub type Cycles = u64;

// What the execution driver and the debugger need from a core.
pub trait Cpu {
    // Runs one instruction, or services one pending interrupt, and returns
    // what it cost.
    fn step(&mut self) -> Result<Cycles>;

    fn pc(&self) -> u16;

    // False once the core is stopped or the PC has left memory.
    fn can_run_next_instruction(&self) -> bool;

    fn is_halted(&self) -> bool;
    fn is_interrupt_enabled(&self) -> bool;

    // Requests a maskable interrupt; the byte is an instruction or a vector
    // depending on the core. Delivered by the next `step`.
    fn interrupt(&mut self, byte: u8);

    fn reset(&mut self);
    fn start(&mut self);
    fn stop(&mut self);

    fn register_snapshot(&self) -> Vec<(&'static str, u16)>;
    fn flag_snapshot(&self) -> Vec<(&'static str, bool)>;
}

////////////////////////////////////////////////////////////////////////////////

// Feeds the shared decoders from live memory, advancing the PC as it goes.
pub(crate) struct Fetcher<'a, D> {
    mem: &'a mut Memory<u16, D>,
    pc: &'a mut u16,
    pub opcode_fetches: u8,
}

impl<'a, D> Fetcher<'a, D> {
    pub fn new(mem: &'a mut Memory<u16, D>, pc: &'a mut u16) -> Self {
        Fetcher { mem, pc, opcode_fetches: 0 }
    }
}

impl<D: Copy + Default + fmt::Debug + 'static> Source<D> for Fetcher<'_, D> {
    fn next(&mut self) -> D {
        let val = self.mem.read(*self.pc);
        *self.pc = self.pc.wrapping_add(1);
        val
    }

    fn next_opcode(&mut self) -> D {
        self.opcode_fetches += 1;
        self.next()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub enum AnyCpu {
    I8080(I8080),
    Z80(Z80),
    Lr35902(Lr35902),
    Lmc(Lmc),
    Synacor(Synacor),
}

impl Cpu for AnyCpu {
    delegate! {
        to match self {
            AnyCpu::I8080(x) => x,
            AnyCpu::Z80(x) => x,
            AnyCpu::Lr35902(x) => x,
            AnyCpu::Lmc(x) => x,
            AnyCpu::Synacor(x) => x,
        } {
            fn step(&mut self) -> Result<Cycles>;
            fn pc(&self) -> u16;
            fn can_run_next_instruction(&self) -> bool;
            fn is_halted(&self) -> bool;
            fn is_interrupt_enabled(&self) -> bool;
            fn interrupt(&mut self, byte: u8);
            fn reset(&mut self);
            fn start(&mut self);
            fn stop(&mut self);
            fn register_snapshot(&self) -> Vec<(&'static str, u16)>;
            fn flag_snapshot(&self) -> Vec<(&'static str, bool)>;
        }
    }
}
