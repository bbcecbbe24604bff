pub mod flags;

use common::decoder::{AluOp, Cond, Decoded};
use common::error::Result;
use common::i8080::{decode, decode_opcode, Ins, Reg, RegPair, StackPair};
use common::io::SharedObserver;
use common::mem::Memory;
use common::misc::{high_byte, low_byte, to_u16};

use log::{debug, trace};

use crate::cpu::{Cpu, Cycles, Fetcher};
use crate::io::Ports;
pub use flags::Flags;

pub const MEMORY_SIZE: usize = 0x10000;
const HALTED_CYCLES: Cycles = 4;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    pub fn bc(&self) -> u16 {
        to_u16(self.b, self.c)
    }

    pub fn de(&self) -> u16 {
        to_u16(self.d, self.e)
    }

    pub fn hl(&self) -> u16 {
        to_u16(self.h, self.l)
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = high_byte(val);
        self.l = low_byte(val);
    }
}

#[derive(Debug)]
pub struct I8080 {
    regs: Registers,
    flags: Flags,
    inte: bool,
    halted: bool,
    stopped: bool,
    pending: Option<u8>,
    initial_pc: u16,
    mem: Memory<u16, u8>,
    ports: Ports,
}

impl I8080 {
    pub fn new(mem: Memory<u16, u8>, initial_pc: u16) -> Self {
        let mut cpu = I8080 {
            regs: Registers::default(),
            flags: Flags::new(),
            inte: false,
            halted: false,
            stopped: true,
            pending: None,
            initial_pc,
            mem,
            ports: Ports::new(),
        };
        cpu.reset_state();
        cpu
    }

    pub fn reset_state(&mut self) {
        self.regs = Registers { pc: self.initial_pc, ..Default::default() };
        self.flags = Flags::new();
        self.inte = false;
        self.halted = false;
        self.pending = None;
    }

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    pub fn memory(&self) -> &Memory<u16, u8> {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory<u16, u8> {
        &mut self.mem
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    pub fn add_io_observer(&mut self, observer: SharedObserver) {
        self.ports.add_observer(observer);
    }

    pub fn input(&mut self, port: u8, val: u8) {
        self.ports.input(port, val);
    }

    ///////////////////////////////////////////////////////////////////////////

    fn reg(&mut self, r: Reg) -> u8 {
        match r {
            Reg::B => self.regs.b,
            Reg::C => self.regs.c,
            Reg::D => self.regs.d,
            Reg::E => self.regs.e,
            Reg::H => self.regs.h,
            Reg::L => self.regs.l,
            Reg::M => self.mem.read(self.regs.hl()),
            Reg::A => self.regs.a,
        }
    }

    fn set_reg(&mut self, r: Reg, val: u8) {
        match r {
            Reg::B => self.regs.b = val,
            Reg::C => self.regs.c = val,
            Reg::D => self.regs.d = val,
            Reg::E => self.regs.e = val,
            Reg::H => self.regs.h = val,
            Reg::L => self.regs.l = val,
            Reg::M => self.mem.write(self.regs.hl(), val),
            Reg::A => self.regs.a = val,
        }
    }

    fn pair(&self, rp: RegPair) -> u16 {
        match rp {
            RegPair::B => self.regs.bc(),
            RegPair::D => self.regs.de(),
            RegPair::H => self.regs.hl(),
            RegPair::Sp => self.regs.sp,
        }
    }

    fn set_pair(&mut self, rp: RegPair, val: u16) {
        let (high, low) = (high_byte(val), low_byte(val));
        match rp {
            RegPair::B => (self.regs.b, self.regs.c) = (high, low),
            RegPair::D => (self.regs.d, self.regs.e) = (high, low),
            RegPair::H => (self.regs.h, self.regs.l) = (high, low),
            RegPair::Sp => self.regs.sp = val,
        }
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let low = self.mem.read(addr);
        let high = self.mem.read(addr.wrapping_add(1));
        to_u16(high, low)
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        self.mem.write(addr, low_byte(val));
        self.mem.write(addr.wrapping_add(1), high_byte(val));
    }

    fn push(&mut self, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        self.write_word(self.regs.sp, val);
    }

    fn pop(&mut self) -> u16 {
        let val = self.read_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        val
    }

    fn cond(&self, cc: Cond) -> bool {
        match cc {
            Cond::Nz => !self.flags.zero,
            Cond::Z => self.flags.zero,
            Cond::Nc => !self.flags.carry,
            Cond::C => self.flags.carry,
            Cond::Po => !self.flags.parity,
            Cond::Pe => self.flags.parity,
            Cond::P => !self.flags.sign,
            Cond::M => self.flags.sign,
        }
    }

    fn alu(&mut self, op: AluOp, val: u8) {
        let a = self.regs.a;
        let carry = self.flags.carry;
        let res = match op {
            AluOp::Add => self.flags.add(a, val, false),
            AluOp::Adc => self.flags.add(a, val, carry),
            AluOp::Sub => self.flags.sub(a, val, false),
            AluOp::Sbc => self.flags.sub(a, val, carry),
            AluOp::And => self.flags.and(a, val),
            AluOp::Xor => self.flags.xor(a, val),
            AluOp::Or => self.flags.or(a, val),
            AluOp::Cp => {
                self.flags.sub(a, val, false);
                a
            }
        };
        self.regs.a = res;
    }

    fn daa(&mut self) {
        let a = self.regs.a;
        let lsb = a & 0x0f;
        let msb = a >> 4;
        let mut correction = 0u8;
        let mut carry = self.flags.carry;
        if self.flags.aux_carry || lsb > 9 {
            correction |= 0x06;
        }
        if self.flags.carry || msb > 9 || (msb >= 9 && lsb > 9) {
            correction |= 0x60;
            carry = true;
        }
        self.regs.a = self.flags.add(a, correction, false);
        self.flags.carry = carry;
    }

    fn exec(&mut self, decoded: &Decoded<Ins>) -> Result<Cycles> {
        use Ins::*;
        let cycles = match decoded.ins {
            Nop => 4,
            Lxi(rp, nn) => {
                self.set_pair(rp, nn);
                10
            }
            Stax(rp) => {
                self.mem.write(self.pair(rp), self.regs.a);
                7
            }
            Ldax(rp) => {
                self.regs.a = self.mem.read(self.pair(rp));
                7
            }
            Shld(nn) => {
                self.write_word(nn, self.regs.hl());
                16
            }
            Lhld(nn) => {
                let val = self.read_word(nn);
                self.regs.set_hl(val);
                16
            }
            Sta(nn) => {
                self.mem.write(nn, self.regs.a);
                13
            }
            Lda(nn) => {
                self.regs.a = self.mem.read(nn);
                13
            }
            Inx(rp) => {
                self.set_pair(rp, self.pair(rp).wrapping_add(1));
                5
            }
            Dcx(rp) => {
                self.set_pair(rp, self.pair(rp).wrapping_sub(1));
                5
            }
            Inr(r) => {
                let val = self.reg(r);
                let res = self.flags.inc(val);
                self.set_reg(r, res);
                if r == Reg::M { 10 } else { 5 }
            }
            Dcr(r) => {
                let val = self.reg(r);
                let res = self.flags.dec(val);
                self.set_reg(r, res);
                if r == Reg::M { 10 } else { 5 }
            }
            Mvi(r, n) => {
                self.set_reg(r, n);
                if r == Reg::M { 10 } else { 7 }
            }
            Dad(rp) => {
                let hl = self.regs.hl();
                let val = self.pair(rp);
                self.flags.carry = hl.checked_add(val).is_none();
                self.regs.set_hl(hl.wrapping_add(val));
                10
            }
            Rlc => {
                self.flags.carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                4
            }
            Rrc => {
                self.flags.carry = self.regs.a & 0x01 != 0;
                self.regs.a = self.regs.a.rotate_right(1);
                4
            }
            Ral => {
                let carry = self.flags.carry;
                self.flags.carry = self.regs.a & 0x80 != 0;
                self.regs.a = (self.regs.a << 1) | carry as u8;
                4
            }
            Rar => {
                let carry = self.flags.carry;
                self.flags.carry = self.regs.a & 0x01 != 0;
                self.regs.a = (self.regs.a >> 1) | ((carry as u8) << 7);
                4
            }
            Daa => {
                self.daa();
                4
            }
            Cma => {
                self.regs.a = !self.regs.a;
                4
            }
            Stc => {
                self.flags.carry = true;
                4
            }
            Cmc => {
                self.flags.carry = !self.flags.carry;
                4
            }
            Mov(dst, src) => {
                let val = self.reg(src);
                self.set_reg(dst, val);
                if dst == Reg::M || src == Reg::M { 7 } else { 5 }
            }
            Hlt => {
                debug!("I8080: halted at {:#06x}", self.regs.pc.wrapping_sub(1));
                self.halted = true;
                7
            }
            Alu(op, r) => {
                let val = self.reg(r);
                self.alu(op, val);
                if r == Reg::M { 7 } else { 4 }
            }
            AluImm(op, n) => {
                self.alu(op, n);
                7
            }
            Ret(None) => {
                self.regs.pc = self.pop();
                10
            }
            Ret(Some(cc)) => {
                if self.cond(cc) {
                    self.regs.pc = self.pop();
                    11
                } else {
                    5
                }
            }
            Jmp(cc, nn) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.regs.pc = nn;
                }
                10
            }
            Call(None, nn) => {
                self.push(self.regs.pc);
                self.regs.pc = nn;
                17
            }
            Call(Some(cc), nn) => {
                if self.cond(cc) {
                    self.push(self.regs.pc);
                    self.regs.pc = nn;
                    17
                } else {
                    11
                }
            }
            Pop(sp) => {
                let val = self.pop();
                match sp {
                    StackPair::B => self.set_pair(RegPair::B, val),
                    StackPair::D => self.set_pair(RegPair::D, val),
                    StackPair::H => self.set_pair(RegPair::H, val),
                    StackPair::Psw => {
                        self.regs.a = high_byte(val);
                        self.flags = Flags::from_byte(low_byte(val));
                    }
                }
                10
            }
            Push(sp) => {
                let val = match sp {
                    StackPair::B => self.regs.bc(),
                    StackPair::D => self.regs.de(),
                    StackPair::H => self.regs.hl(),
                    StackPair::Psw => to_u16(self.regs.a, self.flags.to_byte()),
                };
                self.push(val);
                11
            }
            Rst(n) => {
                self.push(self.regs.pc);
                self.regs.pc = (n as u16) * 8;
                11
            }
            Pchl => {
                self.regs.pc = self.regs.hl();
                5
            }
            Sphl => {
                self.regs.sp = self.regs.hl();
                5
            }
            Xthl => {
                let val = self.read_word(self.regs.sp);
                self.write_word(self.regs.sp, self.regs.hl());
                self.regs.set_hl(val);
                18
            }
            Xchg => {
                let de = self.regs.de();
                self.set_pair(RegPair::D, self.regs.hl());
                self.regs.set_hl(de);
                4
            }
            Out(port) => {
                self.ports.write(port, self.regs.a)?;
                10
            }
            In(port) => {
                self.regs.a = self.ports.read(port)?;
                10
            }
            Di => {
                debug!("I8080: interrupts disabled");
                self.inte = false;
                4
            }
            Ei => {
                debug!("I8080: interrupts enabled");
                self.inte = true;
                4
            }
        };
        Ok(cycles)
    }

    // The interrupting device jams an opcode onto the bus; usually an RST.
    fn deliver_interrupt(&mut self, opcode: u8) -> Result<Cycles> {
        debug!("I8080: servicing interrupt with {opcode:#04x}");
        self.inte = false;
        self.halted = false;
        let decoded = decode_opcode(opcode, &mut Fetcher::new(&mut self.mem, &mut self.regs.pc))?;
        self.exec(&decoded)
    }
}

impl Cpu for I8080 {
    fn step(&mut self) -> Result<Cycles> {
        if self.inte {
            if let Some(opcode) = self.pending.take() {
                return self.deliver_interrupt(opcode);
            }
        }
        if self.halted {
            return Ok(HALTED_CYCLES);
        }

        let pc = self.regs.pc;
        let decoded = decode(&mut Fetcher::new(&mut self.mem, &mut self.regs.pc))?;
        trace!("{pc:#06x}: {}", decoded.ins);
        self.exec(&decoded)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn can_run_next_instruction(&self) -> bool {
        !self.stopped && (self.regs.pc as usize) < self.mem.size()
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn is_interrupt_enabled(&self) -> bool {
        self.inte
    }

    // The request stays latched until INTE lets it through. A newer request
    // replaces an unserviced one.
    fn interrupt(&mut self, byte: u8) {
        if !self.inte {
            debug!("I8080: holding interrupt {byte:#04x} until interrupts are enabled");
        }
        self.pending = Some(byte);
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
        let r = &self.regs;
        vec![
            ("a", r.a as u16),
            ("b", r.b as u16),
            ("c", r.c as u16),
            ("d", r.d as u16),
            ("e", r.e as u16),
            ("h", r.h as u16),
            ("l", r.l as u16),
            ("sp", r.sp),
            ("pc", r.pc),
        ]
    }

    fn flag_snapshot(&self) -> Vec<(&'static str, bool)> {
        let f = &self.flags;
        vec![
            ("s", f.sign),
            ("z", f.zero),
            ("ac", f.aux_carry),
            ("p", f.parity),
            ("c", f.carry),
        ]
    }
}
