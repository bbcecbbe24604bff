pub mod cycles;
pub mod flags;

use common::decoder::{AluOp, Cond, Decoded, FmtWithPc, RotOp};
use common::error::Result;
use common::lr35902::{Ins, Operand, Pair, Reg, decode};
use common::mem::Memory;
use common::misc::{Bits, high_byte, low_byte, to_u16};

use log::{debug, trace};

use crate::cpu::{Cpu, Cycles, Fetcher};
pub use flags::Flags;

pub const MEMORY_SIZE: usize = 0x10000;
pub const ENTRY_POINT: u16 = 0x100;
const HIGH_PAGE: u16 = 0xff00;

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
    pub fn hl(&self) -> u16 {
        to_u16(self.h, self.l)
    }

    pub fn set_hl(&mut self, val: u16) {
        (self.h, self.l) = (high_byte(val), low_byte(val));
    }
}

#[derive(Debug)]
pub struct Lr35902 {
    regs: Registers,
    flags: Flags,
    ime: bool,
    // EI takes effect after the instruction that follows it.
    ime_scheduled: bool,
    halted: bool,
    stopped: bool,
    pending: Option<u8>,
    mem: Memory<u16, u8>,
}

impl Lr35902 {
    pub fn new(mem: Memory<u16, u8>) -> Self {
        let mut cpu = Lr35902 {
            regs: Registers::default(),
            flags: Flags::default(),
            ime: false,
            ime_scheduled: false,
            halted: false,
            stopped: false,
            pending: None,
            mem,
        };
        cpu.reset_state();
        cpu
    }

    pub fn reset_state(&mut self) {
        self.regs = Registers { a: 0xff, sp: 0xfffe, pc: ENTRY_POINT, ..Default::default() };
        self.flags = Flags::from_raw(0xff);
        self.ime = false;
        self.ime_scheduled = false;
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

    pub fn ime(&self) -> bool {
        self.ime
    }

    pub fn set_ime(&mut self, ime: bool) {
        self.ime = ime;
    }

    ///////////////////////////////////////////////////////////////////////////

    fn reg(&self, r: Reg) -> u8 {
        match r {
            Reg::B => self.regs.b,
            Reg::C => self.regs.c,
            Reg::D => self.regs.d,
            Reg::E => self.regs.e,
            Reg::H => self.regs.h,
            Reg::L => self.regs.l,
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
            Reg::A => self.regs.a = val,
        }
    }

    fn pair(&self, p: Pair) -> u16 {
        let r = &self.regs;
        match p {
            Pair::Bc => to_u16(r.b, r.c),
            Pair::De => to_u16(r.d, r.e),
            Pair::Hl => r.hl(),
            Pair::Sp => r.sp,
            Pair::Af => to_u16(r.a, self.flags.to_raw()),
        }
    }

    fn set_pair(&mut self, p: Pair, val: u16) {
        let (high, low) = (high_byte(val), low_byte(val));
        match p {
            Pair::Bc => (self.regs.b, self.regs.c) = (high, low),
            Pair::De => (self.regs.d, self.regs.e) = (high, low),
            Pair::Hl => self.regs.set_hl(val),
            Pair::Sp => self.regs.sp = val,
            Pair::Af => {
                self.regs.a = high;
                self.flags = Flags::from_raw(low);
            }
        }
    }

    // Resolves a memory operand, applying the (HL+)/(HL-) adjustment.
    fn addr_of(&mut self, op: Operand) -> Option<u16> {
        let hl = self.regs.hl();
        match op {
            Operand::Ind(p) => Some(self.pair(p)),
            Operand::HlInc => {
                self.regs.set_hl(hl.wrapping_add(1));
                Some(hl)
            }
            Operand::HlDec => {
                self.regs.set_hl(hl.wrapping_sub(1));
                Some(hl)
            }
            Operand::Abs(nn) => Some(nn),
            Operand::High(n) => Some(HIGH_PAGE | n as u16),
            Operand::HighC => Some(HIGH_PAGE | self.regs.c as u16),
            Operand::Reg(_) | Operand::Imm(_) => None,
        }
    }

    fn read8(&mut self, op: Operand) -> u8 {
        match op {
            Operand::Reg(r) => self.reg(r),
            Operand::Imm(n) => n,
            _ => {
                let addr = self.addr_of(op).unwrap_or_default();
                self.mem.read(addr)
            }
        }
    }

    fn write8(&mut self, op: Operand, val: u8) {
        match op {
            Operand::Reg(r) => self.set_reg(r, val),
            Operand::Imm(_) => (),
            _ => {
                let addr = self.addr_of(op).unwrap_or_default();
                self.mem.write(addr, val);
            }
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
            Cond::Nz => !self.flags.get_zero(),
            Cond::Z => self.flags.get_zero(),
            Cond::Nc => !self.flags.get_carry(),
            Cond::C => self.flags.get_carry(),
            // Not encodable on this core.
            _ => false,
        }
    }

    fn alu(&mut self, op: AluOp, val: u8) {
        let a = self.regs.a;
        let carry = self.flags.get_carry();
        self.regs.a = match op {
            AluOp::Add => self.flags.add8(a, val, false),
            AluOp::Adc => self.flags.add8(a, val, carry),
            AluOp::Sub => self.flags.sub8(a, val, false),
            AluOp::Sbc => self.flags.sub8(a, val, carry),
            AluOp::And => self.flags.and8(a, val),
            AluOp::Xor => self.flags.logical(a ^ val),
            AluOp::Or => self.flags.logical(a | val),
            AluOp::Cp => {
                self.flags.sub8(a, val, false);
                a
            }
        };
    }

    fn rot(&self, op: RotOp, val: u8) -> (u8, bool) {
        let carry = self.flags.get_carry() as u8;
        let high = val.is_bit_set(7);
        let low = val.is_bit_set(0);
        match op {
            RotOp::Rlc => (val.rotate_left(1), high),
            RotOp::Rrc => (val.rotate_right(1), low),
            RotOp::Rl => ((val << 1) | carry, high),
            RotOp::Rr => ((val >> 1) | (carry << 7), low),
            RotOp::Sla => (val << 1, high),
            RotOp::Sra => ((val >> 1) | (val & 0x80), low),
            RotOp::Sll => ((val << 1) | 0x01, high),
            RotOp::Srl => (val >> 1, low),
        }
    }

    fn exec(&mut self, decoded: &Decoded<Ins>) -> Result<Cycles> {
        use Ins::*;
        let mut extra: Cycles = 0;
        match decoded.ins {
            Nop => (),
            Stop | Halt => {
                debug!("LR35902: {} at {:#06x}", decoded.ins, self.regs.pc);
                self.halted = true;
            }
            Ld(dst, src) => {
                let val = self.read8(src);
                self.write8(dst, val);
            }
            LdPairImm(p, nn) => self.set_pair(p, nn),
            StSp(nn) => self.write_word(nn, self.regs.sp),
            LdSpHl => self.regs.sp = self.regs.hl(),
            LdHlSp(e) => {
                let res = self.flags.add_sp(self.regs.sp, e);
                self.regs.set_hl(res);
            }
            AddHl(p) => {
                let (hl, val) = (self.regs.hl(), self.pair(p));
                let res = self.flags.add16(hl, val);
                self.regs.set_hl(res);
            }
            AddSp(e) => self.regs.sp = self.flags.add_sp(self.regs.sp, e),
            IncPair(p) => self.set_pair(p, self.pair(p).wrapping_add(1)),
            DecPair(p) => self.set_pair(p, self.pair(p).wrapping_sub(1)),
            Inc(op) => {
                let val = self.read8(op);
                let res = self.flags.inc8(val);
                self.write8(op, res);
            }
            Dec(op) => {
                let val = self.read8(op);
                let res = self.flags.dec8(val);
                self.write8(op, res);
            }
            Rlca | Rrca | Rla | Rra => {
                let op = match decoded.ins {
                    Rlca => RotOp::Rlc,
                    Rrca => RotOp::Rrc,
                    Rla => RotOp::Rl,
                    _ => RotOp::Rr,
                };
                let (res, carry) = self.rot(op, self.regs.a);
                self.regs.a = res;
                self.flags.accumulator_rotate(carry);
            }
            Daa => self.regs.a = self.flags.daa(self.regs.a),
            Cpl => {
                self.regs.a = !self.regs.a;
                self.flags.set_subtract(true);
                self.flags.set_half_carry(true);
            }
            Scf | Ccf => {
                let carry = decoded.ins == Scf || !self.flags.get_carry();
                self.flags.set_subtract(false);
                self.flags.set_half_carry(false);
                self.flags.set_carry(carry);
            }
            Alu(op, src) => {
                let val = self.read8(src);
                self.alu(op, val);
            }
            Rot(op, target) => {
                let val = self.read8(target);
                let (res, carry) = self.rot(op, val);
                self.flags.rotate(res, carry);
                self.write8(target, res);
            }
            Swap(target) => {
                let val = self.read8(target);
                let res = val.rotate_left(4);
                self.flags.logical(res);
                self.write8(target, res);
            }
            Bit(bit, target) => {
                let val = self.read8(target);
                self.flags.bit(bit, val);
            }
            Res(bit, target) | Set(bit, target) => {
                let val = self.read8(target);
                self.write8(target, val.with_bit(bit as u32, matches!(decoded.ins, Set(..))));
            }
            Jp(cc, nn) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.regs.pc = nn;
                    if cc.is_some() {
                        extra = cycles::JP_TAKEN;
                    }
                }
            }
            JpHl => self.regs.pc = self.regs.hl(),
            Jr(cc, d) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.regs.pc = self.regs.pc.wrapping_add(d as i16 as u16);
                    if cc.is_some() {
                        extra = cycles::JR_TAKEN;
                    }
                }
            }
            Call(cc, nn) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.push(self.regs.pc);
                    self.regs.pc = nn;
                    if cc.is_some() {
                        extra = cycles::CALL_TAKEN;
                    }
                }
            }
            Ret(cc) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.regs.pc = self.pop();
                    if cc.is_some() {
                        extra = cycles::RET_TAKEN;
                    }
                }
            }
            Reti => {
                self.regs.pc = self.pop();
                self.ime = true;
            }
            Rst(n) => {
                self.push(self.regs.pc);
                self.regs.pc = n as u16;
            }
            Push(p) => self.push(self.pair(p)),
            Pop(p) => {
                let val = self.pop();
                self.set_pair(p, val);
            }
            Di => {
                debug!("LR35902: interrupts disabled");
                self.ime = false;
                self.ime_scheduled = false;
            }
            Ei => {
                debug!("LR35902: interrupts enabled");
                self.ime_scheduled = true;
            }
        }
        Ok(cycles::of(decoded) + extra)
    }

    fn deliver_interrupt(&mut self, vector: u8) -> Cycles {
        debug!("LR35902: servicing interrupt at {vector:#04x}");
        self.ime = false;
        self.halted = false;
        self.push(self.regs.pc);
        self.regs.pc = vector as u16;
        cycles::INTERRUPT
    }
}

impl Cpu for Lr35902 {
    fn step(&mut self) -> Result<Cycles> {
        if self.pending.is_some() {
            // A request wakes a halted core even when it cannot be serviced.
            self.halted = false;
            if self.ime {
                if let Some(vector) = self.pending.take() {
                    return Ok(self.deliver_interrupt(vector));
                }
            }
        }
        if self.halted {
            return Ok(cycles::HALTED);
        }

        let pc = self.regs.pc;
        let decoded = match decode(&mut Fetcher::new(&mut self.mem, &mut self.regs.pc)) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.regs.pc = pc;
                return Err(err);
            }
        };
        trace!("{pc:#06x}: {}", decoded.ins.display_with_pc(pc));
        // An EI from the previous step lands now, so this instruction still
        // runs before any interrupt and a DI here overrides it.
        if std::mem::take(&mut self.ime_scheduled) {
            self.ime = true;
        }
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
        self.ime
    }

    // The byte is the vector to call: 0x40, 0x48, 0x50, 0x58 or 0x60.
    fn interrupt(&mut self, vector: u8) {
        self.pending = Some(vector);
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
        vec![
            ("af", self.pair(Pair::Af)),
            ("bc", self.pair(Pair::Bc)),
            ("de", self.pair(Pair::De)),
            ("hl", self.pair(Pair::Hl)),
            ("sp", self.regs.sp),
            ("pc", self.regs.pc),
        ]
    }

    fn flag_snapshot(&self) -> Vec<(&'static str, bool)> {
        let f = self.flags;
        vec![
            ("z", f.get_zero()),
            ("n", f.get_subtract()),
            ("h", f.get_half_carry()),
            ("c", f.get_carry()),
        ]
    }
}
