pub mod cycles;
pub mod flags;

use common::decoder::{AluOp, Cond, Decoded, FmtWithPc, RotOp};
use common::error::Result;
use common::io::SharedObserver;
use common::mem::Memory;
use common::misc::{Bits, high_byte, low_byte, to_u16};
use common::z80::{Block, BlockKind, Index, Ins, Operand, Pair, Reg, decode, decode_opcode};

use log::{debug, trace};

use crate::cpu::{Cpu, Cycles, Fetcher};
use crate::io::Ports;
pub use flags::Flags;

pub const MEMORY_SIZE: usize = 0x10000;
const NMI_VECTOR: u16 = 0x66;
const MODE_1_VECTOR: u16 = 0x38;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
    #[default]
    Zero,
    One,
    Two,
}

// The alternate bank, reached through EX AF, AF' and EXX.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Shadow {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub shadow: Shadow,
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

    pub fn set_bc(&mut self, val: u16) {
        (self.b, self.c) = (high_byte(val), low_byte(val));
    }

    pub fn set_de(&mut self, val: u16) {
        (self.d, self.e) = (high_byte(val), low_byte(val));
    }

    pub fn set_hl(&mut self, val: u16) {
        (self.h, self.l) = (high_byte(val), low_byte(val));
    }
}

#[derive(Debug)]
pub struct Z80 {
    regs: Registers,
    flags: Flags,
    iff1: bool,
    iff2: bool,
    mode: InterruptMode,
    halted: bool,
    stopped: bool,
    pending: Option<u8>,
    nmi_pending: bool,
    initial_pc: u16,
    mem: Memory<u16, u8>,
    ports: Ports,
}

impl Z80 {
    pub fn new(mem: Memory<u16, u8>, initial_pc: u16) -> Self {
        let mut cpu = Z80 {
            regs: Registers::default(),
            flags: Flags::default(),
            iff1: false,
            iff2: false,
            mode: InterruptMode::Zero,
            halted: false,
            stopped: false,
            pending: None,
            nmi_pending: false,
            initial_pc,
            mem,
            ports: Ports::new(),
        };
        cpu.reset_state();
        cpu
    }

    pub fn reset_state(&mut self) {
        self.regs = Registers { a: 0xff, sp: 0xffff, pc: self.initial_pc, ..Default::default() };
        self.flags = Flags::from_raw(0xff);
        self.iff1 = false;
        self.iff2 = false;
        self.mode = InterruptMode::Zero;
        self.halted = false;
        self.pending = None;
        self.nmi_pending = false;
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

    pub fn iff1(&self) -> bool {
        self.iff1
    }

    pub fn iff2(&self) -> bool {
        self.iff2
    }

    pub fn set_iff(&mut self, iff1: bool, iff2: bool) {
        self.iff1 = iff1;
        self.iff2 = iff2;
    }

    pub fn interrupt_mode(&self) -> InterruptMode {
        self.mode
    }

    pub fn set_interrupt_mode(&mut self, mode: InterruptMode) {
        self.mode = mode;
    }

    pub fn nmi_interrupt(&mut self) {
        self.nmi_pending = true;
    }

    ///////////////////////////////////////////////////////////////////////////
    // Registers and operands

    // R counts opcode fetches in its low seven bits.
    fn inc_r(&mut self, fetches: u8) {
        let r = self.regs.r;
        self.regs.r = (r & 0x80) | (r.wrapping_add(fetches) & 0x7f);
    }

    fn reg8(&self, r: Reg) -> u8 {
        let regs = &self.regs;
        match r {
            Reg::B => regs.b,
            Reg::C => regs.c,
            Reg::D => regs.d,
            Reg::E => regs.e,
            Reg::H => regs.h,
            Reg::L => regs.l,
            Reg::A => regs.a,
            Reg::Ixh => high_byte(regs.ix),
            Reg::Ixl => low_byte(regs.ix),
            Reg::Iyh => high_byte(regs.iy),
            Reg::Iyl => low_byte(regs.iy),
            Reg::I => regs.i,
            Reg::R => regs.r,
        }
    }

    fn set_reg8(&mut self, r: Reg, val: u8) {
        let regs = &mut self.regs;
        match r {
            Reg::B => regs.b = val,
            Reg::C => regs.c = val,
            Reg::D => regs.d = val,
            Reg::E => regs.e = val,
            Reg::H => regs.h = val,
            Reg::L => regs.l = val,
            Reg::A => regs.a = val,
            Reg::Ixh => regs.ix = to_u16(val, low_byte(regs.ix)),
            Reg::Ixl => regs.ix = to_u16(high_byte(regs.ix), val),
            Reg::Iyh => regs.iy = to_u16(val, low_byte(regs.iy)),
            Reg::Iyl => regs.iy = to_u16(high_byte(regs.iy), val),
            Reg::I => regs.i = val,
            Reg::R => regs.r = val,
        }
    }

    fn pair(&self, p: Pair) -> u16 {
        match p {
            Pair::Bc => self.regs.bc(),
            Pair::De => self.regs.de(),
            Pair::Hl => self.regs.hl(),
            Pair::Sp => self.regs.sp,
            Pair::Af => to_u16(self.regs.a, self.flags.to_raw()),
            Pair::Ix => self.regs.ix,
            Pair::Iy => self.regs.iy,
        }
    }

    fn set_pair(&mut self, p: Pair, val: u16) {
        match p {
            Pair::Bc => self.regs.set_bc(val),
            Pair::De => self.regs.set_de(val),
            Pair::Hl => self.regs.set_hl(val),
            Pair::Sp => self.regs.sp = val,
            Pair::Af => {
                self.regs.a = high_byte(val);
                self.flags = Flags::from_raw(low_byte(val));
            }
            Pair::Ix => self.regs.ix = val,
            Pair::Iy => self.regs.iy = val,
        }
    }

    fn index(&self, index: Index) -> u16 {
        match index {
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    fn addr_of(&self, op: Operand) -> Option<u16> {
        match op {
            Operand::Ind(p) => Some(self.pair(p)),
            Operand::Idx(index, d) => Some(self.index(index).wrapping_add(d as i16 as u16)),
            Operand::Abs(nn) => Some(nn),
            Operand::Reg(_) | Operand::Imm(_) => None,
        }
    }

    fn read8(&mut self, op: Operand) -> u8 {
        match op {
            Operand::Reg(r) => self.reg8(r),
            Operand::Imm(n) => n,
            _ => {
                let addr = self.addr_of(op).unwrap_or_default();
                self.mem.read(addr)
            }
        }
    }

    fn write8(&mut self, op: Operand, val: u8) {
        match op {
            Operand::Reg(r) => self.set_reg8(r, val),
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
        let f = self.flags;
        match cc {
            Cond::Nz => !f.get_zero(),
            Cond::Z => f.get_zero(),
            Cond::Nc => !f.get_carry(),
            Cond::C => f.get_carry(),
            Cond::Po => !f.get_parity_overflow(),
            Cond::Pe => f.get_parity_overflow(),
            Cond::P => !f.get_sign(),
            Cond::M => f.get_sign(),
        }
    }

    fn jump_relative(&mut self, d: i8) {
        self.regs.pc = self.regs.pc.wrapping_add(d as i16 as u16);
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute

    fn alu(&mut self, op: AluOp, val: u8) {
        let a = self.regs.a;
        let carry = self.flags.get_carry();
        self.regs.a = match op {
            AluOp::Add => self.flags.add8(a, val, false),
            AluOp::Adc => self.flags.add8(a, val, carry),
            AluOp::Sub => self.flags.sub8(a, val, false),
            AluOp::Sbc => self.flags.sub8(a, val, carry),
            AluOp::And => self.flags.and8(a, val),
            AluOp::Xor => self.flags.xor8(a, val),
            AluOp::Or => self.flags.or8(a, val),
            AluOp::Cp => {
                self.flags.cp8(a, val);
                a
            }
        };
    }

    // Returns the result and the carry out.
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

    // One iteration of a block instruction. Returns the extra cost when a
    // repeating form goes round again.
    fn block(&mut self, block: Block) -> Result<Cycles> {
        let step = |val: u16| if block.dec { val.wrapping_sub(1) } else { val.wrapping_add(1) };
        let hl = self.regs.hl();
        let again = match block.kind {
            BlockKind::Ld => {
                let val = self.mem.read(hl);
                let de = self.regs.de();
                self.mem.write(de, val);
                self.regs.set_hl(step(hl));
                self.regs.set_de(step(de));
                let bc = self.regs.bc().wrapping_sub(1);
                self.regs.set_bc(bc);

                let n = val.wrapping_add(self.regs.a);
                self.flags.set_half_carry(false);
                self.flags.set_add_sub(false);
                self.flags.set_parity_overflow(bc != 0);
                self.flags.set_xy((n & 0x08) | ((n & 0x02) << 4));
                bc != 0
            }
            BlockKind::Cp => {
                let val = self.mem.read(hl);
                let carry = self.flags.get_carry();
                let res = self.flags.sub8(self.regs.a, val, false);
                self.flags.set_carry(carry);
                self.regs.set_hl(step(hl));
                let bc = self.regs.bc().wrapping_sub(1);
                self.regs.set_bc(bc);

                let n = res.wrapping_sub(self.flags.get_half_carry() as u8);
                self.flags.set_parity_overflow(bc != 0);
                self.flags.set_xy((n & 0x08) | ((n & 0x02) << 4));
                bc != 0 && res != 0
            }
            BlockKind::In => {
                let val = self.ports.read(self.regs.c)?;
                self.mem.write(hl, val);
                self.regs.set_hl(step(hl));
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.flags.set_sz_xy(self.regs.b);
                self.flags.set_add_sub(val.is_bit_set(7));
                self.regs.b != 0
            }
            BlockKind::Out => {
                let val = self.mem.read(hl);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.ports.write(self.regs.c, val)?;
                self.regs.set_hl(step(hl));
                self.flags.set_sz_xy(self.regs.b);
                self.flags.set_add_sub(val.is_bit_set(7));
                self.regs.b != 0
            }
        };

        if block.repeat && again {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            return Ok(cycles::BLOCK_REPEAT);
        }
        Ok(0)
    }

    fn exec(&mut self, decoded: &Decoded<Ins>) -> Result<Cycles> {
        use Ins::*;
        let mut extra: Cycles = 0;
        match decoded.ins {
            Nop => (),
            Halt => {
                debug!("Z80: halted at {:#06x}", self.regs.pc.wrapping_sub(1));
                self.halted = true;
            }
            Ld(dst, src) => {
                let val = self.read8(src);
                self.write8(dst, val);
                if let (Operand::Reg(Reg::A), Operand::Reg(Reg::I | Reg::R)) = (dst, src) {
                    self.flags.set_sz_xy(val);
                    self.flags.set_half_carry(false);
                    self.flags.set_add_sub(false);
                    self.flags.set_parity_overflow(self.iff2);
                }
            }
            LdPairImm(p, nn) => self.set_pair(p, nn),
            LdPairInd(p, nn) => {
                let val = self.read_word(nn);
                self.set_pair(p, val);
            }
            StPair(nn, p) => self.write_word(nn, self.pair(p)),
            LdSp(p) => self.regs.sp = self.pair(p),
            Push(p) => self.push(self.pair(p)),
            Pop(p) => {
                let val = self.pop();
                self.set_pair(p, val);
            }
            ExAf => {
                let shadow = &mut self.regs.shadow;
                std::mem::swap(&mut self.regs.a, &mut shadow.a);
                let f = std::mem::replace(&mut shadow.f, self.flags.to_raw());
                self.flags = Flags::from_raw(f);
            }
            Exx => {
                let r = &mut self.regs;
                std::mem::swap(&mut r.b, &mut r.shadow.b);
                std::mem::swap(&mut r.c, &mut r.shadow.c);
                std::mem::swap(&mut r.d, &mut r.shadow.d);
                std::mem::swap(&mut r.e, &mut r.shadow.e);
                std::mem::swap(&mut r.h, &mut r.shadow.h);
                std::mem::swap(&mut r.l, &mut r.shadow.l);
            }
            ExDeHl => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }
            ExSp(p) => {
                let val = self.read_word(self.regs.sp);
                self.write_word(self.regs.sp, self.pair(p));
                self.set_pair(p, val);
            }
            Alu(op, src) => {
                let val = self.read8(src);
                self.alu(op, val);
            }
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
            IncPair(p) => self.set_pair(p, self.pair(p).wrapping_add(1)),
            DecPair(p) => self.set_pair(p, self.pair(p).wrapping_sub(1)),
            AddPair(dst, src) => {
                let (a, b) = (self.pair(dst), self.pair(src));
                let res = self.flags.add16(a, b);
                self.set_pair(dst, res);
            }
            AdcPair(p) => {
                let (hl, val, carry) = (self.regs.hl(), self.pair(p), self.flags.get_carry());
                let res = self.flags.adc16(hl, val, carry);
                self.regs.set_hl(res);
            }
            SbcPair(p) => {
                let (hl, val, carry) = (self.regs.hl(), self.pair(p), self.flags.get_carry());
                let res = self.flags.sbc16(hl, val, carry);
                self.regs.set_hl(res);
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
                self.flags.accumulator_rotate(res, carry);
            }
            Daa => self.regs.a = self.flags.daa(self.regs.a),
            Cpl => {
                self.regs.a = !self.regs.a;
                self.flags.set_half_carry(true);
                self.flags.set_add_sub(true);
                self.flags.set_xy(self.regs.a);
            }
            Scf => {
                self.flags.set_carry(true);
                self.flags.set_half_carry(false);
                self.flags.set_add_sub(false);
                self.flags.set_xy(self.regs.a);
            }
            Ccf => {
                let carry = self.flags.get_carry();
                self.flags.set_half_carry(carry);
                self.flags.set_carry(!carry);
                self.flags.set_add_sub(false);
                self.flags.set_xy(self.regs.a);
            }
            Neg => self.regs.a = self.flags.sub8(0, self.regs.a, false),
            Rot(op, target, copy) => {
                let val = self.read8(target);
                let (res, carry) = self.rot(op, val);
                self.flags.rotate(res, carry);
                self.write8(target, res);
                if let Some(r) = copy {
                    self.set_reg8(r, res);
                }
            }
            Bit(bit, target) => {
                let val = self.read8(target);
                let xy_from = self.addr_of(target).map(high_byte).unwrap_or(val);
                self.flags.bit(bit, val, xy_from);
            }
            Res(bit, target, copy) | Set(bit, target, copy) => {
                let val = self.read8(target);
                let res = val.with_bit(bit as u32, matches!(decoded.ins, Set(..)));
                self.write8(target, res);
                if let Some(r) = copy {
                    self.set_reg8(r, res);
                }
            }
            Rld | Rrd => {
                let hl = self.regs.hl();
                let m = self.mem.read(hl);
                let a = self.regs.a;
                let (m, a) = if decoded.ins == Rld {
                    ((m << 4) | (a & 0x0f), (a & 0xf0) | (m >> 4))
                } else {
                    ((a << 4) | (m >> 4), (a & 0xf0) | (m & 0x0f))
                };
                self.mem.write(hl, m);
                self.regs.a = a;
                self.flags.set_szp_xy(a);
                self.flags.set_half_carry(false);
                self.flags.set_add_sub(false);
            }
            Jp(cc, nn) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.regs.pc = nn;
                }
            }
            JpInd(p) => self.regs.pc = self.pair(p),
            Jr(cc, d) => {
                if cc.is_none_or(|cc| self.cond(cc)) {
                    self.jump_relative(d);
                    if cc.is_some() {
                        extra = cycles::JR_TAKEN;
                    }
                }
            }
            Djnz(d) => {
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(d);
                    extra = cycles::JR_TAKEN;
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
            Reti => self.regs.pc = self.pop(),
            Retn => {
                self.regs.pc = self.pop();
                self.iff1 = self.iff2;
            }
            Rst(n) => {
                self.push(self.regs.pc);
                self.regs.pc = n as u16;
            }
            InImm(port) => self.regs.a = self.ports.read(port)?,
            InC(r) => {
                let val = self.ports.read(self.regs.c)?;
                if let Some(r) = r {
                    self.set_reg8(r, val);
                }
                self.flags.set_szp_xy(val);
                self.flags.set_half_carry(false);
                self.flags.set_add_sub(false);
            }
            OutImm(port) => self.ports.write(port, self.regs.a)?,
            OutC(r) => {
                let val = r.map(|r| self.reg8(r)).unwrap_or(0);
                self.ports.write(self.regs.c, val)?;
            }
            Di => {
                debug!("Z80: interrupts disabled");
                (self.iff1, self.iff2) = (false, false);
            }
            Ei => {
                debug!("Z80: interrupts enabled");
                (self.iff1, self.iff2) = (true, true);
            }
            Im(mode) => {
                self.mode = match mode {
                    0 => InterruptMode::Zero,
                    1 => InterruptMode::One,
                    _ => InterruptMode::Two,
                };
            }
            Block(block) => extra = self.block(block)?,
        }
        Ok(cycles::of(decoded) + extra)
    }

    ///////////////////////////////////////////////////////////////////////////
    // Interrupts

    fn deliver_nmi(&mut self) -> Cycles {
        debug!("Z80: servicing NMI at {:#06x}", self.regs.pc);
        self.nmi_pending = false;
        self.halted = false;
        self.inc_r(1);
        self.iff2 = self.iff1;
        self.iff1 = false;
        self.push(self.regs.pc);
        self.regs.pc = NMI_VECTOR;
        cycles::NMI
    }

    fn deliver_interrupt(&mut self, byte: u8) -> Result<Cycles> {
        debug!("Z80: servicing mode {:?} interrupt with {byte:#04x}", self.mode);
        self.iff1 = false;
        self.iff2 = false;
        self.halted = false;
        match self.mode {
            InterruptMode::Zero => {
                let mut fetcher = Fetcher::new(&mut self.mem, &mut self.regs.pc);
                let decoded = decode_opcode(byte, &mut fetcher);
                let fetches = fetcher.opcode_fetches;
                self.inc_r(1 + fetches);
                self.exec(&decoded?)?;
                Ok(cycles::INTERRUPT_MODE_0)
            }
            InterruptMode::One => {
                self.inc_r(1);
                self.push(self.regs.pc);
                self.regs.pc = MODE_1_VECTOR;
                Ok(cycles::INTERRUPT_MODE_1)
            }
            InterruptMode::Two => {
                self.inc_r(1);
                let target = self.read_word(to_u16(self.regs.i, byte));
                self.push(self.regs.pc);
                self.regs.pc = target;
                Ok(cycles::INTERRUPT_MODE_2)
            }
        }
    }
}

impl Cpu for Z80 {
    fn step(&mut self) -> Result<Cycles> {
        if self.nmi_pending {
            return Ok(self.deliver_nmi());
        }
        if self.iff1 {
            if let Some(byte) = self.pending.take() {
                return self.deliver_interrupt(byte);
            }
        }
        if self.halted {
            self.inc_r(1);
            return Ok(cycles::HALTED);
        }

        let pc = self.regs.pc;
        let mut fetcher = Fetcher::new(&mut self.mem, &mut self.regs.pc);
        let decoded = decode(&mut fetcher);
        let fetches = fetcher.opcode_fetches;
        self.inc_r(fetches);
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                self.regs.pc = pc;
                return Err(err);
            }
        };
        trace!("{pc:#06x}: {}", decoded.ins.display_with_pc(pc));
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
        self.iff1
    }

    // Latched until IFF1 allows it through.
    fn interrupt(&mut self, byte: u8) {
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
        let s = &r.shadow;
        vec![
            ("af", self.pair(Pair::Af)),
            ("bc", r.bc()),
            ("de", r.de()),
            ("hl", r.hl()),
            ("ix", r.ix),
            ("iy", r.iy),
            ("sp", r.sp),
            ("pc", r.pc),
            ("i", r.i as u16),
            ("r", r.r as u16),
            ("af'", to_u16(s.a, s.f)),
            ("bc'", to_u16(s.b, s.c)),
            ("de'", to_u16(s.d, s.e)),
            ("hl'", to_u16(s.h, s.l)),
        ]
    }

    fn flag_snapshot(&self) -> Vec<(&'static str, bool)> {
        let f = self.flags;
        vec![
            ("s", f.get_sign()),
            ("z", f.get_zero()),
            ("y", f.get_y()),
            ("h", f.get_half_carry()),
            ("x", f.get_x()),
            ("p", f.get_parity_overflow()),
            ("n", f.get_add_sub()),
            ("c", f.get_carry()),
        ]
    }
}
