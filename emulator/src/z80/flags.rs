use common::misc::Bits;

use crate::flags::{
    add_overflow, borrowed_out_of, carried_out_of, half_borrow, half_carry, is_negative, parity,
    sub_overflow,
};

// The F register. X and Y are the undocumented copies of bits 3 and 5 of
// (usually) the result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const CARRY_SHIFT: u32 = 0;
    pub const ADD_SUB_SHIFT: u32 = 1;
    pub const PARITY_OVERFLOW_SHIFT: u32 = 2;
    pub const X_SHIFT: u32 = 3;
    pub const HALF_CARRY_SHIFT: u32 = 4;
    pub const Y_SHIFT: u32 = 5;
    pub const ZERO_SHIFT: u32 = 6;
    pub const SIGN_SHIFT: u32 = 7;

    pub const C: u8 = 0x1 << Self::CARRY_SHIFT;
    pub const N: u8 = 0x1 << Self::ADD_SUB_SHIFT;
    pub const PV: u8 = 0x1 << Self::PARITY_OVERFLOW_SHIFT;
    pub const X: u8 = 0x1 << Self::X_SHIFT;
    pub const H: u8 = 0x1 << Self::HALF_CARRY_SHIFT;
    pub const Y: u8 = 0x1 << Self::Y_SHIFT;
    pub const Z: u8 = 0x1 << Self::ZERO_SHIFT;
    pub const S: u8 = 0x1 << Self::SIGN_SHIFT;

    const XY_MASK: u8 = Self::X | Self::Y;

    pub fn from_raw(raw: u8) -> Self {
        Flags(raw)
    }

    pub fn to_raw(self) -> u8 {
        self.0
    }

    fn get(self, shift: u32) -> bool {
        self.0.is_bit_set(shift)
    }

    fn set(&mut self, shift: u32, val: bool) {
        self.0 = self.0.with_bit(shift, val);
    }

    pub fn get_carry(self) -> bool {
        self.get(Self::CARRY_SHIFT)
    }

    pub fn set_carry(&mut self, val: bool) {
        self.set(Self::CARRY_SHIFT, val);
    }

    pub fn get_add_sub(self) -> bool {
        self.get(Self::ADD_SUB_SHIFT)
    }

    pub fn set_add_sub(&mut self, val: bool) {
        self.set(Self::ADD_SUB_SHIFT, val);
    }

    pub fn get_parity_overflow(self) -> bool {
        self.get(Self::PARITY_OVERFLOW_SHIFT)
    }

    pub fn set_parity_overflow(&mut self, val: bool) {
        self.set(Self::PARITY_OVERFLOW_SHIFT, val);
    }

    pub fn get_half_carry(self) -> bool {
        self.get(Self::HALF_CARRY_SHIFT)
    }

    pub fn set_half_carry(&mut self, val: bool) {
        self.set(Self::HALF_CARRY_SHIFT, val);
    }

    pub fn get_zero(self) -> bool {
        self.get(Self::ZERO_SHIFT)
    }

    pub fn set_zero(&mut self, val: bool) {
        self.set(Self::ZERO_SHIFT, val);
    }

    pub fn get_sign(self) -> bool {
        self.get(Self::SIGN_SHIFT)
    }

    pub fn set_sign(&mut self, val: bool) {
        self.set(Self::SIGN_SHIFT, val);
    }

    pub fn get_x(self) -> bool {
        self.get(Self::X_SHIFT)
    }

    pub fn get_y(self) -> bool {
        self.get(Self::Y_SHIFT)
    }

    pub fn set_xy(&mut self, from: u8) {
        self.0 = (self.0 & !Self::XY_MASK) | (from & Self::XY_MASK);
    }

    // S, Z, X and Y straight from a result.
    pub fn set_sz_xy(&mut self, val: u8) {
        self.set_sign(is_negative(val));
        self.set_zero(val == 0);
        self.set_xy(val);
    }

    // The usual treatment of logical and rotate results.
    pub fn set_szp_xy(&mut self, val: u8) {
        self.set_sz_xy(val);
        self.set_parity_overflow(parity(val));
    }

    ///////////////////////////////////////////////////////////////////////////

    pub fn add8(&mut self, a: u8, b: u8, carry: bool) -> u8 {
        let res = a.wrapping_add(b).wrapping_add(carry as u8);
        self.set_sz_xy(res);
        self.set_half_carry(half_carry(a, b, carry));
        self.set_parity_overflow(add_overflow(7, a as u16, b as u16, res as u16));
        self.set_add_sub(false);
        self.set_carry(carried_out_of(7, a as u16, b as u16, carry));
        res
    }

    pub fn sub8(&mut self, a: u8, b: u8, borrow: bool) -> u8 {
        let res = a.wrapping_sub(b).wrapping_sub(borrow as u8);
        self.set_sz_xy(res);
        self.set_half_carry(half_borrow(a, b, borrow));
        self.set_parity_overflow(sub_overflow(7, a as u16, b as u16, res as u16));
        self.set_add_sub(true);
        self.set_carry(borrowed_out_of(7, a as u16, b as u16, borrow));
        res
    }

    // A compare takes X and Y from the operand, not the discarded result.
    pub fn cp8(&mut self, a: u8, b: u8) {
        self.sub8(a, b, false);
        self.set_xy(b);
    }

    pub fn and8(&mut self, a: u8, b: u8) -> u8 {
        let res = a & b;
        self.set_szp_xy(res);
        self.set_half_carry(true);
        self.set_add_sub(false);
        self.set_carry(false);
        res
    }

    pub fn or8(&mut self, a: u8, b: u8) -> u8 {
        self.logical(a | b)
    }

    pub fn xor8(&mut self, a: u8, b: u8) -> u8 {
        self.logical(a ^ b)
    }

    fn logical(&mut self, res: u8) -> u8 {
        self.set_szp_xy(res);
        self.set_half_carry(false);
        self.set_add_sub(false);
        self.set_carry(false);
        res
    }

    // INC and DEC leave carry alone.
    pub fn inc8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        self.set_sz_xy(res);
        self.set_half_carry(val & 0x0f == 0x0f);
        self.set_parity_overflow(val == 0x7f);
        self.set_add_sub(false);
        res
    }

    pub fn dec8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        self.set_sz_xy(res);
        self.set_half_carry(val & 0x0f == 0x00);
        self.set_parity_overflow(val == 0x80);
        self.set_add_sub(true);
        res
    }

    // ADD HL, rr: S, Z and P/V are untouched. Carries are taken from the full
    // 16-bit sum.
    pub fn add16(&mut self, a: u16, b: u16) -> u16 {
        let res = a.wrapping_add(b);
        self.set_half_carry(carried_out_of(11, a, b, false));
        self.set_add_sub(false);
        self.set_carry(carried_out_of(15, a, b, false));
        self.set_xy((res >> 8) as u8);
        res
    }

    pub fn adc16(&mut self, a: u16, b: u16, carry: bool) -> u16 {
        let res = a.wrapping_add(b).wrapping_add(carry as u16);
        self.set_sign(res.is_bit_set(15));
        self.set_zero(res == 0);
        self.set_half_carry(carried_out_of(11, a, b, carry));
        self.set_parity_overflow(add_overflow(15, a, b, res));
        self.set_add_sub(false);
        self.set_carry(carried_out_of(15, a, b, carry));
        self.set_xy((res >> 8) as u8);
        res
    }

    pub fn sbc16(&mut self, a: u16, b: u16, borrow: bool) -> u16 {
        let res = a.wrapping_sub(b).wrapping_sub(borrow as u16);
        self.set_sign(res.is_bit_set(15));
        self.set_zero(res == 0);
        self.set_half_carry(borrowed_out_of(11, a, b, borrow));
        self.set_parity_overflow(sub_overflow(15, a, b, res));
        self.set_add_sub(true);
        self.set_carry(borrowed_out_of(15, a, b, borrow));
        self.set_xy((res >> 8) as u8);
        res
    }

    // RLCA and friends: only H, N, C and the undocumented bits change.
    pub fn accumulator_rotate(&mut self, res: u8, carry: bool) {
        self.set_half_carry(false);
        self.set_add_sub(false);
        self.set_carry(carry);
        self.set_xy(res);
    }

    // CB-prefixed shifts and rotates.
    pub fn rotate(&mut self, res: u8, carry: bool) {
        self.set_szp_xy(res);
        self.set_half_carry(false);
        self.set_add_sub(false);
        self.set_carry(carry);
    }

    // `xy_from` is the register for BIT b, r; memory forms leak the high
    // byte of the address instead.
    pub fn bit(&mut self, bit: u8, val: u8, xy_from: u8) {
        let set = val.is_bit_set(bit as u32);
        self.set_sign(bit == 7 && set);
        self.set_zero(!set);
        self.set_parity_overflow(!set);
        self.set_half_carry(true);
        self.set_add_sub(false);
        self.set_xy(xy_from);
    }

    pub fn daa(&mut self, a: u8) -> u8 {
        let low = a & 0x0f;
        let mut diff = 0u8;
        let carry = self.get_carry() || a > 0x99;
        if carry {
            diff |= 0x60;
        }
        if self.get_half_carry() || low > 9 {
            diff |= 0x06;
        }
        let subtract = self.get_add_sub();
        let res = if subtract { a.wrapping_sub(diff) } else { a.wrapping_add(diff) };
        let half = if subtract { self.get_half_carry() && low < 6 } else { low > 9 };
        self.set_szp_xy(res);
        self.set_half_carry(half);
        self.set_carry(carry);
        res
    }
}
