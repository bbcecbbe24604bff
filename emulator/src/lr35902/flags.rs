use common::misc::Bits;

use crate::flags::{borrowed_out_of, carried_out_of, half_borrow, half_carry};

// Z N H C in the high nibble of F. The low nibble always reads zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const CARRY_SHIFT: u32 = 4;
    pub const HALF_CARRY_SHIFT: u32 = 5;
    pub const SUBTRACT_SHIFT: u32 = 6;
    pub const ZERO_SHIFT: u32 = 7;

    const MASK: u8 = 0xf0;

    pub fn from_raw(raw: u8) -> Self {
        Flags(raw & Self::MASK)
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

    pub fn get_half_carry(self) -> bool {
        self.get(Self::HALF_CARRY_SHIFT)
    }

    pub fn set_half_carry(&mut self, val: bool) {
        self.set(Self::HALF_CARRY_SHIFT, val);
    }

    pub fn get_subtract(self) -> bool {
        self.get(Self::SUBTRACT_SHIFT)
    }

    pub fn set_subtract(&mut self, val: bool) {
        self.set(Self::SUBTRACT_SHIFT, val);
    }

    pub fn get_zero(self) -> bool {
        self.get(Self::ZERO_SHIFT)
    }

    pub fn set_zero(&mut self, val: bool) {
        self.set(Self::ZERO_SHIFT, val);
    }

    fn set_all(&mut self, zero: bool, subtract: bool, half: bool, carry: bool) {
        self.set_zero(zero);
        self.set_subtract(subtract);
        self.set_half_carry(half);
        self.set_carry(carry);
    }

    ///////////////////////////////////////////////////////////////////////////

    pub fn add8(&mut self, a: u8, b: u8, carry: bool) -> u8 {
        let res = a.wrapping_add(b).wrapping_add(carry as u8);
        let c = carried_out_of(7, a as u16, b as u16, carry);
        self.set_all(res == 0, false, half_carry(a, b, carry), c);
        res
    }

    pub fn sub8(&mut self, a: u8, b: u8, borrow: bool) -> u8 {
        let res = a.wrapping_sub(b).wrapping_sub(borrow as u8);
        let c = borrowed_out_of(7, a as u16, b as u16, borrow);
        self.set_all(res == 0, true, half_borrow(a, b, borrow), c);
        res
    }

    pub fn and8(&mut self, a: u8, b: u8) -> u8 {
        let res = a & b;
        self.set_all(res == 0, false, true, false);
        res
    }

    pub fn logical(&mut self, res: u8) -> u8 {
        self.set_all(res == 0, false, false, false);
        res
    }

    pub fn inc8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        self.set_zero(res == 0);
        self.set_subtract(false);
        self.set_half_carry(val & 0x0f == 0x0f);
        res
    }

    pub fn dec8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        self.set_zero(res == 0);
        self.set_subtract(true);
        self.set_half_carry(val & 0x0f == 0x00);
        res
    }

    // ADD HL, rr leaves Z alone.
    pub fn add16(&mut self, a: u16, b: u16) -> u16 {
        self.set_subtract(false);
        self.set_half_carry(carried_out_of(11, a, b, false));
        self.set_carry(carried_out_of(15, a, b, false));
        a.wrapping_add(b)
    }

    // ADD SP, e and LD HL, SP+e: carries come from the low byte.
    pub fn add_sp(&mut self, sp: u16, e: i8) -> u16 {
        let offset = e as i16 as u16;
        let h = carried_out_of(3, sp, offset, false);
        let c = carried_out_of(7, sp, offset, false);
        self.set_all(false, false, h, c);
        sp.wrapping_add(offset)
    }

    pub fn accumulator_rotate(&mut self, carry: bool) {
        self.set_all(false, false, false, carry);
    }

    pub fn rotate(&mut self, res: u8, carry: bool) {
        self.set_all(res == 0, false, false, carry);
    }

    pub fn bit(&mut self, bit: u8, val: u8) {
        self.set_zero(!val.is_bit_set(bit as u32));
        self.set_subtract(false);
        self.set_half_carry(true);
    }

    pub fn daa(&mut self, a: u8) -> u8 {
        let mut res = a;
        let mut carry = self.get_carry();
        if !self.get_subtract() {
            if carry || a > 0x99 {
                res = res.wrapping_add(0x60);
                carry = true;
            }
            if self.get_half_carry() || a & 0x0f > 9 {
                res = res.wrapping_add(0x06);
            }
        } else {
            if carry {
                res = res.wrapping_sub(0x60);
            }
            if self.get_half_carry() {
                res = res.wrapping_sub(0x06);
            }
        }
        self.set_zero(res == 0);
        self.set_half_carry(false);
        self.set_carry(carry);
        res
    }
}
