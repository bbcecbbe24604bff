use crate::flags::{borrowed_out_of, carried_out_of, half_carry, is_negative, parity};

// Packed as S Z 0 AC 0 P 1 C.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub sign: bool,
    pub zero: bool,
    pub aux_carry: bool,
    pub parity: bool,
    pub carry: bool,
}

impl Flags {
    pub const SIGN_SHIFT: u8 = 7;
    pub const ZERO_SHIFT: u8 = 6;
    pub const AUX_CARRY_SHIFT: u8 = 4;
    pub const PARITY_SHIFT: u8 = 2;
    pub const CARRY_SHIFT: u8 = 0;
    const ALWAYS_SET: u8 = 0x02;

    pub fn new() -> Flags {
        Default::default()
    }

    pub fn to_byte(self) -> u8 {
        ((self.sign as u8) << Self::SIGN_SHIFT)
            | ((self.zero as u8) << Self::ZERO_SHIFT)
            | ((self.aux_carry as u8) << Self::AUX_CARRY_SHIFT)
            | ((self.parity as u8) << Self::PARITY_SHIFT)
            | ((self.carry as u8) << Self::CARRY_SHIFT)
            | Self::ALWAYS_SET
    }

    pub fn from_byte(val: u8) -> Flags {
        let bit = |shift: u8| (val >> shift) & 0x1 != 0;
        Flags {
            sign: bit(Self::SIGN_SHIFT),
            zero: bit(Self::ZERO_SHIFT),
            aux_carry: bit(Self::AUX_CARRY_SHIFT),
            parity: bit(Self::PARITY_SHIFT),
            carry: bit(Self::CARRY_SHIFT),
        }
    }

    pub fn set_szp(&mut self, val: u8) {
        self.sign = is_negative(val);
        self.zero = val == 0;
        self.parity = parity(val);
    }

    pub fn add(&mut self, a: u8, b: u8, carry: bool) -> u8 {
        let res = a.wrapping_add(b).wrapping_add(carry as u8);
        self.carry = carried_out_of(7, a as u16, b as u16, carry);
        self.aux_carry = half_carry(a, b, carry);
        self.set_szp(res);
        res
    }

    // The ALU subtracts by adding the complement, so AC is the carry out of
    // bit 3 of a + !b + !borrow.
    pub fn sub(&mut self, a: u8, b: u8, borrow: bool) -> u8 {
        let res = a.wrapping_sub(b).wrapping_sub(borrow as u8);
        self.carry = borrowed_out_of(7, a as u16, b as u16, borrow);
        self.aux_carry = half_carry(a, !b, !borrow);
        self.set_szp(res);
        res
    }

    pub fn and(&mut self, a: u8, b: u8) -> u8 {
        let res = a & b;
        self.carry = false;
        self.aux_carry = ((a | b) & 0x08) != 0;
        self.set_szp(res);
        res
    }

    pub fn or(&mut self, a: u8, b: u8) -> u8 {
        let res = a | b;
        self.carry = false;
        self.aux_carry = false;
        self.set_szp(res);
        res
    }

    pub fn xor(&mut self, a: u8, b: u8) -> u8 {
        let res = a ^ b;
        self.carry = false;
        self.aux_carry = false;
        self.set_szp(res);
        res
    }

    // INR and DCR leave carry alone.
    pub fn inc(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        self.aux_carry = half_carry(val, 1, false);
        self.set_szp(res);
        res
    }

    pub fn dec(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        self.aux_carry = half_carry(val, !1, true);
        self.set_szp(res);
        res
    }
}
