// Arithmetic helpers the per-ISA flag registers are derived from. Operands
// are widened so the same helpers serve 8- and 16-bit operations.

fn mask_through(bit: u32) -> u32 {
    ((1u64 << (bit + 1)) - 1) as u32
}

// True if a + b + carry carries out of `bit`.
pub fn carried_out_of(bit: u32, a: u16, b: u16, carry: bool) -> bool {
    let mask = mask_through(bit);
    (a as u32 & mask) + (b as u32 & mask) + carry as u32 > mask
}

// True if a - b - borrow borrows into `bit`.
pub fn borrowed_out_of(bit: u32, a: u16, b: u16, borrow: bool) -> bool {
    let mask = mask_through(bit);
    (a as u32 & mask) < (b as u32 & mask) + borrow as u32
}

pub fn half_carry(a: u8, b: u8, carry: bool) -> bool {
    carried_out_of(3, a as u16, b as u16, carry)
}

pub fn half_borrow(a: u8, b: u8, borrow: bool) -> bool {
    borrowed_out_of(3, a as u16, b as u16, borrow)
}

// Even parity.
pub fn parity(val: u8) -> bool {
    val.count_ones() % 2 == 0
}

// Signed overflow of a + b = res, with the sign at `bit`.
pub fn add_overflow(bit: u32, a: u16, b: u16, res: u16) -> bool {
    ((a ^ res) & (b ^ res)) >> bit & 0x1 != 0
}

// Signed overflow of a - b = res.
pub fn sub_overflow(bit: u32, a: u16, b: u16, res: u16) -> bool {
    ((a ^ b) & (a ^ res)) >> bit & 0x1 != 0
}

pub fn is_negative(val: u8) -> bool {
    val & 0x80 != 0
}
