pub fn to_u16(high: u8, low: u8) -> u16 {
    ((high as u16) << u8::BITS) | (low as u16)
}

pub fn high_byte(val: u16) -> u8 {
    (val >> u8::BITS) as u8
}

pub fn low_byte(val: u16) -> u8 {
    val as u8
}

////////////////////////////////////////////////////////////////////////////////

pub trait Bits: Copy {
    fn is_bit_set(self, bit: u32) -> bool;
    #[must_use]
    fn with_bit(self, bit: u32, val: bool) -> Self;
}

macro_rules! impl_bits {
    ($($t:ty),*) => {
        $(
            impl Bits for $t {
                fn is_bit_set(self, bit: u32) -> bool {
                    (self >> bit) & 0x1 != 0
                }

                fn with_bit(self, bit: u32, val: bool) -> Self {
                    (self & !(1 << bit)) | ((val as $t) << bit)
                }
            }
        )*
    };
}

impl_bits!(u8, u16);

////////////////////////////////////////////////////////////////////////////////

// Little-endian words, as the 16-bit word machines store their images.
pub fn words_from_bytes(bytes: &[u8]) -> Vec<u16> {
    let even = bytes.len() & !0x1;
    let words: Vec<u16> = bytemuck::pod_collect_to_vec(&bytes[..even]);
    words.into_iter().map(u16::from_le).collect()
}
