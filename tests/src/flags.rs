use emu_lib::flags::{add_overflow, borrowed_out_of, carried_out_of, parity, sub_overflow};
use emu_lib::i8080;
use emu_lib::z80::Flags;

use crate::{C, H, N, PV, S, Z, flags};

fn documented(f: Flags) -> u8 {
    f.to_raw() & !(Flags::X | Flags::Y)
}

#[test]
fn builder() {
    assert_eq!(flags(&[]), 0);
    assert_eq!(flags(&[S, Z, H, PV, N, C]), 0xd7);
    assert_eq!(flags(&[C, C]), C);
}

#[test]
fn z80_add() {
    let mut f = Flags::default();
    assert_eq!(f.add8(0x7f, 0x01, false), 0x80);
    assert_eq!(documented(f), flags(&[S, H, PV]));

    assert_eq!(f.add8(0xff, 0x01, false), 0x00);
    assert_eq!(documented(f), flags(&[Z, H, C]));

    assert_eq!(f.add8(0x0e, 0x01, true), 0x10);
    assert_eq!(documented(f), flags(&[H]));
}

#[test]
fn z80_sub() {
    let mut f = Flags::default();
    assert_eq!(f.sub8(0x80, 0x01, false), 0x7f);
    assert_eq!(documented(f), flags(&[H, PV, N]));

    assert_eq!(f.sub8(0x00, 0x01, false), 0xff);
    assert_eq!(documented(f), flags(&[S, H, N, C]));

    assert_eq!(f.sub8(0x05, 0x04, true), 0x00);
    assert_eq!(documented(f), flags(&[Z, N]));
}

#[test]
fn z80_compare_takes_xy_from_operand() {
    let mut f = Flags::default();
    f.cp8(0x00, 0x28);
    assert!(f.get_x() && f.get_y());
    assert!(f.get_carry() && f.get_add_sub());
}

#[test]
fn z80_inc_dec_keep_carry() {
    let mut f = Flags::from_raw(Flags::C);
    assert_eq!(f.inc8(0x7f), 0x80);
    assert_eq!(documented(f), flags(&[S, H, PV, C]));
    assert_eq!(f.dec8(0x80), 0x7f);
    assert_eq!(documented(f), flags(&[H, PV, N, C]));
}

#[test]
fn z80_wide_carries() {
    let mut f = Flags::default();
    assert_eq!(f.add16(0x0fff, 0x0001), 0x1000);
    assert!(f.get_half_carry() && !f.get_carry());

    // The carry-in alone can carry out of bit 15.
    assert_eq!(f.adc16(0xffff, 0x0000, true), 0x0000);
    assert_eq!(documented(f), flags(&[Z, H, C]));

    assert_eq!(f.sbc16(0x0000, 0x0000, true), 0xffff);
    assert_eq!(documented(f), flags(&[S, H, N, C]));
}

#[test]
fn i8080_logical() {
    let mut f = i8080::Flags::new();
    f.carry = true;
    assert_eq!(f.and(0x0f, 0x08), 0x08);
    assert!(!f.carry && f.aux_carry && !f.parity);
    assert_eq!(f.xor(0xff, 0xff), 0x00);
    assert!(f.zero && f.parity && !f.aux_carry);
}

#[test]
fn helpers() {
    assert!(carried_out_of(7, 0x80, 0x80, false));
    assert!(!carried_out_of(7, 0x7f, 0x80, false));
    assert!(carried_out_of(7, 0x7f, 0x80, true));
    assert!(borrowed_out_of(15, 0x0000, 0x0000, true));
    assert!(!borrowed_out_of(15, 0x0001, 0x0000, true));
    assert!(add_overflow(7, 0x40, 0x40, 0x80));
    assert!(sub_overflow(7, 0x80, 0x01, 0x7f));
    assert!(parity(0x00));
    assert!(!parity(0x01));
}
