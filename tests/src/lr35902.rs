use common::mem::Memory;
use common::{EmulatorError, OpcodeTable};
use disassembler::{Disassembler, Line};
use emu_lib::lr35902::{ENTRY_POINT, MEMORY_SIZE};
use emu_lib::{Cpu, Lr35902};

fn lr35902_with(program: &[u8]) -> Lr35902 {
    let mut mem = Memory::with_size(MEMORY_SIZE);
    mem.load(program, ENTRY_POINT);
    Lr35902::new(mem)
}

fn znhc(cpu: &Lr35902) -> (bool, bool, bool, bool) {
    let f = cpu.flags();
    (f.get_zero(), f.get_subtract(), f.get_half_carry(), f.get_carry())
}

#[test]
fn stack_pointer_offsets() {
    // add sp, -1; ld hl, sp+2
    let mut cpu = lr35902_with(&[0xe8, 0xff, 0xf8, 0x02]);
    cpu.regs_mut().sp = 0x0001;

    assert_eq!(cpu.step().unwrap(), 16);
    assert_eq!(cpu.regs().sp, 0x0000);
    // Carries out of the low byte, never zero.
    assert_eq!(znhc(&cpu), (false, false, true, true));

    assert_eq!(cpu.step().unwrap(), 12);
    assert_eq!(cpu.regs().hl(), 0x0002);
    assert_eq!(cpu.regs().sp, 0x0000);
    assert_eq!(znhc(&cpu), (false, false, false, false));
}

#[test]
fn decimal_adjust() {
    // add a, 0x27; daa; sub 0x43; daa
    let mut cpu = lr35902_with(&[0xc6, 0x27, 0x27, 0xd6, 0x43, 0x27]);
    cpu.regs_mut().a = 0x15;

    assert_eq!(cpu.step().unwrap(), 8);
    assert_eq!(cpu.regs().a, 0x3c);
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.regs().a, 0x42);
    assert_eq!(znhc(&cpu), (false, false, false, false));

    cpu.step().unwrap();
    assert_eq!(cpu.regs().a, 0xff);
    assert_eq!(znhc(&cpu), (false, true, true, true));
    cpu.step().unwrap();
    assert_eq!(cpu.regs().a, 0x99);
    assert_eq!(znhc(&cpu), (false, true, false, true));
}

#[test]
fn reti_reenables_interrupts() {
    // ei; nop; nop; nop
    let mut cpu = lr35902_with(&[0xfb, 0x00, 0x00, 0x00]);
    // reti
    cpu.memory_mut().write(0x48, 0xd9);
    cpu.regs_mut().sp = 0xd000;
    cpu.interrupt(0x48);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 20);
    assert_eq!(cpu.pc(), 0x48);
    assert!(!cpu.ime());

    // Held until the handler returns.
    cpu.interrupt(0x50);
    assert_eq!(cpu.step().unwrap(), 16);
    assert_eq!(cpu.pc(), 0x102);
    assert!(cpu.ime());

    assert_eq!(cpu.step().unwrap(), 20);
    assert_eq!(cpu.pc(), 0x50);
    assert_eq!(cpu.regs().sp, 0xcffe);
    assert_eq!(cpu.memory().direct_read(0xcffe), 0x02);
    assert_eq!(cpu.memory().direct_read(0xcfff), 0x01);
}

#[test]
fn holes_are_errors() {
    let mut cpu = lr35902_with(&[0xd3]);
    assert_eq!(cpu.step(), Err(EmulatorError::unrecognized(0xd3u8, OpcodeTable::Root)));
    assert_eq!(cpu.pc(), ENTRY_POINT);
}

#[test]
fn addresses_match_fetches() {
    let program = [
        0x3e, 0x05, // ld a, 0x05
        0xe0, 0x80, // ldh (0x80), a
        0xcb, 0x37, // swap a
        0x08, 0x00, 0xc0, // ld (0xc000), sp
        0x18, 0x00, // jr +0
    ];
    let lines: Vec<Line> =
        Disassembler::<disassembler::Lr35902>::new(&program, ENTRY_POINT).disassemble().collect();
    assert_eq!(lines.len(), 5);

    let mut cpu = lr35902_with(&program);
    for line in lines.iter() {
        assert_eq!(cpu.pc(), line.addr, "{line}");
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs().a, 0x50);
    assert_eq!(cpu.memory().direct_read(0xff80), 0x05);
    assert_eq!(cpu.memory().direct_read(0xc000), 0xfe);
    assert_eq!(cpu.memory().direct_read(0xc001), 0xff);
}

#[test]
fn snapshots() {
    let cpu = lr35902_with(&[]);
    let regs = cpu.register_snapshot();
    assert_eq!(regs[0], ("af", 0xfff0));
    assert!(regs.contains(&("pc", ENTRY_POINT)));

    let flags = cpu.flag_snapshot();
    let names: Vec<&str> = flags.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["z", "n", "h", "c"]);
    assert!(flags.iter().all(|(_, set)| *set));
}
