use std::sync::Arc;

use common::EmulatorError;
use emu_lib::io::console::PipeConsole;
use emu_lib::io::cpm::CpmSession;
use emu_lib::Cpu;

#[test]
fn z80_prints_through_bdos() {
    let program = [
        0x06, 0x03, // ld b, 3
        0x0e, 0x02, // ld c, 2
        0x1e, b'*', // ld e, '*'
        0xc5, // push bc
        0xcd, 0x05, 0x00, // call 5
        0xc1, // pop bc
        0x10, 0xf5, // djnz -11
        0xc3, 0x00, 0x00, // jp 0
    ];
    let pipe = Arc::new(PipeConsole::default());
    let mut session = CpmSession::z80(&program, pipe.clone());

    session.run().unwrap();
    assert!(session.is_finished());
    assert_eq!(pipe.take_output_string(), "***");
    assert!(session.cycles() > 0);
    assert!(!session.cpu().can_run_next_instruction());
}

#[test]
fn halt_ends_without_finishing() {
    let pipe = Arc::new(PipeConsole::default());
    let mut session = CpmSession::i8080(&[0x76], pipe.clone());
    session.run().unwrap();
    assert!(!session.is_finished());
    assert!(pipe.is_out_empty());
    assert_eq!(session.cpu().pc(), 0x101);
}

#[test]
fn input_is_illegal() {
    // in a, (0x01)
    let pipe = Arc::new(PipeConsole::default());
    let mut session = CpmSession::z80(&[0xdb, 0x01], pipe);
    assert_eq!(session.run(), Err(EmulatorError::IllegalPort(1)));
    assert!(!session.is_finished());
}

#[test]
fn sessions_only_run() {
    let pipe = Arc::new(PipeConsole::default());
    let mut session = CpmSession::i8080(&[0xc3, 0x00, 0x00], pipe);
    assert!(session.pause().is_err());
    assert!(session.stop().is_err());
    session.run().unwrap();
    assert!(session.is_finished());
}
