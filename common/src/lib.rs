pub mod decoder;
pub mod error;
pub mod i8080;
pub mod io;
pub mod lmc;
pub mod lr35902;
pub mod mem;
pub mod misc;
pub mod synacor;
pub mod z80;

pub use error::{EmulatorError, OpcodeTable};
