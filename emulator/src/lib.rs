pub mod cpu;
pub mod debugger;
pub mod driver;
pub mod flags;
pub mod i8080;
pub mod io;
pub mod lmc;
pub mod lr35902;
pub mod synacor;
pub mod z80;

pub use cpu::{AnyCpu, Cpu, Cycles};
pub use debugger::{Breakpoint, Debugger};
pub use driver::{Driver, DriverConfig, Event, State};
pub use i8080::I8080;
pub use lmc::Lmc;
pub use lr35902::Lr35902;
pub use synacor::Synacor;
pub use z80::Z80;
