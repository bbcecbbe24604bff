use std::collections::BTreeMap;
use std::fmt;

use common::error::{EmulatorError, Result};

use log::info;

// A breakpoint remembers the disassembly line it was made from, so a UI can
// list it the way the user saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    address: u16,
    line: String,
}

impl Breakpoint {
    pub fn new(address: u16) -> Self {
        Breakpoint { address, line: format!("{address:04x}") }
    }

    // Parses "address\tmnemonic" (or just an address), as the disassembler
    // prints it. The address may carry a 0x prefix.
    pub fn from_line(line: &str, radix: u32) -> Result<Self> {
        let field = line.split('\t').next().unwrap_or_default().trim();
        let digits = field.strip_prefix("0x").unwrap_or(field);
        let address = u16::from_str_radix(digits, radix)
            .map_err(|_| EmulatorError::InvalidBreakpoint(line.to_string()))?;
        Ok(Breakpoint { address, line: line.to_string() })
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

////////////////////////////////////////////////////////////////////////////////

// The breakpoint set and the debug-mode switch, shared between the driver and
// whatever UI edits them.
#[derive(Debug, Default)]
pub struct Debugger {
    breakpoints: BTreeMap<u16, Breakpoint>,
    debug_mode: bool,
}

impl Debugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.breakpoints.insert(breakpoint.address(), breakpoint);
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> Option<Breakpoint> {
        self.breakpoints.remove(&address)
    }

    pub fn has_breakpoint(&self, address: u16) -> bool {
        self.breakpoints.contains_key(&address)
    }

    pub fn breakpoint(&self, address: u16) -> Option<&Breakpoint> {
        self.breakpoints.get(&address)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.values()
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
    }

    // Checked against the PC before each instruction runs.
    pub fn should_break(&self, pc: u16) -> bool {
        if self.debug_mode && self.has_breakpoint(pc) {
            info!("Breakpoint hit: {pc:#06x}");
            return true;
        }
        false
    }
}
