pub mod console;
pub mod cpm;

use common::error::Result;
use common::io::{Observers, SharedObserver};

use log::trace;

// The 256 I/O ports of the 8080 family. IN reads what an observer supplies,
// falling back to whatever was last latched with `input`.
#[derive(Debug, Clone)]
pub struct Ports {
    io_in: [u8; 256],
    io_out: [u8; 256],
    observers: Observers,
}

impl Ports {
    pub fn new() -> Self {
        Ports { io_in: [0; 256], io_out: [0; 256], observers: Observers::new() }
    }

    pub fn add_observer(&mut self, observer: SharedObserver) {
        self.observers.add(observer);
    }

    pub fn input(&mut self, port: u8, val: u8) {
        self.io_in[port as usize] = val;
    }

    pub fn last_out(&self, port: u8) -> u8 {
        self.io_out[port as usize]
    }

    pub fn read(&mut self, port: u8) -> Result<u8> {
        let val = match self.observers.notify_in(port)? {
            Some(val) => val,
            None => self.io_in[port as usize],
        };
        trace!("Port: in {val:#04x} from {port:#04x}");
        Ok(val)
    }

    pub fn write(&mut self, port: u8, val: u8) -> Result<()> {
        trace!("Port: out {val:#04x} to {port:#04x}");
        self.io_out[port as usize] = val;
        self.observers.notify_out(port, val)
    }
}

impl Default for Ports {
    fn default() -> Self {
        Self::new()
    }
}
