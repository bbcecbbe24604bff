use std::collections::VecDeque;
use std::io::{Read, Write, stdin, stdout};
use std::sync::{Arc, Mutex};
use std::thread;

use common::error::Result;
use common::io::IoObserver;

use log::error;

use crate::lmc;

// A character terminal the machines print to and read keys from.
pub trait Console: Send + Sync {
    fn handle_output(&self, val: u8);

    fn input_available(&self) -> bool;
    fn poll_input(&self) -> Option<u8>;
}

////////////////////////////////////////////////////////////////////////////////

// The process's own terminal. Stdin is drained by a background thread so
// polling never blocks.
pub struct StdIo {
    in_buf: Arc<Mutex<VecDeque<u8>>>,
}

impl StdIo {
    pub fn new() -> Self {
        let in_buf = Arc::new(Mutex::new(VecDeque::new()));
        let reader_buf = in_buf.clone();
        thread::spawn(move || {
            let mut byte = [0u8];
            let mut input = stdin().lock();
            while let Ok(1) = input.read(&mut byte) {
                reader_buf.lock().unwrap().push_back(byte[0]);
            }
        });
        StdIo { in_buf }
    }
}

impl Default for StdIo {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdIo {
    fn handle_output(&self, val: u8) {
        let mut out = stdout().lock();
        if let Err(err) = out.write_all(&[val]).and_then(|_| out.flush()) {
            error!("Console: unable to write to stdout: {err}");
        }
    }

    fn input_available(&self) -> bool {
        !self.in_buf.lock().unwrap().is_empty()
    }

    fn poll_input(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }
}

////////////////////////////////////////////////////////////////////////////////

// An in-memory console, for tests and for embedding.
#[derive(Default)]
pub struct PipeConsole {
    out_buf: Mutex<VecDeque<u8>>,
    in_buf: Mutex<VecDeque<u8>>,
}

impl PipeConsole {
    pub fn take_output(&self) -> VecDeque<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap())
    }

    pub fn take_output_string(&self) -> String {
        let bytes: Vec<u8> = self.take_output().into();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn is_out_empty(&self) -> bool {
        self.out_buf.lock().unwrap().is_empty()
    }

    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap().push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        self.in_buf.lock().unwrap().extend(vals);
    }
}

impl Console for PipeConsole {
    fn handle_output(&self, val: u8) {
        self.out_buf.lock().unwrap().push_back(val);
    }

    fn input_available(&self) -> bool {
        !self.in_buf.lock().unwrap().is_empty()
    }

    fn poll_input(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }
}

////////////////////////////////////////////////////////////////////////////////

// Wires a console to a data port and an optional status port. The status
// port reads 1 while a key is waiting.
pub struct ConsolePorts {
    console: Arc<dyn Console>,
    data: u8,
    status: Option<u8>,
}

impl ConsolePorts {
    pub fn new(console: Arc<dyn Console>, data: u8, status: Option<u8>) -> Self {
        ConsolePorts { console, data, status }
    }
}

impl IoObserver for ConsolePorts {
    fn in_requested(&mut self, port: u8) -> Result<Option<u8>> {
        if port == self.data {
            return Ok(self.console.poll_input());
        }
        if Some(port) == self.status {
            return Ok(Some(self.console.input_available() as u8));
        }
        Ok(None)
    }

    fn out_changed(&mut self, port: u8, val: u8) -> Result<()> {
        if port == self.data {
            self.console.handle_output(val);
        }
        Ok(())
    }
}

// OUT prints a number per line, OTC a character, and INP takes a typed
// number once its line is complete.
pub struct LmcConsole {
    console: Arc<dyn Console>,
    line: String,
}

impl LmcConsole {
    pub fn new(console: Arc<dyn Console>) -> Self {
        LmcConsole { console, line: String::new() }
    }

    fn print(&self, text: &str) {
        for b in text.bytes() {
            self.console.handle_output(b);
        }
    }
}

impl IoObserver<lmc::Port, u16> for LmcConsole {
    fn in_requested(&mut self, _port: lmc::Port) -> Result<Option<u16>> {
        while let Some(ch) = self.console.poll_input() {
            match ch {
                b'\n' | b'\r' if !self.line.is_empty() => {
                    let line = std::mem::take(&mut self.line);
                    return Ok(line.parse().ok());
                }
                b'0'..=b'9' => self.line.push(ch as char),
                _ => (),
            }
        }
        Ok(None)
    }

    fn out_changed(&mut self, port: lmc::Port, val: u16) -> Result<()> {
        match port {
            lmc::Port::Otc => self.console.handle_output(val as u8),
            _ => self.print(&format!("{val}\n")),
        }
        Ok(())
    }
}
