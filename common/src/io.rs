use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::Result;

// Port-mapped I/O hooks, fired synchronously from inside IN/OUT-class
// instructions. Observers must not re-enter the CPU.
pub trait IoObserver<P = u8, V = u8>: Send {
    // Returning a value overrides whatever is latched for the port.
    fn in_requested(&mut self, _port: P) -> Result<Option<V>> {
        Ok(None)
    }

    fn out_changed(&mut self, _port: P, _val: V) -> Result<()> {
        Ok(())
    }
}

pub type SharedObserver<P = u8, V = u8> = Arc<Mutex<dyn IoObserver<P, V>>>;

pub struct Observers<P = u8, V = u8> {
    observers: Vec<SharedObserver<P, V>>,
}

impl<P: Copy, V: Copy> Observers<P, V> {
    pub fn new() -> Self {
        Observers { observers: Vec::new() }
    }

    pub fn add(&mut self, observer: SharedObserver<P, V>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    // Every observer hears the request; the first value supplied wins.
    pub fn notify_in(&self, port: P) -> Result<Option<V>> {
        let mut val = None;
        for observer in self.observers.iter() {
            let supplied = observer.lock().unwrap().in_requested(port)?;
            val = val.or(supplied);
        }
        Ok(val)
    }

    pub fn notify_out(&self, port: P, val: V) -> Result<()> {
        for observer in self.observers.iter() {
            observer.lock().unwrap().out_changed(port, val)?;
        }
        Ok(())
    }
}

impl<P: Copy, V: Copy> Default for Observers<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, V> Clone for Observers<P, V> {
    fn clone(&self) -> Self {
        Observers { observers: self.observers.clone() }
    }
}

impl<P, V> fmt::Debug for Observers<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Observers({})", self.observers.len())
    }
}
