use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use delegate::delegate;
use log::trace;

// Offered every read and write before it reaches the backing array. Handlers
// reach the true RAM through the direct accessors on `RawMemory`.
pub trait MemoryMapper<A, D>: Send {
    fn read(&mut self, mem: &mut RawMemory<A, D>, addr: A) -> D;
    fn write(&mut self, mem: &mut RawMemory<A, D>, addr: A, val: D);
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct RawMemory<A, D> {
    data: Vec<D>,
    _addr: PhantomData<A>,
}

impl<A, D> RawMemory<A, D>
where
    A: Copy + Into<usize>,
    D: Copy + Default + fmt::Debug,
{
    fn new() -> Self {
        RawMemory { data: Vec::new(), _addr: PhantomData }
    }

    // Addresses wrap like a truncated address bus.
    fn index(&self, addr: usize) -> Option<usize> {
        if self.data.is_empty() {
            None
        } else {
            Some(addr % self.data.len())
        }
    }

    pub fn direct_read(&self, addr: A) -> D {
        match self.index(addr.into()) {
            Some(idx) => self.data[idx],
            None => D::default(),
        }
    }

    pub fn direct_write(&mut self, addr: A, val: D) {
        if let Some(idx) = self.index(addr.into()) {
            trace!("Mem: writing {val:?} to {idx:#06x}");
            self.data[idx] = val;
        }
    }

    // An independent copy of [from, to).
    pub fn slice(&self, from: A, to: A) -> Vec<D> {
        let len = self.data.len();
        let from = usize::min(from.into(), len);
        let to = usize::min(to.into(), len);
        if from >= to {
            return Vec::new();
        }
        self.data[from..to].to_vec()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn add(&mut self, segment: &[D]) {
        self.data.extend_from_slice(segment);
    }

    pub fn load(&mut self, data: &[D], start: A) {
        let start: usize = start.into();
        for (offset, val) in data.iter().enumerate() {
            if let Some(idx) = self.index(start + offset) {
                self.data[idx] = *val;
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Clone)]
pub struct Memory<A, D> {
    raw: RawMemory<A, D>,
    mapper: Option<Arc<Mutex<dyn MemoryMapper<A, D>>>>,
}

impl<A, D> Memory<A, D>
where
    A: Copy + Into<usize> + 'static,
    D: Copy + Default + fmt::Debug + 'static,
{
    pub fn new() -> Self {
        Memory { raw: RawMemory::new(), mapper: None }
    }

    pub fn with_size(size: usize) -> Self {
        let mut mem = Self::new();
        mem.add(&vec![D::default(); size]);
        mem
    }

    pub fn read(&mut self, addr: A) -> D {
        if let Some(mapper) = &self.mapper {
            return mapper.lock().unwrap().read(&mut self.raw, addr);
        }
        self.raw.direct_read(addr)
    }

    pub fn write(&mut self, addr: A, val: D) {
        if let Some(mapper) = &self.mapper {
            mapper.lock().unwrap().write(&mut self.raw, addr, val);
            return;
        }
        self.raw.direct_write(addr, val)
    }

    pub fn set_mapper(&mut self, mapper: impl MemoryMapper<A, D> + 'static) {
        self.mapper = Some(Arc::new(Mutex::new(mapper)));
    }

    // For callers that need to keep a handle on the mapper's own state.
    pub fn set_shared_mapper(&mut self, mapper: Arc<Mutex<dyn MemoryMapper<A, D>>>) {
        self.mapper = Some(mapper);
    }

    pub fn clear_mapper(&mut self) {
        self.mapper = None;
    }

    pub fn has_mapper(&self) -> bool {
        self.mapper.is_some()
    }

    pub fn raw(&self) -> &RawMemory<A, D> {
        &self.raw
    }

    delegate! {
        to self.raw {
            pub fn direct_read(&self, addr: A) -> D;
            pub fn direct_write(&mut self, addr: A, val: D);
            pub fn slice(&self, from: A, to: A) -> Vec<D>;
            pub fn size(&self) -> usize;
            pub fn add(&mut self, segment: &[D]);
            pub fn load(&mut self, data: &[D], start: A);
        }
    }
}

impl<A, D> Default for Memory<A, D>
where
    A: Copy + Into<usize> + 'static,
    D: Copy + Default + fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, D> From<Vec<D>> for Memory<A, D> {
    fn from(data: Vec<D>) -> Self {
        Memory { raw: RawMemory { data, _addr: PhantomData }, mapper: None }
    }
}

impl<A, D: fmt::Debug> fmt::Debug for Memory<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.raw.data.len())
            .field("mapped", &self.mapper.is_some())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////

// Drops writes into a ROM region; everything else goes straight through.
#[derive(Debug, Clone)]
pub struct ReadOnlyRange {
    range: Range<usize>,
    ignored_writes: usize,
}

impl ReadOnlyRange {
    pub fn new(range: Range<usize>) -> Self {
        ReadOnlyRange { range, ignored_writes: 0 }
    }

    pub fn ignored_writes(&self) -> usize {
        self.ignored_writes
    }
}

impl<A, D> MemoryMapper<A, D> for ReadOnlyRange
where
    A: Copy + Into<usize> + Send,
    D: Copy + Default + fmt::Debug + Send,
{
    fn read(&mut self, mem: &mut RawMemory<A, D>, addr: A) -> D {
        mem.direct_read(addr)
    }

    fn write(&mut self, mem: &mut RawMemory<A, D>, addr: A, val: D) {
        let idx: usize = addr.into();
        if self.range.contains(&idx) {
            trace!("Mem: ignoring write of {val:?} to ROM at {idx:#06x}");
            self.ignored_writes += 1;
        } else {
            mem.direct_write(addr, val);
        }
    }
}
