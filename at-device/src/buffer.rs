//! Fixed-capacity accumulation buffer

/// Default accumulation buffer capacity in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Receives the bytes of one transaction across many partial reads
///
/// The storage is zero-filled and never grows. `len` is the running write
/// offset; it never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl AccumulationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Bytes accumulated so far
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Region the next read writes into
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.len..]
    }

    /// Commit `n` bytes written into [`unfilled_mut`](Self::unfilled_mut)
    ///
    /// Clamped to the capacity.
    pub fn advance(&mut self, n: usize) {
        self.len = (self.len + n).min(self.data.len());
    }
}

impl Default for AccumulationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
