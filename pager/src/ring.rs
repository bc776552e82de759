//! Fixed-capacity byte queue used to decouple diagnostic text from the
//! serial port's write rate.
//!
//! One slot is always left unused so that a full queue can be told apart from
//! an empty one, giving `N - 1` usable bytes.

use core::fmt;

/// Byte that terminates a bulk push when `stop_on_sentinel` is set
pub const SENTINEL: u8 = b'\0';

/// Single-producer / single-consumer circular byte buffer
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "a ring buffer needs at least one usable slot");
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    const fn next(index: usize) -> usize {
        if index == N - 1 { 0 } else { index + 1 }
    }

    /// Number of bytes the buffer can hold at once
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn len(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            N - self.tail + self.head
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        Self::next(self.head) == self.tail
    }

    /// Enqueue a byte, returning `false` (and dropping it) when full
    pub fn push(&mut self, byte: u8) -> bool {
        let next_head = Self::next(self.head);
        if next_head == self.tail {
            return false;
        }
        self.buf[self.head] = byte;
        self.head = next_head;
        true
    }

    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.tail];
        self.tail = Self::next(self.tail);
        Some(byte)
    }

    /// Push bytes until the input runs out, the sentinel is reached (if
    /// `stop_on_sentinel`), or the buffer fills up.
    ///
    /// Returns the number of bytes actually enqueued. A partial write is not
    /// rolled back.
    pub fn push_bulk(&mut self, bytes: &[u8], stop_on_sentinel: bool) -> usize {
        for (i, &byte) in bytes.iter().enumerate() {
            if stop_on_sentinel && byte == SENTINEL {
                return i;
            }
            if !self.push(byte) {
                return i;
            }
        }
        bytes.len()
    }
}

impl<const N: usize> fmt::Write for RingBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_bulk(s.as_bytes(), false) == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}
