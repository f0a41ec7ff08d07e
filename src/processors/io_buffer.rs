use rtrb::{Consumer, Producer, RingBuffer};

use crate::processors::gate::Control;
use crate::BLOCK_SIZE;

/// Slots in each ring. A multiple of the block size so a buffered algorithm
/// can always tell whether a whole block fits.
pub const RING_CAPACITY: usize = 2 * BLOCK_SIZE;

/// Fixed-capacity FIFO between the per-sample tick and the block renderer.
///
/// Writes never block: when the ring is full the oldest value is dropped.
/// Reads never block either: an empty ring yields `T::default()`. Both ends
/// live in the same owner, the ring is only used for its allocation-free
/// storage and its slot accounting.
pub struct Ring<T> {
    producer: Producer<T>,
    consumer: Consumer<T>,
}

/// Control bytes waiting to be rendered.
pub type InputBuffer = Ring<Control>;
/// Rendered samples waiting to be played.
pub type OutputBuffer = Ring<i16>;

impl<T: Copy + Default> Ring<T> {
    pub fn new() -> Self {
        Self::with_capacity(RING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(capacity);
        Self { producer, consumer }
    }

    pub fn overwrite(&mut self, value: T) {
        if self.producer.is_full() {
            let _ = self.consumer.pop();
        }
        let _ = self.producer.push(value);
    }

    pub fn immediate_read(&mut self) -> T {
        self.consumer.pop().unwrap_or_default()
    }

    /// Number of values that can be read.
    pub fn readable(&self) -> usize {
        self.consumer.slots()
    }

    /// Number of values that can be written without dropping anything.
    pub fn writable(&self) -> usize {
        self.producer.slots()
    }

    pub fn capacity(&self) -> usize {
        self.producer.buffer().capacity()
    }

    pub fn flush(&mut self) {
        while self.consumer.pop().is_ok() {}
    }
}

impl<T: Copy + Default> Default for Ring<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_order() {
        let mut ring: OutputBuffer = Ring::new();
        for i in 0..5 {
            ring.overwrite(i);
        }
        assert_eq!(ring.readable(), 5);
        assert_eq!(ring.writable(), RING_CAPACITY - 5);
        let read: Vec<i16> = (0..5).map(|_| ring.immediate_read()).collect();
        assert_eq!(read, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_read_is_default() {
        let mut ring: InputBuffer = Ring::new();
        assert_eq!(ring.immediate_read(), Control::NONE);
    }

    #[test]
    fn full_ring_drops_oldest() {
        let mut ring: OutputBuffer = Ring::with_capacity(4);
        for i in 0..6 {
            ring.overwrite(i);
        }
        assert_eq!(ring.readable(), 4);
        assert_eq!(ring.immediate_read(), 2);
    }

    #[test]
    fn capacity_is_whole_blocks() {
        let ring: OutputBuffer = Ring::new();
        assert_eq!(ring.capacity() % BLOCK_SIZE, 0);
    }
}
