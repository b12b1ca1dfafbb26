//! Lock-free sample ring between the sensor reader and the processor thread

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Single-producer, single-consumer ring of raw sensor samples
pub struct SampleRingBuffer {
    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,
}

impl SampleRingBuffer {
    /// Create new ring buffer with given capacity (in samples)
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f64>::new(capacity.max(1));
        let (producer, consumer) = rb.split();

        Self { producer, consumer }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (SampleProducer, SampleConsumer) {
        (
            SampleProducer {
                producer: self.producer,
            },
            SampleConsumer {
                consumer: self.consumer,
            },
        )
    }
}

/// Writing end, handed to whatever reads the sensor
pub struct SampleProducer {
    producer: HeapProducer<f64>,
}

impl SampleProducer {
    /// Queue one sample
    ///
    /// # Returns
    /// `false` if the ring is full and the sample was dropped
    pub fn push(&mut self, sample: f64) -> bool {
        self.producer.push(sample).is_ok()
    }

    /// Queue several samples, oldest first
    ///
    /// # Returns
    /// Number of samples actually written (may be less if the ring is full)
    pub fn write(&mut self, samples: &[f64]) -> usize {
        self.producer.push_slice(samples)
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Reading end, drained by the processor thread
pub struct SampleConsumer {
    consumer: HeapConsumer<f64>,
}

impl SampleConsumer {
    /// Read up to `buffer.len()` samples
    ///
    /// # Returns
    /// Number of samples read
    pub fn read(&mut self, buffer: &mut [f64]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}
