//! Sample ingestion: transform windows, cross-thread ring, background processor

pub mod processor;
pub mod ring;
pub mod sample_buffer;

pub use processor::{AnalyzerEvent, PulseProcessor};
pub use ring::{SampleConsumer, SampleProducer, SampleRingBuffer};
pub use sample_buffer::SampleBuffer;
