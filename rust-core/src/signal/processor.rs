//! Background pulse processor - keeps ingestion off the caller's thread
//!
//! The sensor reader pushes raw samples into a lock-free ring. A worker
//! thread drains the ring into the analyzer and publishes a report for every
//! completed window. Analyzer state (buffer, filter history, plan,
//! properties) sits behind one mutex, so reconfiguration from another thread
//! can never tear a window.

use super::ring::{SampleConsumer, SampleProducer, SampleRingBuffer};
use crate::error::ProcessorError;
use crate::spectrum::{PipelineStages, SpectralAnalyzer, SpectrumReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

/// Default ring capacity in samples
pub const DEFAULT_RING_CAPACITY: usize = 4096;

/// Samples drained from the ring per lock of the analyzer
const DRAIN_CHUNK: usize = 256;

/// Published by the worker thread
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    /// A window completed
    SpectrumComputed(SpectrumReport),

    /// Raw sample as it was ingested (only with raw echo enabled)
    RawSample(f64),
}

/// Runs a [`SpectralAnalyzer`] on a worker thread
pub struct PulseProcessor {
    analyzer: Arc<Mutex<SpectralAnalyzer>>,

    /// Latest report, taken by `take_report`
    latest: Arc<Mutex<Option<SpectrumReport>>>,

    subscribers: Arc<Mutex<Vec<Sender<AnalyzerEvent>>>>,

    running: Arc<AtomicBool>,

    echo_raw: Arc<AtomicBool>,

    ring_capacity: usize,

    worker: Option<JoinHandle<()>>,
}

impl PulseProcessor {
    pub fn new(analyzer: SpectralAnalyzer) -> Self {
        Self::with_ring_capacity(analyzer, DEFAULT_RING_CAPACITY)
    }

    pub fn with_ring_capacity(analyzer: SpectralAnalyzer, ring_capacity: usize) -> Self {
        Self {
            analyzer: Arc::new(Mutex::new(analyzer)),
            latest: Arc::new(Mutex::new(None)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            echo_raw: Arc::new(AtomicBool::new(false)),
            ring_capacity,
            worker: None,
        }
    }

    /// Start the worker thread
    ///
    /// # Returns
    /// The producer end of the sample ring, for the sensor reader
    pub fn start(&mut self) -> Result<SampleProducer, ProcessorError> {
        if self.worker.is_some() {
            return Err(ProcessorError::AlreadyRunning);
        }

        let (producer, consumer) = SampleRingBuffer::new(self.ring_capacity).split();

        self.running.store(true, Ordering::SeqCst);

        let worker = Worker {
            analyzer: Arc::clone(&self.analyzer),
            latest: Arc::clone(&self.latest),
            subscribers: Arc::clone(&self.subscribers),
            running: Arc::clone(&self.running),
            echo_raw: Arc::clone(&self.echo_raw),
        };

        self.worker = Some(std::thread::spawn(move || worker.run(consumer)));
        log::info!("pulse processor started (ring capacity {})", self.ring_capacity);

        Ok(producer)
    }

    /// Stop and join the worker thread
    ///
    /// Samples still in the ring when the worker notices the stop flag are
    /// ingested before it exits.
    pub fn stop(&mut self) -> Result<(), ProcessorError> {
        let handle = self.worker.take().ok_or(ProcessorError::NotRunning)?;

        self.running.store(false, Ordering::SeqCst);
        if handle.join().is_err() {
            log::error!("pulse processor worker panicked");
        }

        log::info!("pulse processor stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Receive every future event on a new channel
    pub fn subscribe(&self) -> Receiver<AnalyzerEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Also publish each raw sample as it is ingested (for live plots)
    pub fn set_echo_raw(&self, enabled: bool) {
        self.echo_raw.store(enabled, Ordering::SeqCst);
    }

    /// Latest report since the last call, if any
    pub fn take_report(&self) -> Option<SpectrumReport> {
        self.latest.lock().ok()?.take()
    }

    pub fn set_sample_interval(&self, sample_interval: f64) -> Result<(), ProcessorError> {
        Ok(self.lock()?.set_sample_interval(sample_interval)?)
    }

    pub fn set_sample_settings(
        &self,
        effective_size: usize,
        zero_pad: usize,
        hop: usize,
    ) -> Result<(), ProcessorError> {
        Ok(self.lock()?.set_sample_settings(effective_size, zero_pad, hop)?)
    }

    pub fn set_frequency_band(&self, min_hz: f64, max_hz: f64) -> Result<(), ProcessorError> {
        Ok(self.lock()?.set_frequency_band(min_hz, max_hz)?)
    }

    pub fn set_stages(&self, stages: PipelineStages) -> Result<(), ProcessorError> {
        self.lock()?.set_stages(stages);
        Ok(())
    }

    /// Run `f` with exclusive access to the analyzer
    pub fn with_analyzer<R>(
        &self,
        f: impl FnOnce(&mut SpectralAnalyzer) -> R,
    ) -> Result<R, ProcessorError> {
        let mut analyzer = self.lock()?;
        Ok(f(&mut analyzer))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SpectralAnalyzer>, ProcessorError> {
        self.analyzer.lock().map_err(|_| ProcessorError::Poisoned)
    }
}

impl Drop for PulseProcessor {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

/// State moved onto the worker thread
struct Worker {
    analyzer: Arc<Mutex<SpectralAnalyzer>>,
    latest: Arc<Mutex<Option<SpectrumReport>>>,
    subscribers: Arc<Mutex<Vec<Sender<AnalyzerEvent>>>>,
    running: Arc<AtomicBool>,
    echo_raw: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, mut consumer: SampleConsumer) {
        let mut chunk = vec![0.0; DRAIN_CHUNK];

        loop {
            // Read the flag before draining so nothing pushed before stop() is lost
            let keep_running = self.running.load(Ordering::SeqCst);

            let n = consumer.read(&mut chunk);
            if n > 0 {
                self.ingest(&chunk[..n]);
                continue;
            }

            if !keep_running {
                break;
            }

            // Nothing queued; sensors run at a few Hz so a short sleep costs nothing
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ingest(&self, samples: &[f64]) {
        let echo = self.echo_raw.load(Ordering::SeqCst);
        let mut events = Vec::new();

        {
            let mut analyzer = match self.analyzer.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    log::error!("analyzer lock poisoned, dropping {} samples", samples.len());
                    return;
                }
            };

            for &sample in samples {
                if echo {
                    events.push(AnalyzerEvent::RawSample(sample));
                }

                if analyzer.add_sample(sample) {
                    if let Some(report) = analyzer.report() {
                        log::debug!("spectrum computed, peak {:?}", report.peak);
                        events.push(AnalyzerEvent::SpectrumComputed(report));
                    }
                }
            }
        }

        self.publish(events);
    }

    fn publish(&self, events: Vec<AnalyzerEvent>) {
        if events.is_empty() {
            return;
        }

        let latest_report = events.iter().rev().find_map(|event| match event {
            AnalyzerEvent::SpectrumComputed(report) => Some(report.clone()),
            AnalyzerEvent::RawSample(_) => None,
        });

        if let Some(report) = latest_report {
            if let Ok(mut latest) = self.latest.lock() {
                *latest = Some(report);
            }
        }

        if let Ok(mut subscribers) = self.subscribers.lock() {
            // Drop subscribers whose receiver is gone
            subscribers.retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
        }
    }
}
