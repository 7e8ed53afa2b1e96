//! Scripted probers, restarters and a log sink for unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProbeError, RestartError};
use crate::probe::Prober;
use crate::restart::Restarter;

/// Replays a fixed sequence of probe results, then repeats the last one.
pub struct ScriptedProber {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        let script: VecDeque<bool> = script.into_iter().collect();
        let fallback = script.back().copied().unwrap_or(false);
        Self {
            script: Mutex::new(script),
            fallback,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::new([true])
    }

    pub fn always_failing() -> Self {
        Self::new([false])
    }

    /// Every probe takes `latency` of (virtual) time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str, _timeout: Duration) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let ok = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if ok {
            Ok(())
        } else {
            Err(ProbeError::Status(503))
        }
    }
}

/// Restarter with a fixed answer that records every call.
pub struct ScriptedRestarter {
    result: Result<(), RestartError>,
    ids: Mutex<Vec<String>>,
}

impl ScriptedRestarter {
    pub fn succeeding() -> Self {
        Self {
            result: Ok(()),
            ids: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: RestartError) -> Self {
        Self {
            result: Err(err),
            ids: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.ids.lock().unwrap().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl Restarter for ScriptedRestarter {
    async fn restart(&self, restartable_id: &str) -> Result<(), RestartError> {
        self.ids.lock().unwrap().push(restartable_id.to_string());
        self.result.clone()
    }
}

/// Collects formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this thread's events here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
