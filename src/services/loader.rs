//! Background feed fetching for the current selection.
//!
//! Every `select` or `cancel` bumps a generation counter. Fetch threads tag
//! their result with the generation they were started for, and only a result
//! whose tag matches the current generation is applied.

use log::{debug, info, warn};
use std::mem;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::client::{FeedError, FeedSource};
use crate::models::reading::Reading;

type FetchResult = (u64, Result<Vec<Reading>, FeedError>);

#[derive(Debug)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(Vec<Reading>),
    Failed(FeedError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

pub struct FeedLoader<S: FeedSource + ?Sized> {
    source: Arc<S>,
    generation: u64,
    state: LoadState,
    tx: Sender<FetchResult>,
    rx: Receiver<FetchResult>,
}

impl<S: FeedSource + ?Sized> FeedLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::channel();
        FeedLoader {
            source,
            generation: 0,
            state: LoadState::Idle,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start fetching `url`, superseding whatever was in flight.
    pub fn select(&mut self, url: &str) -> Result<(), String> {
        self.generation += 1;
        let generation = self.generation;
        self.state = LoadState::Loading;

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let url = url.to_string();
        info!("Loader: fetching selection {}", generation);
        thread::Builder::new()
            .name(format!("feed-fetch-{}", generation))
            .spawn(move || {
                let result = source.fetch(&url);
                // Receiver gone means the loader was dropped; nothing to report to.
                let _ = tx.send((generation, result));
            })
            .map_err(|e| format!("spawn feed fetch thread failed: {}", e))?;
        Ok(())
    }

    /// Forget the in-flight fetch. Its result will be discarded on arrival.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.state.is_loading() {
            debug!("Loader: cancelled, now at generation {}", self.generation);
        }
        self.state = LoadState::Idle;
    }

    /// Apply any results that already arrived without blocking.
    pub fn poll(&mut self) -> &LoadState {
        loop {
            match self.rx.try_recv() {
                Ok(message) => self.apply(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        &self.state
    }

    /// Block until the current selection resolves or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> &LoadState {
        self.poll();
        let deadline = Instant::now() + timeout;
        while self.state.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Loader: selection {} still loading after {:?}", self.generation, timeout);
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(message) => self.apply(message),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        &self.state
    }

    /// Take the resolved state, leaving the loader idle.
    pub fn take(&mut self) -> LoadState {
        mem::replace(&mut self.state, LoadState::Idle)
    }

    fn apply(&mut self, (generation, result): FetchResult) {
        if generation != self.generation {
            debug!(
                "Loader: discarding stale result for selection {} (current {})",
                generation, self.generation
            );
            return;
        }
        self.state = match result {
            Ok(readings) => {
                info!("Loader: selection {} ready with {} reading(s)", generation, readings.len());
                LoadState::Ready(readings)
            }
            Err(e) => {
                warn!("Loader: selection {} failed: {}", generation, e);
                LoadState::Failed(e)
            }
        };
    }
}
