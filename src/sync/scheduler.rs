//! Task and timer scheduling for the renderer.
//!
//! Network calls and delays run as spawned tasks that only post a
//! [`Completion`] back; the owner of the renderer applies completions one at a
//! time, so widget state is never touched from a task.

use crate::network::fetcher::{Ack, FailureReason, FetchResult, SubmitError};
use crate::portfolio::Action;
use crate::portfolio::payloads::ImpactAnalysis;
use crate::sync::section::{RefreshTicket, Section};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum Completion {
    Fetched {
        ticket: RefreshTicket,
        result: FetchResult,
    },
    Submitted {
        section: Section,
        action: Action,
        result: Result<Ack, SubmitError>,
    },
    /// The settle delay after a write elapsed.
    RefreshDue(Section),
    /// Periodic timer fired. `generation` identifies the timer that sent it.
    Tick { section: Section, generation: u64 },
    ImpactLoaded {
        widget_id: String,
        /// Recommendations request id the widget belonged to.
        generation: u64,
        result: Result<ImpactAnalysis, FailureReason>,
    },
    HoldingLoaded {
        symbol: String,
        result: Result<Option<f64>, FailureReason>,
    },
}

struct Envelope {
    /// `None` when the task was cancelled.
    completion: Option<Completion>,
    /// Counted in `pending`; periodic ticks are not.
    tracked: bool,
}

pub struct Scheduler {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: mpsc::UnboundedReceiver<Envelope>,
    pending: usize,
    shutdown: CancellationToken,
    periodic: HashMap<Section, PeriodicTimer>,
    next_generation: u64,
}

struct PeriodicTimer {
    generation: u64,
    token: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            pending: 0,
            shutdown: CancellationToken::new(),
            periodic: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Runs `task` in the background. Its completion is delivered by
    /// [`Scheduler::next`]; only [`Scheduler::shutdown`] cancels it.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let token = self.shutdown.child_token();
        let sender = self.sender.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let completion = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                completion = task => Some(completion),
            };
            let _ = sender.send(Envelope {
                completion,
                tracked: true,
            });
        });
    }

    /// Delivers [`Completion::RefreshDue`] for `section` after `delay`.
    /// Pausing the section's timer does not cancel it.
    pub fn schedule_refresh(&mut self, section: Section, delay: Duration) {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            Completion::RefreshDue(section)
        });
    }

    /// Starts (or restarts) the periodic timer of `section`. The first tick
    /// comes after one full interval. Returns false after a shutdown.
    pub fn start_periodic(&mut self, section: Section, interval: Duration) -> bool {
        if self.is_shut_down() {
            return false;
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        let token = self.shutdown.child_token();
        let timer = PeriodicTimer {
            generation,
            token: token.clone(),
        };
        if let Some(previous) = self.periodic.insert(section, timer) {
            previous.token.cancel();
        }
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let tick = Envelope {
                            completion: Some(Completion::Tick { section, generation }),
                            tracked: false,
                        };
                        if sender.send(tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        true
    }

    /// Clears the periodic timer of `section`. Returns whether one was running.
    pub fn stop(&mut self, section: Section) -> bool {
        match self.periodic.remove(&section) {
            Some(timer) => {
                timer.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn has_timer(&self, section: Section) -> bool {
        self.periodic.contains_key(&section)
    }

    /// Whether a tick was sent by the timer currently running for `section`.
    /// Ticks queued before a stop or restart are not.
    pub fn is_live_tick(&self, section: Section, generation: u64) -> bool {
        self.periodic
            .get(&section)
            .is_some_and(|timer| timer.generation == generation)
    }

    /// Cancels every spawned task and timer.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.periodic.clear();
    }

    fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawned tasks whose completion has not been received yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn unwrap_envelope(&mut self, envelope: Envelope) -> Option<Completion> {
        if envelope.tracked {
            self.pending = self.pending.saturating_sub(1);
        }
        envelope.completion
    }

    /// Waits for the next completion, ticks included.
    pub async fn next(&mut self) -> Option<Completion> {
        loop {
            let envelope = self.receiver.recv().await?;
            if let Some(completion) = self.unwrap_envelope(envelope) {
                return Some(completion);
            }
        }
    }

    /// Waits for the next completion while tracked work is outstanding.
    /// Returns `None` once nothing is pending.
    pub async fn next_pending(&mut self) -> Option<Completion> {
        while self.pending > 0 {
            let envelope = self.receiver.recv().await?;
            if let Some(completion) = self.unwrap_envelope(envelope) {
                return Some(completion);
            }
        }
        None
    }

    /// Returns an already delivered completion without waiting.
    pub fn try_next(&mut self) -> Option<Completion> {
        while let Ok(envelope) = self.receiver.try_recv() {
            if let Some(completion) = self.unwrap_envelope(envelope) {
                return Some(completion);
            }
        }
        None
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
