//! Decides when the session is revalidated.
//!
//! The host calls [`RevalidationScheduler::mount`] once and forwards "view became
//! active" events through a [`FocusNotifier`]. Focus handling is only wired up after
//! the initial load has finished, and the returned [`SchedulerHandle`] removes it again.

use crate::session::machine::SessionStateMachine;
use crate::session::types::FetchOutcome;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const FOCUS_CHANNEL_CAPACITY: usize = 16;

/// The host's view became active or regained focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSignal;

/// Cloneable sender the host uses to report focus changes
#[derive(Debug, Clone)]
pub struct FocusNotifier {
    sender: broadcast::Sender<FocusSignal>,
}

impl FocusNotifier {
    /// Returns false when no listener is installed, in which case the signal is dropped
    pub fn notify(&self) -> bool {
        self.sender.send(FocusSignal).is_ok()
    }
}

/// What a single focus signal did
#[derive(Debug)]
pub struct FocusOutcome {
    /// A snapshot with a username was found and merged
    pub merged: bool,
    /// Background revalidation, started when the snapshot was older than the threshold
    pub refresh: Option<JoinHandle<FetchOutcome>>,
}

impl FocusOutcome {
    pub fn refresh_started(&self) -> bool {
        self.refresh.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RevalidationScheduler {
    machine: SessionStateMachine,
    refresh_threshold_ms: i64,
    focus: broadcast::Sender<FocusSignal>,
}

impl RevalidationScheduler {
    pub fn new(machine: SessionStateMachine, refresh_threshold_ms: i64) -> Self {
        let (focus, _) = broadcast::channel(FOCUS_CHANNEL_CAPACITY);
        Self {
            machine,
            refresh_threshold_ms,
            focus,
        }
    }

    pub fn machine(&self) -> &SessionStateMachine {
        &self.machine
    }

    pub fn focus_notifier(&self) -> FocusNotifier {
        FocusNotifier {
            sender: self.focus.clone(),
        }
    }

    /// Run the initial load, then start listening for focus signals
    pub async fn mount(&self) -> SchedulerHandle {
        self.machine.start().await;

        let mut signals = self.focus.subscribe();
        let scheduler = self.clone();
        let listener = tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(FocusSignal) => {
                        scheduler.handle_focus().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Skipped {} focus signals", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        info!("Focus revalidation installed");
        SchedulerHandle {
            listener: Some(listener),
            machine: self.machine.clone(),
        }
    }

    /// Merge the cached snapshot and revalidate in the background if it has aged out
    pub async fn handle_focus(&self) -> FocusOutcome {
        let snapshot = self.machine.merge_cached_user().await;
        let merged = snapshot.as_ref().is_some_and(|s| s.has_username());

        let now = self.machine.clock().now_millis();
        let stale = snapshot
            .as_ref()
            .is_some_and(|s| s.is_stale(now, self.refresh_threshold_ms));

        let refresh = if stale {
            debug!("Cached user older than {}ms, revalidating", self.refresh_threshold_ms);
            let machine = self.machine.clone();
            Some(tokio::spawn(async move { machine.fetch_user().await }))
        } else {
            None
        };

        FocusOutcome { merged, refresh }
    }
}

/// Keeps focus revalidation installed; dropping it tears everything down
#[derive(Debug)]
pub struct SchedulerHandle {
    listener: Option<JoinHandle<()>>,
    machine: SessionStateMachine,
}

impl SchedulerHandle {
    pub fn is_active(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.is_finished())
    }

    /// Remove the focus listener and stop publishing state
    pub fn teardown(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            self.machine.detach();
            debug!("Focus revalidation removed");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
