//! Scripted [`SessionClient`] for tests and offline demos.
//!
//! Responses are served in the order they were queued. When a queue runs dry the
//! last scripted result keeps being returned, so a single `push_fetch` models a
//! stable server.

use super::{ClientError, SessionClient, SessionResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<T>,
    last: Option<T>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            last: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn push(&mut self, item: T) {
        self.queue.push_back(item);
    }

    fn next(&mut self) -> Option<T> {
        if let Some(item) = self.queue.pop_front() {
            self.last = Some(item.clone());
            return Some(item);
        }
        self.last.clone()
    }
}

#[derive(Debug, Default)]
pub struct MockSessionClient {
    fetches: Mutex<Script<Result<SessionResponse, ClientError>>>,
    deletes: Mutex<Script<Result<u16, ClientError>>>,
    fetch_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MockSessionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to keep requests in flight while a test races them
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_fetch(&self, response: SessionResponse) -> &Self {
        self.lock_fetches().push(Ok(response));
        self
    }

    pub fn push_fetch_error(&self, error: ClientError) -> &Self {
        self.lock_fetches().push(Err(error));
        self
    }

    pub fn push_delete(&self, status: u16) -> &Self {
        self.lock_deletes().push(Ok(status));
        self
    }

    pub fn push_delete_error(&self, error: ClientError) -> &Self {
        self.lock_deletes().push(Err(error));
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn lock_fetches(
        &self,
    ) -> std::sync::MutexGuard<'_, Script<Result<SessionResponse, ClientError>>> {
        self.fetches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_deletes(&self) -> std::sync::MutexGuard<'_, Script<Result<u16, ClientError>>> {
        self.deletes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SessionClient for MockSessionClient {
    async fn fetch_current_user(&self) -> Result<SessionResponse, ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_fetches().next();
        self.simulate_latency().await;
        next.unwrap_or_else(|| Err(ClientError::Network("no scripted response".to_string())))
    }

    async fn delete_session(&self) -> Result<u16, ClientError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_deletes().next();
        self.simulate_latency().await;
        next.unwrap_or_else(|| Err(ClientError::Network("no scripted response".to_string())))
    }

    fn client_type(&self) -> &'static str {
        "mock"
    }
}
