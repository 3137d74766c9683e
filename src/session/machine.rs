use crate::cache::{self, CachedSnapshot, PersistentCache};
use crate::client::SessionClient;
use crate::clock::{Clock, SystemClock};
use crate::config::SessionSyncConfig;
use crate::guard::{GuardOutcome, Navigator, ProxyGuard};
use crate::session::types::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

/// Owner of the live [`User`] and sole writer of the persistent cache.
///
/// Cloning is cheap; clones drive and observe the same state. Every transition is
/// published to [`subscribe`](Self::subscribe) receivers until [`detach`](Self::detach)
/// is called.
#[derive(Clone)]
pub struct SessionStateMachine {
    inner: Arc<MachineInner>,
}

struct MachineInner {
    client: Arc<dyn SessionClient>,
    cache: Arc<dyn PersistentCache>,
    guard: ProxyGuard,
    clock: Arc<dyn Clock>,
    fetch_without_snapshot: bool,
    state: watch::Sender<UserState>,
    // held for the duration of a fetch; at most one request in flight
    fetch_gate: Mutex<()>,
    detached: AtomicBool,
}

impl SessionStateMachine {
    pub fn new(
        config: &SessionSyncConfig,
        client: Arc<dyn SessionClient>,
        cache: Arc<dyn PersistentCache>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_clock(config, client, cache, navigator, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &SessionSyncConfig,
        client: Arc<dyn SessionClient>,
        cache: Arc<dyn PersistentCache>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let guard = ProxyGuard::new(config, cache.clone(), navigator, clock.clone());
        let (state, _) = watch::channel(UserState::default());

        Self {
            inner: Arc::new(MachineInner {
                client,
                cache,
                guard,
                clock,
                fetch_without_snapshot: config.fetch_without_snapshot,
                state,
                fetch_gate: Mutex::new(()),
                detached: AtomicBool::new(false),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> UserState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<SessionSyncError> {
        self.inner.state.borrow().error.clone()
    }

    /// Observe every published transition
    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.inner.state.subscribe()
    }

    /// Stop publishing. Requests already in flight still complete and still write
    /// the cache; their results are just no longer delivered.
    pub fn detach(&self) {
        if !self.inner.detached.swap(true, Ordering::SeqCst) {
            debug!("Session state machine detached");
        }
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Initial load: show the cached user right away, then confirm it with the server
    pub async fn start(&self) {
        let snapshot = cache::load_snapshot(self.inner.cache.as_ref()).await;

        match snapshot {
            Some(snapshot) => {
                info!("Restored cached user {}", snapshot.username);
                self.update(|state| {
                    state.phase = Phase::Ready;
                    state.user = Some(User::from(&snapshot));
                });
                self.update(|state| state.phase = Phase::Loading);
                self.fetch_user().await;
            }
            None if self.inner.fetch_without_snapshot => {
                debug!("No cached user, revalidating anyway");
                self.update(|state| state.phase = Phase::Loading);
                self.fetch_user().await;
            }
            None => debug!("No cached user, skipping initial fetch"),
        }

        self.update(|state| state.phase = Phase::Ready);
    }

    /// Confirm the session with the server and reconcile user, cache and error.
    ///
    /// A call made while another fetch is in flight waits for it and returns
    /// [`FetchOutcome::Coalesced`] instead of issuing a second request. The adopted
    /// result is whatever that earlier request saw, so after the session credentials
    /// change (a fresh login) use [`refresh_user`](Self::refresh_user) instead.
    pub async fn fetch_user(&self) -> FetchOutcome {
        let _gate = match self.inner.fetch_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                debug!("Fetch already in flight, waiting for its result");
                let _ = self.inner.fetch_gate.lock().await;
                return FetchOutcome::Coalesced;
            }
        };

        self.fetch_locked().await
    }

    /// Like [`fetch_user`](Self::fetch_user), but never adopts an older request: waits
    /// for any fetch in flight to finish, then always issues its own.
    pub async fn refresh_user(&self) -> FetchOutcome {
        let _gate = self.inner.fetch_gate.lock().await;
        self.fetch_locked().await
    }

    // caller holds fetch_gate
    async fn fetch_locked(&self) -> FetchOutcome {
        let response = match self.inner.client.fetch_current_user().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetching current user failed: {}", e);
                self.record_error(e.into());
                return FetchOutcome::TransportFailed;
            }
        };

        if !response.is_auth_failure() {
            let user: User = match serde_json::from_value(response.body) {
                Ok(user) => user,
                Err(e) => {
                    warn!("Status {} with unusable user body: {}", response.status, e);
                    self.record_error(SessionSyncError::Transport(format!(
                        "malformed user body: {e}"
                    )));
                    return FetchOutcome::TransportFailed;
                }
            };
            self.accept_user(user).await;
            return FetchOutcome::Authenticated;
        }

        let outcome = self.inner.guard.inspect(&response).await;
        match outcome {
            GuardOutcome::Genuine => {
                let status = response.status;
                let message = response
                    .message()
                    .unwrap_or("session rejected")
                    .to_string();
                info!("Session rejected by server ({}): {}", status, message);

                self.update(|state| {
                    state.user = None;
                    state.error = Some(SessionSyncError::Session { status, message });
                });
                if let Err(e) = cache::remove_snapshot(self.inner.cache.as_ref()).await {
                    warn!("Failed to remove cached user: {}", e);
                }
                FetchOutcome::Unauthenticated { status }
            }
            GuardOutcome::RedirectToLogin { target } => {
                self.update(|state| {
                    state.user = state.user.take().filter(User::has_id).map(|mut user| {
                        user.proxy_response = true;
                        user
                    });
                });
                self.inner.guard.redirect_to_login(&target).await;
                FetchOutcome::ProxyAnomaly(GuardOutcome::RedirectToLogin { target })
            }
            other => FetchOutcome::ProxyAnomaly(other),
        }
    }

    async fn accept_user(&self, user: User) {
        let snapshot = CachedSnapshot::from_user(&user, self.inner.clock.now_millis());
        debug!("Authenticated as {}", user.username);

        self.update(|state| {
            state.user = Some(user);
            state.error = None;
        });

        let cache = self.inner.cache.as_ref();
        if let Err(e) = cache::store_snapshot(cache, &snapshot).await {
            error!("Failed to cache user snapshot: {}", e);
            self.record_error(e.into());
        }
        if let Err(e) = cache::clear_cooldown(cache).await {
            warn!("Failed to clear reload cooldown marker: {}", e);
        }
    }

    /// End the session on the server, then forget everything stored locally.
    ///
    /// Anything other than a 200 leaves user and cache untouched so the call can be
    /// retried.
    pub async fn logout(&self) -> Result<(), SessionSyncError> {
        let status = match self.inner.client.delete_session().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Logout request failed: {}", e);
                let error = SessionSyncError::from(e);
                self.record_error(error.clone());
                return Err(error);
            }
        };

        if status != 200 {
            warn!("Logout rejected with status {}", status);
            let error = SessionSyncError::LogoutFailure { status };
            self.record_error(error.clone());
            return Err(error);
        }

        let cleared = self.inner.cache.clear().await;
        self.update(|state| {
            state.user = None;
            state.error = None;
        });

        if let Err(e) = cleared {
            error!("Session ended but local cache could not be cleared: {}", e);
            let error = SessionSyncError::from(e);
            self.record_error(error.clone());
            return Err(error);
        }

        info!("Logged out");
        Ok(())
    }

    /// Bring the in-memory user in line with the cached snapshot, which another view
    /// of the application may have rewritten. Returns the snapshot that was read.
    pub async fn merge_cached_user(&self) -> Option<CachedSnapshot> {
        let snapshot = cache::load_snapshot(self.inner.cache.as_ref()).await;

        self.update(|state| {
            state.user = match &snapshot {
                Some(snapshot) if snapshot.has_username() => Some(match state.user.take() {
                    Some(mut user) => {
                        user.apply_snapshot(snapshot);
                        user
                    }
                    None => User::from(snapshot),
                }),
                _ => None,
            };
        });

        snapshot
    }

    fn record_error(&self, error: SessionSyncError) {
        self.update(|state| state.error = Some(error));
    }

    fn update(&self, f: impl FnOnce(&mut UserState)) {
        if self.is_detached() {
            debug!("Dropping state update after detach");
            return;
        }
        self.inner.state.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            *state != before
        });
    }
}

impl std::fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("client", &self.inner.client.client_type())
            .field("cache", &self.inner.cache.cache_type())
            .field("guard", &self.inner.guard)
            .field("state", &*self.inner.state.borrow())
            .field("detached", &self.is_detached())
            .finish()
    }
}
