// Process-wide authentication session.
//
// Owned explicitly and shared as `Arc<AuthSession>`; the interceptor and
// the login/logout operations are the only writers. Readers load the
// current tokens at send time, never caching them across a request.

use std::sync::Arc;

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct SessionState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    /// Bumped on every credential change. Lets the interceptor tell whether
    /// a 403 was produced by a token that has already been rotated.
    generation: u64,
}

/// Bearer/refresh token pair for the current process.
#[derive(Debug, Default)]
pub struct AuthSession {
    state: ArcSwap<SessionState>,
}

impl AuthSession {
    /// A logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session seeded with existing tokens.
    pub fn with_tokens(
        access_token: Option<SecretString>,
        refresh_token: Option<SecretString>,
    ) -> Self {
        Self {
            state: ArcSwap::from_pointee(SessionState {
                access_token,
                refresh_token,
                generation: 0,
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn access_token(&self) -> Option<SecretString> {
        self.state.load().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.state.load().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.load().access_token.is_some()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.state.load().refresh_token.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state.load().generation
    }

    /// Access token and generation read atomically together.
    pub(crate) fn bearer(&self) -> (Option<String>, u64) {
        let state = self.state.load();
        (
            state
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            state.generation,
        )
    }

    // ── Writes (login, refresh, logout) ─────────────────────────────

    /// Replace both tokens after a successful login.
    pub(crate) fn set_credentials(
        &self,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
    ) {
        self.rcu(|state| SessionState {
            access_token: Some(access_token.clone()),
            refresh_token: refresh_token.clone(),
            generation: state.generation + 1,
        });
        debug!("session credentials stored");
    }

    /// Apply a refresh response. The refresh token is only replaced when
    /// the server rotated it.
    pub(crate) fn apply_refresh(
        &self,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
    ) {
        self.rcu(|state| SessionState {
            access_token: Some(access_token.clone()),
            refresh_token: refresh_token.clone().or_else(|| state.refresh_token.clone()),
            generation: state.generation + 1,
        });
        debug!("session refreshed");
    }

    /// Drop both tokens (logout, or a refresh rejected by the server).
    ///
    /// Returns the generation of the cleared session.
    pub(crate) fn clear(&self) -> u64 {
        let generation = self.rcu(|state| SessionState {
            access_token: None,
            refresh_token: None,
            generation: state.generation + 1,
        });
        debug!("session cleared");
        generation
    }

    /// Swap in `f(current)` and return the generation written. Every write
    /// bumps the generation by one.
    fn rcu(&self, f: impl Fn(&SessionState) -> SessionState) -> u64 {
        let previous = self.state.rcu(|current| Arc::new(f(current)));
        previous.generation + 1
    }
}
