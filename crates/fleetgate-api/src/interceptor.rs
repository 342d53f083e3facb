// Reauthenticating transport wrapper.
//
// Attaches the bearer token to every request and turns an HTTP 403 into a
// single-flight token refresh followed by exactly one replay. All requests
// that fail while a refresh is running share that refresh's outcome.

use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::auth::{AuthSettings, LoginRequest, LoginResponse, TokenResponse};
use crate::error::Error;
use crate::session::AuthSession;
use crate::transport::{ApiRequest, Transport};

type RefreshFuture = Shared<BoxFuture<'static, Result<(), Error>>>;

/// Transport wrapper implementing the reauthentication protocol.
///
/// Cheaply cloneable; clones share the session and the in-flight refresh.
///
/// State machine: `Authorized -> RefreshInFlight -> (Authorized | SessionExpired)`.
/// A replayed request that fails again is returned as-is, so one expiry
/// costs at most one refresh and one replay per request.
#[derive(Clone)]
pub struct AuthInterceptor {
    inner: Arc<InterceptorInner>,
}

struct InterceptorInner {
    transport: Arc<dyn Transport>,
    session: Arc<AuthSession>,
    settings: AuthSettings,
    /// The refresh currently in flight, if any.
    refresh: Mutex<Option<RefreshFuture>>,
    /// The last rejected refresh, kept until the session changes again.
    expired: Mutex<Option<Expiry>>,
}

/// Session generation cleared by a rejected refresh, and the error every
/// request from that session is answered with.
struct Expiry {
    generation: u64,
    error: Error,
}

impl AuthInterceptor {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<AuthSession>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            inner: Arc::new(InterceptorInner {
                transport,
                session,
                settings,
                refresh: Mutex::new(None),
                expired: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.inner.session
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.inner.settings
    }

    /// Whether a token refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresh
            .lock()
            .expect("refresh lock poisoned")
            .is_some()
    }

    // ── Login / logout ───────────────────────────────────────────────

    /// Exchange credentials for a token pair.
    ///
    /// Sent straight to the transport: a rejected login never triggers a
    /// refresh, and the session is only written on success.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, Error> {
        let settings = &self.inner.settings;
        debug!(identifier = %request.identifier, "logging in");

        let value = self
            .inner
            .transport
            .execute(ApiRequest::post(settings.login_path.clone()).json(request.body()))
            .await?;
        let tokens = TokenResponse::from_value(value)?;
        let has_refresh_token = tokens.refresh.is_some();
        self.inner
            .session
            .set_credentials(tokens.access, tokens.refresh);

        info!("login successful");
        Ok(LoginResponse {
            user: tokens.user,
            has_refresh_token,
        })
    }

    /// End the server-side session, then drop the local tokens.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let (pending, _) = self.send(ApiRequest::post(self.inner.settings.logout_path.clone()));
        let result = pending.await;
        self.inner.session.clear();
        debug!("logout complete");
        result.map(|_| ())
    }

    // ── Request pipeline ─────────────────────────────────────────────

    async fn dispatch(self, request: ApiRequest) -> Result<Value, Error> {
        self.wait_for_refresh().await?;

        let (pending, generation) = self.send(request.clone());
        match pending.await {
            Err(err) if err.is_forbidden() => {}
            other => return other,
        }

        debug!(method = %request.method, path = %request.path, "authorization rejected");
        self.refresh_after(generation).await?;

        debug!(method = %request.method, path = %request.path, "replaying request");
        let (replay, _) = self.send(request);
        replay.await
    }

    /// Attach the current bearer token and hand the request to the transport.
    ///
    /// Returns the session generation the token was read from.
    fn send(&self, mut request: ApiRequest) -> (BoxFuture<'static, Result<Value, Error>>, u64) {
        let (token, generation) = self.inner.session.bearer();
        if let Some(token) = token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        (self.inner.transport.execute(request), generation)
    }

    /// Hold new requests back while a refresh is running. They share its
    /// outcome.
    async fn wait_for_refresh(&self) -> Result<(), Error> {
        let pending = self
            .inner
            .refresh
            .lock()
            .expect("refresh lock poisoned")
            .clone();
        match pending {
            Some(pending) => pending.await,
            None => Ok(()),
        }
    }

    /// Join the in-flight refresh, or start one if none is running.
    ///
    /// `generation` is the session generation the failed request was sent
    /// with. If the session has been refreshed since, the request is simply
    /// replayed with the newer token. If a refresh was rejected since, and
    /// nobody has logged in again, the request expires without a refresh.
    async fn refresh_after(&self, generation: u64) -> Result<(), Error> {
        let pending = {
            let mut slot = self.inner.refresh.lock().expect("refresh lock poisoned");
            if let Some(pending) = slot.as_ref() {
                pending.clone()
            } else if self.inner.session.generation() != generation
                && self.inner.session.is_authenticated()
            {
                return Ok(());
            } else if let Some(error) = self.expired_since(generation) {
                debug!("session already expired, not refreshing");
                return Err(error);
            } else {
                let refresh = self.clone().refresh().boxed().shared();
                *slot = Some(refresh.clone());
                refresh
            }
        };
        pending.await
    }

    /// The expiry error, if the session is still the one a rejected refresh
    /// cleared at or after `generation`.
    fn expired_since(&self, generation: u64) -> Option<Error> {
        let expired = self.inner.expired.lock().expect("expiry lock poisoned");
        expired
            .as_ref()
            .filter(|e| {
                generation <= e.generation && self.inner.session.generation() == e.generation
            })
            .map(|e| e.error.clone())
    }

    async fn refresh(self) -> Result<(), Error> {
        let result = self.run_refresh().await;
        *self.inner.refresh.lock().expect("refresh lock poisoned") = None;
        result
    }

    async fn run_refresh(&self) -> Result<(), Error> {
        let settings = &self.inner.settings;
        let mut request = ApiRequest::get(settings.refresh_path.clone());
        if let Some(token) = self.inner.session.refresh_token() {
            request.set_header(settings.refresh_header.clone(), token.expose_secret());
        }

        debug!("refreshing access token");
        let (pending, _) = self.send(request);
        match pending.await {
            Ok(value) => {
                let tokens = TokenResponse::from_value(value)?;
                self.inner
                    .session
                    .apply_refresh(tokens.access, tokens.refresh);
                info!("access token refreshed");
                Ok(())
            }
            Err(Error::Forbidden { data }) => {
                warn!("refresh rejected, session expired");
                let generation = self.inner.session.clear();
                let message = settings.session_expired_message.clone();
                let error = Error::SessionExpired {
                    data: annotate(data, &message),
                    message,
                };
                *self.inner.expired.lock().expect("expiry lock poisoned") = Some(Expiry {
                    generation,
                    error: error.clone(),
                });
                Err(error)
            }
            Err(other) => {
                warn!(error = %other, "refresh failed");
                Err(other)
            }
        }
    }
}

impl Transport for AuthInterceptor {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'static, Result<Value, Error>> {
        self.clone().dispatch(request).boxed()
    }
}

/// Put the user-facing message on the refresh failure payload.
fn annotate(data: Value, message: &str) -> Value {
    match data {
        Value::Object(mut map) => {
            map.insert("message".into(), Value::String(message.to_owned()));
            Value::Object(map)
        }
        Value::Null => json!({ "message": message }),
        other => json!({ "message": message, "detail": other }),
    }
}
