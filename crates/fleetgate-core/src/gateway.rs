// ── Gateway facade ──
//
// Wires transport, reauthentication, query cache and entity store into a
// single handle. Every read and write the application makes goes through
// a `Gateway`.

use std::marker::PhantomData;
use std::sync::Arc;

use fleetgate_api::{
    AuthInterceptor, AuthSession, HttpTransport, LoginRequest, LoginResponse, Transport,
    TransportConfig,
};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{
    CloseRent, CreateMutation, DeleteManyMutation, DeleteMutation, GetQuery, ListQuery,
    MarkNotificationsRead, Patch, UpdateMutation,
};
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::model::{EntityId, Rent, Resource};
use crate::query::{MutationEndpoint, MutationTrigger, QueryCache, QueryEndpoint, Subscription};
use crate::store::{DataStore, EntityTable};
use crate::stream::TableStream;

// ── Gateway ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<GatewayInner>`. Owns the auth session, the
/// reauthenticating transport, the query cache and the entity store.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    config: GatewayConfig,
    session: Arc<AuthSession>,
    interceptor: AuthInterceptor,
    cache: QueryCache,
    store: Arc<DataStore>,
}

impl Gateway {
    /// Create a gateway talking HTTP to `config.base_url`. Does not log in.
    pub fn new(config: GatewayConfig) -> Result<Self, CoreError> {
        let transport_config = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        let transport = HttpTransport::new(config.base_url.clone(), &transport_config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a gateway over any transport.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_session(config, transport, Arc::new(AuthSession::new()))
    }

    /// Create a gateway that shares an existing session.
    pub fn with_session(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        session: Arc<AuthSession>,
    ) -> Self {
        let interceptor =
            AuthInterceptor::new(transport, Arc::clone(&session), config.auth.clone());
        let store = Arc::new(DataStore::new());
        let cache = QueryCache::new(
            Arc::new(interceptor.clone()),
            Arc::clone(&store),
            config.keep_unused_for,
        );
        debug!(base_url = %config.base_url, "gateway created");

        Self {
            inner: Arc::new(GatewayInner {
                config,
                session,
                interceptor,
                cache,
                store,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.inner.session
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Log in with a username or email.
    ///
    /// Rejected credentials return the server's error and leave the session
    /// as it was.
    pub async fn login(
        &self,
        identifier: &str,
        password: SecretString,
    ) -> Result<LoginResponse, CoreError> {
        let response = self
            .inner
            .interceptor
            .login(&LoginRequest::new(identifier, password))
            .await?;
        info!(identifier, "logged in");
        Ok(response)
    }

    /// Log in with the credentials from the configuration.
    pub async fn login_with_config(&self) -> Result<LoginResponse, CoreError> {
        let Some(credentials) = self.inner.config.credentials.clone() else {
            return Err(CoreError::Config {
                message: "no credentials configured".into(),
            });
        };
        self.login(&credentials.identifier, credentials.password)
            .await
    }

    /// End the session.
    ///
    /// The server-side logout is best effort; the local session, query
    /// cache and entity store are cleared regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.interceptor.logout().await {
            warn!(error = %e, "server logout failed (non-fatal)");
        }
        self.inner.cache.reset();
        self.inner.store.reset();
        info!("logged out");
    }

    // ── Queries and mutations ────────────────────────────────────────

    pub fn subscribe<E: QueryEndpoint>(
        &self,
        endpoint: E,
        arg: E::Arg,
    ) -> Result<Subscription<E>, CoreError> {
        self.inner.cache.subscribe(Arc::new(endpoint), arg)
    }

    pub async fn query<E: QueryEndpoint>(
        &self,
        endpoint: E,
        arg: E::Arg,
    ) -> Result<Arc<E::Output>, CoreError> {
        self.inner.cache.query(Arc::new(endpoint), arg).await
    }

    pub async fn mutate<M: MutationEndpoint>(
        &self,
        endpoint: M,
        arg: M::Arg,
    ) -> Result<M::Output, CoreError> {
        self.inner.cache.mutate(&endpoint, arg).await
    }

    pub fn mutation<M: MutationEndpoint>(&self, endpoint: M) -> MutationTrigger<M> {
        self.inner.cache.mutation(endpoint)
    }

    /// Typed CRUD access to one resource family.
    pub fn resource<T: Resource>(&self) -> ResourceHandle<T> {
        ResourceHandle {
            gateway: self.clone(),
            _marker: PhantomData,
        }
    }

    // ── Resource-specific actions ────────────────────────────────────

    pub async fn close_rent(&self, id: EntityId) -> Result<Option<Rent>, CoreError> {
        self.mutate(CloseRent, id).await
    }

    /// Mark the given notifications read; an empty list marks all of them.
    pub async fn mark_notifications_read(&self, ids: Vec<EntityId>) -> Result<(), CoreError> {
        self.mutate(MarkNotificationsRead, ids).await
    }
}

// ── ResourceHandle ───────────────────────────────────────────────────

/// CRUD operations for resource `T`, routed through the query cache.
pub struct ResourceHandle<T> {
    gateway: Gateway,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceHandle<T> {
    /// Subscribe to the full list. Keeps the list cached while held.
    pub fn subscribe_list(&self) -> Result<Subscription<ListQuery<T>>, CoreError> {
        self.gateway.subscribe(ListQuery::<T>::new(), ())
    }

    /// Fetch (or reuse) the normalized list.
    pub async fn list(&self) -> Result<Arc<EntityTable<T>>, CoreError> {
        self.gateway.query(ListQuery::<T>::new(), ()).await
    }

    pub async fn get(&self, id: EntityId) -> Result<Arc<T>, CoreError> {
        self.gateway.query(GetQuery::<T>::new(), id).await
    }

    pub async fn create(&self, body: Value) -> Result<Option<T>, CoreError> {
        self.gateway.mutate(CreateMutation::<T>::new(), body).await
    }

    pub async fn update(&self, id: EntityId, body: Value) -> Result<Option<T>, CoreError> {
        self.gateway
            .mutate(UpdateMutation::<T>::new(), Patch { id, body })
            .await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        self.gateway.mutate(DeleteMutation::<T>::new(), id).await
    }

    pub async fn delete_many(&self, ids: Vec<EntityId>) -> Result<(), CoreError> {
        self.gateway.mutate(DeleteManyMutation::<T>::new(), ids).await
    }

    /// The store's current table for `T`, without fetching.
    pub fn table(&self) -> Arc<EntityTable<T>> {
        self.gateway.store().table::<T>()
    }

    pub fn stream(&self) -> TableStream<T> {
        self.gateway.store().subscribe::<T>()
    }
}
