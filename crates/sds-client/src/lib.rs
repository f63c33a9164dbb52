//! SDS Client - Sequential Data Store Client SDK
//!
//! Async client for a sequential data store backend. Every store call runs
//! under the configured request timeout and retryable failures are retried
//! with exponential back-off. Operations are grouped into services the way
//! the store groups its resources: types, streams, roles and communities.
//!
//! Key Features:
//! - Async-first API with tokio integration
//! - Per-request timeout surfaced as a distinct error
//! - Automatic retry of timeouts and transport failures
//! - Session default window mode with per-call override
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod config;
pub mod request;
pub mod services;

pub use config::{ClientConfig, RetryConfig, TimeoutConfig};
pub use services::{CommunitiesService, RolesService, StreamsService, TypesService};

use sds_common::{ConnectionProfile, Result, WindowMode};
use sds_store::StoreBackend;
use std::future::Future;
use std::sync::Arc;

/// The main client for interacting with a sequential data store.
#[derive(Clone)]
pub struct SdsClient {
    backend: Arc<dyn StoreBackend>,
    config: ClientConfig,
    profile: Option<ConnectionProfile>,
}

impl SdsClient {
    /// Create a client session over a backend.
    pub fn new(backend: Arc<dyn StoreBackend>, config: ClientConfig) -> Self {
        Self {
            backend,
            config,
            profile: None,
        }
    }

    /// Attach the connection profile the session was configured with.
    pub fn with_profile(mut self, profile: ConnectionProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Derive a session handle sharing this backend with another default
    /// window mode. This session keeps its own mode.
    pub fn with_window_mode(&self, mode: WindowMode) -> Self {
        let mut session = self.clone();
        session.config.window_mode = mode;
        session
    }

    pub fn profile(&self) -> Option<&ConnectionProfile> {
        self.profile.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Default window mode of this session.
    pub fn window_mode(&self) -> WindowMode {
        self.config.window_mode
    }

    pub fn types(&self) -> TypesService<'_> {
        TypesService::new(self)
    }

    pub fn streams(&self) -> StreamsService<'_> {
        StreamsService::new(self)
    }

    pub fn roles(&self) -> RolesService<'_> {
        RolesService::new(self)
    }

    pub fn communities(&self) -> CommunitiesService<'_> {
        CommunitiesService::new(self)
    }

    pub(crate) fn backend(&self) -> &dyn StoreBackend {
        self.backend.as_ref()
    }

    /// Run one store call under this session's timeout and retry policy.
    pub(crate) async fn request<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        request::execute(&self.config, operation, call).await
    }
}

impl std::fmt::Debug for SdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdsClient")
            .field("config", &self.config)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
