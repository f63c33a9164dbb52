//! SDS Sample Session
//!
//! Builds the client session a run uses from the settings document.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::lifecycle::{Coordinator, RunMode};
use sds_client::{ClientConfig, SdsClient};
use sds_common::{AppSettings, Result};
use sds_store::MemoryStore;
use std::sync::Arc;
use tracing::info;

/// Connect a client for the profile the settings select. Both profiles are
/// served by an in-process store rooted at the profile's base URL; the
/// configured community is seeded with its member role.
pub fn connect(settings: &AppSettings, config: ClientConfig) -> Result<SdsClient> {
    let profile = settings.profile()?;
    info!(
        profile = profile.name(),
        base_url = %profile.base_url(),
        namespace = %settings.namespace_id,
        "connecting to sequential data store"
    );

    let mut store = MemoryStore::new().with_base_url(profile.base_url());
    if let Some(community) = settings.community() {
        store = store.with_community(community, community);
    }

    Ok(SdsClient::new(Arc::new(store), config).with_profile(profile))
}

/// A coordinator for the settings' namespace and community.
pub fn coordinator(settings: &AppSettings, client: SdsClient, mode: RunMode) -> Coordinator {
    Coordinator::new(client, settings.namespace_id.clone())
        .with_community(settings.community().map(str::to_string))
        .with_mode(mode)
}
