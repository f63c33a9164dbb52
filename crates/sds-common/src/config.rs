//! SDS Config - Application Settings
//!
//! Settings document read at startup and the connection profile derived from
//! it. The document uses PascalCase keys (`TenantId`, `NamespaceId`, ...).
//! A missing, unreadable or incomplete document is a fatal startup error.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::error::{Result, SdsError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tenant and namespace value that selects the edge profile.
pub const DEFAULT_TENANT: &str = "default";

// =============================================================================
// App Settings
// =============================================================================

/// Contents of the settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    pub tenant_id: String,
    pub namespace_id: String,
    #[serde(default)]
    pub community_id: Option<String>,
    pub api_version: String,
    pub resource: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl AppSettings {
    /// Load and validate settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdsError::Configuration(format!("could not open/read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate settings from a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        let settings: AppSettings = serde_json::from_str(content)
            .map_err(|e| SdsError::Configuration(format!("malformed settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every field the selected profile needs is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("TenantId", &self.tenant_id),
            ("NamespaceId", &self.namespace_id),
            ("ApiVersion", &self.api_version),
            ("Resource", &self.resource),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SdsError::Configuration(format!("{} is empty", field)));
            }
        }
        self.profile().map(|_| ())
    }

    /// Community sharing steps run only when a community is configured.
    pub fn community(&self) -> Option<&str> {
        self.community_id.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Select the connection profile: edge when tenant and namespace are
    /// both `default`, cloud otherwise.
    pub fn profile(&self) -> Result<ConnectionProfile> {
        if self.tenant_id == DEFAULT_TENANT && self.namespace_id == DEFAULT_TENANT {
            return Ok(ConnectionProfile::Edge {
                api_version: self.api_version.clone(),
                resource: self.resource.clone(),
            });
        }

        let client_id = non_empty(&self.client_id)
            .ok_or_else(|| SdsError::Configuration("ClientId is required".to_string()))?;
        let client_secret = non_empty(&self.client_secret)
            .ok_or_else(|| SdsError::Configuration("ClientSecret is required".to_string()))?;

        Ok(ConnectionProfile::Cloud {
            api_version: self.api_version.clone(),
            tenant_id: self.tenant_id.clone(),
            resource: self.resource.clone(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Connection Profile
// =============================================================================

/// How the client reaches the store.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionProfile {
    /// Local edge store, no authentication.
    Edge { api_version: String, resource: String },
    /// Hosted multi-tenant store with client credentials.
    Cloud {
        api_version: String,
        tenant_id: String,
        resource: String,
        client_id: String,
        client_secret: String,
    },
}

impl ConnectionProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edge { .. } => "edge",
            Self::Cloud { .. } => "cloud",
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            Self::Edge { resource, .. } | Self::Cloud { resource, .. } => resource,
        }
    }

    pub fn api_version(&self) -> &str {
        match self {
            Self::Edge { api_version, .. } | Self::Cloud { api_version, .. } => api_version,
        }
    }

    /// Base URL that stream self links are rooted at.
    pub fn base_url(&self) -> String {
        let resource = self.resource().trim_end_matches('/');
        match self {
            Self::Edge { api_version, .. } => {
                format!("{}/api/{}/Tenants/default", resource, api_version)
            }
            Self::Cloud {
                api_version,
                tenant_id,
                ..
            } => format!("{}/api/{}/Tenants/{}", resource, api_version, tenant_id),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edge {
                api_version,
                resource,
            } => f
                .debug_struct("Edge")
                .field("api_version", api_version)
                .field("resource", resource)
                .finish(),
            Self::Cloud {
                api_version,
                tenant_id,
                resource,
                client_id,
                ..
            } => f
                .debug_struct("Cloud")
                .field("api_version", api_version)
                .field("tenant_id", tenant_id)
                .field("resource", resource)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CLOUD: &str = r#"{
        "Resource": "https://sds.example.com",
        "ApiVersion": "v1",
        "TenantId": "tenant-1",
        "NamespaceId": "samples",
        "CommunityId": "",
        "ClientId": "client",
        "ClientSecret": "secret"
    }"#;

    const EDGE: &str = r#"{
        "Resource": "http://localhost:5590",
        "ApiVersion": "v1",
        "TenantId": "default",
        "NamespaceId": "default"
    }"#;

    #[test]
    fn test_cloud_profile() {
        let settings = AppSettings::from_json(CLOUD).expect("cloud settings should parse");
        let profile = settings.profile().expect("profile should resolve");
        assert_eq!(profile.name(), "cloud");
        assert_eq!(
            profile.base_url(),
            "https://sds.example.com/api/v1/Tenants/tenant-1"
        );
        assert_eq!(settings.community(), None);
        let debug = format!("{:?}", profile);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"secret\""));
    }

    #[test]
    fn test_edge_profile_needs_no_credentials() {
        let settings = AppSettings::from_json(EDGE).expect("edge settings should parse");
        let profile = settings.profile().expect("profile should resolve");
        assert_eq!(profile.name(), "edge");
        assert_eq!(profile.api_version(), "v1");
    }

    #[test]
    fn test_cloud_profile_requires_secret() {
        let json = CLOUD.replace("\"secret\"", "\"\"");
        let err = AppSettings::from_json(&json).expect_err("secret should be required");
        assert!(matches!(err, SdsError::Configuration(_)));
    }

    #[test]
    fn test_malformed_settings() {
        assert!(matches!(
            AppSettings::from_json("{ not json"),
            Err(SdsError::Configuration(_))
        ));
        assert!(AppSettings::from_json(r#"{"TenantId": "t"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(EDGE.as_bytes()).expect("write settings");

        let settings = AppSettings::from_file(file.path()).expect("settings should load");
        assert_eq!(settings.namespace_id, "default");

        let missing = AppSettings::from_file("/nonexistent/appsettings.json");
        assert!(matches!(missing, Err(SdsError::Configuration(_))));
    }
}
