//! SDS Common - Shared Types and Utilities
//!
//! Foundational types, error handling, and configuration used by the store
//! engine, the client and the time-series sample. Provides the vocabulary
//! every layer speaks: type definitions, streams, events, window modes,
//! summaries and access control entries.
//!
//! Key Features:
//! - Unified error type with retryable error detection
//! - Typed schemas with a single timestamp key per type
//! - Settings document loading and connection profile selection
//! - Timestamp and interval helpers
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod access;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use access::{
    AccessControlEntry, AccessControlList, AccessRights, AccessType, AclPatch, Community,
    PatchOperation, Role, StreamReference, Trustee, TrusteeType, COMMUNITY_MEMBER_ROLE_TYPE_ID,
};
pub use config::{AppSettings, ConnectionProfile};
pub use error::{Result, SdsError};
pub use types::*;
