//! SDS Access - Roles, Communities and Access Control
//!
//! Types for sharing streams with community roles. Access control entries
//! are applied to a stream as incremental patch operations against its
//! role trustee list, never as a full replacement.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::error::{Result, SdsError};
use serde::{Deserialize, Serialize};

/// Role type identifier of community member roles.
pub const COMMUNITY_MEMBER_ROLE_TYPE_ID: &str = "community-member";

/// Patch path that appends to the role trustee list.
pub const ROLE_TRUSTEE_ENTRIES_PATH: &str = "/RoleTrusteeAccessControlEntries";

// =============================================================================
// Roles
// =============================================================================

/// A tenant role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub role_type_id: String,
    pub community_id: Option<String>,
}

impl Role {
    /// The member role of a community.
    pub fn community_member(id: impl Into<String>, community_id: impl Into<String>) -> Self {
        let community_id = community_id.into();
        Self {
            id: id.into(),
            name: format!("Community Member ({})", community_id),
            role_type_id: COMMUNITY_MEMBER_ROLE_TYPE_ID.to_string(),
            community_id: Some(community_id),
        }
    }
}

/// Find the role of the given type that belongs to a community.
pub fn find_role<'a>(
    roles: &'a [Role],
    role_type_id: &str,
    community_id: &str,
) -> Result<&'a Role> {
    roles
        .iter()
        .find(|r| r.role_type_id == role_type_id && r.community_id.as_deref() == Some(community_id))
        .ok_or_else(|| {
            SdsError::NotFound(format!(
                "no role of type {} in community {}",
                role_type_id, community_id
            ))
        })
}

// =============================================================================
// Communities
// =============================================================================

/// A group of tenants that streams can be shared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Community {
    pub id: String,
    pub name: String,
}

/// A stream found through community discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamReference {
    pub id: String,
    pub namespace_id: String,
    pub type_id: String,
    /// Dereferenceable link to the stream, usable with `get_last_value_url`.
    #[serde(rename = "Self")]
    pub self_link: String,
}

// =============================================================================
// Access Control
// =============================================================================

/// Access rights bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessRights(pub u32);

impl AccessRights {
    pub const NONE: AccessRights = AccessRights(0);
    pub const READ: AccessRights = AccessRights(1);
    pub const WRITE: AccessRights = AccessRights(2);
    pub const DELETE: AccessRights = AccessRights(4);
    pub const MANAGE_PERMISSIONS: AccessRights = AccessRights(8);

    pub fn contains(&self, other: AccessRights) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Whether an entry grants or denies its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessType {
    #[default]
    Allowed,
    Denied,
}

/// Kind of principal an entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrusteeType {
    User,
    Client,
    Role,
}

/// The principal of an access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trustee {
    pub object_id: String,
    pub tenant_id: Option<String>,
    #[serde(rename = "Type")]
    pub trustee_type: TrusteeType,
}

/// A single access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessControlEntry {
    pub access_rights: AccessRights,
    pub access_type: AccessType,
    pub trustee: Trustee,
}

impl AccessControlEntry {
    /// Read access for a role.
    pub fn role_read(role_id: impl Into<String>) -> Self {
        Self {
            access_rights: AccessRights::READ,
            access_type: AccessType::Allowed,
            trustee: Trustee {
                object_id: role_id.into(),
                tenant_id: None,
                trustee_type: TrusteeType::Role,
            },
        }
    }

    /// True when this entry allows the role to read.
    pub fn allows_role_read(&self, role_id: &str) -> bool {
        self.access_type == AccessType::Allowed
            && self.access_rights.contains(AccessRights::READ)
            && self.trustee.trustee_type == TrusteeType::Role
            && self.trustee.object_id == role_id
    }
}

/// Role trustee access control list of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessControlList {
    pub role_trustee_access_control_entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    /// Apply every operation of a patch, or none of them.
    pub fn apply(&mut self, patch: &AclPatch) -> Result<()> {
        let mut entries = self.role_trustee_access_control_entries.clone();
        for op in &patch.0 {
            match op {
                PatchOperation::Add { path, value } => match parse_entry_index(path)? {
                    EntryIndex::Append => entries.push(value.clone()),
                    EntryIndex::At(i) if i <= entries.len() => entries.insert(i, value.clone()),
                    EntryIndex::At(i) => {
                        return Err(SdsError::InvalidArgument(format!(
                            "patch index {} out of bounds ({} entries)",
                            i,
                            entries.len()
                        )))
                    }
                },
                PatchOperation::Remove { path } => match parse_entry_index(path)? {
                    EntryIndex::At(i) if i < entries.len() => {
                        entries.remove(i);
                    }
                    _ => {
                        return Err(SdsError::InvalidArgument(format!(
                            "cannot remove entry at {}",
                            path
                        )))
                    }
                },
            }
        }
        self.role_trustee_access_control_entries = entries;
        Ok(())
    }

    /// True when any entry lets the role read.
    pub fn allows_role_read(&self, role_id: &str) -> bool {
        self.role_trustee_access_control_entries
            .iter()
            .any(|e| e.allows_role_read(role_id))
    }
}

// =============================================================================
// Patch
// =============================================================================

/// A JSON-patch style operation on the role trustee list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add {
        path: String,
        value: AccessControlEntry,
    },
    Remove {
        path: String,
    },
}

/// An ordered list of patch operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AclPatch(pub Vec<PatchOperation>);

impl AclPatch {
    /// Append one entry to the role trustee list.
    pub fn append(entry: AccessControlEntry) -> Self {
        Self(vec![PatchOperation::Add {
            path: format!("{}/-", ROLE_TRUSTEE_ENTRIES_PATH),
            value: entry,
        }])
    }
}

enum EntryIndex {
    Append,
    At(usize),
}

fn parse_entry_index(path: &str) -> Result<EntryIndex> {
    let suffix = path
        .strip_prefix(ROLE_TRUSTEE_ENTRIES_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| SdsError::InvalidArgument(format!("unsupported patch path {}", path)))?;

    if suffix == "-" {
        return Ok(EntryIndex::Append);
    }
    suffix
        .parse::<usize>()
        .map(EntryIndex::At)
        .map_err(|_| SdsError::InvalidArgument(format!("unsupported patch path {}", path)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_role() {
        let roles = vec![
            Role {
                id: "admin".to_string(),
                name: "Tenant Administrator".to_string(),
                role_type_id: "tenant-admin".to_string(),
                community_id: None,
            },
            Role::community_member("member-a", "community-a"),
            Role::community_member("member-b", "community-b"),
        ];

        let role = find_role(&roles, COMMUNITY_MEMBER_ROLE_TYPE_ID, "community-b")
            .expect("role should be found");
        assert_eq!(role.id, "member-b");

        let missing = find_role(&roles, COMMUNITY_MEMBER_ROLE_TYPE_ID, "community-c");
        assert!(matches!(missing, Err(SdsError::NotFound(_))));
    }

    #[test]
    fn test_patch_append_is_incremental() {
        let mut acl = AccessControlList::default();
        acl.apply(&AclPatch::append(AccessControlEntry::role_read("role-1")))
            .expect("append should apply");
        acl.apply(&AclPatch::append(AccessControlEntry::role_read("role-2")))
            .expect("append should apply");

        assert_eq!(acl.role_trustee_access_control_entries.len(), 2);
        assert!(acl.allows_role_read("role-1"));
        assert!(acl.allows_role_read("role-2"));
        assert!(!acl.allows_role_read("role-3"));
    }

    #[test]
    fn test_patch_remove_and_bad_paths() {
        let mut acl = AccessControlList::default();
        acl.apply(&AclPatch::append(AccessControlEntry::role_read("role-1")))
            .expect("append should apply");

        let remove = AclPatch(vec![PatchOperation::Remove {
            path: format!("{}/0", ROLE_TRUSTEE_ENTRIES_PATH),
        }]);
        acl.apply(&remove).expect("remove should apply");
        assert!(acl.role_trustee_access_control_entries.is_empty());

        let bad = AclPatch(vec![PatchOperation::Add {
            path: "/Owner".to_string(),
            value: AccessControlEntry::role_read("role-1"),
        }]);
        assert!(acl.apply(&bad).is_err());
        assert!(acl.apply(&remove).is_err());
    }

    #[test]
    fn test_failed_patch_leaves_list_untouched() {
        let mut acl = AccessControlList::default();
        let patch = AclPatch(vec![
            PatchOperation::Add {
                path: format!("{}/-", ROLE_TRUSTEE_ENTRIES_PATH),
                value: AccessControlEntry::role_read("role-1"),
            },
            PatchOperation::Remove {
                path: format!("{}/5", ROLE_TRUSTEE_ENTRIES_PATH),
            },
        ]);
        assert!(acl.apply(&patch).is_err());
        assert!(acl.role_trustee_access_control_entries.is_empty());
    }

    #[test]
    fn test_patch_wire_shape() {
        let patch = AclPatch::append(AccessControlEntry::role_read("role-1"));
        let json = serde_json::to_value(&patch).expect("patch should serialize");
        assert_eq!(json[0]["op"], "add");
        assert_eq!(json[0]["path"], "/RoleTrusteeAccessControlEntries/-");
        assert_eq!(json[0]["value"]["AccessRights"], 1);
        assert_eq!(json[0]["value"]["AccessType"], "Allowed");
        assert_eq!(json[0]["value"]["Trustee"]["Type"], "Role");
    }
}
