//! Database security objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::UserRole;

/// Response of `GET /{db}/_security`, and body of the matching `PUT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Database administrators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<SecurityObject>,
    /// Database members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<SecurityObject>,
    /// Cloudant permissions by user or API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudant: Option<BTreeMap<String, Vec<UserRole>>>,
    /// Ignore Cloudant permissions and use only CouchDB roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couchdb_auth_only: Option<bool>,
}

/// Names and roles granted one level of access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityObject {
    /// User names.
    #[serde(default)]
    pub names: Vec<String>,
    /// Roles.
    #[serde(default)]
    pub roles: Vec<String>,
}
