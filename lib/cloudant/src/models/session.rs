//! Session information.

use serde::{Deserialize, Serialize};

crate::string_enum! {
    /// A permission granted to a user.
    pub enum UserRole {
        /// Read documents.
        Reader => "_reader",
        /// Write documents.
        Writer => "_writer",
        /// Administer the database.
        Admin => "_admin",
        /// Run replications.
        Replicator => "_replicator",
        /// Read `_db_updates`.
        DbUpdates => "_db_updates",
        /// Write design documents.
        Design => "_design",
        /// Read shard information.
        Shards => "_shards",
        /// Change the security object.
        Security => "_security",
    }
}

/// Response of `GET /_session`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInformation {
    /// Success marker.
    pub ok: bool,
    /// Authentication details.
    pub info: SessionInfo,
    /// The authenticated user.
    #[serde(rename = "userCtx")]
    pub user_ctx: UserContext,
}

/// How the current session was authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Handler that authenticated the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<String>,
    /// Database holding the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_db: Option<String>,
    /// Enabled handlers.
    #[serde(default)]
    pub authentication_handlers: Vec<String>,
}

/// A user and their roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Database scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    /// User name; absent for anonymous sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<UserRole>,
}
