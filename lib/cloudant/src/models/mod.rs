//! Records exchanged with the service.
//!
//! Most types are closed records mirroring one JSON shape. [`Document`],
//! [`DesignDocument`] and [`ReplicationDocument`] are open records: fields
//! the library does not declare are kept in a property bag and written back
//! unchanged (see [`OpenRecord`](crate::OpenRecord)).
//!
//! Enumerations are declared with [`string_enum!`](crate::string_enum), so
//! values added to the service later decode as `Unknown(..)` instead of
//! failing.

mod bulk;
mod changes;
mod database;
mod design;
mod document;
mod partition;
mod query;
mod replication;
mod scheduler;
mod search;
mod security;
mod server;
mod session;
mod throughput;
mod view;

pub use bulk::*;
pub use changes::*;
pub use database::*;
pub use design::*;
pub use document::*;
pub use partition::*;
pub use query::*;
pub use replication::*;
pub use scheduler::*;
pub use search::*;
pub use security::*;
pub use server::*;
pub use session::*;
pub use throughput::*;
pub use view::*;
