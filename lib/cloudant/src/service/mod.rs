//! Service operations.
//!
//! Each endpoint is an `async` method on [`CloudantClient`](crate::CloudantClient)
//! taking a typed options record: required inputs go through `new(..)`,
//! optional ones through `with_*` setters. Endpoints offered both buffered
//! and streamed share their options record and request description; only the
//! response mode differs.

/// Declare an options record.
///
/// Fields before `;` are required and set by `new`; fields after it are
/// `Option`s with the named setter. Field attributes pass through, so
/// `#[query(..)]` and `#[serde(..)]` control where each input goes.
macro_rules! options {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$req_meta:meta])*
                $req:ident : $req_ty:ty,
            )*
            ;
            $(
                $(#[$opt_meta:meta])*
                $opt:ident : $opt_ty:ty => $setter:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            $(
                $(#[$req_meta])*
                pub $req: $req_ty,
            )*
            $(
                $(#[$opt_meta])*
                pub $opt: ::std::option::Option<$opt_ty>,
            )*
        }

        impl $name {
            /// Create the record from its required inputs.
            #[must_use]
            #[allow(clippy::new_without_default, clippy::too_many_arguments)]
            pub fn new($($req: impl ::std::convert::Into<$req_ty>),*) -> Self {
                Self {
                    $($req: $req.into(),)*
                    $($opt: ::std::option::Option::None,)*
                }
            }

            $(
                #[doc = concat!("Set `", stringify!($opt), "`.")]
                #[must_use]
                pub fn $setter(mut self, value: impl ::std::convert::Into<$opt_ty>) -> Self {
                    self.$opt = ::std::option::Option::Some(value.into());
                    self
                }
            )*
        }
    };
}

mod attachment;
mod changes;
mod database;
mod design;
mod document;
mod partition;
mod query;
mod replication;
mod search;
mod server;

pub use attachment::*;
pub use changes::*;
pub use database::*;
pub use design::*;
pub use document::*;
pub use partition::*;
pub use query::*;
pub use replication::*;
pub use search::*;
pub use server::*;
