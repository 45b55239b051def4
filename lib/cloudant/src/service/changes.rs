//! Changes feed endpoints.

use http::HeaderName;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ChangesFeed, ChangesResult, ChangesStyle};
use crate::{
    Body, CloudantClient, Json, Method, Operation, Query, Response, ResponseMode, Result, Streamed,
};

options! {
    /// Options of [`CloudantClient::post_changes`] and
    /// [`CloudantClient::post_changes_as_stream`].
    ///
    /// Filtering inputs (`doc_ids`, `fields`, `selector`) travel in the body,
    /// everything else in the query string.
    #[derive(Query, Serialize)]
    pub struct PostChangesOptions {
        /// Database name.
        #[query(skip)]
        #[serde(skip)]
        db: String,
        ;
        /// Resume after this event, as a header.
        #[query(skip)]
        #[serde(skip)]
        last_event_id: String => with_last_event_id,
        /// Include encoding information of attachment stubs.
        #[serde(skip)]
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        #[serde(skip)]
        attachments: bool => with_attachments,
        /// Include conflict information.
        #[serde(skip)]
        conflicts: bool => with_conflicts,
        /// Reverse the order.
        #[serde(skip)]
        descending: bool => with_descending,
        /// Feed kind.
        #[serde(skip)]
        feed: ChangesFeed => with_feed,
        /// Filter, e.g. `_selector` or `ddoc/name`.
        #[serde(skip)]
        filter: String => with_filter,
        /// Heartbeat interval in milliseconds.
        #[serde(skip)]
        heartbeat: u64 => with_heartbeat,
        /// Include the documents.
        #[serde(skip)]
        include_docs: bool => with_include_docs,
        /// Maximum number of changes.
        #[serde(skip)]
        limit: u64 => with_limit,
        /// Compute the sequence every this many changes.
        #[serde(skip)]
        seq_interval: u64 => with_seq_interval,
        /// Start after this sequence, or `now`.
        #[serde(skip)]
        since: String => with_since,
        /// Revisions listed per change.
        #[serde(skip)]
        style: ChangesStyle => with_style,
        /// Wait timeout in milliseconds.
        #[serde(skip)]
        timeout: u64 => with_timeout,
        /// View used by the `_view` filter.
        #[serde(skip)]
        view: String => with_view,
        /// Only these documents, with the `_doc_ids` filter.
        #[query(skip)]
        #[serde(skip_serializing_if = "Option::is_none")]
        doc_ids: Vec<String> => with_doc_ids,
        /// Fields to return, with the `_selector` filter.
        #[query(skip)]
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Vec<String> => with_fields,
        /// Documents to match, with the `_selector` filter.
        #[query(skip)]
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Value => with_selector,
    }
}

const LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

fn post_changes<M: ResponseMode>(name: &'static str, options: &PostChangesOptions) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_changes")
        .path("db", &options.db)
        .header(LAST_EVENT_ID, options.last_event_id.as_deref())
        .query(options)
        .json_body(options)
}

impl CloudantClient {
    /// Read the changes feed.
    ///
    /// Use [`post_changes_as_stream`](Self::post_changes_as_stream) for
    /// `continuous` and `eventsource` feeds.
    pub async fn post_changes(&self, options: &PostChangesOptions) -> Result<ChangesResult> {
        self.send(post_changes::<Json<ChangesResult>>("postChanges", options))
            .await
    }

    /// Read the changes feed as an unbuffered body.
    pub async fn post_changes_as_stream(
        &self,
        options: &PostChangesOptions,
    ) -> Result<Response<Body>> {
        self.send(post_changes::<Streamed>("postChangesAsStream", options))
            .await
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;
    use crate::ToQueryPairs;

    #[test]
    fn filters_go_to_the_body() {
        let options = PostChangesOptions::new("orders")
            .with_filter("_selector")
            .with_since("now")
            .with_feed(ChangesFeed::Continuous)
            .with_selector(json!({"status": "open"}));

        check!(
            options.to_query_pairs().expect("pairs")
                == vec![
                    ("feed".to_string(), "continuous".to_string()),
                    ("filter".to_string(), "_selector".to_string()),
                    ("since".to_string(), "now".to_string()),
                ]
        );
        check!(serde_json::to_value(&options).expect("encode") == json!({"selector": {"status": "open"}}));
    }
}
