//! Full-text search endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::models::{SearchAnalyzeResult, SearchInfoResult, SearchResult};
use crate::{
    Body, CloudantClient, Json, Method, Operation, Response, ResponseMode, Result, Streamed,
};

options! {
    /// Options of [`CloudantClient::post_search`] and
    /// [`CloudantClient::post_search_as_stream`].
    #[derive(Serialize)]
    pub struct PostSearchOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[serde(skip)]
        ddoc: String,
        /// Search index name.
        #[serde(skip)]
        index: String,
        /// Lucene query.
        query: String,
        ;
        /// Resume after this page.
        #[serde(skip_serializing_if = "Option::is_none")]
        bookmark: String => with_bookmark,
        /// Fields to highlight.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight_fields: Vec<String> => with_highlight_fields,
        /// Fragments per highlighted field.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight_number: u64 => with_highlight_number,
        /// Text after each highlighted term.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight_post_tag: String => with_highlight_post_tag,
        /// Text before each highlighted term.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight_pre_tag: String => with_highlight_pre_tag,
        /// Characters per fragment.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight_size: u64 => with_highlight_size,
        /// Include the full documents.
        #[serde(skip_serializing_if = "Option::is_none")]
        include_docs: bool => with_include_docs,
        /// Stored fields to return.
        #[serde(skip_serializing_if = "Option::is_none")]
        include_fields: Vec<String> => with_include_fields,
        /// Maximum number of matches.
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: u64 => with_limit,
        /// Sort order, a field or a list of fields.
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Vec<String> => with_sort,
        /// Answer from a possibly stale index.
        #[serde(skip_serializing_if = "Option::is_none")]
        stale: String => with_stale,
        /// Fields to count facets for.
        #[serde(skip_serializing_if = "Option::is_none")]
        counts: Vec<String> => with_counts,
        /// Facet restrictions, as `[field, value]` pairs.
        #[serde(skip_serializing_if = "Option::is_none")]
        drilldown: Vec<Vec<String>> => with_drilldown,
        /// Group results by this field.
        #[serde(skip_serializing_if = "Option::is_none")]
        group_field: String => with_group_field,
        /// Maximum number of groups.
        #[serde(skip_serializing_if = "Option::is_none")]
        group_limit: u64 => with_group_limit,
        /// Group sort order.
        #[serde(skip_serializing_if = "Option::is_none")]
        group_sort: Vec<String> => with_group_sort,
        /// Range facets by field.
        #[serde(skip_serializing_if = "Option::is_none")]
        ranges: Value => with_ranges,
    }
}

options! {
    /// Options of [`CloudantClient::get_search_info`].
    pub struct GetSearchInfoOptions {
        /// Database name.
        db: String,
        /// Design document name, without the `_design/` prefix.
        ddoc: String,
        /// Search index name.
        index: String,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_search_analyze`].
    #[derive(Serialize)]
    pub struct PostSearchAnalyzeOptions {
        /// Analyzer name.
        analyzer: String,
        /// Text to tokenize.
        text: String,
        ;
    }
}

fn post_search<M: ResponseMode>(name: &'static str, options: &PostSearchOptions) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_design/{ddoc}/_search/{index}")
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .path("index", &options.index)
        .require("query", !options.query.is_empty())
        .json_body(options)
}

impl CloudantClient {
    /// Query a search index.
    pub async fn post_search(&self, options: &PostSearchOptions) -> Result<SearchResult> {
        self.send(post_search::<Json<SearchResult>>("postSearch", options))
            .await
    }

    /// Query a search index, returning an unbuffered body.
    pub async fn post_search_as_stream(
        &self,
        options: &PostSearchOptions,
    ) -> Result<Response<Body>> {
        self.send(post_search::<Streamed>("postSearchAsStream", options))
            .await
    }

    /// Retrieve the state of a search index.
    pub async fn get_search_info(
        &self,
        options: &GetSearchInfoOptions,
    ) -> Result<SearchInfoResult> {
        let operation = Operation::<Json<SearchInfoResult>>::new(
            "getSearchInfo",
            Method::Get,
            "/{db}/_design/{ddoc}/_search_info/{index}",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .path("index", &options.index);
        self.send(operation).await
    }

    /// Show how an analyzer tokenizes text.
    pub async fn post_search_analyze(
        &self,
        options: &PostSearchAnalyzeOptions,
    ) -> Result<SearchAnalyzeResult> {
        let operation = Operation::<Json<SearchAnalyzeResult>>::new(
            "postSearchAnalyze",
            Method::Post,
            "/_search_analyze",
        )
        .require("analyzer", !options.analyzer.is_empty())
        .json_body(options);
        self.send(operation).await
    }
}
