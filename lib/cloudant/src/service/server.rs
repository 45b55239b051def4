//! Server-level endpoints.

use crate::models::{
    ActiveTask, CapacityThroughputInformation, DbUpdates, DbsInfoResult, MembershipInformation,
    ServerInformation, SessionInformation, UpInformation, UuidsResult,
};
use crate::{CloudantClient, Json, Method, Operation, Query, Result};

options! {
    /// Options of [`CloudantClient::get_uuids`].
    #[derive(Default, Query)]
    pub struct GetUuidsOptions {
        ;
        /// Number of UUIDs to generate.
        count: u32 => with_count,
    }
}

options! {
    /// Options of [`CloudantClient::get_all_dbs`].
    #[derive(Default, Query)]
    pub struct GetAllDbsOptions {
        ;
        /// Reverse the order.
        descending: bool => with_descending,
        /// Stop at this database name.
        #[query(format = "json")]
        end_key: String => with_end_key,
        /// Maximum number of names.
        limit: u64 => with_limit,
        /// Names to skip.
        skip: u64 => with_skip,
        /// Start at this database name.
        #[query(format = "json")]
        start_key: String => with_start_key,
    }
}

options! {
    /// Options of [`CloudantClient::post_dbs_info`].
    #[derive(serde::Serialize)]
    pub struct PostDbsInfoOptions {
        /// Database names.
        keys: Vec<String>,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::get_db_updates`].
    #[derive(Default, Query)]
    pub struct GetDbUpdatesOptions {
        ;
        /// Reverse the order.
        descending: bool => with_descending,
        /// Feed kind.
        feed: crate::models::ChangesFeed => with_feed,
        /// Heartbeat interval in milliseconds.
        heartbeat: u64 => with_heartbeat,
        /// Maximum number of events.
        limit: u64 => with_limit,
        /// Wait timeout in milliseconds.
        timeout: u64 => with_timeout,
        /// Start after this sequence.
        since: String => with_since,
    }
}

impl CloudantClient {
    /// Retrieve the server welcome message and version.
    pub async fn get_server_information(&self) -> Result<ServerInformation> {
        self.send(Operation::<Json<ServerInformation>>::new(
            "getServerInformation",
            Method::Get,
            "/",
        ))
        .await
    }

    /// Generate UUIDs.
    pub async fn get_uuids(&self, options: &GetUuidsOptions) -> Result<UuidsResult> {
        let operation =
            Operation::<Json<UuidsResult>>::new("getUuids", Method::Get, "/_uuids").query(options);
        self.send(operation).await
    }

    /// Check whether the node is up.
    pub async fn get_up_information(&self) -> Result<UpInformation> {
        self.send(Operation::<Json<UpInformation>>::new(
            "getUpInformation",
            Method::Get,
            "/_up",
        ))
        .await
    }

    /// List the tasks running on the cluster.
    pub async fn get_active_tasks(&self) -> Result<Vec<ActiveTask>> {
        self.send(Operation::<Json<Vec<ActiveTask>>>::new(
            "getActiveTasks",
            Method::Get,
            "/_active_tasks",
        ))
        .await
    }

    /// List database names.
    pub async fn get_all_dbs(&self, options: &GetAllDbsOptions) -> Result<Vec<String>> {
        let operation = Operation::<Json<Vec<String>>>::new("getAllDbs", Method::Get, "/_all_dbs")
            .query(options);
        self.send(operation).await
    }

    /// Retrieve information about several databases at once.
    pub async fn post_dbs_info(&self, options: &PostDbsInfoOptions) -> Result<Vec<DbsInfoResult>> {
        self.send(
            Operation::<Json<Vec<DbsInfoResult>>>::new("postDbsInfo", Method::Post, "/_dbs_info")
                .require("keys", !options.keys.is_empty())
                .json_body(options),
        )
        .await
    }

    /// List cluster nodes.
    pub async fn get_membership_information(&self) -> Result<MembershipInformation> {
        self.send(Operation::<Json<MembershipInformation>>::new(
            "getMembershipInformation",
            Method::Get,
            "/_membership",
        ))
        .await
    }

    /// Describe the session the client is authenticated with.
    pub async fn get_session_information(&self) -> Result<SessionInformation> {
        self.send(Operation::<Json<SessionInformation>>::new(
            "getSessionInformation",
            Method::Get,
            "/_session",
        ))
        .await
    }

    /// Retrieve the provisioned throughput capacity.
    pub async fn get_capacity_throughput_information(
        &self,
    ) -> Result<CapacityThroughputInformation> {
        self.send(Operation::<Json<CapacityThroughputInformation>>::new(
            "getCapacityThroughputInformation",
            Method::Get,
            "/_api/v2/user/capacity/throughput",
        ))
        .await
    }

    /// List database creation, update and deletion events.
    pub async fn get_db_updates(&self, options: &GetDbUpdatesOptions) -> Result<DbUpdates> {
        let operation = Operation::<Json<DbUpdates>>::new(
            "getDbUpdates",
            Method::Get,
            "/_db_updates",
        )
        .query(options);
        self.send(operation).await
    }
}
