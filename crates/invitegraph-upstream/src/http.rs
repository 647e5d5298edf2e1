//! HTTP implementation of [`UpstreamClient`] backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{UpstreamError, UpstreamResult};
use crate::traits::{Endpoint, UpstreamClient};
use crate::wire::{
    ProfilesRequest, UsersByProfileIdRequest, WireActivity, WireProfilesEnvelope,
    WireSearchResponse, WireUser,
};

/// Header identifying this service to upstream.
pub const CLIENT_HEADER: &str = "x-ethos-client";

/// Connection settings for [`HttpUpstreamClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpUpstreamConfig {
    /// Base URL of the legacy API, e.g. `https://api.ethos.network/api/v1`.
    pub api_base_v1: String,
    /// Base URL of the current API, e.g. `https://api.ethos.network/api/v2`.
    pub api_base_v2: String,
    pub user_agent: String,
    /// Value of the `X-Ethos-Client` header.
    pub client_name: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpUpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_v1: "https://api.ethos.network/api/v1".to_string(),
            api_base_v2: "https://api.ethos.network/api/v2".to_string(),
            user_agent: "EthosInviteGraph/1.0".to_string(),
            client_name: "ethos-invite-graph@1.0.0".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// REST client for the upstream reputation network.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    http: Client,
    v1: String,
    v2: String,
}

impl HttpUpstreamClient {
    /// Builds a client with default headers and timeout from `config`.
    pub fn from_config(config: HttpUpstreamConfig) -> UpstreamResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client_name = HeaderValue::from_str(&config.client_name).map_err(|e| {
            UpstreamError::InvalidConfig {
                message: format!("client_name is not a valid header value: {e}"),
            }
        })?;
        headers.insert(HeaderName::from_static(CLIENT_HEADER), client_name);

        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::InvalidConfig {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            v1: config.api_base_v1.trim_end_matches('/').to_string(),
            v2: config.api_base_v2.trim_end_matches('/').to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> UpstreamResult<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                record_request(endpoint, "error");
                warn!(%endpoint, error = %e, "Upstream request failed");
                return Err(UpstreamError::Transport {
                    endpoint,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        record_request(endpoint, status_class(status.as_u16()));
        debug!(%endpoint, status = status.as_u16(), "Upstream response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%endpoint, status = status.as_u16(), body = %body, "Upstream returned error status");
            return Err(UpstreamError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode {
                endpoint,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<WireSearchResponse> {
        let request = self
            .http
            .get(format!("{}/users/search", self.v2))
            .query(&[("query", query.to_string()), ("limit", limit.to_string())]);
        self.send(Endpoint::UserSearch, request).await
    }

    async fn users_by_profile_ids(&self, profile_ids: &[u64]) -> UpstreamResult<Vec<WireUser>> {
        let request = self
            .http
            .post(format!("{}/users/by/profile-id", self.v2))
            .json(&UsersByProfileIdRequest { profile_ids });
        self.send(Endpoint::UsersByProfileId, request).await
    }

    async fn legacy_profiles(
        &self,
        ids: &[u64],
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<WireProfilesEnvelope> {
        let request = self
            .http
            .post(format!("{}/profiles", self.v1))
            .json(&ProfilesRequest { ids, limit, offset });
        self.send(Endpoint::LegacyProfiles, request).await
    }

    async fn invitation_activities(
        &self,
        profile_id: u64,
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<Vec<WireActivity>> {
        let request = self
            .http
            .get(format!("{}/activities/userkey", self.v2))
            .query(&[
                ("userkey", format!("profileId:{profile_id}")),
                ("direction", "author".to_string()),
                ("activityType", "INVITATION".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]);
        self.send(Endpoint::Activities, request).await
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

fn record_request(endpoint: Endpoint, status: &'static str) {
    metrics::counter!(
        "invitegraph_upstream_requests_total",
        "endpoint" => endpoint.as_str(),
        "status" => status
    )
    .increment(1);
}

/// Registers upstream client metric descriptions.
pub fn register_upstream_metrics() {
    metrics::describe_counter!(
        "invitegraph_upstream_requests_total",
        "Total upstream API requests by endpoint and status class"
    );
}
