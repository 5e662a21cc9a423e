//! Typed client for the alert router HTTP API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const CALLER_HEADER: &str = "X-Caller-Id";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The router answered with an error body.
    #[error("{status} {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
        /// Present for `no_responders`: the radius stored for the next attempt.
        search_radius: Option<i64>,
        attempt_count: Option<u32>,
    },
}

impl ClientError {
    /// Machine-readable error code, if the router sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            ClientError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Responder {
    pub responder: String,
    pub lat: i64,
    pub long: i64,
    pub verified: bool,
    pub last_updated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub responder: String,
    pub verified: bool,
    pub newly_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub alert_id: String,
    pub responder: String,
    pub distance: u64,
    pub search_radius: i64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    pub alert_id: String,
    pub routed_to: Option<String>,
    pub distance: u64,
    pub timestamp: u64,
    pub attempt_count: u32,
    pub search_radius: i64,
}

#[derive(Debug, Deserialize)]
struct AuthorityView {
    authority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
    search_radius: Option<i64>,
    attempt_count: Option<u32>,
}

pub struct AlertRouterClient {
    client: Client,
    base_url: String,
}

impl AlertRouterClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register or move `caller`'s location. Coordinates are degrees × 10^7.
    pub async fn register_location(&self, caller: &str, lat: i64, long: i64) -> Result<Responder, ClientError> {
        let req = self
            .client
            .post(self.url("/api/v1/responders/location"))
            .header(CALLER_HEADER, caller)
            .json(&json!({ "lat": lat, "long": long }));
        send(req).await
    }

    pub async fn get_responder(&self, responder: &str) -> Result<Responder, ClientError> {
        send(self.client.get(self.url(&format!("/api/v1/responders/{responder}")))).await
    }

    /// Verify `responder`. Only the registry authority may call this.
    pub async fn verify(&self, caller: &str, responder: &str) -> Result<Verification, ClientError> {
        let req = self
            .client
            .post(self.url(&format!("/api/v1/responders/{responder}/verify")))
            .header(CALLER_HEADER, caller);
        send(req).await
    }

    pub async fn authority(&self) -> Result<Option<String>, ClientError> {
        let view: AuthorityView = send(self.client.get(self.url("/api/v1/authority"))).await?;
        Ok(view.authority)
    }

    /// Hand the registry authority to `new_authority`.
    pub async fn set_authority(&self, caller: &str, new_authority: &str) -> Result<Option<String>, ClientError> {
        let req = self
            .client
            .put(self.url("/api/v1/authority"))
            .header(CALLER_HEADER, caller)
            .json(&json!({ "new_authority": new_authority }));
        let view: AuthorityView = send(req).await?;
        Ok(view.authority)
    }

    /// One routing attempt. `initial_radius` of 0 reuses the stored radius.
    pub async fn route_alert(
        &self,
        caller: &str,
        alert_id: &str,
        lat: i64,
        long: i64,
        initial_radius: i64,
    ) -> Result<Assignment, ClientError> {
        let req = self
            .client
            .post(self.url(&format!("/api/v1/alerts/{alert_id}/route")))
            .header(CALLER_HEADER, caller)
            .json(&json!({ "lat": lat, "long": long, "initial_radius": initial_radius }));
        send(req).await
    }

    pub async fn get_routing(&self, alert_id: &str) -> Result<Routing, ClientError> {
        send(self.client.get(self.url(&format!("/api/v1/alerts/{alert_id}/routing")))).await
    }

    /// Clear an alert's routing record. Returns the removed record.
    pub async fn reset_routing(&self, caller: &str, alert_id: &str) -> Result<Routing, ClientError> {
        let req = self
            .client
            .delete(self.url(&format!("/api/v1/alerts/{alert_id}/routing")))
            .header(CALLER_HEADER, caller);
        send(req).await
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req.send().await?;
    decode(resp).await
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await?;
    Err(match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Api {
            status,
            code: body.error,
            message: body.message,
            search_radius: body.search_radius,
            attempt_count: body.attempt_count,
        },
        Err(_) => ClientError::Api {
            status,
            code: "unknown".to_string(),
            message: text,
            search_radius: None,
            attempt_count: None,
        },
    })
}
