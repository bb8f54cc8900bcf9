//! HTTP client for the compute API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use roast_id::{RequestId, ServerId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::ComputeClient;
use crate::error::ComputeError;
use crate::types::{ActionResponse, CreateServerRequest, CreatedServer, Server, ServerAction};

/// Header carrying the auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Response headers the API uses to report its request ID.
const REQUEST_ID_HEADERS: [&str; 2] = ["x-openstack-request-id", "x-compute-request-id"];

/// Compute API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpComputeClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComputeClient {
    /// Create a new client for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        auth_token: Option<&str>,
        request_timeout: Duration,
    ) -> Result<Self, ComputeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ComputeError::InvalidConfig("invalid auth token".to_string()))?;
            headers.insert(AUTH_TOKEN_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ComputeError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, turning error responses into `ComputeError`.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, ComputeError> {
        let call_id = RequestId::new();
        debug!(call_id = %call_id, what = %what, "Sending compute request");

        let response = request.send().await?;
        let status = response.status();
        let request_id = request_id_of(&response);
        debug!(
            call_id = %call_id,
            status = status.as_u16(),
            request_id = request_id.as_deref().unwrap_or("-"),
            "Compute response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        warn!(
            call_id = %call_id,
            what = %what,
            status = status.as_u16(),
            message = %message,
            "Compute request failed"
        );

        Err(match status {
            StatusCode::CONFLICT => ComputeError::ActionInProgress { message },
            StatusCode::NOT_FOUND => ComputeError::NotFound(what.to_string()),
            other => ComputeError::api(other.as_u16(), message, request_id),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ComputeError> {
        response
            .json()
            .await
            .map_err(|e| ComputeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ComputeClient for HttpComputeClient {
    async fn create_server(
        &self,
        request: &CreateServerRequest,
    ) -> Result<CreatedServer, ComputeError> {
        let body = serde_json::json!({ "server": request });
        let response = self
            .send(
                self.client.post(self.url("/servers")).json(&body),
                "create server",
            )
            .await?;
        let status = response.status().as_u16();

        let envelope: Envelope<CreatedServer> = Self::decode(response).await?;
        let mut created = envelope.server;
        created.status = status;
        Ok(created)
    }

    async fn get_server(&self, id: &ServerId) -> Result<Server, ComputeError> {
        let path = format!("/servers/{id}");
        let response = self
            .send(self.client.get(self.url(&path)), &format!("server {id}"))
            .await?;

        let envelope: Envelope<Server> = Self::decode(response).await?;
        Ok(envelope.server)
    }

    async fn delete_server(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        let path = format!("/servers/{id}");
        let response = self
            .send(self.client.delete(self.url(&path)), &format!("server {id}"))
            .await?;

        Ok(action_response(&response))
    }

    async fn server_action(
        &self,
        id: &ServerId,
        action: ServerAction,
    ) -> Result<ActionResponse, ComputeError> {
        let path = format!("/servers/{id}/action");
        let response = self
            .send(
                self.client.post(self.url(&path)).json(&action.body()),
                &format!("{action} on server {id}"),
            )
            .await?;

        Ok(action_response(&response))
    }
}

/// `{"server": {...}}` wrapper.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    server: T,
}

fn request_id_of(response: &reqwest::Response) -> Option<String> {
    REQUEST_ID_HEADERS.iter().find_map(|name| {
        response
            .headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    })
}

fn action_response(response: &reqwest::Response) -> ActionResponse {
    ActionResponse {
        status: response.status().as_u16(),
        request_id: request_id_of(response),
    }
}

/// Pull the message out of a fault body such as
/// `{"conflictingRequest": {"message": "...", "code": 409}}`.
async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            body.as_object()?
                .values()
                .find_map(|fault| fault.get("message")?.as_str().map(|s| s.to_string()))
        })
        .unwrap_or_else(|| if text.is_empty() { "no body".to_string() } else { text })
}
