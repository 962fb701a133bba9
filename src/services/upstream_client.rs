use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    // The router hands over an http 1.x method while reqwest 0.11 speaks http 0.2,
    // so the method crosses as a string and is re-parsed here.
    #[error("unsupported method {0}")]
    InvalidMethod(String),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// `None` when the upstream sent no body (e.g. 204).
    pub body: Option<Value>,
}

/// Forwards application calls to the domain API under `/api/v1`.
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(client: Client, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// `path` and `query` must still be percent-encoded as received; they are
    /// appended verbatim.
    pub fn endpoint(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/api/v1/{}?{}", self.base_url, path, query),
            None => format!("{}/api/v1/{}", self.base_url, path),
        }
    }

    pub async fn forward(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Result<UpstreamResponse, ForwardError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| ForwardError::InvalidMethod(method.to_string()))?;
        let url = self.endpoint(path, query);
        debug!("Forwarding {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(authorization) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Upstream call to {} failed: {}", url, e);
            ForwardError::Transport(e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(UpstreamResponse {
            status,
            body: parse_body(&text),
        })
    }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| json!({ "success": false, "error": text })))
}
