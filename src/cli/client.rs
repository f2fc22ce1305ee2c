use serde_json::Value;
use std::time::Duration;

/// Thin wrapper over reqwest that speaks the server's response envelope:
/// `{"success":true,"data":...}` or `{"success":false,"error":...}`.
pub struct ApiClient {
    base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        unwrap_envelope(response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        unwrap_envelope(response).await
    }
}

/// Extracts `data` from a success envelope, or turns an error envelope
/// into an anyhow error carrying the server's message and code.
async fn unwrap_envelope(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|_| anyhow::anyhow!("server returned a non-JSON response ({status})"))?;

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    match body.get("code").and_then(Value::as_str) {
        Some(code) => Err(anyhow::anyhow!("{message} ({code})")),
        None => Err(anyhow::anyhow!("{message} ({status})")),
    }
}
