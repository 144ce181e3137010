use serde_json::Value;

use super::RelayError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Forwards chat requests to the AI backend unchanged
#[derive(Clone)]
pub struct AiRelay {
    http: reqwest::Client,
    backend_url: String,
}

impl AiRelay {
    pub fn new(http: reqwest::Client, backend_url: impl Into<String>) -> Self {
        Self {
            http,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/ai/chat", self.backend_url)
    }

    /// POST `body` to the backend and return its JSON reply. A non-2xx reply
    /// becomes [`RelayError::Upstream`] carrying the backend's `error` and
    /// `details` fields when it sent any.
    pub async fn chat(&self, body: &Value) -> Result<Value, RelayError> {
        let response = self.http.post(self.endpoint()).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body: Value = response.json().await.unwrap_or(Value::Null);
            let message = error_body
                .get("error")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("Backend request failed")
                .to_string();
            tracing::warn!("AI backend returned {}: {}", status.as_u16(), message);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                message,
                details: error_body.get("details").filter(|d| !d.is_null()).cloned(),
            });
        }

        response.json().await.map_err(|e| RelayError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_chat_path() {
        let relay = AiRelay::new(reqwest::Client::new(), "http://backend:3001/");
        assert_eq!(relay.endpoint(), "http://backend:3001/api/ai/chat");
    }
}
