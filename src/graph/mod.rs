use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiSettings;
use crate::model::MediaHandle;

pub mod model;

pub use model::{ApiResponse, MediaFile, PageRequest, TemplatePage};

use model::UploadMediaResponse;

/// Page size requested from the template listing.
pub const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("template listing failed {status}: {body}")]
    Fetch { status: u16, body: String },
    #[error("failed to download media {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("media upload failed {status}: {body}")]
    Upload { status: u16, body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The four Graph calls the migration needs. `GraphClient` talks HTTP; tests
/// and the dry-run mode substitute their own implementations.
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn fetch_template_page(&self, request: &PageRequest) -> Result<TemplatePage, GraphError>;

    async fn download_media(&self, url: &str) -> Result<Vec<u8>, GraphError>;

    async fn upload_media(&self, account: &str, file: MediaFile) -> Result<MediaHandle, GraphError>;

    /// Submit a create-template payload. Any HTTP status is returned as `Ok`;
    /// only transport failures are errors.
    async fn create_template(&self, account: &str, payload: &Value) -> Result<ApiResponse, GraphError>;
}

#[derive(Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, GraphError> {
        let http = Client::builder()
            .user_agent(concat!("waba-template-migrator/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()?;
        info!(base_url = %settings.base_url, timeout = ?settings.timeout, "graph client initialized");
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.access_token.clone(),
        })
    }

    pub fn templates_url(&self, account: &str) -> String {
        format!("{}/{}/message_templates", self.base_url, account)
    }

    pub fn media_url(&self, account: &str) -> String {
        format!("{}/{}/media", self.base_url, account)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    pub fn build_list_request(&self, request: &PageRequest) -> Result<reqwest::Request, GraphError> {
        let builder = match request {
            PageRequest::First { account } => self
                .http
                .get(self.templates_url(account))
                .query(&[("limit", PAGE_LIMIT)]),
            PageRequest::Next(url) => self.http.get(url),
        };
        Ok(self.authorized(builder).build()?)
    }

    pub fn build_create_request(
        &self,
        account: &str,
        payload: &Value,
    ) -> Result<reqwest::Request, GraphError> {
        let builder = self.http.post(self.templates_url(account)).json(payload);
        Ok(self.authorized(builder).build()?)
    }
}

fn log_request(request: &reqwest::Request) {
    debug!(method = %request.method(), url = %request.url(), "graph request");
    for (name, value) in request.headers() {
        if *name == reqwest::header::AUTHORIZATION {
            debug!("  {}: Bearer [REDACTED]", name);
        } else {
            debug!("  {}: {}", name, value.to_str().unwrap_or("[invalid]"));
        }
    }
}

async fn read_failure(res: Response) -> (u16, String) {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    (status, body)
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn fetch_template_page(&self, request: &PageRequest) -> Result<TemplatePage, GraphError> {
        let request = self.build_list_request(request)?;
        log_request(&request);
        let res = self.http.execute(request).await?;
        if !res.status().is_success() {
            let (status, body) = read_failure(res).await;
            warn!(status, %body, "template listing failed");
            return Err(GraphError::Fetch { status, body });
        }
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn download_media(&self, url: &str) -> Result<Vec<u8>, GraphError> {
        let failed = |reason: String| GraphError::Download {
            url: url.to_string(),
            reason,
        };
        debug!(url, "downloading media");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !res.status().is_success() {
            let (status, body) = read_failure(res).await;
            return Err(failed(format!("status {}: {}", status, body)));
        }
        let bytes = res.bytes().await.map_err(|e| failed(e.to_string()))?;
        debug!(url, size = bytes.len(), "media downloaded");
        Ok(bytes.to_vec())
    }

    async fn upload_media(&self, account: &str, file: MediaFile) -> Result<MediaHandle, GraphError> {
        let size = file.bytes.len();
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .part("file", part);

        let request = self
            .authorized(self.http.post(self.media_url(account)).multipart(form))
            .build()?;
        log_request(&request);
        let res = self.http.execute(request).await?;
        if !res.status().is_success() {
            let (status, body) = read_failure(res).await;
            warn!(status, %body, file = %file.file_name, "media upload failed");
            return Err(GraphError::Upload { status, body });
        }
        let body = res.text().await?;
        let payload: UploadMediaResponse = serde_json::from_str(&body)?;
        info!(
            file = %file.file_name,
            mime = %file.mime_type,
            size,
            media_id = %payload.id,
            "media uploaded"
        );
        Ok(MediaHandle(payload.id))
    }

    async fn create_template(&self, account: &str, payload: &Value) -> Result<ApiResponse, GraphError> {
        let request = self.build_create_request(account, payload)?;
        log_request(&request);
        debug!(
            "Request Payload: {}",
            serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
        );
        let res = self.http.execute(request).await?;
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        debug!(status, %body, "create template response");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn client() -> GraphClient {
        GraphClient::new(&ApiSettings {
            base_url: "https://graph.example/v20.0/".into(),
            access_token: "token".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn first_page_request_targets_account_listing() {
        let request = client()
            .build_list_request(&PageRequest::First {
                account: "111".into(),
            })
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/v20.0/111/message_templates");
        assert_eq!(request.url().query(), Some("limit=100"));
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bearer token"
        );
    }

    #[test]
    fn next_page_request_uses_cursor_url_verbatim() {
        let next = "https://graph.example/v20.0/111/message_templates?limit=100&after=abc";
        let request = client()
            .build_list_request(&PageRequest::Next(next.into()))
            .unwrap();
        assert_eq!(request.url().as_str(), next);
        assert!(request.headers().contains_key("Authorization"));
    }

    #[test]
    fn create_request_sets_json_body_and_headers() {
        let payload = json!({ "name": "welcome" });
        let request = client().build_create_request("222", &payload).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/v20.0/222/message_templates");
        assert_eq!(
            request
                .headers()
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent, payload);
    }

    #[test]
    fn debug_output_hides_token() {
        let printed = format!("{:?}", client());
        assert!(printed.contains("graph.example"));
        assert!(!printed.contains("token"));
    }
}
