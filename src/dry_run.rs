use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::graph::{ApiResponse, GraphApi, GraphError, MediaFile, PageRequest, TemplatePage};
use crate::model::MediaHandle;

/// Reads through to the wrapped client but never writes to the destination:
/// media is not transferred and create payloads are printed instead of sent.
pub struct DryRunGraph<A> {
    inner: A,
}

impl<A: GraphApi> DryRunGraph<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: GraphApi> GraphApi for DryRunGraph<A> {
    async fn fetch_template_page(&self, request: &PageRequest) -> Result<TemplatePage, GraphError> {
        self.inner.fetch_template_page(request).await
    }

    async fn download_media(&self, url: &str) -> Result<Vec<u8>, GraphError> {
        info!(url, "dry run: skipping media download");
        Ok(Vec::new())
    }

    async fn upload_media(&self, account: &str, file: MediaFile) -> Result<MediaHandle, GraphError> {
        info!(account, file = %file.file_name, mime = %file.mime_type, "dry run: skipping media upload");
        Ok(MediaHandle(format!("dry-run:{}", file.file_name)))
    }

    async fn create_template(&self, account: &str, payload: &Value) -> Result<ApiResponse, GraphError> {
        println!(
            "POST {}/message_templates\n{}",
            account,
            serde_json::to_string_pretty(payload)?
        );
        Ok(ApiResponse {
            status: 200,
            body: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingInner {
        pages: AtomicUsize,
    }

    #[async_trait]
    impl GraphApi for CountingInner {
        async fn fetch_template_page(&self, _: &PageRequest) -> Result<TemplatePage, GraphError> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            Ok(TemplatePage::default())
        }

        async fn download_media(&self, _: &str) -> Result<Vec<u8>, GraphError> {
            panic!("dry run must not download");
        }

        async fn upload_media(&self, _: &str, _: MediaFile) -> Result<MediaHandle, GraphError> {
            panic!("dry run must not upload");
        }

        async fn create_template(&self, _: &str, _: &Value) -> Result<ApiResponse, GraphError> {
            panic!("dry run must not publish");
        }
    }

    #[tokio::test]
    async fn reads_pass_through_and_writes_are_skipped() {
        let api = DryRunGraph::new(CountingInner::default());
        api.fetch_template_page(&PageRequest::First { account: "1".into() })
            .await
            .unwrap();
        assert_eq!(api.inner.pages.load(Ordering::SeqCst), 1);

        assert!(api.download_media("https://cdn/a.jpg").await.unwrap().is_empty());
        let handle = api
            .upload_media(
                "2",
                MediaFile {
                    file_name: "a.jpg".into(),
                    mime_type: "image/jpeg".into(),
                    bytes: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(handle.as_str(), "dry-run:a.jpg");

        let response = api
            .create_template("2", &serde_json::json!({ "name": "x" }))
            .await
            .unwrap();
        assert!(response.is_success());
    }
}
