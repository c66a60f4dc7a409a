use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::graph::model::CreateTemplateResponse;
use crate::graph::GraphApi;
use crate::model::Template;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created { id: Option<String> },
    /// Any non-success status, or a transport failure (`status: None`).
    /// `body` is kept verbatim.
    Rejected { status: Option<u16>, body: String },
}

pub fn build_create_template_request(template: &Template) -> Value {
    json!({
        "name": template.name,
        "category": template.category.as_str(),
        "language": template.language,
        "components": template.components.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
    })
}

/// Submit `template` to `account`. Never retries and never looks inside an
/// error body.
#[instrument(skip(api, template), fields(template = %template.name))]
pub async fn publish_template(
    api: &dyn GraphApi,
    account: &str,
    template: &Template,
) -> PublishOutcome {
    let payload = build_create_template_request(template);
    match api.create_template(account, &payload).await {
        Ok(response) if response.is_success() => {
            let id = serde_json::from_str::<CreateTemplateResponse>(&response.body)
                .ok()
                .and_then(|r| {
                    if let Some(status) = &r.status {
                        info!(review_status = %status, "template submitted");
                    }
                    r.id
                });
            info!(id = ?id, "template created");
            PublishOutcome::Created { id }
        }
        Ok(response) => {
            error!(status = response.status, body = %response.body, "template rejected");
            PublishOutcome::Rejected {
                status: Some(response.status),
                body: response.body,
            }
        }
        Err(err) => {
            error!(error = %err, "template request failed");
            PublishOutcome::Rejected {
                status: None,
                body: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ApiResponse, GraphError, MediaFile, PageRequest, TemplatePage};
    use crate::model::{Body, Category, Component, MediaHandle};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        response: Mutex<Option<Result<ApiResponse, GraphError>>>,
        payloads: Mutex<Vec<(String, Value)>>,
    }

    impl Scripted {
        fn new(response: Result<ApiResponse, GraphError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                payloads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GraphApi for Scripted {
        async fn fetch_template_page(&self, _: &PageRequest) -> Result<TemplatePage, GraphError> {
            Ok(TemplatePage::default())
        }

        async fn download_media(&self, _: &str) -> Result<Vec<u8>, GraphError> {
            Ok(Vec::new())
        }

        async fn upload_media(&self, _: &str, _: MediaFile) -> Result<MediaHandle, GraphError> {
            Ok(MediaHandle("unused".into()))
        }

        async fn create_template(&self, account: &str, payload: &Value) -> Result<ApiResponse, GraphError> {
            self.payloads
                .lock()
                .unwrap()
                .push((account.to_string(), payload.clone()));
            self.response.lock().unwrap().take().expect("one call scripted")
        }
    }

    fn welcome() -> Template {
        Template {
            name: "welcome".into(),
            category: Category::Utility,
            language: "en".into(),
            components: vec![Component::Body(Body {
                text: "Hi {{1}}".into(),
                example: None,
            })],
        }
    }

    #[test]
    fn request_contains_the_four_fields() {
        let body = build_create_template_request(&welcome());
        assert_eq!(
            body,
            json!({
                "name": "welcome",
                "category": "UTILITY",
                "language": "en",
                "components": [{ "type": "BODY", "text": "Hi {{1}}" }]
            })
        );
    }

    #[tokio::test]
    async fn success_status_is_created() {
        let api = Scripted::new(Ok(ApiResponse {
            status: 200,
            body: r#"{"id":"987","status":"PENDING","category":"UTILITY"}"#.into(),
        }));
        let outcome = publish_template(&api, "222", &welcome()).await;
        assert_eq!(outcome, PublishOutcome::Created { id: Some("987".into()) });
        let payloads = api.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].0, "222");
        assert_eq!(payloads[0].1["name"], "welcome");
    }

    #[tokio::test]
    async fn error_status_keeps_body_verbatim() {
        let body = r#"{"error":{"message":"Template name already exists","code":100}}"#;
        let api = Scripted::new(Ok(ApiResponse {
            status: 400,
            body: body.into(),
        }));
        let outcome = publish_template(&api, "222", &welcome()).await;
        assert_eq!(
            outcome,
            PublishOutcome::Rejected {
                status: Some(400),
                body: body.into(),
            }
        );
    }

    #[tokio::test]
    async fn call_failure_is_rejected_without_status() {
        let decode = serde_json::from_str::<Value>("not json").unwrap_err();
        let api = Scripted::new(Err(GraphError::Decode(decode)));
        match publish_template(&api, "222", &welcome()).await {
            PublishOutcome::Rejected { status, body } => {
                assert_eq!(status, None);
                assert!(body.starts_with("invalid response JSON"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
