use serde::Deserialize;

use crate::model::Template;

/// One page of `GET /{account}/message_templates`.
#[derive(Deserialize, Debug, Default)]
pub struct TemplatePage {
    #[serde(default)]
    pub data: Vec<Template>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl TemplatePage {
    pub fn next_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// Which page of a template listing to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    First { account: String },
    /// A `paging.next` URL returned by the previous page, used verbatim.
    Next(String),
}

/// A downloaded asset ready to be re-uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Status and body of a create-template call, unclassified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct UploadMediaResponse {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateTemplateResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
