//! Converts source template components into the create-template form.
//!
//! Normalization never fails. Media headers whose asset cannot be moved are
//! emitted without an `example` and reported through [`MediaOutcome::Failed`];
//! unknown buttons are dropped and reported through `dropped_buttons`.
use tracing::warn;

use crate::graph::GraphApi;
use crate::media::migrate_media;
use crate::model::{Button, Component, Header, HeaderExample, MediaHandle, Template};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    Migrated(MediaHandle),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedComponent {
    pub component: Component,
    /// Set only for IMAGE/VIDEO/DOCUMENT headers.
    pub media: Option<MediaOutcome>,
    /// `TYPE:text` of every button kept.
    pub buttons: Vec<String>,
    /// `TYPE:text` of every button removed because its type is unknown.
    pub dropped_buttons: Vec<String>,
}

impl NormalizedComponent {
    fn plain(component: Component) -> Self {
        Self {
            component,
            media: None,
            buttons: Vec::new(),
            dropped_buttons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTemplate {
    pub template: Template,
    /// Component types of the source template, in order.
    pub source_kinds: Vec<String>,
    pub media: Vec<MediaOutcome>,
    pub buttons: Vec<String>,
    pub dropped_buttons: Vec<String>,
}

impl NormalizedTemplate {
    pub fn media_handles(&self) -> Vec<&MediaHandle> {
        self.media
            .iter()
            .filter_map(|m| match m {
                MediaOutcome::Migrated(handle) => Some(handle),
                MediaOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn media_errors(&self) -> Vec<&str> {
        self.media
            .iter()
            .filter_map(|m| match m {
                MediaOutcome::Failed(reason) => Some(reason.as_str()),
                MediaOutcome::Migrated(_) => None,
            })
            .collect()
    }

    /// A media header could not be migrated and was published without example.
    pub fn is_degraded(&self) -> bool {
        self.media
            .iter()
            .any(|m| matches!(m, MediaOutcome::Failed(_)))
    }
}

pub async fn normalize_template(
    api: &dyn GraphApi,
    template: &Template,
    account: &str,
) -> NormalizedTemplate {
    let mut components = Vec::with_capacity(template.components.len());
    let mut media = Vec::new();
    let mut buttons = Vec::new();
    let mut dropped_buttons = Vec::new();

    for component in &template.components {
        let normalized = normalize_component(api, component, &template.name, account).await;
        components.push(normalized.component);
        media.extend(normalized.media);
        buttons.extend(normalized.buttons);
        dropped_buttons.extend(normalized.dropped_buttons);
    }

    NormalizedTemplate {
        template: Template {
            name: template.name.clone(),
            category: template.category.clone(),
            language: template.language.clone(),
            components,
        },
        source_kinds: template.component_kinds(),
        media,
        buttons,
        dropped_buttons,
    }
}

/// `template_name` is only used to label console warnings.
pub async fn normalize_component(
    api: &dyn GraphApi,
    component: &Component,
    template_name: &str,
    account: &str,
) -> NormalizedComponent {
    match component {
        Component::Header(header) if header.format.is_media() => {
            normalize_media_header(api, header, template_name, account).await
        }
        Component::Header(header) => NormalizedComponent::plain(Component::Header(Header {
            format: header.format,
            text: header.text.clone(),
            example: header.example.clone(),
        })),
        Component::Buttons(source) => {
            let mut kept = Vec::with_capacity(source.len());
            let mut dropped = Vec::new();
            for button in source {
                match normalize_button(button) {
                    Some(button) => kept.push(button),
                    None => {
                        warn!(
                            template = template_name,
                            button_type = button.kind(),
                            "unknown button type, dropping"
                        );
                        dropped.push(button.summary());
                    }
                }
            }
            NormalizedComponent {
                buttons: kept.iter().map(Button::summary).collect(),
                dropped_buttons: dropped,
                component: Component::Buttons(kept),
                media: None,
            }
        }
        other => NormalizedComponent::plain(other.clone()),
    }
}

async fn normalize_media_header(
    api: &dyn GraphApi,
    header: &Header,
    template_name: &str,
    account: &str,
) -> NormalizedComponent {
    let source_url = header
        .example
        .as_ref()
        .and_then(|example| example.header_handle.first());

    let result = match source_url {
        Some(url) => migrate_media(api, url, account)
            .await
            .map_err(|err| err.to_string()),
        None => Err("header has no example.header_handle".to_string()),
    };

    match result {
        Ok(handle) => NormalizedComponent {
            component: Component::Header(Header {
                format: header.format,
                text: None,
                example: Some(HeaderExample::with_handle(handle.as_str())),
            }),
            media: Some(MediaOutcome::Migrated(handle)),
            buttons: Vec::new(),
            dropped_buttons: Vec::new(),
        },
        Err(reason) => {
            warn!(
                template = template_name,
                format = header.format.as_str(),
                %reason,
                "header media not migrated, emitting header without example"
            );
            NormalizedComponent {
                component: Component::Header(Header {
                    format: header.format,
                    text: None,
                    example: None,
                }),
                media: Some(MediaOutcome::Failed(reason)),
                buttons: Vec::new(),
                dropped_buttons: Vec::new(),
            }
        }
    }
}

/// `None` for button types the create call is not known to accept.
/// QUICK_REPLY buttons are sent without their payload.
pub fn normalize_button(button: &Button) -> Option<Button> {
    match button {
        Button::QuickReply { text, .. } => Some(Button::QuickReply {
            text: text.clone(),
            payload: None,
        }),
        Button::Url { .. } | Button::PhoneNumber { .. } => Some(button.clone()),
        Button::Other(_) => None,
    }
}
