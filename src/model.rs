//! Template domain types shared by the fetcher, normalizer and publisher.
//!
//! Components and buttons are tagged on their `type` field. Kinds this crate
//! does not understand are kept as raw JSON in an `Other` variant so a listing
//! never fails to parse because the vendor added a new component.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Template {
    /// Component types in order, e.g. `HEADER, BODY, BUTTONS`.
    pub fn component_kinds(&self) -> Vec<String> {
        self.components.iter().map(|c| c.kind().to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Utility,
    Marketing,
    Authentication,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Utility => "UTILITY",
            Category::Marketing => "MARKETING",
            Category::Authentication => "AUTHENTICATION",
            Category::Other(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "UTILITY" => Category::Utility,
            "MARKETING" => Category::Marketing,
            "AUTHENTICATION" => Category::Authentication,
            _ => Category::Other(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeaderFormat {
    Text,
    Image,
    Video,
    Document,
    Location,
}

impl HeaderFormat {
    /// Formats whose example points at an account-scoped media asset.
    pub fn is_media(self) -> bool {
        matches!(
            self,
            HeaderFormat::Image | HeaderFormat::Video | HeaderFormat::Document
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderFormat::Text => "TEXT",
            HeaderFormat::Image => "IMAGE",
            HeaderFormat::Video => "VIDEO",
            HeaderFormat::Document => "DOCUMENT",
            HeaderFormat::Location => "LOCATION",
        }
    }
}

/// `example` payload of a HEADER. Keys other than the two known lists are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderExample {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_text: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_handle: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HeaderExample {
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            header_handle: vec![handle.into()],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub format: HeaderFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<HeaderExample>,
}

impl Header {
    /// Reads a HEADER whose `format` is known but whose other fields have
    /// unexpected shapes. Malformed `text` is ignored; malformed example
    /// lists are read as the string entries they contain.
    fn from_raw_lenient(raw: &Value) -> Option<Header> {
        let format: HeaderFormat = serde_json::from_value(raw.get("format")?.clone()).ok()?;
        let text = raw.get("text").and_then(Value::as_str).map(str::to_string);
        let example = raw.get("example").and_then(Value::as_object).map(|obj| {
            let strings = |key: &str| -> Vec<String> {
                obj.get(key)
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            };
            HeaderExample {
                header_text: strings("header_text"),
                header_handle: strings("header_handle"),
                extra: obj
                    .iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "header_text" | "header_handle"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            }
        });
        Some(Header {
            format,
            text,
            example,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Header(Header),
    Body(Body),
    Footer(Footer),
    Buttons(Vec<Button>),
    Other(Value),
}

impl Component {
    pub fn kind(&self) -> &str {
        match self {
            Component::Header(_) => "HEADER",
            Component::Body(_) => "BODY",
            Component::Footer(_) => "FOOTER",
            Component::Buttons(_) => "BUTTONS",
            Component::Other(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("UNKNOWN"),
        }
    }

    /// Wire form used by both the listing and the create-template call.
    pub fn to_json(&self) -> Value {
        let tagged = |tag: &str, inner: Value| {
            let mut map = match inner {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            map.insert("type".into(), Value::String(tag.to_string()));
            Value::Object(map)
        };
        match self {
            Component::Header(h) => tagged("HEADER", serde_json::to_value(h).unwrap_or_default()),
            Component::Body(b) => tagged("BODY", serde_json::to_value(b).unwrap_or_default()),
            Component::Footer(f) => tagged("FOOTER", serde_json::to_value(f).unwrap_or_default()),
            Component::Buttons(buttons) => json!({
                "type": "BUTTONS",
                "buttons": buttons.iter().map(Button::to_json).collect::<Vec<_>>(),
            }),
            Component::Other(raw) => raw.clone(),
        }
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Known kinds that fail to parse (e.g. a header format added upstream) fall
/// back to `Other` and are passed through as received. A HEADER with a known
/// format is always read as a header so its media is never passed through.
impl<'de> Deserialize<'de> for Component {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct ButtonsRaw {
            #[serde(default)]
            buttons: Vec<Button>,
        }

        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let parsed = match kind.as_str() {
            "HEADER" => serde_json::from_value(raw.clone())
                .or_else(|err| Header::from_raw_lenient(&raw).ok_or(err))
                .map(Component::Header),
            "BODY" => serde_json::from_value(raw.clone()).map(Component::Body),
            "FOOTER" => serde_json::from_value(raw.clone()).map(Component::Footer),
            "BUTTONS" => serde_json::from_value::<ButtonsRaw>(raw.clone())
                .map(|parsed| Component::Buttons(parsed.buttons)),
            _ => return Ok(Component::Other(raw)),
        };
        Ok(parsed.unwrap_or_else(|_| Component::Other(raw)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Button {
    QuickReply {
        text: String,
        payload: Option<String>,
    },
    Url {
        text: String,
        url: String,
        example: Option<Vec<String>>,
    },
    PhoneNumber {
        text: String,
        phone_number: String,
    },
    Other(Value),
}

impl Button {
    pub fn kind(&self) -> &str {
        match self {
            Button::QuickReply { .. } => "QUICK_REPLY",
            Button::Url { .. } => "URL",
            Button::PhoneNumber { .. } => "PHONE_NUMBER",
            Button::Other(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("UNKNOWN"),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Button::QuickReply { text, .. }
            | Button::Url { text, .. }
            | Button::PhoneNumber { text, .. } => text,
            Button::Other(raw) => raw.get("text").and_then(Value::as_str).unwrap_or_default(),
        }
    }

    /// `TYPE:text`, the form used in the migration log.
    pub fn summary(&self) -> String {
        format!("{}:{}", self.kind(), self.text())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Button::QuickReply { text, payload } => {
                let mut v = json!({ "type": "QUICK_REPLY", "text": text });
                if let Some(payload) = payload {
                    v["payload"] = Value::String(payload.clone());
                }
                v
            }
            Button::Url { text, url, example } => {
                let mut v = json!({ "type": "URL", "text": text, "url": url });
                if let Some(example) = example {
                    v["example"] = json!(example);
                }
                v
            }
            Button::PhoneNumber { text, phone_number } => json!({
                "type": "PHONE_NUMBER",
                "text": text,
                "phone_number": phone_number,
            }),
            Button::Other(raw) => raw.clone(),
        }
    }
}

impl Serialize for Button {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Button {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw.get("type").and_then(Value::as_str).map(str::to_string);
        let field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let button = match kind.as_deref() {
            Some("QUICK_REPLY") => Button::QuickReply {
                text: field("text"),
                payload: raw.get("payload").and_then(Value::as_str).map(str::to_string),
            },
            Some("URL") => Button::Url {
                text: field("text"),
                url: field("url"),
                example: raw
                    .get("example")
                    .and_then(|e| serde_json::from_value(e.clone()).ok()),
            },
            Some("PHONE_NUMBER") => Button::PhoneNumber {
                text: field("text"),
                phone_number: field("phone_number"),
            },
            _ => Button::Other(raw),
        };
        Ok(button)
    }
}

/// Opaque id returned by an account's media-upload endpoint. Only valid within
/// the account it was uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
