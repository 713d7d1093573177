//! Typed per-kind block configuration.
//!
//! Every built-in block kind has its own props struct. Kinds the core does not
//! know about keep their payload as an opaque JSON value inside
//! [`BlockProps::Extension`] and round-trip untouched.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Built-in block kind keys
pub mod kind {
    pub const PAGE: &str = "page";
    pub const SECTION: &str = "section";
    pub const ROW: &str = "row";
    pub const COLUMN: &str = "column";
    pub const GALLERY: &str = "gallery";
    pub const HEADING: &str = "heading";
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const BUTTON: &str = "button";
    pub const PAYMENT_BUTTON: &str = "payment-button";
    pub const VIDEO: &str = "video";
    pub const SPACER: &str = "spacer";
}

/// A shallow JSON-object patch for [`BlockProps`]
pub type PropsPatch = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageProps {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RowProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingProps {
    pub text: String,
    pub level: u8,
}

impl Default for HeadingProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            level: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    /// Rich text markup
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    /// Accessible text read by screen readers
    pub alt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonProps {
    pub label: String,
    pub href: String,
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentButtonProps {
    pub label: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoProps {
    pub url: String,
    pub autoplay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacerProps {
    pub height: u32,
}

impl Default for SpacerProps {
    fn default() -> Self {
        Self { height: 32 }
    }
}

/// Per-kind props. The variant determines the block's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockProps {
    Page(PageProps),
    Section(SectionProps),
    Row(RowProps),
    Column(ColumnProps),
    Gallery(GalleryProps),
    Heading(HeadingProps),
    Text(TextProps),
    Image(ImageProps),
    Button(ButtonProps),
    PaymentButton(PaymentButtonProps),
    Video(VideoProps),
    Spacer(SpacerProps),
    /// Kind-specific data the core never interprets
    Extension { kind: String, data: Value },
}

/// What a string field inside props carries, as far as sanitization cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    RichText,
    Url,
}

impl BlockProps {
    /// Kind key of these props
    pub fn kind(&self) -> &str {
        match self {
            BlockProps::Page(_) => kind::PAGE,
            BlockProps::Section(_) => kind::SECTION,
            BlockProps::Row(_) => kind::ROW,
            BlockProps::Column(_) => kind::COLUMN,
            BlockProps::Gallery(_) => kind::GALLERY,
            BlockProps::Heading(_) => kind::HEADING,
            BlockProps::Text(_) => kind::TEXT,
            BlockProps::Image(_) => kind::IMAGE,
            BlockProps::Button(_) => kind::BUTTON,
            BlockProps::PaymentButton(_) => kind::PAYMENT_BUTTON,
            BlockProps::Video(_) => kind::VIDEO,
            BlockProps::Spacer(_) => kind::SPACER,
            BlockProps::Extension { kind, .. } => kind,
        }
    }

    /// Default props for a kind (unknown kinds get an empty extension payload)
    pub fn default_for(kind: &str) -> Self {
        match kind {
            kind::PAGE => BlockProps::Page(PageProps::default()),
            kind::SECTION => BlockProps::Section(SectionProps::default()),
            kind::ROW => BlockProps::Row(RowProps::default()),
            kind::COLUMN => BlockProps::Column(ColumnProps::default()),
            kind::GALLERY => BlockProps::Gallery(GalleryProps::default()),
            kind::HEADING => BlockProps::Heading(HeadingProps::default()),
            kind::TEXT => BlockProps::Text(TextProps::default()),
            kind::IMAGE => BlockProps::Image(ImageProps::default()),
            kind::BUTTON => BlockProps::Button(ButtonProps::default()),
            kind::PAYMENT_BUTTON => BlockProps::PaymentButton(PaymentButtonProps::default()),
            kind::VIDEO => BlockProps::Video(VideoProps::default()),
            kind::SPACER => BlockProps::Spacer(SpacerProps::default()),
            other => BlockProps::Extension {
                kind: other.to_string(),
                data: Value::Object(Map::new()),
            },
        }
    }

    /// Type a raw JSON payload according to `kind`
    pub fn from_value(kind: &str, value: Value) -> Result<Self, serde_json::Error> {
        // `null` and a missing payload both mean "all defaults"
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            v => v,
        };

        Ok(match kind {
            kind::PAGE => BlockProps::Page(serde_json::from_value(value)?),
            kind::SECTION => BlockProps::Section(serde_json::from_value(value)?),
            kind::ROW => BlockProps::Row(serde_json::from_value(value)?),
            kind::COLUMN => BlockProps::Column(serde_json::from_value(value)?),
            kind::GALLERY => BlockProps::Gallery(serde_json::from_value(value)?),
            kind::HEADING => BlockProps::Heading(serde_json::from_value(value)?),
            kind::TEXT => BlockProps::Text(serde_json::from_value(value)?),
            kind::IMAGE => BlockProps::Image(serde_json::from_value(value)?),
            kind::BUTTON => BlockProps::Button(serde_json::from_value(value)?),
            kind::PAYMENT_BUTTON => BlockProps::PaymentButton(serde_json::from_value(value)?),
            kind::VIDEO => BlockProps::Video(serde_json::from_value(value)?),
            kind::SPACER => BlockProps::Spacer(serde_json::from_value(value)?),
            other => BlockProps::Extension {
                kind: other.to_string(),
                data: value,
            },
        })
    }

    /// Untyped JSON view of these props
    pub fn to_value(&self) -> Value {
        let result = match self {
            BlockProps::Page(p) => serde_json::to_value(p),
            BlockProps::Section(p) => serde_json::to_value(p),
            BlockProps::Row(p) => serde_json::to_value(p),
            BlockProps::Column(p) => serde_json::to_value(p),
            BlockProps::Gallery(p) => serde_json::to_value(p),
            BlockProps::Heading(p) => serde_json::to_value(p),
            BlockProps::Text(p) => serde_json::to_value(p),
            BlockProps::Image(p) => serde_json::to_value(p),
            BlockProps::Button(p) => serde_json::to_value(p),
            BlockProps::PaymentButton(p) => serde_json::to_value(p),
            BlockProps::Video(p) => serde_json::to_value(p),
            BlockProps::Spacer(p) => serde_json::to_value(p),
            BlockProps::Extension { data, .. } => return data.clone(),
        };
        // Plain structs with string keys always serialize
        result.unwrap_or(Value::Null)
    }

    /// Shallow-merge `patch` over these props and re-type the result.
    ///
    /// A `null` patch value removes the key, falling back to the field default.
    /// Props that are not a JSON object cannot be patched.
    pub fn merged(&self, patch: &PropsPatch) -> Result<Self, serde_json::Error> {
        let mut object = match self.to_value() {
            Value::Object(map) => map,
            other => {
                return Err(serde_json::Error::custom(format!(
                    "{} props are {}, not an object",
                    self.kind(),
                    json_type(&other)
                )))
            }
        };
        for (key, value) in patch {
            if value.is_null() {
                object.remove(key);
            } else {
                object.insert(key.clone(), value.clone());
            }
        }
        Self::from_value(self.kind(), Value::Object(object))
    }

    /// String fields that carry rich text or links
    pub fn fields_mut(&mut self) -> Vec<(FieldKind, &mut String)> {
        match self {
            BlockProps::Text(p) => vec![(FieldKind::RichText, &mut p.html)],
            BlockProps::Image(p) => {
                let mut fields = vec![(FieldKind::Url, &mut p.src)];
                if let Some(link) = p.link.as_mut() {
                    fields.push((FieldKind::Url, link));
                }
                fields
            }
            BlockProps::Button(p) => vec![(FieldKind::Url, &mut p.href)],
            BlockProps::Video(p) => vec![(FieldKind::Url, &mut p.url)],
            _ => Vec::new(),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_types_known_kinds() {
        let props = BlockProps::from_value(
            kind::IMAGE,
            json!({ "src": "/a.png", "altText": "A cat" }),
        )
        .unwrap();

        match props {
            BlockProps::Image(image) => {
                assert_eq!(image.src, "/a.png");
                assert_eq!(image.alt_text, "A cat");
            }
            other => panic!("expected image props, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_kept_opaque() {
        let data = json!({ "anything": [1, 2, 3] });
        let props = BlockProps::from_value("map-embed", data.clone()).unwrap();

        assert_eq!(props.kind(), "map-embed");
        assert_eq!(props.to_value(), data);
    }

    #[test]
    fn test_null_payload_means_defaults() {
        let props = BlockProps::from_value(kind::HEADING, Value::Null).unwrap();
        assert_eq!(props, BlockProps::Heading(HeadingProps::default()));
    }

    #[test]
    fn test_merged_is_shallow() {
        let props = BlockProps::Button(ButtonProps {
            label: "Buy".to_string(),
            href: "/buy".to_string(),
            open_in_new_tab: false,
        });

        let mut patch = PropsPatch::new();
        patch.insert("label".to_string(), json!("Buy now"));
        let merged = props.merged(&patch).unwrap();

        match merged {
            BlockProps::Button(button) => {
                assert_eq!(button.label, "Buy now");
                assert_eq!(button.href, "/buy");
            }
            other => panic!("expected button props, got {:?}", other),
        }
    }

    #[test]
    fn test_merged_rejects_wrong_shape() {
        let props = BlockProps::Heading(HeadingProps::default());
        let mut patch = PropsPatch::new();
        patch.insert("level".to_string(), json!("huge"));

        assert!(props.merged(&patch).is_err());
    }

    #[test]
    fn test_merged_rejects_non_object_extension() {
        let props = BlockProps::from_value("map-embed", json!([1, 2, 3])).unwrap();
        let mut patch = PropsPatch::new();
        patch.insert("zoom".to_string(), json!(4));

        let err = props.merged(&patch).unwrap_err();
        assert!(err.to_string().contains("map-embed props are an array"));
        assert_eq!(props.to_value(), json!([1, 2, 3]));

        let object = BlockProps::from_value("map-embed", json!({ "zoom": 2 })).unwrap();
        assert_eq!(object.merged(&patch).unwrap().to_value(), json!({ "zoom": 4 }));
    }
}
