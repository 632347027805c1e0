use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub data: String,
    pub mime_type: String,
}

/// A resource embedded in a tool result, either as text or as base64 `blob`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedResource {
    pub resource: ResourceContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
/// Content returned by a tool server
pub enum Content {
    Text(TextContent),
    Image(ImageContent),
    Resource(EmbeddedResource),
    /// Any part type this client does not know
    #[serde(other)]
    Unknown,
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(TextContent { text: text.into() })
    }

    pub fn image<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        Content::Image(ImageContent {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

/// Flatten a content list into the text payload of a tool message.
///
/// Only text parts carry tool output here; any other part is replaced by a one-line
/// placeholder so the model knows something was dropped.
pub fn contents_to_text(contents: &[Content]) -> String {
    contents
        .iter()
        .map(|content| match content {
            Content::Text(text) => text.text.clone(),
            Content::Image(image) => {
                format!("[tool returned {} content that cannot be shown]", image.mime_type)
            }
            Content::Resource(embedded) => {
                format!("[tool returned resource {} that cannot be shown]", embedded.resource.uri)
            }
            Content::Unknown => "[tool returned content that cannot be shown]".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
