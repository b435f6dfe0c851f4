//! Gmail message payload decoding.
//!
//! Bodies arrive as a tree of MIME parts with URL-safe base64 data. The first `text/plain`
//! part wins; otherwise the first `text/html` part is reduced to text.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use scraper::{ElementRef, Html};
use serde::Deserialize;

/// Gmail pads some bodies and not others.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One node of a message payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// MIME type of this part.
    #[serde(default)]
    pub mime_type: String,
    /// Headers; only present on the top-level part for metadata requests.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Inline body data.
    #[serde(default)]
    pub body: Option<PartBody>,
    /// Child parts of a multipart node.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// A message header.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Body of a single part.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// URL-safe base64 content; absent for attachments and containers.
    pub data: Option<String>,
}

impl MessagePart {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Plain text of the message, preferring `text/plain` over reduced HTML.
    #[must_use]
    pub fn text(&self) -> String {
        if let Some(plain) = self.find_decoded("text/plain") {
            return plain.trim().to_string();
        }
        self.find_decoded("text/html")
            .map(|body| html_to_text(&body))
            .unwrap_or_default()
    }

    fn find_decoded(&self, mime_type: &str) -> Option<String> {
        if self.mime_type.eq_ignore_ascii_case(mime_type) {
            if let Some(text) = self.body.as_ref().and_then(|b| b.data.as_deref()).and_then(decode_body) {
                return Some(text);
            }
        }
        self.parts.iter().find_map(|part| part.find_decoded(mime_type))
    }
}

/// Decodes URL-safe base64 body data, replacing invalid UTF-8.
#[must_use]
pub fn decode_body(data: &str) -> Option<String> {
    let bytes = BODY_ENGINE.decode(data.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Elements whose content never reaches the reader.
const HIDDEN: &[&str] = &["head", "noscript", "script", "style", "template", "title"];

/// Elements rendered on their own lines.
const BLOCKS: &[&str] = &[
    "address", "article", "blockquote", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "ol", "p", "section", "table", "tr", "ul",
];

/// Reduces an HTML body to readable text, one line per block element.
///
/// Entities, named and numeric, are decoded by the parser.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if HIDDEN.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCKS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            collect_text(child, out);
        } else if let Some(text) = child.value().as_text() {
            // Source line breaks are plain whitespace in HTML.
            out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
        }
    }
    if block {
        out.push('\n');
    } else if name == "td" || name == "th" {
        out.push(' ');
    }
}
