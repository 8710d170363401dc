//! Canonical serialization of documents.
//!
//! Output is a pure function of the in-memory [`Value`]: the same document always
//! serializes to the same bytes, which is what makes text-level change detection
//! meaningful. Non-ASCII text is written verbatim; serde_json's escaping is lossless
//! over the full Unicode range.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

/// Whitespace layout of the serialized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Newline per entry, indented by the given number of spaces per level.
    Pretty { indent: usize },
    /// No whitespace at all.
    Compact,
}

/// How object keys are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    /// Lexicographic at every level.
    Sorted,
    /// As stored in the document.
    Preserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub layout: Layout,
    pub keys: KeyOrder,
}

impl Format {
    /// The raw artifact: sorted keys, four-space indent.
    pub const RAW: Format = Format {
        layout: Layout::Pretty { indent: 4 },
        keys: KeyOrder::Sorted,
    };

    /// Readable transformed artifact: document order, two-space indent.
    pub const TRANSFORMED_PRETTY: Format = Format {
        layout: Layout::Pretty { indent: 2 },
        keys: KeyOrder::Preserved,
    };

    /// Minified transformed artifact.
    pub const TRANSFORMED_COMPACT: Format = Format {
        layout: Layout::Compact,
        keys: KeyOrder::Preserved,
    };
}

/// Returns a copy of `value` whose objects have their keys in lexicographic order.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

pub fn serialize(doc: &Value, format: Format) -> Result<String, serde_json::Error> {
    let sorted;
    let doc = match format.keys {
        KeyOrder::Sorted => {
            sorted = sort_keys(doc);
            &sorted
        }
        KeyOrder::Preserved => doc,
    };

    match format.layout {
        Layout::Compact => serde_json::to_string(doc),
        Layout::Pretty { indent } => {
            let indent = " ".repeat(indent);
            let mut buf = Vec::new();
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut ser = Serializer::with_formatter(&mut buf, formatter);
            doc.serialize(&mut ser)?;
            // serde_json only ever emits valid UTF-8
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}
