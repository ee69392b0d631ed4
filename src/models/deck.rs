//! The deck document schema and its authoring validator.
//!
//! A deck's "call" text is a sequence of lines, each a sequence of parts:
//! plain text, styled text, or a slot where a response is inserted. The one
//! semantic rule on top of the shape is that every call must contain at least
//! one slot, because a fill-in-the-blank prompt with no blank is meaningless.
//!
//! `validate` is the single gate onto the store: it runs on initial creation
//! and again after every patch application, since a generic patch can produce
//! a document the schema was never checked against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Em,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    UpperCase,
    Capitalize,
}

/// Styled run of text within a call line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Styled {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

/// A gap in a call where a response is inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

/// One token of call text. Untagged on the wire: a bare string is literal
/// text, an object with `text` is styled text, and any other object is a
/// slot. Variant order matters for deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text(String),
    Styled(Styled),
    Slot(Slot),
}

impl Part {
    pub fn is_slot(&self) -> bool {
        matches!(self, Part::Slot(_))
    }
}

/// A call: ordered lines of parts forming a fill-in-the-blank prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Call(pub Vec<Vec<Part>>);

impl Call {
    pub fn has_slot(&self) -> bool {
        self.0.iter().flatten().any(Part::is_slot)
    }
}

/// The author-controlled content of a deck; exactly what a client may submit
/// whole or reconstruct via patch. The `public` flag marks the deck as
/// eligible for discovery by non-owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditableDeck {
    pub name: String,
    pub calls: Vec<Call>,
    pub responses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub public: bool,
}

impl EditableDeck {
    /// The text a deck is discoverable by: call text plus responses.
    pub fn search_text(&self) -> String {
        let mut words = Vec::new();
        for call in &self.calls {
            for line in &call.0 {
                for part in line {
                    match part {
                        Part::Text(text) => words.push(text.as_str()),
                        Part::Styled(styled) => words.push(styled.text.as_str()),
                        Part::Slot(_) => {}
                    }
                }
            }
        }
        for response in &self.responses {
            words.push(response.as_str());
        }
        words.join(" ")
    }
}

/// A stored deck as returned to callers: the editable content plus the
/// server-owned author display name and revision marker. Only the repository
/// writes `author` and `version`; client-submitted values are ignored.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    #[serde(flatten)]
    pub editable: EditableDeck,
    pub author: String,
    pub version: i64,
}

/// Read-optimized projection of a deck for listings. Derived from the
/// document of record, never stored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub author: String,
    pub language: Option<String>,
    pub calls: i64,
    pub responses: i64,
    pub public: bool,
    pub version: i64,
}

/// What listing and search operations return: callers only ever see the
/// opaque external code, never a raw identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeAndSummary {
    pub code: String,
    pub summary: Summary,
}

/// Checks a candidate document against the editable deck schema and the
/// authoring invariants. Server-owned fields (`author`, `version`) are
/// stripped before checking, so the same function works on fresh submissions
/// and on patched full decks. Pure; fails `BadDeck`.
pub fn validate(mut candidate: Value) -> Result<EditableDeck, AppError> {
    if let Some(fields) = candidate.as_object_mut() {
        fields.remove("author");
        fields.remove("version");
    }

    let deck: EditableDeck = serde_json::from_value(candidate).map_err(|_| AppError::BadDeck)?;

    if deck.calls.iter().any(|call| !call.has_slot()) {
        return Err(AppError::BadDeck);
    }

    Ok(deck)
}
