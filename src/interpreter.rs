//! Model reply interpretation
//!
//! The language model signals list changes with a fixed marker at the start
//! of a line of its reply:
//!
//! ```text
//! ACTION: ADD apples, bananas and cherries.
//! ACTION: REMOVE milk
//! ```
//!
//! Anything else is a conversational answer shown to the user as-is. A reply
//! that is a JSON object tagged with `action` is accepted as a stricter
//! alternative to the markers.

use serde::{Deserialize, Serialize};

use crate::pantry::Pantry;

/// Marker announcing items to add
pub const ADD_MARKER: &str = "ACTION: ADD";

/// Marker announcing items to remove
pub const REMOVE_MARKER: &str = "ACTION: REMOVE";

/// Apology when an add instruction can't be applied
pub const ADD_CONFUSED: &str = "I tried to add those items, but I got confused.";

/// Apology when a remove instruction can't be applied
pub const REMOVE_CONFUSED: &str = "I tried to remove those items, but I got confused.";

/// Interpreted model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Reply {
    /// Append items to the pantry
    Add { items: Vec<String> },
    /// Remove items from the pantry
    Remove { items: Vec<String> },
    /// Plain conversational answer
    Message { text: String },
}

/// Kind of list mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Remove,
}

impl ActionKind {
    const fn apology(self) -> &'static str {
        match self {
            Self::Add => ADD_CONFUSED,
            Self::Remove => REMOVE_CONFUSED,
        }
    }
}

/// A marker was present but no usable items followed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action {kind:?} carried no items")]
pub struct MalformedAction {
    pub kind: ActionKind,
}

/// A mutation that was applied to the pantry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAction {
    pub kind: ActionKind,
    pub items: Vec<String>,
}

/// User-facing outcome of interpreting a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Text to display and speak
    pub message: String,
    /// Mutation applied to the pantry, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AppliedAction>,
}

/// Classify a raw model reply
///
/// # Errors
///
/// Returns [`MalformedAction`] when an action is requested without items
pub fn parse_reply(text: &str) -> Result<Reply, MalformedAction> {
    if let Some(reply) = parse_structured(text) {
        return match reply {
            Reply::Add { items } => non_empty(ActionKind::Add, split_items(&items)),
            Reply::Remove { items } => non_empty(ActionKind::Remove, split_items(&items)),
            message @ Reply::Message { .. } => Ok(message),
        };
    }

    let upper = text.to_uppercase();
    if let Some(items) = items_after(&upper, ADD_MARKER) {
        return non_empty(ActionKind::Add, items);
    }
    if let Some(items) = items_after(&upper, REMOVE_MARKER) {
        return non_empty(ActionKind::Remove, items);
    }

    Ok(Reply::Message {
        text: text.to_string(),
    })
}

/// Interpret a reply and apply any list mutation to the pantry
///
/// Never fails: malformed instructions and storage errors turn into a fixed
/// apology message.
pub fn resolve(text: &str, pantry: &Pantry) -> Resolution {
    let reply = match parse_reply(text) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(reply = %text, error = %e, "could not extract items from reply");
            return apology(e.kind);
        }
    };

    match reply {
        Reply::Message { text } => Resolution {
            message: text,
            action: None,
        },
        Reply::Add { items } => {
            tracing::info!(items = ?items, "adding items");
            if let Err(e) = pantry.add_all(items.as_slice()) {
                tracing::error!(error = %e, "failed to add items");
                return apology(ActionKind::Add);
            }
            Resolution {
                message: format!("I have added {} to your list.", items.join(", ")),
                action: Some(AppliedAction {
                    kind: ActionKind::Add,
                    items,
                }),
            }
        }
        Reply::Remove { items } => {
            tracing::info!(items = ?items, "removing items");
            if let Err(e) = pantry.remove_all(items.as_slice()) {
                tracing::error!(error = %e, "failed to remove items");
                return apology(ActionKind::Remove);
            }
            Resolution {
                message: format!("I have removed {} from your list.", items.join(", ")),
                action: Some(AppliedAction {
                    kind: ActionKind::Remove,
                    items,
                }),
            }
        }
    }
}

/// Split the item list that follows `marker` in an upper-cased reply
///
/// Only the first non-blank line after the marker is read. " AND " counts as
/// a separator, trailing periods and stray quoting are stripped.
fn items_after(upper: &str, marker: &str) -> Option<Vec<String>> {
    let start = upper.find(marker)? + marker.len();
    let line = upper[start..]
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let items = line.replace(" AND ", ",");
    Some(clean_items(items.split(',')))
}

/// Structured items may still bundle several names in one string
fn split_items(items: &[String]) -> Vec<String> {
    clean_items(items.iter().flat_map(|item| item.split(',')))
}

fn clean_items<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|piece| {
            piece
                .as_ref()
                .trim()
                .trim_matches(|c| matches!(c, '"' | '`' | '*'))
                .trim_end_matches('.')
                .trim()
                .to_lowercase()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn non_empty(kind: ActionKind, items: Vec<String>) -> Result<Reply, MalformedAction> {
    if items.is_empty() {
        return Err(MalformedAction { kind });
    }
    Ok(match kind {
        ActionKind::Add => Reply::Add { items },
        ActionKind::Remove => Reply::Remove { items },
    })
}

fn parse_structured(text: &str) -> Option<Reply> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn apology(kind: ActionKind) -> Resolution {
    Resolution {
        message: kind.apology().to_string(),
        action: None,
    }
}
