//! Typed errors for the parse/validation boundaries of the core crate.

use thiserror::Error;

/// Errors raised while building or parsing quest data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("participants out of range: current={current} max={max}")]
    InvalidParticipants { current: u32, max: u32 },

    #[error("unknown quest type: {0}")]
    UnknownQuestType(String),

    #[error("unknown target audience: {0}")]
    UnknownAudience(String),

    #[error("unknown {kind} bucket: {label}")]
    UnknownBucket { kind: &'static str, label: String },

    #[error("unknown sort key: {0} (expected <deadline|reward|spots>-<asc|desc>)")]
    UnknownSortKey(String),

    #[error("quest {id}: {reason}")]
    InvalidQuest { id: String, reason: String },
}

/// Errors raised while interpreting raw model output as a draft suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionError {
    #[error("model returned an empty response")]
    Empty,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("model response is missing a description")]
    MissingDescription,
}
