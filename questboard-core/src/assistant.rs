//! Conversational quest-draft assistant.
//!
//! One `DraftSession` per editing session. Each send resends the full
//! history plus the current draft fields; the model decides whether it has
//! enough to propose a full draft or needs to ask a clarifying question.
//!
//! States:
//! - Idle -> Composing (user typing)
//! - Composing -> AwaitingResponse (non-empty message sent)
//! - AwaitingResponse -> Idle (suggestion applied to the turn log, or fallback shown)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draft::{QuestDraft, QuestDraftSuggestion};
use crate::quest::{QuestType, TargetAudience};

pub const GREETING: &str = "I can help you edit the quest details. What would you like to change?";
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your request. Please try again.";

/// Hosted model that turns a prompt into raw suggestion JSON.
#[async_trait]
pub trait QuestModel: Send + Sync {
    async fn suggest(&self, instructions: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Composing,
    AwaitingResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank message; nothing was sent.
    Ignored,
    /// A request is already in flight.
    Busy,
    /// The model asked a clarifying question.
    Question(String),
    /// The model proposed a full draft; it can now be applied.
    Draft(QuestDraftSuggestion),
    /// The model call failed; the fallback reply was shown.
    Failed,
}

/// Fixed task description sent with every prompt.
pub fn suggestion_instructions() -> String {
    let mut s = String::from(
        "You are an expert at creating engaging quests for market research and user feedback.\n\
You are in a conversation with a user to build a quest.\n\
Analyze the conversation history provided in the prompt.\n\n\
Your task is to determine if you have enough information to create a full quest draft.\n\
A full draft requires a clear objective, a title, a description, a quest type, a budget, and a target audience.\n\n\
- IF you have enough information, generate a suitable quest title (under 10 words), a detailed description, \
select the most appropriate quest type, and determine a budget and target audience.\n\
- IF NOT, ask a clarifying question to get the missing information. For example, if the budget is missing, \
ask \"What is the budget for this quest?\". Return the question in the \"description\" field and leave other fields empty.\n\n\
Available Quest Types:\n",
    );
    for t in QuestType::ALL {
        s.push_str(&format!("- {}: {}\n", t.label(), t.purpose()));
    }
    s.push_str("\nAvailable Target Audiences:\n");
    for a in TargetAudience::ALL {
        s.push_str(&format!("- {}\n", a.label()));
    }
    s.push_str(
        "\nRespond with a single JSON object and nothing else, with keys: \
\"title\" (string, optional), \"description\" (string, required), \
\"questType\" (one of the quest types above, optional), \
\"budget\" (number, optional), \"targetAudience\" (one of the audiences above, optional).",
    );
    s
}

/// Current form values followed by the whole conversation, oldest first.
pub fn build_prompt(draft: &QuestDraft, turns: &[ConversationTurn]) -> String {
    let mut s = String::new();
    s.push_str(&format!("Current Title: {}\n", draft.title));
    s.push_str(&format!("Current Description: {}\n", draft.description));
    s.push_str(&format!("Current Quest Type: {}\n", draft.quest_type_label()));
    s.push_str(&format!("Current Budget: {}\n", draft.budget));
    s.push_str(&format!("Current Target Audience: {}\n", draft.target_audience));
    s.push_str("---\n");
    s.push_str("Conversation History:\n");
    for t in turns {
        s.push_str(&format!("{}: {}\n", t.role, t.content));
    }
    s
}

#[derive(Debug, Clone)]
pub struct DraftSession {
    draft: QuestDraft,
    turns: Vec<ConversationTurn>,
    last_suggestion: Option<QuestDraftSuggestion>,
    state: SessionState,
}

impl DraftSession {
    /// Start a session over `draft`, greeting the user.
    pub fn open(draft: QuestDraft) -> Self {
        Self {
            draft,
            turns: vec![ConversationTurn::assistant(GREETING)],
            last_suggestion: None,
            state: SessionState::Idle,
        }
    }

    pub fn draft(&self) -> &QuestDraft {
        &self.draft
    }

    /// Direct form edits made outside the assistant.
    pub fn draft_mut(&mut self) -> &mut QuestDraft {
        &mut self.draft
    }

    pub fn into_draft(self) -> QuestDraft {
        self.draft
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    pub fn last_suggestion(&self) -> Option<&QuestDraftSuggestion> {
        self.last_suggestion.as_ref()
    }

    pub fn can_apply(&self) -> bool {
        self.last_suggestion.is_some()
    }

    /// Track the input box. Has no effect while a request is in flight.
    pub fn set_composing(&mut self, input: &str) {
        if self.is_pending() {
            return;
        }
        self.state = if input.trim().is_empty() {
            SessionState::Idle
        } else {
            SessionState::Composing
        };
    }

    pub async fn send(&mut self, message: &str, model: &dyn QuestModel) -> SendOutcome {
        if self.is_pending() {
            return SendOutcome::Busy;
        }
        if message.trim().is_empty() {
            self.state = SessionState::Idle;
            return SendOutcome::Ignored;
        }

        self.turns.push(ConversationTurn::user(message));
        self.state = SessionState::AwaitingResponse;

        let prompt = build_prompt(&self.draft, &self.turns);
        tracing::debug!(turns = self.turns.len(), prompt_len = prompt.len(), "sending draft prompt");

        let result = model
            .suggest(&suggestion_instructions(), &prompt)
            .await
            .and_then(|raw| QuestDraftSuggestion::from_model_json(&raw).map_err(Into::into));

        self.state = SessionState::Idle;
        match result {
            Ok(suggestion) => {
                self.turns
                    .push(ConversationTurn::assistant(suggestion.description.clone()));
                if suggestion.is_full_draft() {
                    self.last_suggestion = Some(suggestion.clone());
                    SendOutcome::Draft(suggestion)
                } else {
                    self.last_suggestion = None;
                    SendOutcome::Question(suggestion.description)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "quest suggestion failed");
                self.fail();
                SendOutcome::Failed
            }
        }
    }

    /// Recover after a send future was dropped before the model answered.
    pub fn cancel_pending(&mut self) {
        if self.is_pending() {
            tracing::warn!("quest suggestion abandoned");
            self.fail();
            self.state = SessionState::Idle;
        }
    }

    fn fail(&mut self) {
        self.turns.push(ConversationTurn::assistant(FALLBACK_REPLY));
        self.last_suggestion = None;
    }

    /// Copy the retained suggestion onto the draft. The suggestion is consumed.
    pub fn apply_last_suggestion(&mut self) -> bool {
        let Some(s) = self.last_suggestion.take() else {
            return false;
        };
        self.draft.apply(&s);
        tracing::info!(title = %self.draft.title, "applied quest suggestion");
        true
    }
}
