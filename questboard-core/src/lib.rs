//! questboard-core: quest model, filter/sort engine and the quest-draft assistant

pub mod assistant;
pub mod display;
pub mod draft;
pub mod error;
pub mod filter;
pub mod quest;
pub mod time;

pub use assistant::{
    build_prompt, suggestion_instructions, ConversationTurn, DraftSession, QuestModel, Role,
    SendOutcome, SessionState, FALLBACK_REPLY, GREETING,
};
pub use display::{participants_display, time_remaining, ParticipantsDisplay, TimeRemaining, Variant};
pub use draft::{Currency, DraftErrors, DraftField, QuestDraft, QuestDraftSuggestion};
pub use error::{QuestError, SuggestionError};
pub use filter::{
    active_filter_count, filter_and_sort, filter_and_sort_refs, AvailabilityBucket,
    QuestFilterSpec, RewardBucket, SortBy, SortDirection, SortField, UrgencyBucket,
};
pub use quest::{AudienceCriteria, Participants, Quest, QuestStatus, QuestType, TargetAudience};
