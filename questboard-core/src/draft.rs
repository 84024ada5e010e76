//! Quest draft: the editable form a business fills in before publishing,
//! and the model suggestions that can be merged into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error::SuggestionError;
use crate::quest::{QuestType, TargetAudience};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Jpy,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraft {
    pub title: String,
    pub description: String,
    pub quest_type: Option<QuestType>,
    pub budget: f64,
    pub currency: Currency,
    pub participant_target: u32,
    pub target_audience: TargetAudience,
}

impl Default for QuestDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            quest_type: None,
            budget: 500.0,
            currency: Currency::Usd,
            participant_target: 100,
            target_audience: TargetAudience::TechEnthusiasts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DraftField {
    Title,
    Description,
    Budget,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
            DraftField::Budget => "budget",
        })
    }
}

/// Every field that failed review, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed. Please check your inputs.")]
pub struct DraftErrors {
    pub fields: Vec<(DraftField, &'static str)>,
}

impl DraftErrors {
    pub fn get(&self, field: DraftField) -> Option<&'static str> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, m)| *m)
    }
}

impl QuestDraft {
    pub fn quest_type_label(&self) -> &'static str {
        self.quest_type.map_or("Not specified", QuestType::label)
    }

    /// Review rules: the draft must be publishable before it leaves the form.
    pub fn validate(&self) -> Result<(), DraftErrors> {
        let mut fields = Vec::new();
        if self.title.chars().count() < 5 {
            fields.push((DraftField::Title, "Title must be at least 5 characters"));
        }
        if self.description.chars().count() < 20 {
            fields.push((
                DraftField::Description,
                "Description must be at least 20 characters",
            ));
        }
        if self.budget.is_nan() || self.budget < 1.0 {
            fields.push((DraftField::Budget, "Budget must be at least $1"));
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(DraftErrors { fields })
        }
    }

    /// Overwrite only the fields the suggestion populates.
    ///
    /// Empty strings and a zero budget count as absent.
    pub fn apply(&mut self, s: &QuestDraftSuggestion) {
        if let Some(title) = s.title.as_deref().filter(|t| !t.trim().is_empty()) {
            self.title = title.to_string();
        }
        if !s.description.trim().is_empty() {
            self.description = s.description.clone();
        }
        if let Some(t) = s.quest_type {
            self.quest_type = Some(t);
        }
        if let Some(b) = s.budget.filter(|b| *b != 0.0) {
            self.budget = b;
        }
        if let Some(a) = s.target_audience {
            self.target_audience = a;
        }
    }
}

/// Structured model output.
///
/// With only `description` set, the description is a clarifying question.
/// With `title` set, it is a full draft that can be applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraftSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_type: Option<QuestType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<TargetAudience>,
}

impl QuestDraftSuggestion {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            description: text.into(),
            ..Default::default()
        }
    }

    pub fn is_full_draft(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Parse raw model text (JSON, optionally wrapped in a Markdown fence).
    ///
    /// Unknown enum values are dropped rather than rejected; a missing
    /// description fails the whole response.
    pub fn from_model_json(raw: &str) -> Result<Self, SuggestionError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(SuggestionError::Empty);
        }

        let v: Value =
            serde_json::from_str(body).map_err(|e| SuggestionError::InvalidJson(e.to_string()))?;
        let obj = v
            .as_object()
            .ok_or_else(|| SuggestionError::InvalidJson("expected a JSON object".to_string()))?;

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(SuggestionError::MissingDescription)?
            .to_string();

        let title = non_empty_str(obj.get("title")).map(str::to_string);

        let quest_type = non_empty_str(obj.get("questType")).and_then(|s| match s.parse::<QuestType>() {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(error = %e, "dropping quest type from model output");
                None
            }
        });

        let target_audience =
            non_empty_str(obj.get("targetAudience")).and_then(|s| match s.parse::<TargetAudience>() {
                Ok(a) => Some(a),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping target audience from model output");
                    None
                }
            });

        let budget = obj.get("budget").and_then(|b| match b {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
            _ => None,
        });
        let budget = match budget {
            Some(b) if b.is_finite() && b >= 0.0 => Some(b),
            Some(b) => {
                tracing::warn!(budget = b, "dropping invalid budget from model output");
                None
            }
            None => None,
        };

        Ok(Self {
            title,
            description,
            quest_type,
            budget,
            target_audience,
        })
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // drop the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
