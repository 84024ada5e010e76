//! Quest model: the unit of work a business publishes for users to complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestType {
    #[serde(rename = "Sensory Feedback")]
    SensoryFeedback,
    #[serde(rename = "Dine & Review")]
    DineAndReview,
    #[serde(rename = "Ad Campaign")]
    AdCampaign,
    #[serde(rename = "App UX")]
    AppUx,
    #[serde(rename = "In-Store Experience")]
    InStoreExperience,
    #[serde(rename = "Survey")]
    Survey,
}

impl QuestType {
    pub const ALL: [QuestType; 6] = [
        QuestType::SensoryFeedback,
        QuestType::DineAndReview,
        QuestType::AdCampaign,
        QuestType::AppUx,
        QuestType::InStoreExperience,
        QuestType::Survey,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuestType::SensoryFeedback => "Sensory Feedback",
            QuestType::DineAndReview => "Dine & Review",
            QuestType::AdCampaign => "Ad Campaign",
            QuestType::AppUx => "App UX",
            QuestType::InStoreExperience => "In-Store Experience",
            QuestType::Survey => "Survey",
        }
    }

    /// One-line description of what the quest type is for.
    pub fn purpose(self) -> &'static str {
        match self {
            QuestType::SensoryFeedback => {
                "For opinions on the look, feel, taste, or sound of a product."
            }
            QuestType::DineAndReview => {
                "For feedback on a restaurant, cafe, or food/beverage product."
            }
            QuestType::AdCampaign => "To test the effectiveness of an advertisement.",
            QuestType::AppUx => "For feedback on a mobile app or website's user experience.",
            QuestType::InStoreExperience => {
                "To evaluate the customer journey in a physical retail location."
            }
            QuestType::Survey => "For general questionnaires and data collection.",
        }
    }
}

impl fmt::Display for QuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestType {
    type Err = QuestError;

    /// Accepts the display label ("Dine & Review") or a slug ("dine-review"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = slug(s);
        QuestType::ALL
            .into_iter()
            .find(|t| slug(t.label()) == wanted)
            .ok_or_else(|| QuestError::UnknownQuestType(s.to_string()))
    }
}

fn slug(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestStatus {
    Matching,
    InProgress,
    InReview,
    Completed,
}

/// Audience labels a quest draft can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetAudience {
    #[default]
    TechEnthusiasts,
    OnlineShoppers,
    SocialMediaUsers,
    Gamers,
    Foodies,
    LocalExplorers,
}

impl TargetAudience {
    pub const ALL: [TargetAudience; 6] = [
        TargetAudience::TechEnthusiasts,
        TargetAudience::OnlineShoppers,
        TargetAudience::SocialMediaUsers,
        TargetAudience::Gamers,
        TargetAudience::Foodies,
        TargetAudience::LocalExplorers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TargetAudience::TechEnthusiasts => "tech-enthusiasts",
            TargetAudience::OnlineShoppers => "online-shoppers",
            TargetAudience::SocialMediaUsers => "social-media-users",
            TargetAudience::Gamers => "gamers",
            TargetAudience::Foodies => "foodies",
            TargetAudience::LocalExplorers => "local-explorers",
        }
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetAudience {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TargetAudience::ALL
            .into_iter()
            .find(|a| a.label() == wanted)
            .ok_or_else(|| QuestError::UnknownAudience(s.to_string()))
    }
}

/// Signed-up count against capacity. Invariant: `current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub current: u32,
    pub max: u32,
}

impl Participants {
    pub fn new(current: u32, max: u32) -> Result<Self, QuestError> {
        if current > max {
            return Err(QuestError::InvalidParticipants { current, max });
        }
        Ok(Self { current, max })
    }

    pub fn remaining(&self) -> i64 {
        i64::from(self.max) - i64::from(self.current)
    }

    /// Percentage of capacity taken. A zero-capacity quest counts as full.
    pub fn filled_percentage(&self) -> f64 {
        if self.max == 0 {
            return 100.0;
        }
        f64::from(self.current) / f64::from(self.max) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceCriteria {
    pub age_range: [u32; 2],
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub quest_type: QuestType,
    pub reward: f64,
    pub status: QuestStatus,
    pub participants: Participants,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub target_audience: AudienceCriteria,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
}

impl Quest {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        quest_type: QuestType,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            quest_type,
            reward: 0.0,
            status: QuestStatus::Matching,
            participants: Participants { current: 0, max: 100 },
            deadline,
            target_audience: AudienceCriteria {
                age_range: [18, 65],
                location: Vec::new(),
                interests: Vec::new(),
            },
            creator_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_status(mut self, status: QuestStatus) -> Self {
        self.status = status;
        self
    }

    /// `current` is clamped to `max`; use `Participants::new` for untrusted input.
    pub fn with_participants(mut self, current: u32, max: u32) -> Self {
        self.participants = Participants {
            current: current.min(max),
            max,
        };
        self
    }

    /// Check invariants serde cannot express (quests loaded from JSON).
    pub fn validate(&self) -> Result<(), QuestError> {
        let p = self.participants;
        Participants::new(p.current, p.max)?;
        if !self.reward.is_finite() || self.reward < 0.0 {
            return Err(QuestError::InvalidQuest {
                id: self.id.clone(),
                reason: format!("reward must be a non-negative amount, got {}", self.reward),
            });
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }
}
