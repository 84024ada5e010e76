//! Quest filter/sort engine.
//!
//! Pure and deterministic for a given `(quests, spec, now)`:
//! - dimensions (type, reward, urgency, availability) are ANDed
//! - selected buckets within a dimension are ORed
//! - an empty dimension is no restriction
//!
//! Buckets are coarse, named ranges. Urgency buckets are not a strict
//! partition: a quest 3-23 hours out is `urgent` but not `soon`.
//! Availability buckets do partition capacity, `almost-full` winning over
//! `limited`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::QuestError;
use crate::quest::{Participants, Quest, QuestType};
use crate::time::{days_until, hours_until};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardBucket {
    #[serde(rename = "0-50")]
    UpTo50,
    #[serde(rename = "51-100")]
    From51To100,
    #[serde(rename = "101-200")]
    From101To200,
    #[serde(rename = "200+")]
    Over200,
}

impl RewardBucket {
    pub const ALL: [RewardBucket; 4] = [
        RewardBucket::UpTo50,
        RewardBucket::From51To100,
        RewardBucket::From101To200,
        RewardBucket::Over200,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RewardBucket::UpTo50 => "0-50",
            RewardBucket::From51To100 => "51-100",
            RewardBucket::From101To200 => "101-200",
            RewardBucket::Over200 => "200+",
        }
    }

    /// Inclusive at both ends, except `200+` which is strictly above 200.
    pub fn contains(self, reward: f64) -> bool {
        match self {
            RewardBucket::UpTo50 => (0.0..=50.0).contains(&reward),
            RewardBucket::From51To100 => (51.0..=100.0).contains(&reward),
            RewardBucket::From101To200 => (101.0..=200.0).contains(&reward),
            RewardBucket::Over200 => reward > 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrgencyBucket {
    Urgent,
    Soon,
    Normal,
}

impl UrgencyBucket {
    pub const ALL: [UrgencyBucket; 3] = [UrgencyBucket::Urgent, UrgencyBucket::Soon, UrgencyBucket::Normal];

    pub fn label(self) -> &'static str {
        match self {
            UrgencyBucket::Urgent => "urgent",
            UrgencyBucket::Soon => "soon",
            UrgencyBucket::Normal => "normal",
        }
    }

    pub fn contains(self, deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            UrgencyBucket::Urgent => {
                let hours = hours_until(deadline, now);
                hours > 0.0 && hours < 24.0
            }
            UrgencyBucket::Soon => {
                let days = days_until(deadline, now);
                (1.0..=3.0).contains(&days)
            }
            UrgencyBucket::Normal => days_until(deadline, now) > 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityBucket {
    AlmostFull,
    Limited,
    Available,
}

impl AvailabilityBucket {
    pub const ALL: [AvailabilityBucket; 3] = [
        AvailabilityBucket::AlmostFull,
        AvailabilityBucket::Limited,
        AvailabilityBucket::Available,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AvailabilityBucket::AlmostFull => "almost-full",
            AvailabilityBucket::Limited => "limited",
            AvailabilityBucket::Available => "available",
        }
    }

    pub fn contains(self, participants: &Participants) -> bool {
        let filled = participants.filled_percentage();
        let remaining = participants.remaining();
        match self {
            AvailabilityBucket::AlmostFull => filled >= 90.0 || remaining <= 5,
            AvailabilityBucket::Limited => {
                !AvailabilityBucket::AlmostFull.contains(participants)
                    && ((70.0..90.0).contains(&filled) || (remaining > 5 && remaining <= 20))
            }
            AvailabilityBucket::Available => filled < 70.0 && remaining > 20,
        }
    }
}

macro_rules! label_enum_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = QuestError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                <$ty>::ALL
                    .into_iter()
                    .find(|b| b.label() == wanted)
                    .ok_or_else(|| QuestError::UnknownBucket {
                        kind: $kind,
                        label: s.to_string(),
                    })
            }
        }
    };
}

label_enum_impls!(RewardBucket, "reward");
label_enum_impls!(UrgencyBucket, "urgency");
label_enum_impls!(AvailabilityBucket, "availability");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Deadline,
    Reward,
    /// Remaining capacity (`max - current`).
    Spots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One field + direction, written as `"<field>-<dir>"` (e.g. `"spots-asc"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortBy {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    fn compare(self, a: &Quest, b: &Quest) -> Ordering {
        let asc = match self.field {
            SortField::Deadline => a.deadline.cmp(&b.deadline),
            SortField::Reward => a.reward.total_cmp(&b.reward),
            SortField::Spots => a.participants.remaining().cmp(&b.participants.remaining()),
        };
        match self.direction {
            SortDirection::Asc => asc,
            SortDirection::Desc => asc.reverse(),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Deadline => "deadline",
            SortField::Reward => "reward",
            SortField::Spots => "spots",
        };
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{field}-{dir}")
    }
}

impl FromStr for SortBy {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || QuestError::UnknownSortKey(s.to_string());
        let lowered = s.trim().to_lowercase();
        let (field, dir) = lowered.rsplit_once('-').ok_or_else(unknown)?;
        let field = match field {
            "deadline" => SortField::Deadline,
            "reward" => SortField::Reward,
            "spots" => SortField::Spots,
            _ => return Err(unknown()),
        };
        let direction = match dir {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(unknown()),
        };
        Ok(Self { field, direction })
    }
}

impl Serialize for SortBy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SortBy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Client-held query over the quest list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestFilterSpec {
    pub types: Vec<QuestType>,
    pub reward_range: Vec<RewardBucket>,
    pub urgency: Vec<UrgencyBucket>,
    pub availability: Vec<AvailabilityBucket>,
    pub sort_by: SortBy,
}

fn toggle<T: PartialEq>(set: &mut Vec<T>, value: T) {
    if let Some(pos) = set.iter().position(|v| *v == value) {
        set.remove(pos);
    } else {
        set.push(value);
    }
}

impl QuestFilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_type(&mut self, t: QuestType) {
        toggle(&mut self.types, t);
    }

    pub fn toggle_reward(&mut self, b: RewardBucket) {
        toggle(&mut self.reward_range, b);
    }

    pub fn toggle_urgency(&mut self, b: UrgencyBucket) {
        toggle(&mut self.urgency, b);
    }

    pub fn toggle_availability(&mut self, b: AvailabilityBucket) {
        toggle(&mut self.availability, b);
    }

    /// Drop every bucket selection; the sort order is kept.
    pub fn clear(&mut self) {
        self.types.clear();
        self.reward_range.clear();
        self.urgency.clear();
        self.availability.clear();
    }

    pub fn matches(&self, quest: &Quest, now: DateTime<Utc>) -> bool {
        (self.types.is_empty() || self.types.contains(&quest.quest_type))
            && (self.reward_range.is_empty()
                || self.reward_range.iter().any(|b| b.contains(quest.reward)))
            && (self.urgency.is_empty()
                || self.urgency.iter().any(|b| b.contains(quest.deadline, now)))
            && (self.availability.is_empty()
                || self
                    .availability
                    .iter()
                    .any(|b| b.contains(&quest.participants)))
    }
}

/// Filter then stable-sort, borrowing from the input.
pub fn filter_and_sort_refs<'a>(
    quests: &'a [Quest],
    spec: &QuestFilterSpec,
    now: DateTime<Utc>,
) -> Vec<&'a Quest> {
    let mut out: Vec<&Quest> = quests.iter().filter(|q| spec.matches(q, now)).collect();
    // sort_by is stable: ties keep input order.
    out.sort_by(|a, b| spec.sort_by.compare(a, b));
    tracing::debug!(
        total = quests.len(),
        kept = out.len(),
        sort = %spec.sort_by,
        "filtered quests"
    );
    out
}

pub fn filter_and_sort(quests: &[Quest], spec: &QuestFilterSpec, now: DateTime<Utc>) -> Vec<Quest> {
    filter_and_sort_refs(quests, spec, now)
        .into_iter()
        .cloned()
        .collect()
}

/// Badge count: every selected bucket counts once, summed across dimensions.
pub fn active_filter_count(spec: &QuestFilterSpec) -> usize {
    spec.types.len() + spec.reward_range.len() + spec.urgency.len() + spec.availability.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
    }

    fn quest(id: &str, t: QuestType) -> Quest {
        Quest::new(id, format!("quest {id}"), t, now() + Duration::days(7))
    }

    fn ids(qs: &[Quest]) -> Vec<&str> {
        qs.iter().map(|q| q.id.as_str()).collect()
    }

    fn reward_buckets(reward: f64) -> Vec<RewardBucket> {
        RewardBucket::ALL.into_iter().filter(|b| b.contains(reward)).collect()
    }

    fn availability_of(current: u32, max: u32) -> Vec<AvailabilityBucket> {
        let p = Participants::new(current, max).unwrap();
        AvailabilityBucket::ALL.into_iter().filter(|b| b.contains(&p)).collect()
    }

    #[test]
    fn empty_spec_is_identity() {
        let quests = vec![
            quest("c", QuestType::Survey).with_reward(10.0),
            quest("a", QuestType::AppUx).with_reward(500.0),
            quest("b", QuestType::AdCampaign).with_reward(75.0),
        ];
        // all deadlines equal so the default deadline-asc sort keeps input order
        let out = filter_and_sort(&quests, &QuestFilterSpec::default(), now());
        assert_eq!(out, quests);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let mut spec = QuestFilterSpec::new();
        spec.toggle_type(QuestType::Survey);
        assert!(filter_and_sort(&[], &spec, now()).is_empty());
    }

    #[test]
    fn type_filter_keeps_exactly_the_selected_types() {
        let quests: Vec<Quest> = QuestType::ALL
            .into_iter()
            .enumerate()
            .map(|(i, t)| quest(&i.to_string(), t))
            .collect();
        let mut spec = QuestFilterSpec::new();
        spec.toggle_type(QuestType::Survey);
        spec.toggle_type(QuestType::AppUx);

        let out = filter_and_sort(&quests, &spec, now());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|q| spec.types.contains(&q.quest_type)));
        for q in &quests {
            let kept = out.iter().any(|o| o.id == q.id);
            assert_eq!(kept, spec.types.contains(&q.quest_type), "type {}", q.quest_type);
        }
    }

    #[test]
    fn reward_bucket_boundaries() {
        assert_eq!(reward_buckets(0.0), vec![RewardBucket::UpTo50]);
        assert_eq!(reward_buckets(50.0), vec![RewardBucket::UpTo50]);
        assert_eq!(reward_buckets(51.0), vec![RewardBucket::From51To100]);
        assert_eq!(reward_buckets(100.0), vec![RewardBucket::From51To100]);
        assert_eq!(reward_buckets(200.0), vec![RewardBucket::From101To200]);
        assert_eq!(reward_buckets(200.01), vec![RewardBucket::Over200]);
        // gaps between integer buckets match no bucket at all
        assert!(reward_buckets(50.5).is_empty());
        assert!(reward_buckets(100.5).is_empty());
    }

    #[test]
    fn reward_buckets_are_or_combined() {
        let quests = vec![
            quest("cheap", QuestType::Survey).with_reward(20.0),
            quest("mid", QuestType::Survey).with_reward(80.0),
            quest("rich", QuestType::Survey).with_reward(250.0),
        ];
        let mut spec = QuestFilterSpec::new();
        spec.toggle_reward(RewardBucket::UpTo50);
        spec.toggle_reward(RewardBucket::Over200);
        assert_eq!(ids(&filter_and_sort(&quests, &spec, now())), vec!["cheap", "rich"]);
    }

    #[test]
    fn availability_examples() {
        assert_eq!(availability_of(90, 100), vec![AvailabilityBucket::AlmostFull]);
        assert_eq!(availability_of(75, 100), vec![AvailabilityBucket::Limited]);
        assert_eq!(availability_of(50, 100), vec![AvailabilityBucket::Available]);
        assert_eq!(availability_of(232, 234), vec![AvailabilityBucket::AlmostFull]);
    }

    #[test]
    fn almost_full_takes_precedence_over_limited() {
        // 71% filled would be `limited`, but 4 remaining is `almost-full`
        assert_eq!(availability_of(10, 14), vec![AvailabilityBucket::AlmostFull]);
        // 10 remaining is in the limited range, but 90% filled is almost full
        assert_eq!(availability_of(90, 100), vec![AvailabilityBucket::AlmostFull]);
        assert_eq!(availability_of(85, 100), vec![AvailabilityBucket::Limited]);
        assert_eq!(availability_of(20, 200), vec![AvailabilityBucket::Available]);
        // 82.5% filled with 35 remaining is limited through the percentage range alone
        assert_eq!(availability_of(165, 200), vec![AvailabilityBucket::Limited]);
        assert_eq!(availability_of(185, 200), vec![AvailabilityBucket::AlmostFull]);
    }

    #[test]
    fn availability_buckets_partition_capacity() {
        for max in [0u32, 1, 7, 14, 30, 100, 1000] {
            for current in 0..=max {
                assert_eq!(availability_of(current, max).len(), 1, "{current}/{max}");
            }
        }
    }

    #[test]
    fn urgency_buckets_follow_literal_thresholds() {
        let n = now();
        let at = |d: Duration| -> Vec<UrgencyBucket> {
            UrgencyBucket::ALL
                .into_iter()
                .filter(|b| b.contains(n + d, n))
                .collect()
        };
        assert_eq!(at(Duration::hours(2)), vec![UrgencyBucket::Urgent]);
        assert_eq!(at(Duration::hours(24)), vec![UrgencyBucket::Soon]);
        assert_eq!(at(Duration::hours(36)), vec![UrgencyBucket::Soon]);
        assert_eq!(at(Duration::days(3)), vec![UrgencyBucket::Soon]);
        assert_eq!(at(Duration::days(3) + Duration::minutes(1)), vec![UrgencyBucket::Normal]);
        // expired quests match nothing
        assert!(at(Duration::zero()).is_empty());
        assert!(at(Duration::hours(-5)).is_empty());
    }

    #[test]
    fn urgency_quirk_between_3_and_24_hours() {
        // Known boundary quirk: the hour-based `urgent` test and the day-based
        // `soon` test do not share a boundary, so 3-23h out is urgent-only.
        let n = now();
        let q = quest("q", QuestType::Survey);
        let q = Quest { deadline: n + Duration::hours(10), ..q };
        assert!(UrgencyBucket::Urgent.contains(q.deadline, n));
        assert!(!UrgencyBucket::Soon.contains(q.deadline, n));

        let mut spec = QuestFilterSpec::new();
        spec.toggle_urgency(UrgencyBucket::Soon);
        assert!(!spec.matches(&q, n));
    }

    #[test]
    fn dimensions_are_anded() {
        let quests = vec![
            quest("match", QuestType::Survey).with_reward(30.0).with_participants(95, 100),
            quest("wrong-type", QuestType::AppUx).with_reward(30.0).with_participants(95, 100),
            quest("wrong-reward", QuestType::Survey).with_reward(90.0).with_participants(95, 100),
            quest("wrong-spots", QuestType::Survey).with_reward(30.0).with_participants(10, 100),
        ];
        let mut spec = QuestFilterSpec::new();
        spec.toggle_type(QuestType::Survey);
        spec.toggle_reward(RewardBucket::UpTo50);
        spec.toggle_availability(AvailabilityBucket::AlmostFull);
        assert_eq!(ids(&filter_and_sort(&quests, &spec, now())), vec!["match"]);
    }

    #[test]
    fn spots_asc_is_stable_on_ties() {
        let quests = vec![
            quest("first", QuestType::Survey).with_participants(80, 100),
            quest("roomy", QuestType::Survey).with_participants(0, 100),
            quest("second", QuestType::Survey).with_participants(30, 50),
            quest("tight", QuestType::Survey).with_participants(99, 100),
        ];
        let spec = QuestFilterSpec {
            sort_by: "spots-asc".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_and_sort(&quests, &spec, now())),
            vec!["tight", "first", "second", "roomy"]
        );
    }

    #[test]
    fn descending_sorts_are_stable_on_ties() {
        let quests = vec![
            quest("a", QuestType::Survey).with_reward(50.0),
            quest("b", QuestType::Survey).with_reward(100.0),
            quest("c", QuestType::Survey).with_reward(50.0),
        ];
        let spec = QuestFilterSpec {
            sort_by: SortBy::new(SortField::Reward, SortDirection::Desc),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&quests, &spec, now())), vec!["b", "a", "c"]);
    }

    #[test]
    fn deadline_desc_is_farthest_first() {
        let n = now();
        let mk = |id: &str, hours: i64| Quest::new(id, id, QuestType::Survey, n + Duration::hours(hours));
        let quests = vec![mk("mid", 48), mk("near", 2), mk("far", 200)];

        let desc = QuestFilterSpec {
            sort_by: "deadline-desc".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&quests, &desc, n)), vec!["far", "mid", "near"]);
        assert_eq!(
            ids(&filter_and_sort(&quests, &QuestFilterSpec::default(), n)),
            vec!["near", "mid", "far"]
        );
    }

    #[test]
    fn active_filter_count_is_literal_sum() {
        let mut spec = QuestFilterSpec::new();
        spec.toggle_type(QuestType::Survey);
        spec.toggle_type(QuestType::AppUx);
        spec.toggle_reward(RewardBucket::UpTo50);
        assert_eq!(active_filter_count(&spec), 3);

        spec.toggle_urgency(UrgencyBucket::Urgent);
        spec.toggle_availability(AvailabilityBucket::Limited);
        spec.toggle_availability(AvailabilityBucket::Available);
        assert_eq!(active_filter_count(&spec), 6);
    }

    #[test]
    fn toggle_and_clear() {
        let mut spec = QuestFilterSpec::new();
        spec.sort_by = "reward-desc".parse().unwrap();
        spec.toggle_reward(RewardBucket::Over200);
        spec.toggle_reward(RewardBucket::Over200);
        assert!(spec.reward_range.is_empty());

        spec.toggle_urgency(UrgencyBucket::Soon);
        spec.clear();
        assert_eq!(active_filter_count(&spec), 0);
        assert_eq!(spec.sort_by.to_string(), "reward-desc");
    }

    #[test]
    fn labels_parse_and_reject_unknowns() {
        assert_eq!("200+".parse::<RewardBucket>().unwrap(), RewardBucket::Over200);
        assert_eq!("Almost-Full".parse::<AvailabilityBucket>().unwrap(), AvailabilityBucket::AlmostFull);
        assert!(matches!(
            "overdue".parse::<UrgencyBucket>(),
            Err(QuestError::UnknownBucket { kind: "urgency", .. })
        ));
        assert!("spots-sideways".parse::<SortBy>().is_err());
        assert!("popularity-asc".parse::<SortBy>().is_err());
        for key in ["deadline-asc", "deadline-desc", "reward-asc", "reward-desc", "spots-asc", "spots-desc"] {
            assert_eq!(key.parse::<SortBy>().unwrap().to_string(), key);
        }
    }

    #[test]
    fn filter_spec_reads_source_json_shape() {
        let spec: QuestFilterSpec = serde_json::from_str(
            r#"{"types":["Survey"],"rewardRange":["0-50","200+"],"urgency":[],"availability":["limited"],"sortBy":"spots-desc"}"#,
        )
        .unwrap();
        assert_eq!(spec.types, vec![QuestType::Survey]);
        assert_eq!(spec.reward_range, vec![RewardBucket::UpTo50, RewardBucket::Over200]);
        assert_eq!(spec.sort_by, SortBy::new(SortField::Spots, SortDirection::Desc));
        assert_eq!(active_filter_count(&spec), 4);
    }
}
