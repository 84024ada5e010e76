use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use questboard_core::{
    active_filter_count, filter_and_sort, filter_and_sort_refs, participants_display, time_remaining,
    AvailabilityBucket, DraftSession, Quest, QuestDraft, QuestFilterSpec, QuestModel, QuestType,
    RewardBucket, SendOutcome, TargetAudience, UrgencyBucket,
};
use std::path::PathBuf;
use std::sync::Mutex;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("quests.json")
}

fn load_quests() -> Vec<Quest> {
    let raw = std::fs::read_to_string(fixture_path()).unwrap();
    let quests: Vec<Quest> = serde_json::from_str(&raw).unwrap();
    for q in &quests {
        q.validate().unwrap();
    }
    quests
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
}

fn ids(qs: &[Quest]) -> Vec<&str> {
    qs.iter().map(|q| q.id.as_str()).collect()
}

fn spec(sort: &str) -> QuestFilterSpec {
    QuestFilterSpec {
        sort_by: sort.parse().unwrap(),
        ..Default::default()
    }
}

#[test]
fn default_view_is_soonest_deadline_first() {
    let quests = load_quests();
    let out = filter_and_sort(&quests, &QuestFilterSpec::default(), now());
    assert_eq!(ids(&out), vec!["7", "1", "2", "3", "6", "4", "5"]);
}

#[test]
fn urgency_buckets_over_fixture() {
    let quests = load_quests();

    let mut s = QuestFilterSpec::new();
    s.toggle_urgency(UrgencyBucket::Urgent);
    assert_eq!(ids(&filter_and_sort(&quests, &s, now())), vec!["1", "2"]);

    // quest 2 is 16h out: urgent, but the day-based `soon` test excludes it
    let mut s = QuestFilterSpec::new();
    s.toggle_urgency(UrgencyBucket::Soon);
    assert_eq!(ids(&filter_and_sort(&quests, &s, now())), vec!["3"]);

    let mut s = QuestFilterSpec::new();
    s.toggle_urgency(UrgencyBucket::Normal);
    assert_eq!(ids(&filter_and_sort(&quests, &s, now())), vec!["6", "4", "5"]);
}

#[test]
fn cheap_and_limited_quests() {
    let quests = load_quests();
    let mut s = QuestFilterSpec::new();
    s.toggle_reward(RewardBucket::UpTo50);
    assert_eq!(ids(&filter_and_sort(&quests, &s, now())), vec!["7", "2", "3"]);

    s.toggle_availability(AvailabilityBucket::Limited);
    assert_eq!(ids(&filter_and_sort(&quests, &s, now())), vec!["2", "3"]);
    assert_eq!(active_filter_count(&s), 2);
}

#[test]
fn spots_and_reward_sorts() {
    let quests = load_quests();
    assert_eq!(
        ids(&filter_and_sort(&quests, &spec("spots-asc"), now())),
        vec!["7", "1", "3", "2", "5", "6", "4"]
    );
    // 2 and 7 tie on reward 25 and keep their input order
    assert_eq!(
        ids(&filter_and_sort(&quests, &spec("reward-desc"), now())),
        vec!["5", "4", "1", "6", "3", "2", "7"]
    );
}

#[test]
fn type_filter_and_badge_count() {
    let quests = load_quests();
    let mut s = QuestFilterSpec::new();
    s.toggle_type(QuestType::AppUx);
    let refs = filter_and_sort_refs(&quests, &s, now());
    assert_eq!(refs.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(), vec!["7", "1"]);

    s.toggle_type(QuestType::Survey);
    s.toggle_reward(RewardBucket::UpTo50);
    assert_eq!(active_filter_count(&s), 3);
}

#[test]
fn row_labels_for_fixture() {
    let quests = load_quests();
    let q1 = &quests[0];
    assert_eq!(time_remaining(q1.deadline, now()).text, "3 hours left");
    assert_eq!(participants_display(&q1.participants).label, Some("Almost Full"));

    let expired = &quests[6];
    assert!(expired.is_expired(now()));
    assert_eq!(time_remaining(expired.deadline, now()).text, "Expired");
}

struct OneShot(Mutex<Option<String>>);

#[async_trait]
impl QuestModel for OneShot {
    async fn suggest(&self, _instructions: &str, _prompt: &str) -> anyhow::Result<String> {
        self.0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow::anyhow!("model already answered"))
    }
}

#[tokio::test]
async fn drafted_quest_passes_review() {
    let model = OneShot(Mutex::new(Some(
        r#"```json
{"title":"Cold Brew Tasting Night","description":"Taste three cold brew blends at our cafe and rate aroma, body and finish.","questType":"Dine & Review","budget":900,"targetAudience":"foodies"}
```"#
            .to_string(),
    )));

    let mut session = DraftSession::open(QuestDraft::default());
    assert!(session.draft().validate().is_err());

    let out = session
        .send("We want foodies to rate our cold brew, budget $900", &model)
        .await;
    assert!(matches!(out, SendOutcome::Draft(_)));
    assert!(session.apply_last_suggestion());

    let draft = session.into_draft();
    assert_eq!(draft.quest_type, Some(QuestType::DineAndReview));
    assert_eq!(draft.target_audience, TargetAudience::Foodies);
    assert!(draft.validate().is_ok());
}

#[tokio::test]
async fn model_outage_leaves_draft_untouched() {
    let model = OneShot(Mutex::new(None));
    let start = QuestDraft {
        title: "Sneaker survey".to_string(),
        ..Default::default()
    };
    let mut session = DraftSession::open(start.clone());
    assert_eq!(session.send("make it punchier", &model).await, SendOutcome::Failed);
    assert_eq!(session.draft(), &start);
    assert!(!session.can_apply());
}
