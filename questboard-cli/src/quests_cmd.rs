use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use questboard_core::{
    active_filter_count, filter_and_sort_refs, participants_display, time::parse_local_to_utc,
    time_remaining, AvailabilityBucket, Quest, QuestFilterSpec, QuestType, RewardBucket, SortBy,
    UrgencyBucket,
};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct QuestsArgs {
    /// JSON file holding an array of quests
    #[arg(long)]
    pub file: PathBuf,

    /// Quest type label, e.g. "App UX" or "dine-review" (repeatable)
    #[arg(long = "type")]
    pub types: Vec<QuestType>,

    /// Reward bucket: 0-50, 51-100, 101-200, 200+ (repeatable)
    #[arg(long)]
    pub reward: Vec<RewardBucket>,

    /// Urgency bucket: urgent, soon, normal (repeatable)
    #[arg(long)]
    pub urgency: Vec<UrgencyBucket>,

    /// Availability bucket: almost-full, limited, available (repeatable)
    #[arg(long)]
    pub availability: Vec<AvailabilityBucket>,

    /// Sort key as <field>-<direction>, e.g. reward-desc
    #[arg(long, default_value = "deadline-asc")]
    pub sort: SortBy,

    /// Pin "now" to a local time ("YYYY-MM-DD HH:MM"); requires --tz
    #[arg(long, requires = "tz")]
    pub now: Option<String>,

    /// IANA timezone for --now, e.g. Asia/Taipei
    #[arg(long)]
    pub tz: Option<String>,

    /// Print the filtered quests as JSON
    #[arg(long)]
    pub json: bool,
}

impl QuestsArgs {
    fn filter_spec(&self) -> QuestFilterSpec {
        let mut spec = QuestFilterSpec::new();
        spec.sort_by = self.sort;
        // a repeated flag must not toggle the value back off
        for t in &self.types {
            if !spec.types.contains(t) {
                spec.toggle_type(*t);
            }
        }
        for b in &self.reward {
            if !spec.reward_range.contains(b) {
                spec.toggle_reward(*b);
            }
        }
        for b in &self.urgency {
            if !spec.urgency.contains(b) {
                spec.toggle_urgency(*b);
            }
        }
        for b in &self.availability {
            if !spec.availability.contains(b) {
                spec.toggle_availability(*b);
            }
        }
        spec
    }

    fn now(&self) -> Result<DateTime<Utc>> {
        match (&self.now, &self.tz) {
            (Some(local), Some(tz)) => parse_local_to_utc(local, tz),
            (Some(_), None) => bail!("--now needs --tz"),
            (None, _) => Ok(Utc::now()),
        }
    }
}

pub fn load_quests(path: &Path) -> Result<Vec<Quest>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let quests: Vec<Quest> =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    for q in &quests {
        q.validate().with_context(|| format!("in {}", path.display()))?;
    }
    Ok(quests)
}

fn render_row(q: &Quest, now: DateTime<Utc>) -> String {
    let time = time_remaining(q.deadline, now);
    let spots = participants_display(&q.participants);
    let spots = match spots.label {
        Some(label) => format!("{} ({label})", spots.text),
        None => spots.text,
    };
    format!(
        "{:<6} {:<22} ${:>8.2}  {:<16} {}",
        q.id,
        q.quest_type.label(),
        q.reward,
        time.text,
        spots
    )
}

pub fn run(args: QuestsArgs) -> Result<()> {
    let quests = load_quests(&args.file)?;
    let spec = args.filter_spec();
    let now = args.now()?;

    let shown = filter_and_sort_refs(&quests, &spec, now);
    tracing::debug!(loaded = quests.len(), shown = shown.len(), sort = %spec.sort_by, "quests listed");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!(
        "{} of {} quests | active filters: {} | sort: {}\n",
        shown.len(),
        quests.len(),
        active_filter_count(&spec),
        spec.sort_by
    );
    for q in &shown {
        println!("{}", render_row(q, now));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: QuestsArgs,
    }

    fn parse(argv: &[&str]) -> QuestsArgs {
        let mut full = vec!["quests", "--file", "q.json"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn flags_build_the_filter_spec() {
        let args = parse(&[
            "--type",
            "App UX",
            "--type",
            "survey",
            "--type",
            "survey",
            "--reward",
            "200+",
            "--availability",
            "limited",
            "--sort",
            "reward-desc",
        ]);
        let spec = args.filter_spec();
        assert_eq!(active_filter_count(&spec), 4);
        assert!(spec.types.contains(&QuestType::Survey));
        assert_eq!(spec.sort_by.to_string(), "reward-desc");
    }

    #[test]
    fn rejects_unknown_bucket_labels() {
        let argv = ["quests", "--file", "q.json", "--urgency", "asap"];
        assert!(Harness::try_parse_from(argv).is_err());
    }

    #[test]
    fn now_override_uses_timezone() {
        let args = parse(&["--now", "2026-02-19 20:00", "--tz", "Asia/Taipei"]);
        assert_eq!(
            args.now().unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn row_shows_time_and_spots_labels() {
        let now = Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap();
        let q = Quest::new("1", "Checkout flow", QuestType::AppUx, now + Duration::hours(3))
            .with_reward(120.0)
            .with_participants(232, 234);
        let row = render_row(&q, now);
        assert!(row.contains("App UX"));
        assert!(row.contains("$  120.00"));
        assert!(row.contains("3 hours left"));
        assert!(row.contains("(Almost Full)"));
    }
}
