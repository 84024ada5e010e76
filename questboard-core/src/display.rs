//! Display classifiers for quest rows: time left and spots left.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quest::Participants;
use crate::time::millis_until;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Normal,
    Warning,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRemaining {
    pub text: String,
    pub variant: Variant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantsDisplay {
    pub text: String,
    pub label: Option<&'static str>,
    pub variant: Variant,
}

fn ceil_div(n: i64, d: i64) -> i64 {
    (n + d - 1) / d
}

fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s left")
    } else {
        format!("{n} {unit} left")
    }
}

/// Relative time label until `deadline`, or the date when it is over a month out.
pub fn time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    const MINUTE: i64 = 60 * 1000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let ms = millis_until(deadline, now);
    if ms <= 0 {
        return TimeRemaining {
            text: "Expired".to_string(),
            variant: Variant::Urgent,
        };
    }

    let days = ceil_div(ms, DAY);
    if days > 30 {
        return TimeRemaining {
            text: deadline.format("%b %-d, %Y").to_string(),
            variant: Variant::Normal,
        };
    }

    // gated on a full day left so the hour and minute labels stay reachable
    if ms >= DAY {
        let variant = if days <= 3 { Variant::Warning } else { Variant::Normal };
        TimeRemaining {
            text: plural(days, "day"),
            variant,
        }
    } else if ms >= HOUR {
        TimeRemaining {
            text: plural(ceil_div(ms, HOUR), "hour"),
            variant: Variant::Urgent,
        }
    } else {
        TimeRemaining {
            text: plural(ceil_div(ms, MINUTE), "minute"),
            variant: Variant::Urgent,
        }
    }
}

pub fn participants_display(p: &Participants) -> ParticipantsDisplay {
    let text = format!("{}/{}", p.current, p.max);
    let filled = p.filled_percentage();
    let remaining = p.remaining();

    if filled >= 90.0 || remaining <= 5 {
        ParticipantsDisplay {
            text,
            label: Some("Almost Full"),
            variant: Variant::Urgent,
        }
    } else if filled >= 70.0 || remaining <= 20 {
        ParticipantsDisplay {
            text,
            label: Some("Limited Spots"),
            variant: Variant::Warning,
        }
    } else {
        ParticipantsDisplay {
            text,
            label: None,
            variant: Variant::Normal,
        }
    }
}
