use anyhow::Result;
use clap::Args;
use questboard_core::{
    DraftField, DraftSession, QuestDraft, QuestDraftSuggestion, QuestModel, QuestType,
    SendOutcome, TargetAudience, FALLBACK_REPLY, GREETING,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Quest type label, e.g. "Survey"
    #[arg(long = "type")]
    pub quest_type: Option<QuestType>,

    #[arg(long)]
    pub budget: Option<f64>,

    /// Target audience, e.g. foodies
    #[arg(long)]
    pub audience: Option<TargetAudience>,
}

impl DraftArgs {
    fn initial_draft(&self) -> QuestDraft {
        let mut d = QuestDraft::default();
        if let Some(t) = &self.title {
            d.title = t.clone();
        }
        if let Some(desc) = &self.description {
            d.description = desc.clone();
        }
        d.quest_type = self.quest_type;
        if let Some(b) = self.budget {
            d.budget = b;
        }
        if let Some(a) = self.audience {
            d.target_audience = a;
        }
        d
    }
}

/// Daily transcript under `~/.questboard/drafts/`.
struct Transcript {
    path: PathBuf,
}

impl Transcript {
    fn open_today() -> Result<Self> {
        let dir = crate::state::ensure_questboard_home()?.join("drafts");
        std::fs::create_dir_all(&dir)?;
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        Ok(Self {
            path: dir.join(format!("{today}.md")),
        })
    }

    fn append(&self, role: &str, msg: &str) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            f,
            "- {} [{}] {}",
            chrono::Utc::now().to_rfc3339(),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

enum Command<'a> {
    Send(&'a str),
    Apply,
    Show,
    Review,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "/apply" => Command::Apply,
        "/show" => Command::Show,
        "/review" => Command::Review,
        "/help" | "/?" => Command::Help,
        "/quit" | "/exit" | "/q" => Command::Quit,
        _ if line.starts_with('/') => Command::Unknown(line),
        _ => Command::Send(line),
    }
}

fn format_draft(d: &QuestDraft) -> String {
    format!(
        "Title:       {}\nDescription: {}\nType:        {}\nBudget:      {:.2} {}\nTarget:      {} participants, {}",
        or_dash(&d.title),
        or_dash(&d.description),
        d.quest_type_label(),
        d.budget,
        d.currency,
        d.participant_target,
        d.target_audience.label()
    )
}

fn format_suggestion(s: &QuestDraftSuggestion) -> String {
    let mut out = String::new();
    if let Some(t) = &s.title {
        out.push_str(&format!("  title:    {t}\n"));
    }
    out.push_str(&format!("  details:  {}\n", s.description));
    if let Some(t) = s.quest_type {
        out.push_str(&format!("  type:     {}\n", t.label()));
    }
    if let Some(b) = s.budget {
        out.push_str(&format!("  budget:   {b:.2}\n"));
    }
    if let Some(a) = s.target_audience {
        out.push_str(&format!("  audience: {}\n", a.label()));
    }
    out
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn review(d: &QuestDraft) -> String {
    match d.validate() {
        Ok(()) => "Draft looks good.".to_string(),
        Err(errs) => {
            let mut out = format!("{errs}\n");
            for field in [DraftField::Title, DraftField::Description, DraftField::Budget] {
                if let Some(msg) = errs.get(field) {
                    out.push_str(&format!("  {field}: {msg}\n"));
                }
            }
            out
        }
    }
}

const HELP: &str = "Type a message to talk to the assistant.\n  /apply   use the last suggested draft\n  /show    print the current draft\n  /review  check the draft before publishing\n  /quit    leave (or Ctrl-D / Ctrl-C at the prompt)\nCtrl-C while the assistant is thinking cancels that request.";

/// What the assistant said for the transcript. `None` outcome means the request was cancelled.
fn assistant_reply(outcome: Option<&SendOutcome>) -> Option<String> {
    match outcome {
        None | Some(SendOutcome::Failed) => Some(FALLBACK_REPLY.to_string()),
        Some(SendOutcome::Question(q)) => Some(q.clone()),
        Some(SendOutcome::Draft(s)) => Some(s.description.clone()),
        Some(SendOutcome::Busy | SendOutcome::Ignored) => None,
    }
}

pub async fn run(args: DraftArgs, model: &dyn QuestModel) -> Result<()> {
    let mut session = DraftSession::open(args.initial_draft());
    let log = Transcript::open_today()?;
    log.append("system", "session_start")?;

    println!("assistant> {GREETING}");
    println!("(/help for commands)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush().ok();

        // after the first ctrl_c() SIGINT no longer ends the process, so the prompt exits on it
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        session.set_composing(&line);

        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Show => println!("{}", format_draft(session.draft())),
            Command::Review => print!("{}", review(session.draft())),
            Command::Apply => {
                if session.apply_last_suggestion() {
                    log.append("system", "applied suggestion")?;
                    println!("Applied.\n{}", format_draft(session.draft()));
                } else {
                    println!("Nothing to apply yet.");
                }
            }
            Command::Unknown(cmd) => println!("Unknown command {cmd}. Try /help."),
            Command::Send(msg) => {
                if msg.is_empty() {
                    continue;
                }
                log.append("user", msg)?;
                println!("assistant> ...thinking (Ctrl-C to cancel)");

                let outcome = tokio::select! {
                    out = session.send(msg, model) => Some(out),
                    _ = tokio::signal::ctrl_c() => None,
                };

                if let Some(reply) = assistant_reply(outcome.as_ref()) {
                    log.append("assistant", &reply)?;
                }
                match outcome {
                    None => {
                        session.cancel_pending();
                        println!("assistant> {FALLBACK_REPLY}");
                    }
                    Some(SendOutcome::Question(q)) => println!("assistant> {q}"),
                    Some(SendOutcome::Draft(s)) => {
                        println!("assistant> Here's a draft:\n{}", format_suggestion(&s));
                        println!("Type /apply to use it.");
                    }
                    Some(SendOutcome::Failed) => println!("assistant> {FALLBACK_REPLY}"),
                    Some(SendOutcome::Busy | SendOutcome::Ignored) => {}
                }
            }
        }
    }

    log.append("system", "session_end")?;
    println!("\nFinal draft:\n{}", format_draft(session.draft()));
    Ok(())
}
