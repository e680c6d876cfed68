//! Terminal chat over the social media analysis workflow
//!
//! Run with: cargo run -p social-insights --bin social-insights-chat

use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use social_insights::chat::SAMPLE_QUESTIONS;
use social_insights::providers::LangflowClient;
use social_insights::types::Role;
use social_insights::{ChatConfig, ChatSession, TurnOutcome, TurnState};
use std::sync::Arc;
use std::time::Duration;

/// Ask questions about your social media engagement data.
///
/// Settings come from the environment (LANGFLOW_ID, APPLICATION_TOKEN, ...).
#[derive(Parser)]
#[command(name = "social-insights-chat", version, about, long_about = None)]
struct Args {
    /// Flow endpoint name (overrides LANGFLOW_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,
}

enum Command {
    Ask(String),
    Clear,
    Samples,
    History,
    Quit,
    Nothing,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Nothing,
            "/clear" => Self::Clear,
            "/samples" => Self::Samples,
            "/history" => Self::History,
            "/quit" | "/exit" => Self::Quit,
            text => Self::Ask(text.to_string()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    social_insights::logging::init("social_insights_chat");

    let args = Args::parse();
    let mut config = ChatConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let client = LangflowClient::new(&config)?;
    tracing::info!("Using flow at {}", client.run_url());
    let mut session = ChatSession::new(Arc::new(client));

    let term = Term::stdout();
    print_banner(&term)?;
    print_samples(&term)?;

    loop {
        term.write_str(&format!("{} ", style("you>").green().bold()))?;
        let mut line = String::new();
        // EOF ends the session
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        match Command::parse(&line) {
            Command::Nothing => continue,
            Command::Quit => break,
            Command::Clear => {
                session.clear();
                term.write_line(&style("Chat cleared.").dim().to_string())?;
            }
            Command::Samples => print_samples(&term)?,
            Command::History => {
                for turn in session.transcript().turns() {
                    print_turn(&term, turn.role, &turn.content)?;
                }
            }
            Command::Ask(question) => {
                let pending = session.begin_turn(&question);
                let spinner = (session.state() == TurnState::AwaitingResponse)
                    .then(analyzing_spinner);
                let result = pending.response().await;
                let outcome = session.finish_turn(result);
                if let Some(spinner) = spinner {
                    spinner.finish_and_clear();
                }

                match outcome {
                    TurnOutcome::Answer(answer) => print_turn(&term, Role::Assistant, &answer)?,
                    TurnOutcome::Failed(message) => {
                        term.write_line(&style(message).red().to_string())?
                    }
                }
            }
        }
    }

    Ok(())
}

fn analyzing_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Analyzing...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_banner(term: &Term) -> std::io::Result<()> {
    term.write_line(&style("Websitians | Social Media Analytics").green().bold().to_string())?;
    term.write_line("")?;
    term.write_line("Ask questions about your social media engagement data:")?;
    term.write_line("  - Performance metrics")?;
    term.write_line("  - Trend analysis")?;
    term.write_line("  - Content recommendations")?;
    term.write_line("")?;
    term.write_line(
        &style("Commands: /samples, /history, /clear, /quit")
            .dim()
            .to_string(),
    )
}

fn print_samples(term: &Term) -> std::io::Result<()> {
    term.write_line(&style("Sample questions").bold().to_string())?;
    for (label, question) in SAMPLE_QUESTIONS {
        term.write_line(&format!("  {}: {}", style(label).cyan(), question))?;
    }
    term.write_line("")
}

fn print_turn(term: &Term, role: Role, content: &str) -> std::io::Result<()> {
    let prefix = match role {
        Role::User => style("you>").green().bold(),
        Role::Assistant => style("assistant>").blue().bold(),
    };
    term.write_line(&format!("{prefix} {content}"))
}
