use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use smritify::{AnswerGenerator, Config, Deck, QuestionStore, Smritify, SmritifyError, telemetry};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Flashcard study in the terminal", long_about = None)]
struct Cli {
    /// SQLite database file (overrides SMRITIFY_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Study questions interactively (default)
    Study(DeckArgs),
    /// Add a question
    Add {
        #[arg(short, long, value_parser = non_blank)]
        question: String,
        #[arg(short, long, value_parser = non_blank)]
        subject: String,
        #[arg(short, long)]
        answer: Option<String>,
    },
    /// Print stored questions
    List {
        #[command(flatten)]
        deck: DeckArgs,
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the completion service for study questions
    Suggest {
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        topic: String,
        /// Store each suggestion as an unanswered question
        #[arg(long)]
        save: bool,
    },
}

fn non_blank(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("must not be blank".to_string());
    }
    Ok(value.to_string())
}

#[derive(Args, Debug, Default)]
struct DeckArgs {
    /// Only questions with this subject
    #[arg(long, conflicts_with_all = ["bookmarked", "unanswered"])]
    subject: Option<String>,
    /// Only bookmarked questions
    #[arg(long, conflicts_with = "unanswered")]
    bookmarked: bool,
    /// Only questions without an answer
    #[arg(long)]
    unanswered: bool,
}

impl DeckArgs {
    fn deck(&self) -> Deck {
        if let Some(subject) = &self.subject {
            Deck::Subject(subject.clone())
        } else if self.bookmarked {
            Deck::Bookmarked
        } else if self.unanswered {
            Deck::Unanswered
        } else {
            Deck::All
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), SmritifyError> {
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command.unwrap_or(Command::Study(DeckArgs::default())) {
        Command::Study(args) => {
            telemetry::init_file(&config.log_path)?;
            info!("Starting study session on {}", config.db_path.display());
            Smritify::open(&config, args.deck())?.run().await
        }
        Command::Add {
            question,
            subject,
            answer,
        } => {
            telemetry::init_stderr();
            let store = QuestionStore::open(&config.db_path)?;
            let id = store.add(&question, answer.as_deref(), &subject)?;
            println!("{}", id);
            Ok(())
        }
        Command::List { deck, json } => {
            telemetry::init_stderr();
            let store = QuestionStore::open(&config.db_path)?;
            let records = store.list_deck(&deck.deck())?;
            if json {
                let out = serde_json::to_string_pretty(&records)
                    .map_err(|e| SmritifyError::Io(e.into()))?;
                println!("{}", out);
                return Ok(());
            }
            for record in records {
                let flags = format!(
                    "{}{}",
                    if record.is_bookmarked { "B" } else { "-" },
                    if record.is_understood { "U" } else { "-" },
                );
                println!(
                    "{:>4}  {}  [{}]  {}\n      {}",
                    record.id,
                    flags,
                    record.subject,
                    record.question,
                    record.answer.as_deref().unwrap_or("(no answer)")
                );
            }
            Ok(())
        }
        Command::Suggest {
            subject,
            topic,
            save,
        } => {
            telemetry::init_stderr();
            let generator = AnswerGenerator::new(config.generator.clone())?;
            let suggestions = generator.suggest_questions(&subject, &topic).await?;

            let store = if save && generator.is_enabled() {
                Some(QuestionStore::open(&config.db_path)?)
            } else {
                None
            };
            for suggestion in &suggestions {
                println!("{}", suggestion);
                if let Some(store) = &store {
                    store.add(suggestion, None, &subject)?;
                }
            }
            Ok(())
        }
    }
}
