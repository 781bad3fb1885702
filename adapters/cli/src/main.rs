#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Quiz Defence sessions headless.

mod placement;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quiz_defence_core::{Event, Question};
use quiz_defence_simulation::{Bootstrap, Session, SessionConfig, Tuning};

use crate::placement::TowerPlacement;

/// Quiz Defence headless runner.
#[derive(Debug, Parser)]
#[command(name = "quiz-defence", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a session to completion and prints the game-over record as JSON.
    Run(RunArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Session bootstrap payload (JSON).
    #[arg(long)]
    session: PathBuf,
    /// Optional balance and timing overrides (TOML).
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Tower to build before the first wave, as `kind@column,row`.
    #[arg(long = "tower", value_name = "KIND@COLUMN,ROW")]
    towers: Vec<TowerPlacement>,
    /// How quiz questions are answered.
    #[arg(long, value_enum, default_value_t = AnswerPolicy::Correct)]
    answers: AnswerPolicy,
    /// Simulated time after which the run is abandoned.
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,
    /// Print every simulation event as a JSON line.
    #[arg(long)]
    trace: bool,
}

/// Automatic answering strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AnswerPolicy {
    /// Always pick the correct option.
    Correct,
    /// Always pick a wrong option.
    Incorrect,
    /// Alternate, starting with a correct answer.
    Alternate,
}

impl AnswerPolicy {
    /// Option to submit for the `asked`-th question (zero-based), or `None`
    /// when the question has no wrong option to pick and should expire.
    fn choose(self, question: &Question, asked: usize) -> Option<usize> {
        let correct = match self {
            Self::Correct => true,
            Self::Incorrect => false,
            Self::Alternate => asked % 2 == 0,
        };
        if correct {
            return Some(question.correct_option_index);
        }
        (0..question.options.len()).find(|option| *option != question.correct_option_index)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(&args),
    }
}

fn load_config(args: &RunArgs) -> Result<SessionConfig> {
    let payload = fs::read_to_string(&args.session)
        .with_context(|| format!("failed to read {}", args.session.display()))?;
    let bootstrap = Bootstrap::from_json(&payload)
        .with_context(|| format!("invalid session payload in {}", args.session.display()))?;

    let tuning = match &args.tuning {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Tuning::from_toml(&text)
                .with_context(|| format!("invalid tuning in {}", path.display()))?
        }
        None => Tuning::default(),
    };

    Ok(SessionConfig::new(bootstrap).with_tuning(tuning))
}

fn run(args: &RunArgs) -> Result<()> {
    let mut session =
        Session::new(load_config(args)?).context("session configuration rejected")?;

    for placement in &args.towers {
        let tower = session
            .place_tower(placement.kind, placement.cell)
            .with_context(|| format!("cannot build {placement}"))?;
        log::info!("built tower {} at {placement}", tower.get());
    }

    let limit = Duration::from_secs(args.max_seconds);
    let frame = session.timestep();
    let mut elapsed = Duration::ZERO;
    let mut asked = 0;

    while session.outcome().is_none() {
        if elapsed >= limit {
            bail!("session did not conclude within {}s", args.max_seconds);
        }

        if let Some(question) = session.pending_question() {
            match args.answers.choose(question, asked) {
                Some(option) => {
                    let _ = session.submit_answer(option)?;
                }
                None => session.expire_question()?,
            }
            asked += 1;
        } else {
            session.advance(frame);
            elapsed += frame;
        }

        emit(&mut session, args.trace)?;
    }

    let outcome = session.outcome().context("session ended without a result")?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn emit(session: &mut Session, trace: bool) -> Result<()> {
    for event in session.drain_events() {
        if trace {
            println!("{}", serde_json::to_string(&event)?);
        } else if let Event::GameOver(outcome) = event {
            log::info!("game over: {outcome:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::QuestionId;

    fn question() -> Question {
        Question {
            id: QuestionId::new(1),
            prompt: "capital of France?".into(),
            options: vec!["Lyon".into(), "Paris".into(), "Nice".into()],
            correct_option_index: 1,
        }
    }

    #[test]
    fn policies_pick_the_expected_option() {
        let question = question();
        assert_eq!(AnswerPolicy::Correct.choose(&question, 3), Some(1));
        assert_eq!(AnswerPolicy::Incorrect.choose(&question, 0), Some(0));
        assert_eq!(AnswerPolicy::Alternate.choose(&question, 0), Some(1));
        assert_eq!(AnswerPolicy::Alternate.choose(&question, 1), Some(0));
    }

    #[test]
    fn single_option_questions_expire_instead_of_failing() {
        let question = Question {
            options: vec!["only".into()],
            correct_option_index: 0,
            ..question()
        };
        assert_eq!(AnswerPolicy::Incorrect.choose(&question, 0), None);
    }

    #[test]
    fn cli_arguments_parse() {
        let cli = Cli::try_parse_from([
            "quiz-defence",
            "run",
            "--session",
            "demos/session.json",
            "--tower",
            "arrow@2,1",
            "--tower",
            "frost@5,3",
            "--answers",
            "alternate",
        ])
        .expect("valid arguments");
        let CliCommand::Run(args) = cli.command;
        assert_eq!(args.towers.len(), 2);
        assert_eq!(args.answers, AnswerPolicy::Alternate);
        assert_eq!(args.max_seconds, 900);
        assert!(args.tuning.is_none());
    }
}
