//! Terminal front end for odd-friend.
//!
//! Plays the part of the app screens: loads content, shows the friend,
//! and reads one command per line from stdin.
//!
//! ## Usage
//!
//! ```bash
//! # Bundled words and faces, silent speech
//! odd-friend
//!
//! # Own content, speaking through the system voice
//! odd-friend --words words.json --assets ./faces --system-voice
//!
//! # Scripted session
//! printf 'next\nlike\nstats\nquit\n' | odd-friend --seed 7
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use friend_speaks::{EngineFactory, Transcript, TranscriptFactory};
use odd_friend::{
    AppSession, ConfigError, FaceSource, Friend, ImageCompositor, LOAD_FAILED_NOTICE,
    SHARE_FAILED_NOTICE, SessionConfig, SessionError, ShareError, ShareIntent, ShareTarget,
    SwipeDirection, WordSource,
};
use owo_colors::{OwoColorize, Stream};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Make odd friends in the terminal
#[derive(Parser, Debug)]
#[command(name = "odd-friend", version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// JSON word list with `adjectives`, `verbs` and `nouns` arrays
    #[arg(long, value_name = "PATH")]
    words: Option<PathBuf>,

    /// Folder with `heads/`, `eyes/` and `mouths/` image folders
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Where shared snapshots are written
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// JSON session config; flags override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for friends and voices
    #[arg(long)]
    seed: Option<u64>,

    /// Pick a random locale, voice, pitch and rate for every sentence
    #[arg(long)]
    random_voice: bool,

    /// Speak through the system text-to-speech engine
    #[cfg(feature = "system")]
    #[arg(long)]
    system_voice: bool,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

const AFTER_HELP: &str = "\
COMMANDS (one per line on stdin):
  next            show the next friend
  like | dislike  swipe right or left
  drag <amount>   add horizontal drag to the current gesture
  release         end the gesture; past 100 either way is a swipe
  share           write a PNG snapshot and share it
  stats [json]    show feedback counts
  mute | unmute   stop or resume speaking
  quit            leave
";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{notice} ({0})", notice = LOAD_FAILED_NOTICE)]
    Load(SessionError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("failed to read commands: {0}")]
    Stdin(#[from] std::io::Error),
}

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Next,
    Swipe(SwipeDirection),
    Drag(f32),
    Release,
    Share,
    Stats { json: bool },
    Mute(bool),
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("next" | "n", None) => Command::Next,
            ("like" | "right", None) => Command::Swipe(SwipeDirection::Right),
            ("dislike" | "left", None) => Command::Swipe(SwipeDirection::Left),
            ("drag", Some(amount)) => Command::Drag(
                amount
                    .parse()
                    .map_err(|_| format!("not a drag amount: {amount}"))?,
            ),
            ("drag", None) => return Err("usage: drag <amount>".to_string()),
            ("release", None) => Command::Release,
            ("share", None) => Command::Share,
            ("stats", None) => Command::Stats { json: false },
            ("stats", Some("json")) => Command::Stats { json: true },
            ("mute", None) => Command::Mute(true),
            ("unmute", None) => Command::Mute(false),
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            _ => return Err(format!("unknown command: {}", line.trim())),
        };
        Ok(Some(command))
    }
}

/// Prints the intent instead of opening a share sheet.
struct TerminalShare;

impl ShareTarget for TerminalShare {
    fn dispatch(&self, intent: &ShareIntent) -> Result<(), ShareError> {
        println!(
            "{}: {} ({})",
            intent.chooser_title,
            intent.path.display(),
            intent.mime
        );
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn session_config(cli: &Cli) -> Result<SessionConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    if let Some(path) = &cli.words {
        config = config.with_words(WordSource::File(path.clone()));
    }
    if let Some(dir) = &cli.assets {
        config = config.with_faces(FaceSource::Folder(dir.clone()));
    }
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.random_voice {
        config.speech.randomize = true;
    }
    Ok(config)
}

fn print_friend(friend: &Friend) {
    println!(
        "{}",
        friend
            .sentence
            .to_string()
            .if_supports_color(Stream::Stdout, |text| text.bold())
    );
    println!(
        "  {}",
        friend
            .face
            .to_string()
            .if_supports_color(Stream::Stdout, |text| text.dimmed())
    );
}

fn print_notice(message: &str) {
    println!(
        "{}",
        message.if_supports_color(Stream::Stdout, |text| text.yellow())
    );
}

fn print_stats<F: EngineFactory>(session: &AppSession<F>, json: bool) {
    if json {
        match serde_json::to_string_pretty(session.tally()) {
            Ok(report) => println!("{report}"),
            Err(err) => print_notice(&format!("failed to encode stats: {err}")),
        }
        return;
    }

    if session.tally().is_empty() {
        print_notice("no feedback yet");
        return;
    }
    for (key, stats) in session.tally().entries() {
        println!(
            "{key:<24} {} {} {}",
            format!("+{}", stats.likes).if_supports_color(Stream::Stdout, |t| t.green()),
            format!("-{}", stats.dislikes).if_supports_color(Stream::Stdout, |t| t.red()),
            format!("={}", stats.neutrals).if_supports_color(Stream::Stdout, |t| t.dimmed()),
        );
    }
}

async fn run<F: EngineFactory>(config: SessionConfig, factory: F) -> Result<(), CliError> {
    let mut session = AppSession::load(config, factory)
        .await
        .map_err(CliError::Load)?;

    if let Err(SessionError::SpeechNotReady) = session.enter_main() {
        print_notice(&SessionError::SpeechNotReady.to_string());
        session.speech().ready().await;
        session.enter_main()?;
    }
    print_friend(session.friend());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                print_notice(&message);
                continue;
            }
        };
        debug!(?command, "command");

        match command {
            Command::Next => print_friend(session.next()?),
            Command::Swipe(direction) => print_friend(session.swipe(direction)?),
            Command::Drag(amount) => session.drag(amount),
            Command::Release => {
                if session.release()?.is_some() {
                    print_friend(session.friend());
                }
            }
            Command::Share => {
                if session
                    .share(&ImageCompositor::new(), &TerminalShare)
                    .await
                    .is_err()
                {
                    print_notice(SHARE_FAILED_NOTICE);
                }
            }
            Command::Stats { json } => print_stats(&session, json),
            Command::Mute(muted) => session.set_muted(muted),
            Command::Help => print!("{AFTER_HELP}"),
            Command::Quit => break,
        }
    }

    session.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match session_config(&cli) {
        Ok(config) => start(&cli, config).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} {err}",
                "error:".if_supports_color(Stream::Stderr, |text| text.red())
            );
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "system")]
async fn start(cli: &Cli, config: SessionConfig) -> Result<(), CliError> {
    if cli.system_voice {
        info!("using the system speech engine");
        return run(config, friend_speaks::SystemFactory).await;
    }
    silent(config).await
}

#[cfg(not(feature = "system"))]
async fn start(_cli: &Cli, config: SessionConfig) -> Result<(), CliError> {
    silent(config).await
}

async fn silent(config: SessionConfig) -> Result<(), CliError> {
    info!("speech goes to an in-memory transcript");
    run(config, TranscriptFactory::new(Transcript::default())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(Command::parse("next"), Ok(Some(Command::Next)));
        assert_eq!(
            Command::parse("  LIKE "),
            Ok(Some(Command::Swipe(SwipeDirection::Right)))
        );
        assert_eq!(
            Command::parse("dislike"),
            Ok(Some(Command::Swipe(SwipeDirection::Left)))
        );
        assert_eq!(Command::parse("mute"), Ok(Some(Command::Mute(true))));
        assert_eq!(Command::parse("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn parses_drag_amounts() {
        assert_eq!(Command::parse("drag -120.5"), Ok(Some(Command::Drag(-120.5))));
        assert!(Command::parse("drag far").is_err());
        assert!(Command::parse("drag").is_err());
    }

    #[test]
    fn stats_can_be_json() {
        assert_eq!(
            Command::parse("stats json"),
            Ok(Some(Command::Stats { json: true }))
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            Command::parse("dance"),
            Err("unknown command: dance".to_string())
        );
        assert!(Command::parse("next please").is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let cli = Cli::parse_from([
            "odd-friend",
            "--words",
            "words.json",
            "--seed",
            "9",
            "--random-voice",
        ]);
        let config = session_config(&cli).unwrap();
        assert_eq!(config.words, WordSource::File("words.json".into()));
        assert_eq!(config.faces, FaceSource::Bundled);
        assert_eq!(config.seed, Some(9));
        assert!(config.speech.randomize);
    }
}
