mod app;
mod catalog;
mod config;
mod constants;
mod controller;
mod form;
mod input;
mod profile;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use catalog::{DeezerClient, Track};
use config::{Config, Overrides, Settings};
use constants::constants;
use controller::SearchController;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Directory holding the saved profile (default: platform data dir)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Seconds between popular-track refreshes
  #[arg(long, global = true)]
  poll_interval: Option<u64>,

  /// Catalog API base URL
  #[arg(long, global = true)]
  api_base: Option<String>,

  /// Log filter used when RUST_LOG is unset (e.g. "debug", "dzr=trace")
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the current popular tracks and exit
  Chart,
  /// Search the catalog once and print the results
  Search {
    #[arg(required = true)]
    query: Vec<String>,
  },
  /// Print shell completions
  Completions { shell: Shell },
}

// --- Logging ---

const DEFAULT_LOG_FILTER: &str = "info,dzr=debug,hyper_util=warn,reqwest=warn,hyper=warn";

/// RUST_LOG wins, then `--log-level`, then the built-in default.
fn log_filter(log_level: Option<&str>) -> Result<EnvFilter> {
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    return Ok(filter);
  }
  let directives = log_level.unwrap_or(DEFAULT_LOG_FILTER);
  EnvFilter::try_new(directives).with_context(|| format!("Invalid log level '{}'", directives))
}

/// Log to a daily-rolling file; the terminal belongs to the UI.
fn init_logging(log_level: Option<&str>) -> Result<WorkerGuard> {
  let log_dir = config::log_dir();
  std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;

  let file_appender = tracing_appender::rolling::daily(&log_dir, &constants().log_file);
  let (writer, guard) = tracing_appender::non_blocking(file_appender);

  let filter = log_filter(log_level)?;
  tracing_subscriber::fmt().with_writer(writer).with_env_filter(filter).with_ansi(false).with_target(true).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(Command::Completions { shell }) = args.command {
    clap_complete::generate(shell, &mut Args::command(), "dzr", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging(args.log_level.as_deref())?;
  tracing::info!(version = env!("CARGO_PKG_VERSION"), "dzr starting");

  let config = Config::load();
  let overrides =
    Overrides { data_dir: args.data_dir, poll_interval_secs: args.poll_interval, api_base_url: args.api_base };
  let settings = Settings::resolve(&config, &overrides);

  match args.command {
    Some(Command::Chart) => print_once(&settings, None).await,
    Some(Command::Search { query }) => print_once(&settings, Some(query.join(" "))).await,
    Some(Command::Completions { .. }) => Ok(()),
    None => run_tui(settings, config).await,
  }
}

/// One-shot fetch through the same controller the UI uses.
async fn print_once(settings: &Settings, query: Option<String>) -> Result<()> {
  let catalog = Arc::new(DeezerClient::new(settings.api_base_url.clone()));
  let mut controller = SearchController::new(catalog, settings.popular_limit);

  match query {
    Some(q) => {
      controller.set_query(q);
      if !controller.submit_query() {
        println!("Nothing to search for.");
        return Ok(());
      }
    }
    None => controller.fetch_popular(),
  }
  controller.settle_next().await;

  for line in result_lines(&controller.session().results) {
    println!("{}", line);
  }
  Ok(())
}

/// A failed fetch leaves no results behind, so it prints the same notice as an empty one.
fn result_lines(tracks: &[Track]) -> Vec<String> {
  if tracks.is_empty() {
    return vec!["No tracks.".to_string()];
  }
  tracks.iter().enumerate().map(|(i, track)| format_track_line(i + 1, track)).collect()
}

fn format_track_line(n: usize, track: &Track) -> String {
  format!(
    "{:>2}. {} · {} [{}] {}  {}",
    n,
    track.title,
    track.artist.name,
    track.album.title,
    track.duration_label(),
    track.link
  )
}

async fn run_tui(settings: Settings, config: Config) -> Result<()> {
  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let mut app = App::new(&settings, config);
  let result = run(&mut terminal, &mut app).await;
  app.shutdown();
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  tracing::info!("dzr exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use catalog::{Album, Artist};

  #[test]
  fn cli_parses_search_words() {
    let args = Args::try_parse_from(["dzr", "--poll-interval", "30", "search", "drake", "forever"]).unwrap();
    assert_eq!(args.poll_interval, Some(30));
    match args.command {
      Some(Command::Search { query }) => assert_eq!(query.join(" "), "drake forever"),
      other => panic!("expected search, got {:?}", other),
    }
  }

  #[test]
  fn cli_accepts_log_level_anywhere() {
    let args = Args::try_parse_from(["dzr", "--log-level", "debug"]).unwrap();
    assert_eq!(args.log_level.as_deref(), Some("debug"));
    let args = Args::try_parse_from(["dzr", "chart", "--log-level", "warn"]).unwrap();
    assert_eq!(args.log_level.as_deref(), Some("warn"));
  }

  #[test]
  fn log_level_must_parse() {
    if std::env::var_os("RUST_LOG").is_some() {
      return;
    }
    assert!(log_filter(Some("dzr=trace")).is_ok());
    assert!(log_filter(None).is_ok());
    assert!(log_filter(Some("dzr=loud")).is_err());
  }

  #[tokio::test]
  async fn failed_chart_prints_empty_notice() {
    let catalog = Arc::new(catalog::fake::FakeCatalog::failing());
    let mut controller = SearchController::new(catalog, 5);
    controller.fetch_popular();
    controller.settle_next().await;
    assert_eq!(result_lines(&controller.session().results), vec!["No tracks.".to_string()]);
  }

  #[test]
  fn cli_search_requires_query() {
    assert!(Args::try_parse_from(["dzr", "search"]).is_err());
  }

  #[test]
  fn cli_definition_is_valid() {
    Args::command().debug_assert();
  }

  #[test]
  fn track_line_format() {
    let track = Track {
      id: 1,
      title: "Forever".into(),
      artist: Artist { name: "Drake".into() },
      album: Album { title: "More Than a Game".into(), cover: String::new() },
      duration: 357,
      link: "https://www.deezer.com/track/1".into(),
    };
    assert_eq!(
      format_track_line(3, &track),
      " 3. Forever · Drake [More Than a Game] 5:57  https://www.deezer.com/track/1"
    );
  }
}
