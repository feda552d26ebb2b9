use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::catalog::{CatalogService, DeezerClient, Track};
use crate::config::{Config, Settings};
use crate::constants::constants;
use crate::controller::{PollHandle, SearchController, SearchSession};
use crate::form::ProfileForm;
use crate::profile::{ProfileGate, SubmitError};
use crate::theme::{THEMES, theme_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

pub struct App<C = DeezerClient> {
  pub gate: ProfileGate,
  pub form: ProfileForm,
  pub controller: SearchController<C>,
  pub mode: AppMode,
  pub theme_index: usize,
  pub list_state: ListState,
  /// Cursor position within the query (char index).
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub last_error: Option<String>,
  pub should_quit: bool,
  poll: Option<PollHandle>,
  poll_interval: Duration,
  config: Config,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(settings: &Settings, config: Config) -> Self {
    let catalog = Arc::new(DeezerClient::new(settings.api_base_url.clone()));
    Self::with_catalog(settings, config, catalog)
  }
}

impl<C: CatalogService> App<C> {
  pub fn with_catalog(settings: &Settings, config: Config, catalog: Arc<C>) -> Self {
    let controller =
      SearchController::new(catalog, settings.popular_limit).with_discard_stale(settings.discard_stale_responses);

    let mut app = Self {
      gate: ProfileGate::open(&settings.profile_path),
      form: ProfileForm::default(),
      controller,
      mode: AppMode::Input,
      theme_index: theme_index(config.theme_name.as_deref()),
      list_state: ListState::default(),
      cursor_position: 0,
      input_scroll: 0,
      last_error: None,
      should_quit: false,
      poll: None,
      poll_interval: settings.poll_interval,
      config,
      error_time: None,
    };
    if app.gate.is_ready() {
      app.start_session();
    }
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index]
  }

  pub fn session(&self) -> &SearchSession {
    self.controller.session()
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Begin polling popular tracks. Called once the gate is open.
  fn start_session(&mut self) {
    if self.poll.is_none() {
      self.poll = Some(self.controller.start_polling(self.poll_interval));
    }
  }

  pub fn submit_profile(&mut self) {
    match self.gate.submit(&self.form.draft) {
      Ok(profile) => {
        info!(genre = profile.genre.label(), "profile: onboarding complete");
        self.clear_error();
        self.start_session();
      }
      Err(SubmitError::Invalid(e)) => {
        let missing: Vec<String> = e.missing.iter().map(ToString::to_string).collect();
        self.set_error(format!("{} Missing: {}", e, missing.join(", ")));
      }
      Err(e) => {
        warn!(err = %e, "profile: submit failed");
        self.set_error(e.to_string());
      }
    }
  }

  /// Apply finished fetches and keep the list selection in range.
  pub fn check_pending(&mut self) {
    if !self.controller.check_pending() {
      return;
    }
    let count = self.session().results.len();
    if count == 0 {
      self.list_state.select(None);
      if self.mode == AppMode::Results {
        self.mode = AppMode::Input;
      }
    } else {
      let sel = self.list_state.selected().unwrap_or(0).min(count - 1);
      self.list_state.select(Some(sel));
    }
  }

  pub fn trigger_search(&mut self) {
    if !self.controller.submit_query() {
      self.set_error("Enter a search term.".to_string());
      return;
    }
    self.clear_error();
    self.list_state.select(Some(0));
  }

  pub fn clear_query(&mut self) {
    self.controller.clear_query();
    self.cursor_position = 0;
    self.input_scroll = 0;
  }

  pub fn selected_track(&self) -> Option<&Track> {
    self.list_state.selected().and_then(|i| self.session().results.get(i))
  }

  /// Open the selected track's page in the default browser.
  pub fn open_selected_link(&mut self) {
    let Some((track_id, url)) = self.selected_track().filter(|t| !t.link.is_empty()).map(|t| (t.id, t.link.clone()))
    else {
      return;
    };
    info!(track_id, url = %url, "opening track in browser");
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => {
        self.set_error(format!("Failed to open browser: {}", e));
      }
    }
  }

  /// Stop the poller. Safe to call more than once.
  pub fn shutdown(&mut self) {
    if let Some(mut handle) = self.poll.take() {
      self.controller.stop_polling(&mut handle);
    }
  }

  pub fn is_polling(&self) -> bool {
    self.poll.as_ref().is_some_and(PollHandle::is_active)
  }
}
