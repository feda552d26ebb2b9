use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};
use crate::catalog::CatalogService;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event<C: CatalogService>(app: &mut App<C>, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  if !app.gate.is_ready() {
    handle_form_key(app, key);
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
    app.clear_query();
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
    app.open_selected_link();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
  }
}

fn handle_form_key<C: CatalogService>(app: &mut App<C>, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.submit_profile(),
    KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
    KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
    KeyCode::Left => app.form.cycle_select(false),
    KeyCode::Right => app.form.cycle_select(true),
    KeyCode::Char(' ') if app.form.focus().is_select() => app.form.cycle_select(true),
    KeyCode::Char(c) => app.form.insert_char(c),
    KeyCode::Backspace => app.form.backspace(),
    KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_input_key<C: CatalogService>(app: &mut App<C>, key: event::KeyEvent) {
  app.clear_error();
  let cursor = app.cursor_position;
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let query = app.controller.query_mut();
      let byte_idx = char_to_byte_index(query, cursor);
      query.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if cursor > 0 {
        let query = app.controller.query_mut();
        let byte_idx = char_to_byte_index(query, cursor - 1);
        query.remove(byte_idx);
        app.cursor_position -= 1;
      }
    }
    KeyCode::Delete => {
      let query = app.controller.query_mut();
      if cursor < query.chars().count() {
        let byte_idx = char_to_byte_index(query, cursor);
        query.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if cursor < app.session().query.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.session().query.chars().count();
    }
    KeyCode::Esc => {
      if !app.session().query.is_empty() {
        app.clear_query();
      } else if !app.session().results.is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.session().results.is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key<C: CatalogService>(app: &mut App<C>, key: event::KeyEvent) {
  let count = app.session().results.len();
  match key.code {
    KeyCode::Enter => {
      app.open_selected_link();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| (i + 1) % count);
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Esc | KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::fake_app;
  use crate::catalog::fake::FakeCatalog;
  use ratatui::crossterm::event::KeyEvent;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- key handling ---

  fn app(dir: &std::path::Path) -> App<FakeCatalog> {
    fake_app(dir, FakeCatalog::with_chart(5))
  }

  fn press(app: &mut App<FakeCatalog>, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_str(app: &mut App<FakeCatalog>, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  #[tokio::test]
  async fn form_keys_fill_and_submit() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());

    type_str(&mut app, "Ana");
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, "Lee");
    press(&mut app, KeyCode::Tab);
    type_str(&mut app, "30");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Enter);

    assert!(app.gate.is_ready());
    assert_eq!(app.gate.profile().map(|p| p.age.as_str()), Some("30"));
    app.shutdown();
  }

  #[tokio::test]
  async fn query_editing_respects_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    app.form.draft.name = "Ana".into();
    app.form.draft.lastname = "Lee".into();
    app.form.draft.age = "30".into();
    app.form.draft.gender = Some(crate::profile::Gender::Female);
    app.form.draft.genre = Some(crate::profile::Genre::Jazz);
    app.submit_profile();

    type_str(&mut app, "drke");
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Left);
    type_str(&mut app, "a");
    assert_eq!(app.session().query, "drake");
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.session().query, "drke");
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.session().query, "");
    assert_eq!(app.cursor_position, 0);
    app.shutdown();
  }
}
