use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, AppMode};
use crate::form::FormField;
use crate::profile::GateState;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  if matches!(app.gate.state(), GateState::Ready(_)) {
    render_search_screen(frame, app);
  } else {
    render_onboarding(frame, app);
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect, greeting: Option<&str>) {
  let mut spans = vec![Span::styled(" ♫ dzr ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if let Some(name) = greeting {
    spans.push(Span::styled(format!(" Hi, {}", name), Style::default().fg(theme.fg)));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect, idle: &str) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.session().is_loading {
    (" ⏳ Loading…".to_string(), Style::default().fg(theme.status))
  } else {
    (format!(" {}", idle), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, theme: &Theme, area: Rect, keys: &[(&str, &str)]) {
  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

// --- Onboarding ---

fn render_onboarding(frame: &mut Frame, app: &App) {
  let theme = app.theme();
  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, theme, header_area, None);

  let [form_area] = Layout::horizontal([Constraint::Max(60)]).flex(ratatui::layout::Flex::Center).areas(main_area);
  let focus = app.form.focus();
  let label_w = 11;

  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(
      "Your Integrated Environment for the Latest Music",
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center),
    Line::from(""),
  ];

  for field in FormField::ALL.iter().copied().filter(|f| *f != FormField::Submit) {
    let focused = field == focus;
    let label = format!("{:>width$}  ", field.label(), width = label_w);
    let value = app.form.value(field);
    let value_style = if focused {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg)
    } else {
      Style::default().fg(theme.fg).bg(theme.stripe_bg)
    };
    let shown = if field.is_select() { format!("◂ {} ▸", value) } else { format!("{:<24}", value) };
    lines.push(Line::from(vec![
      Span::styled(label, Style::default().fg(if focused { theme.accent } else { theme.muted })),
      Span::styled(shown, value_style),
    ]));
    lines.push(Line::from(""));
  }

  let enabled = app.form.can_submit();
  let button_style = match (enabled, focus == FormField::Submit) {
    (true, true) => Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD),
    (true, false) => Style::default().fg(theme.key_fg).bg(theme.key_bg),
    (false, _) => Style::default().fg(theme.muted).add_modifier(Modifier::DIM),
  };
  lines.push(Line::from(Span::styled("  Submit  ", button_style)).alignment(Alignment::Center));

  let form = Paragraph::new(lines).block(rounded(theme).title(" Profile ").padding(Padding::horizontal(1)));
  frame.render_widget(form, form_area);

  render_status(frame, app, status_area, "Fill in every field to continue.");
  render_footer(
    frame,
    theme,
    footer_area,
    &[("Tab", "Next"), ("◂▸", "Select"), ("Enter", "Submit"), ("^t", "Theme"), ("Esc", "Quit")],
  );
}

// --- Search ---

fn render_search_screen(frame: &mut Frame, app: &mut App) {
  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let greeting = app.gate.profile().map(|p| p.name.clone());
  render_header(frame, app.theme(), header_area, greeting.as_deref());
  render_results(frame, app, main_area);
  let idle = match (app.mode, app.selected_track()) {
    (AppMode::Results, Some(track)) => format!("Listen on Deezer: {}  ·  Cover: {}", track.link, track.album.cover),
    _ => {
      let refresh = if app.is_polling() { "  ·  popular tracks refresh automatically" } else { "" };
      format!("{} tracks{}", app.session().results.len(), refresh)
    }
  };
  render_status(frame, app, status_area, &idle);
  render_input(frame, app, input_area);

  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("^l", "Clear"), ("^t", "Theme")];
      if app.session().results.is_empty() {
        k.push(("Esc", "Quit"));
      } else {
        k.push(("↓", "Results"));
      }
      k
    }
    AppMode::Results => vec![("Enter", "Listen"), ("j/k", "Navigate"), ("^t", "Theme"), ("Esc", "Back")],
  };
  render_footer(frame, app.theme(), footer_area, &keys);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let session = app.controller.session();

  if session.is_loading {
    let text = vec![Line::from(""), Line::from(Span::styled("Loading…", Style::default().fg(theme.status)))];
    let loading = Paragraph::new(text).alignment(Alignment::Center).block(rounded(theme).title(" Songs "));
    frame.render_widget(loading, area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = session
    .results
    .iter()
    .enumerate()
    .map(|(i, track)| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let right = format!("{}  {}", track.album.title, track.duration_label());
      let right = truncate_str(&right, inner_w / 3);
      let right_w = right.chars().count();
      let left_max = inner_w.saturating_sub(right_w + 2);
      let title = truncate_str(&track.title, left_max);
      let by = truncate_str(&format!(" · {}", track.artist.name), left_max.saturating_sub(title.chars().count()));
      let gap = inner_w.saturating_sub(title.chars().count() + by.chars().count() + right_w);

      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg).add_modifier(Modifier::BOLD)),
        Span::styled(by, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(
      rounded(theme)
        .title(" Songs ")
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search for any song ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let query = app.controller.session().query.clone();
  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&query, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let paragraph = if query.is_empty() {
    Paragraph::new(Span::styled("e.g., Drake forever", Style::default().fg(theme.muted)))
  } else {
    let visible: String = query
      .chars()
      .scan(0usize, |col, c| {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= app.input_scroll)
      .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}
