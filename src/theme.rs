use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Violet",
    bg: Color::Rgb(24, 20, 37),
    fg: Color::Rgb(230, 226, 240),
    accent: Color::Rgb(162, 56, 255),
    muted: Color::Rgb(128, 120, 150),
    border: Color::Rgb(70, 60, 95),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(88, 40, 150),
    stripe_bg: Color::Rgb(30, 26, 46),
    status: Color::Rgb(120, 200, 255),
    error: Color::Rgb(255, 110, 110),
    key_fg: Color::Rgb(24, 20, 37),
    key_bg: Color::Rgb(162, 56, 255),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(200, 60, 40),
    muted: Color::Rgb(130, 125, 115),
    border: Color::Rgb(200, 195, 180),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(200, 60, 40),
    stripe_bg: Color::Rgb(242, 238, 226),
    status: Color::Rgb(30, 110, 160),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(90, 85, 80),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    status: Color::Yellow,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}
