use crate::profile::{Gender, Genre, ProfileDraft, is_complete};

/// Focusable rows of the onboarding form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  Name,
  Lastname,
  Age,
  Gender,
  Genre,
  Submit,
}

impl FormField {
  pub const ALL: [FormField; 6] =
    [FormField::Name, FormField::Lastname, FormField::Age, FormField::Gender, FormField::Genre, FormField::Submit];

  pub fn label(self) -> &'static str {
    match self {
      FormField::Name => "Name",
      FormField::Lastname => "Last Name",
      FormField::Age => "Age",
      FormField::Gender => "Gender",
      FormField::Genre => "Genre",
      FormField::Submit => "Submit",
    }
  }

  pub fn is_select(self) -> bool {
    matches!(self, FormField::Gender | FormField::Genre)
  }
}

/// Cycle through `None` followed by each option, like a `<select>` with a placeholder.
fn cycle<T: Copy + PartialEq>(current: Option<T>, options: &[T], forward: bool) -> Option<T> {
  let len = options.len() + 1;
  let pos = current.and_then(|c| options.iter().position(|o| *o == c)).map_or(0, |i| i + 1);
  let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
  if next == 0 { None } else { Some(options[next - 1]) }
}

/// Onboarding form: the draft being edited plus which row has focus.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
  pub draft: ProfileDraft,
  focus: usize,
}

impl ProfileForm {
  pub fn focus(&self) -> FormField {
    FormField::ALL[self.focus]
  }

  pub fn focus_next(&mut self) {
    self.focus = (self.focus + 1) % FormField::ALL.len();
  }

  pub fn focus_prev(&mut self) {
    self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
  }

  /// Whether the submit button is enabled.
  pub fn can_submit(&self) -> bool {
    is_complete(&self.draft)
  }

  fn text_mut(&mut self) -> Option<&mut String> {
    match self.focus() {
      FormField::Name => Some(&mut self.draft.name),
      FormField::Lastname => Some(&mut self.draft.lastname),
      FormField::Age => Some(&mut self.draft.age),
      _ => None,
    }
  }

  /// Type a character into the focused text field. Age only takes digits.
  pub fn insert_char(&mut self, c: char) {
    if self.focus() == FormField::Age && !c.is_ascii_digit() {
      return;
    }
    if let Some(text) = self.text_mut() {
      text.push(c);
    }
  }

  pub fn backspace(&mut self) {
    if let Some(text) = self.text_mut() {
      text.pop();
    }
  }

  /// Step the focused select forwards or backwards. No effect on text rows.
  pub fn cycle_select(&mut self, forward: bool) {
    match self.focus() {
      FormField::Gender => self.draft.gender = cycle(self.draft.gender, &Gender::ALL, forward),
      FormField::Genre => self.draft.genre = cycle(self.draft.genre, &Genre::ALL, forward),
      _ => {}
    }
  }

  /// Display value for a row; selects show their placeholder when unset.
  pub fn value(&self, field: FormField) -> String {
    match field {
      FormField::Name => self.draft.name.clone(),
      FormField::Lastname => self.draft.lastname.clone(),
      FormField::Age => self.draft.age.clone(),
      FormField::Gender => self.draft.gender.map_or("Select Gender", |g| g.label()).to_string(),
      FormField::Genre => self.draft.genre.map_or("Select Genre", |g| g.label()).to_string(),
      FormField::Submit => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn focus_wraps_both_ways() {
    let mut form = ProfileForm::default();
    assert_eq!(form.focus(), FormField::Name);
    form.focus_prev();
    assert_eq!(form.focus(), FormField::Submit);
    form.focus_next();
    form.focus_next();
    assert_eq!(form.focus(), FormField::Lastname);
  }

  #[test]
  fn age_accepts_digits_only() {
    let mut form = ProfileForm::default();
    form.focus_next();
    form.focus_next();
    for c in "3a0-".chars() {
      form.insert_char(c);
    }
    assert_eq!(form.draft.age, "30");
    form.backspace();
    assert_eq!(form.draft.age, "3");
  }

  #[test]
  fn typing_on_select_row_is_ignored() {
    let mut form = ProfileForm::default();
    for _ in 0..3 {
      form.focus_next();
    }
    assert_eq!(form.focus(), FormField::Gender);
    form.insert_char('x');
    form.backspace();
    assert_eq!(form.draft, ProfileDraft::default());
  }

  #[test]
  fn select_cycles_through_placeholder() {
    assert_eq!(cycle(None, &Gender::ALL, true), Some(Gender::Female));
    assert_eq!(cycle(Some(Gender::Female), &Gender::ALL, true), Some(Gender::Male));
    assert_eq!(cycle(Some(Gender::Male), &Gender::ALL, true), None);
    assert_eq!(cycle(None, &Gender::ALL, false), Some(Gender::Male));
    assert_eq!(cycle(None, &Genre::ALL, false), Some(Genre::Rap));
  }

  #[test]
  fn submit_enabled_once_complete() {
    let mut form = ProfileForm::default();
    assert!(!form.can_submit());
    for c in "Ana".chars() {
      form.insert_char(c);
    }
    form.focus_next();
    for c in "Lee".chars() {
      form.insert_char(c);
    }
    form.focus_next();
    form.insert_char('3');
    form.focus_next();
    form.cycle_select(true);
    assert!(!form.can_submit());
    form.focus_next();
    form.cycle_select(true);
    form.cycle_select(true);
    assert_eq!(form.value(FormField::Genre), "Pop");
    assert!(form.can_submit());
  }
}
