//! One-time user profile and the onboarding gate in front of the search view.
//!
//! The profile lives in a single JSON file. It is written once on a successful
//! submit and read once at startup; a missing, unreadable or incomplete file
//! simply leaves the gate in [`GateState::Onboarding`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  #[serde(rename = "F")]
  Female,
  #[serde(rename = "M")]
  Male,
}

impl Gender {
  pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

  pub fn label(self) -> &'static str {
    match self {
      Gender::Female => "Female",
      Gender::Male => "Male",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
  Rock,
  Pop,
  #[serde(rename = "Hip Hop")]
  HipHop,
  Jazz,
  Electronic,
  Rap,
}

impl Genre {
  pub const ALL: [Genre; 6] = [Genre::Rock, Genre::Pop, Genre::HipHop, Genre::Jazz, Genre::Electronic, Genre::Rap];

  pub fn label(self) -> &'static str {
    match self {
      Genre::Rock => "Rock",
      Genre::Pop => "Pop",
      Genre::HipHop => "Hip Hop",
      Genre::Jazz => "Jazz",
      Genre::Electronic => "Electronic",
      Genre::Rap => "Rap",
    }
  }
}

/// A complete, persisted profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub name: String,
  pub lastname: String,
  /// Digits as typed; never parsed.
  pub age: String,
  pub gender: Gender,
  pub genre: Genre,
}

impl UserProfile {
  fn is_complete(&self) -> bool {
    [&self.name, &self.lastname, &self.age].iter().all(|s| !s.trim().is_empty())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
  Name,
  Lastname,
  Age,
  Gender,
  Genre,
}

impl fmt::Display for ProfileField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ProfileField::Name => "name",
      ProfileField::Lastname => "last name",
      ProfileField::Age => "age",
      ProfileField::Gender => "gender",
      ProfileField::Genre => "genre",
    })
  }
}

/// Form state before submission. Selects start unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
  pub name: String,
  pub lastname: String,
  pub age: String,
  pub gender: Option<Gender>,
  pub genre: Option<Genre>,
}

impl ProfileDraft {
  /// Fields that are empty or whitespace-only, in form order.
  pub fn missing_fields(&self) -> Vec<ProfileField> {
    let mut missing = Vec::new();
    if self.name.trim().is_empty() {
      missing.push(ProfileField::Name);
    }
    if self.lastname.trim().is_empty() {
      missing.push(ProfileField::Lastname);
    }
    if self.age.trim().is_empty() {
      missing.push(ProfileField::Age);
    }
    if self.gender.is_none() {
      missing.push(ProfileField::Gender);
    }
    if self.genre.is_none() {
      missing.push(ProfileField::Genre);
    }
    missing
  }
}

/// True iff every field is filled. Drives the submit button's enabled state.
pub fn is_complete(draft: &ProfileDraft) -> bool {
  draft.missing_fields().is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fill in all fields.")]
pub struct ValidationError {
  pub missing: Vec<ProfileField>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error(transparent)]
  Invalid(#[from] ValidationError),
  #[error("could not save profile: {0:#}")]
  Persist(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
  Onboarding,
  Ready(UserProfile),
}

/// Owns the persisted profile and the Onboarding → Ready transition.
#[derive(Debug)]
pub struct ProfileGate {
  path: PathBuf,
  state: GateState,
}

impl ProfileGate {
  /// Open the gate over `path`, starting in `Ready` if a valid profile is stored there.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let mut gate = Self { path: path.into(), state: GateState::Onboarding };
    if let Some(profile) = gate.load() {
      debug!(path = %gate.path.display(), "profile: found, skipping onboarding");
      gate.state = GateState::Ready(profile);
    }
    gate
  }

  pub fn state(&self) -> &GateState {
    &self.state
  }

  pub fn profile(&self) -> Option<&UserProfile> {
    match &self.state {
      GateState::Ready(p) => Some(p),
      GateState::Onboarding => None,
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self.state, GateState::Ready(_))
  }

  /// Re-read the stored profile. Never fails; anything unusable reads as absent.
  pub fn load(&self) -> Option<UserProfile> {
    load_from(&self.path)
  }

  /// Validate and persist `draft`, overwriting any earlier profile.
  /// Nothing is written when validation fails.
  pub fn submit(&mut self, draft: &ProfileDraft) -> Result<UserProfile, SubmitError> {
    let missing = draft.missing_fields();
    let (Some(gender), Some(genre), true) = (draft.gender, draft.genre, missing.is_empty()) else {
      debug!(?missing, "profile: rejected incomplete submission");
      return Err(ValidationError { missing }.into());
    };

    let profile = UserProfile {
      name: draft.name.clone(),
      lastname: draft.lastname.clone(),
      age: draft.age.clone(),
      gender,
      genre,
    };
    save_to(&self.path, &profile).map_err(SubmitError::Persist)?;
    info!(path = %self.path.display(), "profile: saved");

    self.state = GateState::Ready(profile.clone());
    Ok(profile)
  }
}

fn load_from(path: &Path) -> Option<UserProfile> {
  let content = match std::fs::read_to_string(path) {
    Ok(c) => c,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
    Err(e) => {
      warn!(err = %e, path = %path.display(), "profile: unreadable, starting onboarding");
      return None;
    }
  };
  match serde_json::from_str::<UserProfile>(&content) {
    Ok(profile) if profile.is_complete() => Some(profile),
    Ok(_) => {
      warn!(path = %path.display(), "profile: stored profile is incomplete, ignoring");
      None
    }
    Err(e) => {
      warn!(err = %e, path = %path.display(), "profile: malformed, ignoring");
      None
    }
  }
}

/// Written to a sibling temp file, then renamed into place.
fn save_to(path: &Path, profile: &UserProfile) -> Result<()> {
  if let Some(dir) = path.parent() {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
  }
  let json = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
  let tmp = path.with_extension("json.tmp");
  std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
  std::fs::rename(&tmp, path).with_context(|| format!("Failed to move profile into {}", path.display()))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ana() -> ProfileDraft {
    ProfileDraft {
      name: "Ana".into(),
      lastname: "Lee".into(),
      age: "30".into(),
      gender: Some(Gender::Female),
      genre: Some(Genre::Pop),
    }
  }

  #[test]
  fn fresh_storage_starts_onboarding() {
    let dir = tempfile::tempdir().unwrap();
    let gate = ProfileGate::open(dir.path().join("profile.json"));
    assert_eq!(gate.state(), &GateState::Onboarding);
    assert!(gate.load().is_none());
  }

  #[test]
  fn submit_then_reopen_starts_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("profile.json");

    let mut gate = ProfileGate::open(&path);
    let saved = gate.submit(&ana()).unwrap();
    assert!(gate.is_ready());
    assert_eq!(saved.name, "Ana");
    assert_eq!(saved.genre, Genre::Pop);

    let reopened = ProfileGate::open(&path);
    assert_eq!(reopened.state(), &GateState::Ready(saved.clone()));
    assert_eq!(reopened.load(), Some(saved));
  }

  #[test]
  fn stored_json_uses_short_codes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    let mut draft = ana();
    draft.genre = Some(Genre::HipHop);
    ProfileGate::open(&path).submit(&draft).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["gender"], "F");
    assert_eq!(value["genre"], "Hip Hop");
    assert_eq!(value["age"], "30");
  }

  #[test]
  fn whitespace_field_is_rejected_and_nothing_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    let mut gate = ProfileGate::open(&path);

    let mut draft = ana();
    draft.lastname = "   ".into();
    match gate.submit(&draft) {
      Err(SubmitError::Invalid(e)) => assert_eq!(e.missing, vec![ProfileField::Lastname]),
      other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!gate.is_ready());
    assert!(!path.exists());
    assert!(gate.load().is_none());
  }

  #[test]
  fn unset_selects_are_missing() {
    let draft = ProfileDraft { name: "Ana".into(), lastname: "Lee".into(), age: "30".into(), ..Default::default() };
    assert_eq!(draft.missing_fields(), vec![ProfileField::Gender, ProfileField::Genre]);
    assert!(!is_complete(&draft));
    assert!(is_complete(&ana()));
    assert!(!is_complete(&ProfileDraft::default()));
  }

  #[test]
  fn resubmit_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    ProfileGate::open(&path).submit(&ana()).unwrap();

    let mut other = ana();
    other.name = "Bea".into();
    ProfileGate::open(&path).submit(&other).unwrap();
    assert_eq!(ProfileGate::open(&path).profile().map(|p| p.name.as_str()), Some("Bea"));
  }

  #[test]
  fn malformed_file_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(ProfileGate::open(&path).state(), &GateState::Onboarding);

    std::fs::write(&path, r#"{"name":"Ana","lastname":"Lee","age":"30","gender":"X","genre":"Pop"}"#).unwrap();
    assert_eq!(ProfileGate::open(&path).state(), &GateState::Onboarding);
  }

  #[test]
  fn blank_stored_field_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    std::fs::write(&path, r#"{"name":" ","lastname":"Lee","age":"30","gender":"F","genre":"Pop"}"#).unwrap();
    assert!(ProfileGate::open(&path).load().is_none());
  }

  #[test]
  fn validation_message_matches_prompt() {
    let err = ValidationError { missing: vec![ProfileField::Age] };
    assert_eq!(err.to_string(), "Please fill in all fields.");
  }
}
