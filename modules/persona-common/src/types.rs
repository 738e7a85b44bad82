use std::fmt;

use serde::ser;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Wire form of [`Info::NoInformation`].
pub const NO_INFORMATION: &str = "no information";

/// Agency tag used when an entry never had one.
pub const UNKNOWN_AGENCY: &str = "unknown";

/// Upper bound on extracted filmography entries.
pub const MAX_NARRATIVE_ROLES: usize = 7;

// --- Info ---

/// A free-text field that the model either filled or explicitly left empty.
///
/// Serialized as the plain string, or as [`NO_INFORMATION`] when empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Info {
    Known(String),
    #[default]
    NoInformation,
}

impl Info {
    /// Interpret a model answer. Blank answers and the sentinel (any case) are empty.
    pub fn from_answer(answer: &str) -> Self {
        let trimmed = answer.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_INFORMATION) {
            Info::NoInformation
        } else {
            Info::Known(trimmed.to_string())
        }
    }

    /// Interpret an arbitrary JSON value. Non-string scalars keep their JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Info::NoInformation,
            Value::String(s) => Info::from_answer(s),
            other => Info::Known(other.to_string()),
        }
    }

    pub fn known(&self) -> Option<&str> {
        match self {
            Info::Known(s) => Some(s),
            Info::NoInformation => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Info::Known(_))
    }

    pub fn as_str(&self) -> &str {
        self.known().unwrap_or(NO_INFORMATION)
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Info {
    fn from(s: &str) -> Self {
        Info::from_answer(s)
    }
}

impl Serialize for Info {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Info {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Info::from_value(&value))
    }
}

/// Strings the model may return as null or as a non-string scalar.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}

// --- Decode failure ---

/// A model response that could not be parsed into the expected shape.
///
/// Keeps the verbatim response so it can be inspected later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct DecodeFailure {
    pub error: String,
    pub raw_response: String,
}

impl DecodeFailure {
    pub fn new(reason: impl fmt::Display, raw_response: impl Into<String>) -> Self {
        Self {
            error: format!("Failed to parse JSON: {reason}"),
            raw_response: raw_response.into(),
        }
    }
}

// --- Identity ---

/// Demographics and outward impression, from the primary extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: Info,
    pub age_range: Info,
    pub gender: Info,
    pub height_build: Info,
    pub voice: Info,
    pub impression: Info,
}

// --- Emotional spectrum ---

/// Integer score on a 1–10 axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, String> {
        Self::try_from(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(format!(
                "score {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            ))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// Acting-tone profile on five axes. Low scores mean the first pole
/// (cold, active, subtle, extroverted, serious).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalSpectrum {
    pub cold_warm: Score,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cold_warm_description: String,
    pub active_passive: Score,
    #[serde(default, deserialize_with = "lenient_string")]
    pub active_passive_description: String,
    pub intensity: Score,
    #[serde(default, deserialize_with = "lenient_string")]
    pub intensity_description: String,
    pub extrovert_introvert: Score,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extrovert_introvert_description: String,
    pub comic_level: Score,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comic_level_description: String,
}

/// The emotional-spectrum field of a record: scores, or the failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmotionalReading {
    Scored(EmotionalSpectrum),
    Unreadable(DecodeFailure),
}

impl EmotionalReading {
    pub fn scores(&self) -> Option<&EmotionalSpectrum> {
        match self {
            EmotionalReading::Scored(spectrum) => Some(spectrum),
            EmotionalReading::Unreadable(_) => None,
        }
    }
}

// --- Narrative roles ---

/// Coarse narrative function of a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleType {
    Lead,
    Support,
    Antagonist,
    Helper,
    Cameo,
    /// Anything else, holding the model's label (possibly empty).
    Unclassified(String),
}

impl Default for RoleType {
    fn default() -> Self {
        RoleType::Unclassified(String::new())
    }
}

impl RoleType {
    /// Map a free-text label onto a category. Checked most-specific first, so
    /// "main antagonist" is an antagonist and "special cameo" is a cameo.
    pub fn classify(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["cameo", "special appearance", "카메오", "특별출연", "특별 출연"]) {
            RoleType::Cameo
        } else if has(&["antagonist", "villain", "악역", "악당"]) {
            RoleType::Antagonist
        } else if has(&["helper", "mentor", "sidekick", "조력자"]) {
            RoleType::Helper
        } else if has(&["support", "조연"]) {
            RoleType::Support
        } else if has(&["lead", "protagonist", "starring", "main", "주연", "주인공"]) {
            RoleType::Lead
        } else {
            RoleType::Unclassified(label.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleType::Lead => "lead",
            RoleType::Support => "support",
            RoleType::Antagonist => "antagonist",
            RoleType::Helper => "helper",
            RoleType::Cameo => "cameo",
            RoleType::Unclassified(label) if label.is_empty() => "unclassified",
            RoleType::Unclassified(label) => label,
        }
    }
}

impl Serialize for RoleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = lenient_string(deserializer)?;
        Ok(match label.trim() {
            "" | "unclassified" => RoleType::default(),
            other => RoleType::classify(other),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NarrativeRole {
    #[serde(default, deserialize_with = "lenient_string")]
    pub work_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub character_name: String,
    #[serde(default)]
    pub role_type: RoleType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub character_description: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub emotional_experiences: Vec<String>,
}

/// Output of the filmography extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filmography {
    #[serde(default)]
    pub narrative_roles: Vec<NarrativeRole>,
    #[serde(default)]
    pub recurring_pattern: Info,
}

impl Filmography {
    /// Value used when the filmography response cannot be decoded.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

// --- Actor record ---

/// Composite output of every field extractor for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub profile_image_url: Info,
    #[serde(default)]
    pub personality_spectrum: Info,
    pub emotional_spectrum: EmotionalReading,
    #[serde(default)]
    pub narrative_roles: Vec<NarrativeRole>,
    #[serde(default)]
    pub recurring_pattern: Info,
}

impl ActorRecord {
    pub fn name(&self) -> &Info {
        &self.identity.name
    }
}

// --- Persisted entries ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Success,
    Failed,
    /// Any status label this pipeline did not write.
    #[serde(other)]
    Unknown,
}

/// Defect class of a persisted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Succeeded with a real name.
    Ok,
    /// Failed, or no trustworthy status.
    Failed,
    /// Succeeded, but the name came back empty.
    Incomplete,
}

/// One element of the persisted collection.
///
/// Record fields are held as raw JSON so that a load/save cycle never drops
/// keys this version does not know about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorEntry {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ActorEntry {
    /// A successful entry built from a fresh record.
    pub fn succeeded(
        record: &ActorRecord,
        link: impl Into<String>,
        agency: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => {
                return Err(ser::Error::custom(format!(
                    "actor record serialized to {other} instead of an object"
                )))
            }
        };
        Ok(Self {
            fields,
            link: link.into(),
            agency: Some(agency.into()),
            status: Some(EntryStatus::Success),
            error_message: None,
            raw_response: None,
        })
    }

    /// A failed entry with no record fields.
    pub fn failed(
        link: impl Into<String>,
        agency: impl Into<String>,
        error_message: impl Into<String>,
        raw_response: Option<String>,
    ) -> Self {
        Self {
            fields: Map::new(),
            link: link.into(),
            agency: Some(agency.into()),
            status: Some(EntryStatus::Failed),
            error_message: Some(error_message.into()),
            raw_response,
        }
    }

    pub fn name(&self) -> Info {
        self.fields
            .get("name")
            .map(Info::from_value)
            .unwrap_or_default()
    }

    pub fn agency_or_unknown(&self) -> &str {
        self.agency.as_deref().unwrap_or(UNKNOWN_AGENCY)
    }

    pub fn state(&self) -> EntryState {
        match self.status {
            Some(EntryStatus::Success) if self.name().is_known() => EntryState::Ok,
            Some(EntryStatus::Success) => EntryState::Incomplete,
            _ => EntryState::Failed,
        }
    }

    /// Record an error without touching `status` or record fields.
    /// `raw_response` is only overwritten when a new one is given.
    pub fn note_error(&mut self, message: impl Into<String>, raw_response: Option<String>) {
        self.error_message = Some(message.into());
        if raw_response.is_some() {
            self.raw_response = raw_response;
        }
    }

    /// Record an error and mark the entry failed.
    pub fn mark_failed(&mut self, message: impl Into<String>, raw_response: Option<String>) {
        self.note_error(message, raw_response);
        self.status = Some(EntryStatus::Failed);
    }
}

/// Input row for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSource {
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
}

impl ActorSource {
    pub fn agency_or_unknown(&self) -> &str {
        self.agency.as_deref().unwrap_or(UNKNOWN_AGENCY)
    }
}
