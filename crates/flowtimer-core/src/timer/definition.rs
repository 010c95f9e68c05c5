use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// How many times a definition's cycle of steps runs.
///
/// Serialized as a plain integer where `-1` means infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Repetitions {
    Count(u32),
    Infinite,
}

impl Repetitions {
    pub fn is_infinite(self) -> bool {
        matches!(self, Repetitions::Infinite)
    }

    /// `true` when `repetition` is not the final one of the run.
    pub fn has_more_after(self, repetition: u32) -> bool {
        match self {
            Repetitions::Infinite => true,
            Repetitions::Count(n) => repetition < n,
        }
    }
}

impl TryFrom<i64> for Repetitions {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Repetitions::Infinite),
            n if n >= 1 && n <= i64::from(u32::MAX) => Ok(Repetitions::Count(n as u32)),
            n => Err(ValidationError::InvalidRepetitions(n)),
        }
    }
}

impl From<Repetitions> for i64 {
    fn from(value: Repetitions) -> Self {
        match value {
            Repetitions::Count(n) => i64::from(n),
            Repetitions::Infinite => -1,
        }
    }
}

impl std::fmt::Display for Repetitions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Repetitions::Count(n) => write!(f, "{n}"),
            Repetitions::Infinite => f.write_str("∞"),
        }
    }
}

/// One named, timed segment of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStep {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    /// Duration in whole seconds.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Text handed to the speech collaborator. Falls back to `instructions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_text: Option<String>,
}

impl TimerStep {
    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            duration,
            color: None,
            images: Vec::new(),
            instructions: None,
            speech_text: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_instructions(mut self, text: impl Into<String>) -> Self {
        self.instructions = Some(text.into());
        self
    }

    pub fn with_speech(mut self, text: impl Into<String>) -> Self {
        self.speech_text = Some(text.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Text to speak when this step begins, if any.
    pub fn cue_text(&self) -> Option<&str> {
        self.speech_text
            .as_deref()
            .or(self.instructions.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Static description of a timer: an ordered cycle of steps and how often
/// the cycle repeats.
///
/// Validated once when bound to an engine; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDefinition {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub steps: Vec<TimerStep>,
    pub repetitions: Repetitions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TimerDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<TimerStep>, repetitions: Repetitions) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            steps,
            repetitions,
            tags: Vec::new(),
            color: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: an empty step list, a step with a
    /// zero duration, or a zero repetition count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.is_empty() {
            return Err(ValidationError::EmptySteps {
                definition_id: self.id.clone(),
            });
        }
        if let Some(step) = self.steps.iter().find(|s| s.duration == 0) {
            return Err(ValidationError::InvalidDuration {
                step_id: step.id.clone(),
                duration: i64::from(step.duration),
            });
        }
        if let Repetitions::Count(0) = self.repetitions {
            return Err(ValidationError::InvalidRepetitions(0));
        }
        Ok(())
    }

    pub fn step(&self, index: usize) -> Option<&TimerStep> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Duration of the step at `index`, or 0 when out of range.
    pub fn duration_of(&self, index: usize) -> u32 {
        self.steps.get(index).map(|s| s.duration).unwrap_or(0)
    }

    /// Seconds in one full pass over all steps.
    pub fn cycle_duration_secs(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.duration)).sum()
    }

    /// Seconds in the whole run, `None` for infinite repetition.
    pub fn total_duration_secs(&self) -> Option<u64> {
        match self.repetitions {
            Repetitions::Count(n) => Some(self.cycle_duration_secs().saturating_mul(u64::from(n))),
            Repetitions::Infinite => None,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
