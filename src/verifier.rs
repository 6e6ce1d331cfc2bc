use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::core::VerifyError;
use crate::habit::{Habit, SensorKind, VerificationKind};
use crate::scheduler::HabitTask;

/// What the user (or a device sensor) offers as proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    None,
    Steps { count: u32 },
    Sleep { hours: f32 },
    Outdoors { minutes: u32 },
    /// Text recognised from a photo or typed by the user.
    Text { content: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub confident: bool,
    pub detail: String,
}

impl Verdict {
    pub fn confident(detail: impl Into<String>) -> Self {
        Self {
            confident: true,
            detail: detail.into(),
        }
    }

    pub fn doubtful(detail: impl Into<String>) -> Self {
        Self {
            confident: false,
            detail: detail.into(),
        }
    }
}

/// Checks whether a task was really done. Implementations may await sensors
/// or OCR; the engine only applies the final verdict.
pub trait TaskVerifier {
    fn verify(
        &self,
        task: &HabitTask,
        evidence: &Evidence,
    ) -> impl Future<Output = Result<Verdict, VerifyError>> + Send;
}

/// Heuristic verifier over evidence already gathered by the host.
#[derive(Debug, Clone)]
pub struct EvidenceVerifier {
    pub min_steps: u32,
    pub min_sleep_hours: f32,
    pub min_outdoor_minutes: u32,
}

impl Default for EvidenceVerifier {
    fn default() -> Self {
        Self {
            min_steps: 5000,
            min_sleep_hours: 7.0,
            min_outdoor_minutes: 15,
        }
    }
}

fn keywords(habit: Habit) -> &'static [&'static str] {
    match habit {
        Habit::Leetcode => &["accepted", "runtime", "submission", "leetcode"],
        Habit::Jobs => &["application", "applied", "submitted", "thank you for applying"],
        _ => &[],
    }
}

impl EvidenceVerifier {
    pub fn judge(&self, habit: Habit, evidence: &Evidence) -> Result<Verdict, VerifyError> {
        match (habit.verification(), evidence) {
            (VerificationKind::Manual, _) => Ok(Verdict::confident("self-reported")),
            (VerificationKind::Sensor(SensorKind::Steps), Evidence::Steps { count }) => {
                Ok(if *count >= self.min_steps {
                    Verdict::confident(format!("{} steps", count))
                } else {
                    Verdict::doubtful(format!("only {} of {} steps", count, self.min_steps))
                })
            }
            (VerificationKind::Sensor(SensorKind::Sleep), Evidence::Sleep { hours }) => {
                Ok(if *hours >= self.min_sleep_hours {
                    Verdict::confident(format!("{:.1}h asleep", hours))
                } else {
                    Verdict::doubtful(format!("only {:.1}h asleep", hours))
                })
            }
            (VerificationKind::Location, Evidence::Outdoors { minutes }) => {
                Ok(if *minutes >= self.min_outdoor_minutes {
                    Verdict::confident(format!("{} minutes outdoors", minutes))
                } else {
                    Verdict::doubtful(format!("only {} minutes outdoors", minutes))
                })
            }
            (VerificationKind::Photo, Evidence::Text { content }) => {
                let lowered = content.to_lowercase();
                let hit = keywords(habit).iter().find(|k| lowered.contains(*k));
                Ok(match hit {
                    Some(word) => Verdict::confident(format!("found '{}'", word)),
                    None => Verdict::doubtful("no matching text found"),
                })
            }
            (_, Evidence::None) => Err(VerifyError::Unavailable(format!(
                "no evidence for {}",
                habit
            ))),
            (kind, other) => Err(VerifyError::WrongEvidence(format!(
                "{:?} cannot verify {:?}",
                other, kind
            ))),
        }
    }
}

impl TaskVerifier for EvidenceVerifier {
    fn verify(
        &self,
        task: &HabitTask,
        evidence: &Evidence,
    ) -> impl Future<Output = Result<Verdict, VerifyError>> + Send {
        let verdict = self.judge(task.habit, evidence);
        async move { verdict }
    }
}
