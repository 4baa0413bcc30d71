//! Staged feature rollouts
//!
//! A rollout exposes a feature to a growing share of subjects. Subjects are
//! bucketed deterministically, so a subject that was enabled at 20% stays
//! enabled at every higher percentage.

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_feature_key, Validated};

string_enum! {
    RolloutStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rollout {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub feature_key: String,
    pub description: Option<String>,
    pub status: RolloutStatus,
    pub current_percentage: i32,
    pub target_percentage: i32,
    pub step_percentage: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRollout {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_feature_key"))]
    pub feature_key: String,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_target")]
    #[validate(range(min = 1, max = 100, message = "Target percentage must be between 1 and 100"))]
    pub target_percentage: i32,

    #[serde(default = "default_step")]
    #[validate(range(min = 1, max = 100, message = "Step percentage must be between 1 and 100"))]
    pub step_percentage: i32,
}

fn default_target() -> i32 {
    100
}

fn default_step() -> i32 {
    10
}

impl Validated for NewRollout {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RolloutUpdate {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Target percentage must be between 1 and 100"))]
    pub target_percentage: Option<i32>,

    #[validate(range(min = 1, max = 100, message = "Step percentage must be between 1 and 100"))]
    pub step_percentage: Option<i32>,
}

impl Validated for RolloutUpdate {}

impl Rollout {
    pub fn create(workspace_id: Uuid, input: NewRollout, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: input.name.trim().to_string(),
            feature_key: input.feature_key,
            description: normalize_optional(input.description),
            status: RolloutStatus::Pending,
            current_percentage: 0,
            target_percentage: input.target_percentage,
            step_percentage: input.step_percentage,
            started_at: None,
            paused_at: None,
            completed_at: None,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
        }
    }

    pub fn apply(&mut self, update: RolloutUpdate) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Pending {
            return Err(DomainError::transition("rollout", self.status, "edit"));
        }
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(target) = update.target_percentage {
            self.target_percentage = target;
        }
        if let Some(step) = update.step_percentage {
            self.step_percentage = step;
        }
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn can_delete(&self) -> bool {
        matches!(self.status, RolloutStatus::Pending | RolloutStatus::Cancelled)
    }

    /// Starts at the first step, capped at the target. Only `advance` and
    /// `complete` finish a rollout.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Pending {
            return Err(DomainError::transition("rollout", self.status, "start"));
        }
        self.status = RolloutStatus::Running;
        self.current_percentage = self.step_percentage.min(self.target_percentage);
        self.started_at = Some(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Running {
            return Err(DomainError::transition("rollout", self.status, "pause"));
        }
        self.status = RolloutStatus::Paused;
        self.paused_at = Some(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Paused {
            return Err(DomainError::transition("rollout", self.status, "resume"));
        }
        self.status = RolloutStatus::Running;
        self.paused_at = None;
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Running {
            return Err(DomainError::transition("rollout", self.status, "advance"));
        }
        self.current_percentage =
            (self.current_percentage + self.step_percentage).min(self.target_percentage);
        self.modified_at = Some(now);
        self.finish_if_at_target(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != RolloutStatus::Running {
            return Err(DomainError::transition("rollout", self.status, "complete"));
        }
        self.current_percentage = self.target_percentage;
        self.status = RolloutStatus::Completed;
        self.completed_at = Some(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            RolloutStatus::Pending | RolloutStatus::Running | RolloutStatus::Paused => {
                self.status = RolloutStatus::Cancelled;
                self.current_percentage = 0;
                self.modified_at = Some(now);
                Ok(())
            }
            other => Err(DomainError::transition("rollout", other, "cancel")),
        }
    }

    fn finish_if_at_target(&mut self, now: DateTime<Utc>) {
        if self.current_percentage >= self.target_percentage {
            self.status = RolloutStatus::Completed;
            self.completed_at = Some(now);
        }
    }

    /// Whether the feature is on for `subject`. Paused rollouts keep their
    /// current audience; cancelled and pending ones serve nobody.
    pub fn is_enabled_for(&self, subject: &str) -> bool {
        match self.status {
            RolloutStatus::Running | RolloutStatus::Paused | RolloutStatus::Completed => {
                (bucket(&self.feature_key, subject) as i32) < self.current_percentage
            }
            RolloutStatus::Pending | RolloutStatus::Cancelled => false,
        }
    }
}

/// Stable bucket in `0..100` (FNV-1a over `feature_key:subject`).
pub fn bucket(feature_key: &str, subject: &str) -> u32 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let bytes = feature_key.bytes().chain(std::iter::once(b':')).chain(subject.bytes());
    for byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    (hash % 100) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollout(target: i32, step: i32) -> Rollout {
        Rollout::create(
            Uuid::new_v4(),
            NewRollout {
                name: "New checkout".into(),
                feature_key: "checkout.v2".into(),
                description: None,
                target_percentage: target,
                step_percentage: step,
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_state_machine() {
        let now = Utc::now();
        let mut r = rollout(100, 25);
        assert!(r.pause(now).is_err());
        assert!(r.advance(now).is_err());
        r.start(now).unwrap();
        assert_eq!(r.current_percentage, 25);
        r.pause(now).unwrap();
        assert!(r.advance(now).is_err());
        assert!(r.start(now).is_err());
        r.resume(now).unwrap();
        r.advance(now).unwrap();
        assert_eq!(r.current_percentage, 50);
        r.complete(now).unwrap();
        assert_eq!(r.status, RolloutStatus::Completed);
        assert_eq!(r.current_percentage, 100);
        assert!(r.cancel(now).is_err());
        assert!(r.resume(now).is_err());
    }

    #[test]
    fn test_advance_caps_at_target() {
        let now = Utc::now();
        let mut r = rollout(50, 30);
        r.start(now).unwrap();
        r.advance(now).unwrap();
        assert_eq!(r.current_percentage, 50);
        assert_eq!(r.status, RolloutStatus::Completed);
        assert!(r.completed_at.is_some());
    }

    #[test]
    fn test_update_only_while_pending() {
        let mut r = rollout(100, 10);
        r.apply(RolloutUpdate { step_percentage: Some(20), ..Default::default() }).unwrap();
        r.apply(RolloutUpdate { target_percentage: Some(10), ..Default::default() }).unwrap();
        assert_eq!((r.target_percentage, r.step_percentage), (10, 20));
        r.start(Utc::now()).unwrap();
        assert!(r.apply(RolloutUpdate::default()).is_err());
        assert!(!r.can_delete());
        r.cancel(Utc::now()).unwrap();
        assert!(r.can_delete());
    }

    #[test]
    fn test_bucketing_is_stable_and_monotonic() {
        assert_eq!(bucket("checkout.v2", "user-1"), bucket("checkout.v2", "user-1"));
        let now = Utc::now();
        let mut r = rollout(100, 20);
        r.start(now).unwrap();
        let subjects: Vec<String> = (0..200).map(|i| format!("user-{i}")).collect();
        let at_20: Vec<&String> = subjects.iter().filter(|s| r.is_enabled_for(s)).collect();
        r.advance(now).unwrap();
        for subject in &at_20 {
            assert!(r.is_enabled_for(subject));
        }
        let at_40 = subjects.iter().filter(|s| r.is_enabled_for(s)).count();
        assert!(at_40 >= at_20.len());
        assert!(at_40 > 0 && at_40 < 200);
    }

    #[test]
    fn test_pending_serves_nobody() {
        let r = rollout(100, 100);
        assert!(!r.is_enabled_for("anyone"));
    }

    #[test]
    fn test_rules() {
        let input = NewRollout {
            name: "x".into(),
            feature_key: "Bad Key".into(),
            description: None,
            target_percentage: 0,
            step_percentage: 101,
        };
        let errors = input.field_errors();
        for field in ["name", "feature_key", "target_percentage", "step_percentage"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }

    #[test]
    fn test_step_larger_than_target_is_allowed() {
        let input = NewRollout {
            name: "Quick launch".into(),
            feature_key: "launch.quick".into(),
            description: None,
            target_percentage: 20,
            step_percentage: 50,
        };
        assert!(input.field_errors().is_empty());
    }

    #[test]
    fn test_start_never_completes() {
        let now = Utc::now();
        let mut r = rollout(20, 50);
        r.start(now).unwrap();
        assert_eq!(r.status, RolloutStatus::Running);
        assert_eq!(r.current_percentage, 20);
        assert!(r.completed_at.is_none());
        r.advance(now).unwrap();
        assert_eq!(r.status, RolloutStatus::Completed);
    }
}
