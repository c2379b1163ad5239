use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job::DurationUnit;

/// Lifecycle of a job application. `Pending` is the only state that accepts
/// a decision; `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> ApplicationStatus {
        match self {
            Decision::Accept => ApplicationStatus::Accepted,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Accept => f.write_str("accept"),
            Decision::Reject => f.write_str("reject"),
        }
    }
}

impl ApplicationStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, ApplicationStatus::Pending)
    }

    /// Compute the next status for a decision. A decision on a non-pending
    /// application signals a stale client or a lost race, never a silent
    /// success.
    pub fn decide(self, decision: Decision) -> Result<ApplicationStatus> {
        match self {
            ApplicationStatus::Pending => Ok(decision.target_status()),
            decided => Err(Error::AlreadyDecided(format!(
                "application is already {}",
                decided
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub applicant_location: String,
    pub message: String,
    pub resume_key: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// An application to one of the caller's jobs, joined with the job title
/// for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedApplication {
    #[serde(flatten)]
    pub application: JobApplication,
    pub job_title: String,
}

/// Enough of the parent job to render an applicant's own application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub title: String,
    pub location: String,
    pub amount: Decimal,
    pub duration_unit: DurationUnit,
    pub contact_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedApplication {
    #[serde(flatten)]
    pub application: JobApplication,
    pub job: JobSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_accepts_either_decision() {
        assert_eq!(
            ApplicationStatus::Pending.decide(Decision::Accept).unwrap(),
            ApplicationStatus::Accepted
        );
        assert_eq!(
            ApplicationStatus::Pending.decide(Decision::Reject).unwrap(),
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn decided_states_are_terminal() {
        for decided in [ApplicationStatus::Accepted, ApplicationStatus::Rejected] {
            for decision in [Decision::Accept, Decision::Reject] {
                let err = decided.decide(decision).unwrap_err();
                assert!(matches!(err, Error::AlreadyDecided(_)), "{decided} {decision}");
            }
        }
    }
}
