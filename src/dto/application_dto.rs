use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Decision, JobApplication};
use crate::services::application_service::SubmitOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationPayload {
    pub job_id: Uuid,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub message: String,
    pub resume_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub already_applied: bool,
    pub application: Option<JobApplication>,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(value: SubmitOutcome) -> Self {
        match value {
            SubmitOutcome::Submitted(application) => Self {
                already_applied: false,
                application: Some(application),
            },
            SubmitOutcome::AlreadyApplied => Self {
                already_applied: true,
                application: None,
            },
        }
    }
}
