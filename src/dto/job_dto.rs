use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::job::{DurationUnit, Job};

pub const JOB_TYPES: &[&str] = &[
    "household",
    "it",
    "data-entry",
    "non-tech",
    "sales",
    "marketing",
    "finance",
    "education",
    "healthcare",
    "construction",
    "general",
];

fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_positive"))
    }
}

fn validate_job_type(job_type: &str) -> Result<(), ValidationError> {
    if JOB_TYPES.contains(&job_type) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_job_type"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub organization_name: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 10))]
    pub contact_number: String,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    pub duration_unit: DurationUnit,
    #[validate(custom(function = "validate_job_type"))]
    pub job_type: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requires_resume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub organization_name: Option<String>,
    #[validate(length(min = 1))]
    pub city: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(length(min = 10))]
    pub contact_number: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Option<Decimal>,
    pub duration_unit: Option<DurationUnit>,
    #[validate(custom(function = "validate_job_type"))]
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub requires_resume: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActivePayload {
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BrowseJobsQuery {
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub title: String,
    pub organization_name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub location: String,
    pub location_display: String,
    pub contact_number: String,
    pub amount: Decimal,
    pub duration_unit: DurationUnit,
    pub job_type: String,
    pub description: Option<String>,
    pub requires_resume: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
}

impl From<Job> for JobResponse {
    fn from(value: Job) -> Self {
        let location_display = value.location_display();
        Self {
            id: value.id,
            owner_id: value.owner_id,
            title: value.title,
            organization_name: value.organization_name,
            city: value.city,
            address: value.address,
            location: value.location,
            location_display,
            contact_number: value.contact_number,
            amount: value.amount,
            duration_unit: value.duration_unit,
            job_type: value.job_type,
            description: value.description,
            requires_resume: value.requires_resume,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Vec<Job>> for JobListResponse {
    fn from(value: Vec<Job>) -> Self {
        Self {
            items: value.into_iter().map(Into::into).collect(),
        }
    }
}
