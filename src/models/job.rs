use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "duration_unit", rename_all = "lowercase")]
pub enum DurationUnit {
    Hourly,
    Daily,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub organization_name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Combined "city, address"; the only location field on legacy rows.
    pub location: String,
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

impl Job {
    pub fn location_display(&self) -> String {
        match (&self.city, &self.address) {
            (Some(city), Some(address)) => format!("{}, {}", city, address),
            _ => self.location.clone(),
        }
    }
}

/// Field-level patch for an owner edit. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub organization_name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub contact_number: Option<String>,
    pub amount: Option<Decimal>,
    pub duration_unit: Option<DurationUnit>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub requires_resume: Option<bool>,
}
