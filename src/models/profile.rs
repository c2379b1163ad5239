use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Applicant profile, written by the identity provider. Read-only here;
/// supplies the snapshot fields copied onto an application at submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_city: Option<String>,
}
