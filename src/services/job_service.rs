use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dto::job_dto::{PostJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobPatch};
use crate::store::StoreGateway;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn StoreGateway>,
}

impl JobService {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    pub async fn post_job(&self, owner_id: Uuid, payload: PostJobPayload) -> Result<Job> {
        let now = Utc::now();
        // The combined location is kept alongside city/address for rows and
        // clients predating the split.
        let location = format!("{}, {}", payload.city, payload.address);
        let job = Job {
            id: Uuid::new_v4(),
            owner_id,
            title: payload.title,
            organization_name: payload.organization_name,
            city: Some(payload.city),
            address: Some(payload.address),
            location,
            contact_number: payload.contact_number,
            amount: payload.amount,
            duration_unit: payload.duration_unit,
            job_type: payload.job_type,
            description: payload.description,
            requires_resume: payload.requires_resume,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_job(job).await
    }

    pub async fn edit_job(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        payload: UpdateJobPayload,
    ) -> Result<Job> {
        let current = self.owned_job(owner_id, job_id).await?;

        let mut patch = JobPatch {
            title: payload.title,
            organization_name: payload.organization_name,
            city: payload.city,
            address: payload.address,
            location: None,
            contact_number: payload.contact_number,
            amount: payload.amount,
            duration_unit: payload.duration_unit,
            job_type: payload.job_type,
            description: payload.description,
            requires_resume: payload.requires_resume,
        };
        if patch.city.is_some() || patch.address.is_some() {
            let city = patch.city.clone().or(current.city).unwrap_or_default();
            let address = patch.address.clone().or(current.address).unwrap_or_default();
            patch.location = Some(format!("{}, {}", city, address));
        }

        let affected = self.store.update_job(job_id, owner_id, patch).await?;
        if affected == 0 {
            return Err(Error::NotFound("Job not found".to_string()));
        }
        self.store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    /// Manual open/close by the owner. Takes the desired state rather than
    /// flipping, so a retried request is idempotent. No side effects on the
    /// job's applications.
    pub async fn set_active(&self, owner_id: Uuid, job_id: Uuid, active: bool) -> Result<Job> {
        let affected = self.store.set_job_active(job_id, owner_id, active).await?;
        if affected == 0 {
            self.owned_job(owner_id, job_id).await?;
            return Err(Error::NotFound("Job not found".to_string()));
        }
        self.store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    pub async fn delete_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<()> {
        let deleted = self.store.delete_job(job_id, owner_id).await?;
        if !deleted {
            self.owned_job(owner_id, job_id).await?;
            return Err(Error::NotFound("Job not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_my_jobs(&self, owner_id: Uuid) -> Result<Vec<Job>> {
        self.store.list_jobs_by_owner(owner_id).await
    }

    /// Open jobs for browsing; the caller's own postings are hidden.
    pub async fn browse_jobs(&self, user_id: Uuid, location: Option<&str>) -> Result<Vec<Job>> {
        self.store.list_open_jobs(user_id, location).await
    }

    /// Fetch a job and check ownership, splitting `NotFound` from an
    /// ownership mismatch.
    async fn owned_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<Job> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        if job.owner_id != owner_id {
            return Err(Error::PreconditionFailed(
                "job is owned by another user".to_string(),
            ));
        }
        Ok(job)
    }
}
