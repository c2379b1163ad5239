use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    ApplicationStatus, JobApplication, JobSummary, ReceivedApplication, SubmittedApplication,
};
use crate::models::job::{Job, JobPatch};
use crate::models::profile::Profile;
use crate::store::{ApplicationInsert, StoreGateway};

#[derive(Default)]
struct Tables {
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, JobApplication>,
    profiles: HashMap<Uuid, Profile>,
    objects: HashMap<String, Bytes>,
}

/// In-memory store gateway with the same per-call atomicity as the remote
/// store: each trait method takes the table lock once, so a conditional
/// update is atomic on its own and nothing spans calls. Backs the
/// integration tests and is usable for embedding.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Profiles are owned by the identity provider, so they are not part of
    /// the gateway contract; tests seed them through this helper.
    pub fn insert_profile(&self, profile: Profile) {
        self.tables().profiles.insert(profile.user_id, profile);
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn insert_job(&self, job: Job) -> Result<Job> {
        self.tables().jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.tables().jobs.get(&id).cloned())
    }

    async fn update_job(&self, id: Uuid, owner_id: Uuid, patch: JobPatch) -> Result<u64> {
        let mut tables = self.tables();
        let Some(job) = tables.jobs.get_mut(&id).filter(|j| j.owner_id == owner_id) else {
            return Ok(0);
        };
        if let Some(title) = patch.title {
            job.title = title;
        }
        if let Some(organization_name) = patch.organization_name {
            job.organization_name = organization_name;
        }
        if let Some(city) = patch.city {
            job.city = Some(city);
        }
        if let Some(address) = patch.address {
            job.address = Some(address);
        }
        if let Some(location) = patch.location {
            job.location = location;
        }
        if let Some(contact_number) = patch.contact_number {
            job.contact_number = contact_number;
        }
        if let Some(amount) = patch.amount {
            job.amount = amount;
        }
        if let Some(duration_unit) = patch.duration_unit {
            job.duration_unit = duration_unit;
        }
        if let Some(job_type) = patch.job_type {
            job.job_type = job_type;
        }
        if let Some(description) = patch.description {
            job.description = Some(description);
        }
        if let Some(requires_resume) = patch.requires_resume {
            job.requires_resume = requires_resume;
        }
        job.updated_at = chrono::Utc::now();
        Ok(1)
    }

    async fn set_job_active(&self, id: Uuid, owner_id: Uuid, active: bool) -> Result<u64> {
        let mut tables = self.tables();
        match tables.jobs.get_mut(&id).filter(|j| j.owner_id == owner_id) {
            Some(job) => {
                job.is_active = active;
                job.updated_at = chrono::Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn close_job(&self, id: Uuid, owner_id: Uuid) -> Result<u64> {
        let mut tables = self.tables();
        match tables
            .jobs
            .get_mut(&id)
            .filter(|j| j.owner_id == owner_id && j.is_active)
        {
            Some(job) => {
                job.is_active = false;
                job.updated_at = chrono::Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_job(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut tables = self.tables();
        let owned = tables
            .jobs
            .get(&id)
            .map(|j| j.owner_id == owner_id)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }
        tables.jobs.remove(&id);
        // Store-level cascade, as the schema's ON DELETE CASCADE would do.
        tables.applications.retain(|_, a| a.job_id != id);
        Ok(true)
    }

    async fn list_jobs_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .tables()
            .jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn list_open_jobs(
        &self,
        exclude_owner: Uuid,
        location: Option<&str>,
    ) -> Result<Vec<Job>> {
        let needle = location.map(str::to_lowercase);
        let mut jobs: Vec<Job> = self
            .tables()
            .jobs
            .values()
            .filter(|j| j.is_active && j.owner_id != exclude_owner)
            .filter(|j| match &needle {
                Some(needle) => {
                    j.location.to_lowercase().contains(needle)
                        || j.city
                            .as_deref()
                            .is_some_and(|c| c.to_lowercase().contains(needle))
                        || j.address
                            .as_deref()
                            .is_some_and(|a| a.to_lowercase().contains(needle))
                }
                None => true,
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn insert_application(&self, application: JobApplication) -> Result<ApplicationInsert> {
        let mut tables = self.tables();
        let duplicate = tables.applications.values().any(|a| {
            a.job_id == application.job_id && a.applicant_id == application.applicant_id
        });
        if duplicate {
            return Ok(ApplicationInsert::AlreadyApplied);
        }
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(ApplicationInsert::Created(application))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<JobApplication>> {
        Ok(self.tables().applications.get(&id).cloned())
    }

    async fn get_accepted_application(&self, job_id: Uuid) -> Result<Option<JobApplication>> {
        Ok(self
            .tables()
            .applications
            .values()
            .find(|a| a.job_id == job_id && a.status == ApplicationStatus::Accepted)
            .cloned())
    }

    async fn accept_application(&self, id: Uuid, job_id: Uuid) -> Result<u64> {
        let mut tables = self.tables();
        let sibling_accepted = tables
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.status == ApplicationStatus::Accepted);
        if sibling_accepted {
            return Ok(0);
        }
        match tables
            .applications
            .get_mut(&id)
            .filter(|a| a.status == ApplicationStatus::Pending)
        {
            Some(application) => {
                application.status = ApplicationStatus::Accepted;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<u64> {
        let mut tables = self.tables();
        match tables.applications.get_mut(&id).filter(|a| a.status == from) {
            Some(application) => {
                application.status = to;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn reject_pending_siblings(&self, job_id: Uuid, except: Uuid) -> Result<u64> {
        let mut affected = 0;
        for application in self.tables().applications.values_mut() {
            if application.job_id == job_id
                && application.id != except
                && application.status == ApplicationStatus::Pending
            {
                application.status = ApplicationStatus::Rejected;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn list_received_applications(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ReceivedApplication>> {
        let tables = self.tables();
        let mut received: Vec<ReceivedApplication> = tables
            .applications
            .values()
            .filter_map(|a| {
                let job = tables.jobs.get(&a.job_id)?;
                (job.owner_id == owner_id).then(|| ReceivedApplication {
                    application: a.clone(),
                    job_title: job.title.clone(),
                })
            })
            .collect();
        received.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(received)
    }

    async fn list_submitted_applications(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<SubmittedApplication>> {
        let tables = self.tables();
        let mut submitted: Vec<SubmittedApplication> = tables
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .filter_map(|a| {
                let job = tables.jobs.get(&a.job_id)?;
                Some(SubmittedApplication {
                    application: a.clone(),
                    job: JobSummary {
                        title: job.title.clone(),
                        location: job.location.clone(),
                        amount: job.amount,
                        duration_unit: job.duration_unit,
                        contact_number: job.contact_number.clone(),
                    },
                })
            })
            .collect();
        submitted.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(submitted)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.tables().profiles.get(&user_id).cloned())
    }

    async fn put_object(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<String> {
        self.tables()
            .objects
            .insert(format!("{}/{}", bucket, key), bytes);
        Ok(key.to_string())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }
}
