use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    ApplicationStatus, JobApplication, ReceivedApplication, SubmittedApplication,
};
use crate::models::job::{Job, JobPatch};
use crate::models::profile::Profile;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of an application insert. A second application by the same
/// applicant for the same job is not an error, the caller reports it as
/// "already applied".
#[derive(Debug, Clone)]
pub enum ApplicationInsert {
    Created(JobApplication),
    AlreadyApplied,
}

/// Record-level contract over the remote store.
///
/// Every conditional write is a single store call and atomic on its own;
/// nothing here spans calls, so multi-record operations built on top must
/// order their steps to stay resumable under partial failure. Updates
/// return the affected-row count: zero means the precondition filter
/// matched nothing, which callers disambiguate from absence with a read.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn insert_job(&self, job: Job) -> Result<Job>;
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Patch job fields, scoped by owner.
    async fn update_job(&self, id: Uuid, owner_id: Uuid, patch: JobPatch) -> Result<u64>;
    /// Open or close a job, scoped by owner.
    async fn set_job_active(&self, id: Uuid, owner_id: Uuid, active: bool) -> Result<u64>;
    /// Conditional close used by the accept sequence and reconciliation:
    /// `is_active -> false` only when currently open, scoped by owner, so
    /// re-runs affect zero rows.
    async fn close_job(&self, id: Uuid, owner_id: Uuid) -> Result<u64>;
    async fn delete_job(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;
    async fn list_jobs_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>>;
    /// Open jobs visible to an applicant: everyone's but their own,
    /// optionally narrowed by a location substring.
    async fn list_open_jobs(&self, exclude_owner: Uuid, location: Option<&str>)
        -> Result<Vec<Job>>;

    async fn insert_application(&self, application: JobApplication) -> Result<ApplicationInsert>;
    async fn get_application(&self, id: Uuid) -> Result<Option<JobApplication>>;
    async fn get_accepted_application(&self, job_id: Uuid) -> Result<Option<JobApplication>>;
    /// Conditional `pending -> accepted`, additionally guarded by "no
    /// application of this job is accepted yet". The guard is part of the
    /// same store call, so two concurrent accepts on different rows of one
    /// job cannot both win.
    async fn accept_application(&self, id: Uuid, job_id: Uuid) -> Result<u64>;
    /// Conditional status update on a single row; affects zero rows when
    /// the current status is not `from`.
    async fn update_application_status(
        &self,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<u64>;
    /// Bulk conditional update: every still-pending application of the job
    /// except `except` becomes rejected. Idempotent.
    async fn reject_pending_siblings(&self, job_id: Uuid, except: Uuid) -> Result<u64>;
    async fn list_received_applications(&self, owner_id: Uuid)
        -> Result<Vec<ReceivedApplication>>;
    async fn list_submitted_applications(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<SubmittedApplication>>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    async fn put_object(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<String>;
    fn public_url(&self, bucket: &str, key: &str) -> String;
}
