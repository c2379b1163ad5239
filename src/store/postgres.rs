use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{
    ApplicationStatus, JobApplication, JobSummary, ReceivedApplication, SubmittedApplication,
};
use crate::models::job::{Job, JobPatch};
use crate::models::profile::Profile;
use crate::store::{ApplicationInsert, StoreGateway};

const JOB_COLUMNS: &str = "id, owner_id, title, organization_name, city, address, location, \
     contact_number, amount, duration_unit, job_type, description, requires_resume, is_active, \
     created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, applicant_name, applicant_email, \
     applicant_phone, applicant_location, message, resume_key, status, created_at";

/// Store gateway over Postgres. Every write is a single statement; the
/// conditional filters are the only atomicity the callers get.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    uploads_dir: PathBuf,
    public_base_url: String,
}

impl PgStore {
    pub fn new(pool: PgPool, uploads_dir: impl Into<PathBuf>, public_base_url: String) -> Self {
        Self {
            pool,
            uploads_dir: uploads_dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StoreGateway for PgStore {
    async fn insert_job(&self, job: Job) -> Result<Job> {
        sqlx::query(
            "INSERT INTO jobs (id, owner_id, title, organization_name, city, address, location, \
             contact_number, amount, duration_unit, job_type, description, requires_resume, \
             is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(job.id)
        .bind(job.owner_id)
        .bind(&job.title)
        .bind(&job.organization_name)
        .bind(&job.city)
        .bind(&job.address)
        .bind(&job.location)
        .bind(&job.contact_number)
        .bind(job.amount)
        .bind(job.duration_unit)
        .bind(&job.job_type)
        .bind(&job.description)
        .bind(job.requires_resume)
        .bind(job.is_active)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, owner_id: Uuid, patch: JobPatch) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE jobs SET \
                 title = COALESCE($3, title), \
                 organization_name = COALESCE($4, organization_name), \
                 city = COALESCE($5, city), \
                 address = COALESCE($6, address), \
                 location = COALESCE($7, location), \
                 contact_number = COALESCE($8, contact_number), \
                 amount = COALESCE($9, amount), \
                 duration_unit = COALESCE($10, duration_unit), \
                 job_type = COALESCE($11, job_type), \
                 description = COALESCE($12, description), \
                 requires_resume = COALESCE($13, requires_resume), \
                 updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.organization_name)
        .bind(patch.city)
        .bind(patch.address)
        .bind(patch.location)
        .bind(patch.contact_number)
        .bind(patch.amount)
        .bind(patch.duration_unit)
        .bind(patch.job_type)
        .bind(patch.description)
        .bind(patch.requires_resume)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn set_job_active(&self, id: Uuid, owner_id: Uuid, active: bool) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE jobs SET is_active = $3, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn close_job(&self, id: Uuid, owner_id: Uuid) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE jobs SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND is_active",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete_job(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_jobs_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn list_open_jobs(
        &self,
        exclude_owner: Uuid,
        location: Option<&str>,
    ) -> Result<Vec<Job>> {
        let jobs = match location {
            Some(needle) => {
                let pattern = format!("%{}%", needle);
                sqlx::query_as::<_, Job>(&format!(
                    "SELECT {JOB_COLUMNS} FROM jobs \
                     WHERE is_active AND owner_id <> $1 \
                       AND (location ILIKE $2 OR city ILIKE $2 OR address ILIKE $2) \
                     ORDER BY created_at DESC"
                ))
                .bind(exclude_owner)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Job>(&format!(
                    "SELECT {JOB_COLUMNS} FROM jobs \
                     WHERE is_active AND owner_id <> $1 \
                     ORDER BY created_at DESC"
                ))
                .bind(exclude_owner)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(jobs)
    }

    async fn insert_application(&self, application: JobApplication) -> Result<ApplicationInsert> {
        let res = sqlx::query(
            "INSERT INTO job_applications (id, job_id, applicant_id, applicant_name, \
             applicant_email, applicant_phone, applicant_location, message, resume_key, status, \
             created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (job_id, applicant_id) DO NOTHING",
        )
        .bind(application.id)
        .bind(application.job_id)
        .bind(application.applicant_id)
        .bind(&application.applicant_name)
        .bind(&application.applicant_email)
        .bind(&application.applicant_phone)
        .bind(&application.applicant_location)
        .bind(&application.message)
        .bind(&application.resume_key)
        .bind(application.status)
        .bind(application.created_at)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            Ok(ApplicationInsert::AlreadyApplied)
        } else {
            Ok(ApplicationInsert::Created(application))
        }
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<JobApplication>> {
        let application = sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn get_accepted_application(&self, job_id: Uuid) -> Result<Option<JobApplication>> {
        let application = sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications \
             WHERE job_id = $1 AND status = 'accepted'"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn accept_application(&self, id: Uuid, job_id: Uuid) -> Result<u64> {
        // Precondition and sibling guard in one statement. The subquery
        // reads a snapshot, so a rival accept committing concurrently can
        // slip past it; the partial unique index (one accepted row per job)
        // then rejects the write, which counts as a precondition miss.
        let res = sqlx::query(
            "UPDATE job_applications SET status = 'accepted' \
             WHERE id = $1 AND status = 'pending' \
               AND NOT EXISTS ( \
                   SELECT 1 FROM job_applications \
                   WHERE job_id = $2 AND status = 'accepted' \
               )",
        )
        .bind(id)
        .bind(job_id)
        .execute(&self.pool)
        .await;
        match res {
            Ok(res) => Ok(res.rows_affected()),
            Err(sqlx::Error::Database(err))
                if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE job_applications SET status = $3 WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn reject_pending_siblings(&self, job_id: Uuid, except: Uuid) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE job_applications SET status = 'rejected' \
             WHERE job_id = $1 AND id <> $2 AND status = 'pending'",
        )
        .bind(job_id)
        .bind(except)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn list_received_applications(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ReceivedApplication>> {
        let rows = sqlx::query(
            "SELECT a.id, a.job_id, a.applicant_id, a.applicant_name, a.applicant_email, \
                    a.applicant_phone, a.applicant_location, a.message, a.resume_key, a.status, \
                    a.created_at, j.title AS job_title \
             FROM job_applications a \
             JOIN jobs j ON j.id = a.job_id \
             WHERE j.owner_id = $1 \
             ORDER BY a.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut received = Vec::with_capacity(rows.len());
        for row in rows {
            let application = JobApplication::from_row(&row)?;
            let job_title: String = row.try_get("job_title")?;
            received.push(ReceivedApplication {
                application,
                job_title,
            });
        }
        Ok(received)
    }

    async fn list_submitted_applications(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<SubmittedApplication>> {
        let rows = sqlx::query(
            "SELECT a.id, a.job_id, a.applicant_id, a.applicant_name, a.applicant_email, \
                    a.applicant_phone, a.applicant_location, a.message, a.resume_key, a.status, \
                    a.created_at, j.title AS job_title, j.location AS job_location, \
                    j.amount AS job_amount, j.duration_unit AS job_duration_unit, \
                    j.contact_number AS job_contact_number \
             FROM job_applications a \
             JOIN jobs j ON j.id = a.job_id \
             WHERE a.applicant_id = $1 \
             ORDER BY a.created_at DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut submitted = Vec::with_capacity(rows.len());
        for row in rows {
            let application = JobApplication::from_row(&row)?;
            let job = JobSummary {
                title: row.try_get("job_title")?,
                location: row.try_get("job_location")?,
                amount: row.try_get("job_amount")?,
                duration_unit: row.try_get("job_duration_unit")?,
                contact_number: row.try_get("job_contact_number")?,
            };
            submitted.push(SubmittedApplication { application, job });
        }
        Ok(submitted)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, full_name, email, phone, current_city FROM profiles \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn put_object(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<String> {
        if key.contains("..") || bucket.contains("..") {
            return Err(Error::BadRequest("invalid object key".to_string()));
        }
        let path = self.uploads_dir.join(bucket).join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        Ok(key.to_string())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/uploads/{}/{}", self.public_base_url, bucket, key)
    }
}
