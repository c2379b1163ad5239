use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::cache::DashboardView;
use crate::error::{Error, Result};
use crate::models::application::{ApplicationStatus, Decision, JobApplication};
use crate::store::{ApplicationInsert, StoreGateway};

/// Result of a decision. An accept whose cleanup steps (rejecting rivals,
/// closing the job) did not land is still a success for the caller; the
/// flags tell the client to drive a reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub decision: Decision,
    pub status: ApplicationStatus,
    pub rivals_rejected: u64,
    pub job_closed: bool,
    pub cleanup_complete: bool,
}

/// Result of re-running the accept sequence's cleanup steps. Both counts
/// are zero when the job was already fully reconciled.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub accepted_application_id: Option<Uuid>,
    pub rivals_rejected: u64,
    pub job_newly_closed: bool,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted(JobApplication),
    /// The store already holds an application for this (job, applicant)
    /// pair; a second tab or a retried request, not an error.
    AlreadyApplied,
}

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn StoreGateway>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// Decide an application on behalf of the job owner.
    ///
    /// Accepts run a strictly ordered sequence of independent store calls:
    /// read the application, conditionally accept it, reject the pending
    /// rivals, close the job. The accept comes before the bulk rejection on
    /// purpose: interrupted after it, the job still has one accepted and
    /// some pending applications, which a reconcile pass can finish; the
    /// reverse order could leave a job with every application rejected and
    /// none accepted.
    pub async fn decide_application(
        &self,
        owner_id: Uuid,
        application_id: Uuid,
        decision: Decision,
    ) -> Result<DecisionOutcome> {
        match decision {
            Decision::Reject => self.reject(application_id).await,
            Decision::Accept => self.accept(owner_id, application_id).await,
        }
    }

    async fn reject(&self, application_id: Uuid) -> Result<DecisionOutcome> {
        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        // Single conditional update; the state machine's verdict on the
        // fetched status would already be stale, the filter decides.
        let affected = self
            .store
            .update_application_status(
                application_id,
                ApplicationStatus::Pending,
                ApplicationStatus::Rejected,
            )
            .await?;
        if affected == 0 {
            let current = self
                .store
                .get_application(application_id)
                .await?
                .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
            // The state machine names the refusal; a still-pending row means
            // the update raced something else entirely.
            current.status.decide(Decision::Reject)?;
            return Err(Error::PreconditionFailed(
                "application changed concurrently".to_string(),
            ));
        }

        Ok(DecisionOutcome {
            application_id,
            job_id: application.job_id,
            decision: Decision::Reject,
            status: ApplicationStatus::Rejected,
            rivals_rejected: 0,
            job_closed: false,
            cleanup_complete: true,
        })
    }

    async fn accept(&self, owner_id: Uuid, application_id: Uuid) -> Result<DecisionOutcome> {
        // Step 1: read, to learn the parent job.
        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        let job_id = application.job_id;

        // Step 2: conditional accept with the job-level sibling guard. Any
        // failure here aborts the whole operation; nothing has been written.
        let affected = self.store.accept_application(application_id, job_id).await?;
        if affected == 0 {
            let current = self
                .store
                .get_application(application_id)
                .await?
                .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
            // Still pending means our own precondition held and the sibling
            // guard is what blocked us; otherwise the state machine names
            // the refusal.
            return Err(match current.status.decide(Decision::Accept) {
                Ok(_) => Error::PreconditionFailed(
                    "another application for this job has already been accepted".to_string(),
                ),
                Err(err) => err,
            });
        }

        // Step 3: reject the pending rivals. On failure the job is left
        // with one accepted and some pending applications and stays open;
        // step 4 is not attempted, a reconcile pass drives both later.
        let rivals_rejected = match self
            .store
            .reject_pending_siblings(job_id, application_id)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    %application_id, %job_id, error = %err,
                    "application accepted, but rejecting rival applications failed"
                );
                return Ok(DecisionOutcome {
                    application_id,
                    job_id,
                    decision: Decision::Accept,
                    status: ApplicationStatus::Accepted,
                    rivals_rejected: 0,
                    job_closed: false,
                    cleanup_complete: false,
                });
            }
        };

        // Step 4: close the job, scoped by owner. Failure is logged, not
        // surfaced; the accept itself already happened.
        let (job_closed, cleanup_complete) =
            match self.store.close_job(job_id, owner_id).await {
                Ok(n) if n > 0 => (true, true),
                Ok(_) => match self.store.get_job(job_id).await {
                    Ok(Some(job)) if !job.is_active => (true, true),
                    _ => {
                        warn!(
                            %job_id, %owner_id,
                            "application accepted, but closing the job matched no row"
                        );
                        (false, false)
                    }
                },
                Err(err) => {
                    warn!(%job_id, error = %err, "application accepted, but closing the job failed");
                    (false, false)
                }
            };

        Ok(DecisionOutcome {
            application_id,
            job_id,
            decision: Decision::Accept,
            status: ApplicationStatus::Accepted,
            rivals_rejected,
            job_closed,
            cleanup_complete,
        })
    }

    /// Re-run the accept sequence's cleanup steps for a job, owner only.
    /// Safe to call any number of times: both steps are conditional updates
    /// that match nothing once the job is fully reconciled. A job with no
    /// accepted application is left untouched.
    pub async fn reconcile_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<ReconcileOutcome> {
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

        let Some(accepted) = self.store.get_accepted_application(job_id).await? else {
            return Ok(ReconcileOutcome {
                accepted_application_id: None,
                rivals_rejected: 0,
                job_newly_closed: false,
            });
        };

        let rivals_rejected = self
            .store
            .reject_pending_siblings(job_id, accepted.id)
            .await?;
        let job_newly_closed = self.store.close_job(job_id, owner_id).await? > 0;

        Ok(ReconcileOutcome {
            accepted_application_id: Some(accepted.id),
            rivals_rejected,
            job_newly_closed,
        })
    }

    /// Submit an application, snapshotting the applicant's profile. The
    /// (job, applicant) uniqueness lives in the store; a conflict comes
    /// back as `AlreadyApplied`.
    pub async fn submit_application(
        &self,
        applicant_id: Uuid,
        applicant_email: &str,
        job_id: Uuid,
        message: String,
        resume_key: Option<String>,
    ) -> Result<SubmitOutcome> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        if job.owner_id == applicant_id {
            return Err(Error::BadRequest(
                "you cannot apply to your own job".to_string(),
            ));
        }
        if !job.is_active {
            return Err(Error::PreconditionFailed(
                "this job is no longer open".to_string(),
            ));
        }
        if job.requires_resume && resume_key.is_none() {
            return Err(Error::BadRequest(
                "this job requires a resume".to_string(),
            ));
        }

        let profile = self.store.get_profile(applicant_id).await?;
        let application = JobApplication {
            id: Uuid::new_v4(),
            job_id,
            applicant_id,
            applicant_name: profile
                .as_ref()
                .and_then(|p| p.full_name.clone())
                .unwrap_or_else(|| "Anonymous".to_string()),
            applicant_email: profile
                .as_ref()
                .and_then(|p| p.email.clone())
                .unwrap_or_else(|| applicant_email.to_string()),
            applicant_phone: profile
                .as_ref()
                .and_then(|p| p.phone.clone())
                .unwrap_or_default(),
            applicant_location: profile
                .as_ref()
                .and_then(|p| p.current_city.clone())
                .unwrap_or_default(),
            message,
            resume_key,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };

        match self.store.insert_application(application).await? {
            ApplicationInsert::Created(application) => Ok(SubmitOutcome::Submitted(application)),
            ApplicationInsert::AlreadyApplied => Ok(SubmitOutcome::AlreadyApplied),
        }
    }

    /// Authoritative dashboard load: the view the reconciliation cache
    /// converges to.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardView> {
        let jobs = self.store.list_jobs_by_owner(user_id).await?;
        let received = self.store.list_received_applications(user_id).await?;
        let submitted = self.store.list_submitted_applications(user_id).await?;
        Ok(DashboardView {
            jobs,
            received,
            submitted,
        })
    }
}
