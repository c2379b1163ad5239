use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{ApplicationStatus, Decision, JobApplication};
use crate::models::application::{ReceivedApplication, SubmittedApplication};
use crate::models::job::Job;

/// A user's view of the board: their postings, the applications those
/// postings received, and the applications they submitted elsewhere.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub jobs: Vec<Job>,
    pub received: Vec<ReceivedApplication>,
    pub submitted: Vec<SubmittedApplication>,
}

/// Applications to one job, for display.
#[derive(Debug, Clone, Serialize)]
pub struct JobApplicationsGroup {
    pub job_id: Uuid,
    pub job_title: String,
    pub applications: Vec<JobApplication>,
}

/// A mutation the client just performed, applied to the local view before
/// the store has been re-read.
#[derive(Debug, Clone)]
pub enum LocalChange {
    JobPosted { job: Job },
    JobEdited { job: Job },
    JobToggled { job_id: Uuid, active: bool },
    JobDeleted { job_id: Uuid },
    ApplicationSubmitted { job_id: Uuid },
    ApplicationDecided {
        application_id: Uuid,
        job_id: Uuid,
        decision: Decision,
    },
}

#[derive(Default)]
struct CacheState {
    view: DashboardView,
    /// Jobs applied to since the last reconcile; folded into the derived
    /// applied-set so the UI can disable the button immediately.
    optimistic_applied: HashSet<Uuid>,
    stale: bool,
}

/// Client-visible view kept consistent with the store by optimistic local
/// mutation plus deferred authoritative re-fetch.
///
/// Every local mutation is provisional: the next `reconcile` overwrites it
/// wholesale, so a wrong guess can never outlive one re-fetch. When an
/// operation fails the guess is discarded (`mark_stale`) instead of
/// computing a rollback value locally.
pub struct ReconciliationCache {
    state: Mutex<CacheState>,
}

impl Default for ReconciliationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                stale: true,
                ..CacheState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DashboardView {
        self.state().view.clone()
    }

    /// True when the view has never been loaded or an optimistic guess was
    /// discarded; the caller should re-fetch before trusting `snapshot`.
    pub fn is_stale(&self) -> bool {
        self.state().stale
    }

    /// Overwrite with an authoritative store read. Any optimistic mismatch
    /// loses.
    pub fn reconcile(&self, view: DashboardView) {
        let mut state = self.state();
        state.view = view;
        state.optimistic_applied.clear();
        state.stale = false;
    }

    /// Discard whatever was guessed locally; the next read must re-fetch.
    pub fn mark_stale(&self) {
        self.state().stale = true;
    }

    pub fn apply(&self, change: LocalChange) {
        let mut state = self.state();
        match change {
            LocalChange::JobPosted { job } => {
                state.view.jobs.insert(0, job);
            }
            LocalChange::JobEdited { job } => {
                if let Some(slot) = state.view.jobs.iter_mut().find(|j| j.id == job.id) {
                    *slot = job;
                }
            }
            LocalChange::JobToggled { job_id, active } => {
                if let Some(job) = state.view.jobs.iter_mut().find(|j| j.id == job_id) {
                    job.is_active = active;
                }
            }
            LocalChange::JobDeleted { job_id } => {
                state.view.jobs.retain(|j| j.id != job_id);
                state
                    .view
                    .received
                    .retain(|r| r.application.job_id != job_id);
            }
            LocalChange::ApplicationSubmitted { job_id } => {
                state.optimistic_applied.insert(job_id);
            }
            LocalChange::ApplicationDecided {
                application_id,
                job_id,
                decision,
            } => {
                match decision {
                    Decision::Accept => {
                        // Mirror the orchestrator's eventual effect: target
                        // accepted, pending rivals rejected, job closed.
                        for entry in &mut state.view.received {
                            if entry.application.job_id != job_id {
                                continue;
                            }
                            if entry.application.id == application_id {
                                entry.application.status = ApplicationStatus::Accepted;
                            } else if entry.application.status.is_pending() {
                                entry.application.status = ApplicationStatus::Rejected;
                            }
                        }
                        if let Some(job) = state.view.jobs.iter_mut().find(|j| j.id == job_id) {
                            job.is_active = false;
                        }
                    }
                    Decision::Reject => {
                        if let Some(entry) = state
                            .view
                            .received
                            .iter_mut()
                            .find(|r| r.application.id == application_id)
                        {
                            entry.application.status = ApplicationStatus::Rejected;
                        }
                    }
                }
            }
        }
    }

    /// Received applications grouped by job, in view order.
    pub fn grouped_received(&self) -> Vec<JobApplicationsGroup> {
        let state = self.state();
        let mut groups: Vec<JobApplicationsGroup> = Vec::new();
        for entry in &state.view.received {
            match groups
                .iter_mut()
                .find(|g| g.job_id == entry.application.job_id)
            {
                Some(group) => group.applications.push(entry.application.clone()),
                None => groups.push(JobApplicationsGroup {
                    job_id: entry.application.job_id,
                    job_title: entry.job_title.clone(),
                    applications: vec![entry.application.clone()],
                }),
            }
        }
        groups
    }

    /// Jobs this user has applied to, including not-yet-reconciled
    /// submissions; drives the "already applied" affordance.
    pub fn applied_job_ids(&self) -> HashSet<Uuid> {
        let state = self.state();
        let mut ids: HashSet<Uuid> = state
            .view
            .submitted
            .iter()
            .map(|s| s.application.job_id)
            .collect();
        ids.extend(state.optimistic_applied.iter().copied());
        ids
    }

    pub fn has_applied(&self, job_id: Uuid) -> bool {
        self.applied_job_ids().contains(&job_id)
    }

    /// Schedule the deferred authoritative re-fetch that follows every
    /// mutation. Runs detached: a client navigating away must not abort
    /// the convergence pass.
    pub fn schedule_reconcile<F, Fut>(self: &Arc<Self>, delay: Duration, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<DashboardView>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match fetch().await {
                Ok(view) => cache.reconcile(view),
                Err(err) => {
                    warn!(error = %err, "deferred dashboard reconcile failed");
                    cache.mark_stale();
                }
            }
        });
    }
}

/// Per-user cache handout.
#[derive(Clone, Default)]
pub struct SessionCaches {
    inner: Arc<Mutex<HashMap<Uuid, Arc<ReconciliationCache>>>>,
}

impl SessionCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(&self, user_id: Uuid) -> Arc<ReconciliationCache> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(user_id)
            .or_insert_with(|| Arc::new(ReconciliationCache::new()))
            .clone()
    }
}
