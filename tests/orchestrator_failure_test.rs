use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use mockall::mock;
use mockall::predicate::eq;
use uuid::Uuid;

use jobboard_backend::error::{Error, Result};
use jobboard_backend::models::application::{
    ApplicationStatus, Decision, JobApplication, ReceivedApplication, SubmittedApplication,
};
use jobboard_backend::models::job::{Job, JobPatch};
use jobboard_backend::models::profile::Profile;
use jobboard_backend::services::application_service::ApplicationService;
use jobboard_backend::store::{ApplicationInsert, StoreGateway};

// Mockall cannot mock an async trait method whose argument has a
// non-'static reference inside a generic type (`Option<&str>` in
// `list_open_jobs`), so the mock exposes inherent methods (with that
// argument owned) and a handwritten impl forwards the trait to them.
// The `expect_*` API used by the tests is unchanged.
mock! {
    Store {
        async fn insert_job(&self, job: Job) -> Result<Job>;
        async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;
        async fn update_job(&self, id: Uuid, owner_id: Uuid, patch: JobPatch) -> Result<u64>;
        async fn set_job_active(&self, id: Uuid, owner_id: Uuid, active: bool) -> Result<u64>;
        async fn close_job(&self, id: Uuid, owner_id: Uuid) -> Result<u64>;
        async fn delete_job(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;
        async fn list_jobs_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>>;
        async fn list_open_jobs(
            &self,
            exclude_owner: Uuid,
            location: Option<String>,
        ) -> Result<Vec<Job>>;
        async fn insert_application(
            &self,
            application: JobApplication,
        ) -> Result<ApplicationInsert>;
        async fn get_application(&self, id: Uuid) -> Result<Option<JobApplication>>;
        async fn get_accepted_application(&self, job_id: Uuid) -> Result<Option<JobApplication>>;
        async fn accept_application(&self, id: Uuid, job_id: Uuid) -> Result<u64>;
        async fn update_application_status(
            &self,
            id: Uuid,
            from: ApplicationStatus,
            to: ApplicationStatus,
        ) -> Result<u64>;
        async fn reject_pending_siblings(&self, job_id: Uuid, except: Uuid) -> Result<u64>;
        async fn list_received_applications(
            &self,
            owner_id: Uuid,
        ) -> Result<Vec<ReceivedApplication>>;
        async fn list_submitted_applications(
            &self,
            applicant_id: Uuid,
        ) -> Result<Vec<SubmittedApplication>>;
        async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
        async fn put_object(&self, bucket: String, key: String, bytes: Bytes) -> Result<String>;
        fn public_url(&self, bucket: String, key: String) -> String;
    }
}

#[async_trait]
impl StoreGateway for MockStore {
    async fn insert_job(&self, job: Job) -> Result<Job> {
        MockStore::insert_job(self, job).await
    }
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        MockStore::get_job(self, id).await
    }
    async fn update_job(&self, id: Uuid, owner_id: Uuid, patch: JobPatch) -> Result<u64> {
        MockStore::update_job(self, id, owner_id, patch).await
    }
    async fn set_job_active(&self, id: Uuid, owner_id: Uuid, active: bool) -> Result<u64> {
        MockStore::set_job_active(self, id, owner_id, active).await
    }
    async fn close_job(&self, id: Uuid, owner_id: Uuid) -> Result<u64> {
        MockStore::close_job(self, id, owner_id).await
    }
    async fn delete_job(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        MockStore::delete_job(self, id, owner_id).await
    }
    async fn list_jobs_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>> {
        MockStore::list_jobs_by_owner(self, owner_id).await
    }
    async fn list_open_jobs(
        &self,
        exclude_owner: Uuid,
        location: Option<&str>,
    ) -> Result<Vec<Job>> {
        MockStore::list_open_jobs(self, exclude_owner, location.map(str::to_owned)).await
    }
    async fn insert_application(&self, application: JobApplication) -> Result<ApplicationInsert> {
        MockStore::insert_application(self, application).await
    }
    async fn get_application(&self, id: Uuid) -> Result<Option<JobApplication>> {
        MockStore::get_application(self, id).await
    }
    async fn get_accepted_application(&self, job_id: Uuid) -> Result<Option<JobApplication>> {
        MockStore::get_accepted_application(self, job_id).await
    }
    async fn accept_application(&self, id: Uuid, job_id: Uuid) -> Result<u64> {
        MockStore::accept_application(self, id, job_id).await
    }
    async fn update_application_status(
        &self,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<u64> {
        MockStore::update_application_status(self, id, from, to).await
    }
    async fn reject_pending_siblings(&self, job_id: Uuid, except: Uuid) -> Result<u64> {
        MockStore::reject_pending_siblings(self, job_id, except).await
    }
    async fn list_received_applications(&self, owner_id: Uuid) -> Result<Vec<ReceivedApplication>> {
        MockStore::list_received_applications(self, owner_id).await
    }
    async fn list_submitted_applications(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<SubmittedApplication>> {
        MockStore::list_submitted_applications(self, applicant_id).await
    }
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        MockStore::get_profile(self, user_id).await
    }
    async fn put_object(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<String> {
        MockStore::put_object(self, bucket.to_owned(), key.to_owned(), bytes).await
    }
    fn public_url(&self, bucket: &str, key: &str) -> String {
        MockStore::public_url(self, bucket.to_owned(), key.to_owned())
    }
}

fn pending_application(job_id: Uuid) -> JobApplication {
    JobApplication {
        id: Uuid::new_v4(),
        job_id,
        applicant_id: Uuid::new_v4(),
        applicant_name: "Asha Kumar".to_string(),
        applicant_email: "asha@example.com".to_string(),
        applicant_phone: String::new(),
        applicant_location: String::new(),
        message: String::new(),
        resume_key: None,
        status: ApplicationStatus::Pending,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn rival_rejection_failure_skips_the_job_close() {
    let owner = Uuid::new_v4();
    let job_id = Uuid::new_v4();
    let application = pending_application(job_id);
    let application_id = application.id;

    let mut store = MockStore::new();
    store
        .expect_get_application()
        .with(eq(application_id))
        .times(1)
        .returning(move |_| Ok(Some(application.clone())));
    store
        .expect_accept_application()
        .with(eq(application_id), eq(job_id))
        .times(1)
        .returning(|_, _| Ok(1));
    store
        .expect_reject_pending_siblings()
        .with(eq(job_id), eq(application_id))
        .times(1)
        .returning(|_, _| Err(Error::StoreUnavailable("connection reset".to_string())));
    // The close must not run once the rejection step failed; the job has to
    // stay open so a later reconcile can find the pending rivals.
    store.expect_close_job().never();

    let service = ApplicationService::new(Arc::new(store));
    let outcome = service
        .decide_application(owner, application_id, Decision::Accept)
        .await
        .expect("the accept itself landed");

    assert_eq!(outcome.status, ApplicationStatus::Accepted);
    assert_eq!(outcome.rivals_rejected, 0);
    assert!(!outcome.job_closed);
    assert!(!outcome.cleanup_complete);
}

#[tokio::test]
async fn job_close_failure_is_swallowed_after_rivals_are_rejected() {
    let owner = Uuid::new_v4();
    let job_id = Uuid::new_v4();
    let application = pending_application(job_id);
    let application_id = application.id;

    let mut store = MockStore::new();
    store
        .expect_get_application()
        .with(eq(application_id))
        .times(1)
        .returning(move |_| Ok(Some(application.clone())));
    store
        .expect_accept_application()
        .times(1)
        .returning(|_, _| Ok(1));
    store
        .expect_reject_pending_siblings()
        .times(1)
        .returning(|_, _| Ok(2));
    store
        .expect_close_job()
        .with(eq(job_id), eq(owner))
        .times(1)
        .returning(|_, _| Err(Error::StoreUnavailable("connection reset".to_string())));

    let service = ApplicationService::new(Arc::new(store));
    let outcome = service
        .decide_application(owner, application_id, Decision::Accept)
        .await
        .expect("the accept itself landed");

    assert_eq!(outcome.status, ApplicationStatus::Accepted);
    assert_eq!(outcome.rivals_rejected, 2);
    assert!(!outcome.job_closed);
    assert!(!outcome.cleanup_complete);
}

#[tokio::test]
async fn losing_the_accept_race_reports_a_conflict_and_writes_nothing_more() {
    let owner = Uuid::new_v4();
    let job_id = Uuid::new_v4();
    let application = pending_application(job_id);
    let application_id = application.id;

    let mut store = MockStore::new();
    // Two reads: the initial one and the disambiguation after the guarded
    // update matched nothing. The application is still pending, so a rival
    // must have been accepted.
    store
        .expect_get_application()
        .with(eq(application_id))
        .times(2)
        .returning(move |_| Ok(Some(application.clone())));
    store
        .expect_accept_application()
        .with(eq(application_id), eq(job_id))
        .times(1)
        .returning(|_, _| Ok(0));
    store.expect_reject_pending_siblings().never();
    store.expect_close_job().never();

    let service = ApplicationService::new(Arc::new(store));
    let err = service
        .decide_application(owner, application_id, Decision::Accept)
        .await
        .expect_err("the guard blocked the accept");
    assert!(matches!(err, Error::PreconditionFailed(_)), "{err}");
}
