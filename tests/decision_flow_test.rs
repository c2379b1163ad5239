use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use jobboard_backend::dto::job_dto::PostJobPayload;
use jobboard_backend::error::Error;
use jobboard_backend::models::application::{ApplicationStatus, Decision};
use jobboard_backend::models::job::DurationUnit;
use jobboard_backend::models::profile::Profile;
use jobboard_backend::services::application_service::{ApplicationService, SubmitOutcome};
use jobboard_backend::services::job_service::JobService;
use jobboard_backend::store::{MemoryStore, StoreGateway};

fn job_payload() -> PostJobPayload {
    PostJobPayload {
        title: "Warehouse helper".to_string(),
        organization_name: "Acme Logistics".to_string(),
        city: "Pune".to_string(),
        address: "MG Road 12".to_string(),
        contact_number: "9876543210".to_string(),
        amount: Decimal::new(800, 0),
        duration_unit: DurationUnit::Daily,
        job_type: "general".to_string(),
        description: None,
        requires_resume: false,
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    jobs: JobService,
    applications: ApplicationService,
    owner: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            jobs: JobService::new(store.clone()),
            applications: ApplicationService::new(store.clone()),
            store,
            owner: Uuid::new_v4(),
        }
    }

    async fn post_job(&self) -> Uuid {
        self.jobs
            .post_job(self.owner, job_payload())
            .await
            .expect("post job")
            .id
    }

    async fn apply(&self, job_id: Uuid) -> Uuid {
        let applicant = Uuid::new_v4();
        match self
            .applications
            .submit_application(applicant, "applicant@example.com", job_id, String::new(), None)
            .await
            .expect("submit")
        {
            SubmitOutcome::Submitted(application) => application.id,
            SubmitOutcome::AlreadyApplied => panic!("fresh applicant cannot be a duplicate"),
        }
    }

    async fn status_of(&self, id: Uuid) -> ApplicationStatus {
        self.store
            .get_application(id)
            .await
            .expect("get application")
            .expect("application exists")
            .status
    }

    async fn job_active(&self, id: Uuid) -> bool {
        self.store
            .get_job(id)
            .await
            .expect("get job")
            .expect("job exists")
            .is_active
    }
}

#[tokio::test]
async fn accept_rejects_rivals_and_closes_job() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;
    let c = fx.apply(job_id).await;

    let outcome = fx
        .applications
        .decide_application(fx.owner, a, Decision::Accept)
        .await
        .expect("accept");

    assert_eq!(outcome.status, ApplicationStatus::Accepted);
    assert_eq!(outcome.rivals_rejected, 2);
    assert!(outcome.job_closed);
    assert!(outcome.cleanup_complete);

    assert_eq!(fx.status_of(a).await, ApplicationStatus::Accepted);
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Rejected);
    assert_eq!(fx.status_of(c).await, ApplicationStatus::Rejected);
    assert!(!fx.job_active(job_id).await);
}

#[tokio::test]
async fn reject_touches_only_the_target() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;

    let outcome = fx
        .applications
        .decide_application(fx.owner, a, Decision::Reject)
        .await
        .expect("reject");

    assert_eq!(outcome.status, ApplicationStatus::Rejected);
    assert_eq!(outcome.rivals_rejected, 0);
    assert!(!outcome.job_closed);

    assert_eq!(fx.status_of(a).await, ApplicationStatus::Rejected);
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Pending);
    assert!(fx.job_active(job_id).await);
}

#[tokio::test]
async fn deciding_twice_is_a_conflict_with_no_writes() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;

    fx.applications
        .decide_application(fx.owner, a, Decision::Accept)
        .await
        .expect("first accept");

    for decision in [Decision::Accept, Decision::Reject] {
        let err = fx
            .applications
            .decide_application(fx.owner, a, decision)
            .await
            .expect_err("second decision must fail");
        assert!(matches!(err, Error::AlreadyDecided(_)), "{err}");
    }

    assert_eq!(fx.status_of(a).await, ApplicationStatus::Accepted);
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn concurrent_accepts_let_exactly_one_win() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;

    let (first, second) = tokio::join!(
        fx.applications
            .decide_application(fx.owner, a, Decision::Accept),
        fx.applications
            .decide_application(fx.owner, b, Decision::Accept),
    );

    assert_eq!(
        first.is_ok() as u32 + second.is_ok() as u32,
        1,
        "exactly one accept may succeed"
    );
    for loser in [&first, &second] {
        if let Err(err) = loser {
            assert!(
                matches!(err, Error::PreconditionFailed(_) | Error::AlreadyDecided(_)),
                "{err}"
            );
        }
    }

    let a_status = fx.status_of(a).await;
    let b_status = fx.status_of(b).await;
    let accepted = [a_status, b_status]
        .iter()
        .filter(|s| **s == ApplicationStatus::Accepted)
        .count();
    assert_eq!(accepted, 1);
    assert!(!fx.job_active(job_id).await);
}

#[tokio::test]
async fn deciding_a_missing_application_is_not_found() {
    let fx = Fixture::new();
    let err = fx
        .applications
        .decide_application(fx.owner, Uuid::new_v4(), Decision::Accept)
        .await
        .expect_err("missing application");
    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[tokio::test]
async fn reconcile_finishes_an_interrupted_accept_and_then_does_nothing() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;
    let c = fx.apply(job_id).await;

    // An accept that stopped after its first write: the target is accepted
    // but the rivals are still pending and the job is still open.
    assert_eq!(
        fx.store.accept_application(a, job_id).await.expect("accept"),
        1
    );
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Pending);
    assert!(fx.job_active(job_id).await);

    let outcome = fx
        .applications
        .reconcile_job(fx.owner, job_id)
        .await
        .expect("reconcile");
    assert_eq!(outcome.accepted_application_id, Some(a));
    assert_eq!(outcome.rivals_rejected, 2);
    assert!(outcome.job_newly_closed);
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Rejected);
    assert_eq!(fx.status_of(c).await, ApplicationStatus::Rejected);
    assert!(!fx.job_active(job_id).await);

    // Second pass matches nothing.
    let outcome = fx
        .applications
        .reconcile_job(fx.owner, job_id)
        .await
        .expect("reconcile again");
    assert_eq!(outcome.rivals_rejected, 0);
    assert!(!outcome.job_newly_closed);
}

#[tokio::test]
async fn reconcile_is_refused_for_non_owners_and_missing_jobs() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;
    let b = fx.apply(job_id).await;

    // Interrupted accept: target accepted, rival still pending, job open.
    assert_eq!(
        fx.store.accept_application(a, job_id).await.expect("accept"),
        1
    );

    let stranger = Uuid::new_v4();
    let err = fx
        .applications
        .reconcile_job(stranger, job_id)
        .await
        .expect_err("not the owner");
    assert!(matches!(err, Error::PreconditionFailed(_)), "{err}");

    // A stranger's call must not have driven the cleanup steps.
    assert_eq!(fx.status_of(b).await, ApplicationStatus::Pending);
    assert!(fx.job_active(job_id).await);

    let err = fx
        .applications
        .reconcile_job(fx.owner, Uuid::new_v4())
        .await
        .expect_err("missing job");
    assert!(matches!(err, Error::NotFound(_)), "{err}");

    // The owner still can.
    let outcome = fx
        .applications
        .reconcile_job(fx.owner, job_id)
        .await
        .expect("reconcile");
    assert_eq!(outcome.rivals_rejected, 1);
    assert!(outcome.job_newly_closed);
}

#[tokio::test]
async fn reconcile_without_an_accepted_application_is_a_no_op() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let a = fx.apply(job_id).await;

    let outcome = fx
        .applications
        .reconcile_job(fx.owner, job_id)
        .await
        .expect("reconcile");
    assert_eq!(outcome.accepted_application_id, None);
    assert_eq!(outcome.rivals_rejected, 0);
    assert!(!outcome.job_newly_closed);
    assert_eq!(fx.status_of(a).await, ApplicationStatus::Pending);
    assert!(fx.job_active(job_id).await);
}

#[tokio::test]
async fn applying_twice_reports_already_applied() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;
    let applicant = Uuid::new_v4();

    let first = fx
        .applications
        .submit_application(applicant, "a@example.com", job_id, String::new(), None)
        .await
        .expect("first submit");
    assert!(matches!(first, SubmitOutcome::Submitted(_)));

    let second = fx
        .applications
        .submit_application(applicant, "a@example.com", job_id, String::new(), None)
        .await
        .expect("second submit");
    assert!(matches!(second, SubmitOutcome::AlreadyApplied));
}

#[tokio::test]
async fn applying_to_own_or_closed_job_is_rejected() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;

    let err = fx
        .applications
        .submit_application(fx.owner, "owner@example.com", job_id, String::new(), None)
        .await
        .expect_err("own job");
    assert!(matches!(err, Error::BadRequest(_)), "{err}");

    fx.jobs
        .set_active(fx.owner, job_id, false)
        .await
        .expect("close");
    let err = fx
        .applications
        .submit_application(Uuid::new_v4(), "a@example.com", job_id, String::new(), None)
        .await
        .expect_err("closed job");
    assert!(matches!(err, Error::PreconditionFailed(_)), "{err}");
}

#[tokio::test]
async fn resume_is_enforced_when_the_job_requires_one() {
    let fx = Fixture::new();
    let mut payload = job_payload();
    payload.requires_resume = true;
    let job_id = fx
        .jobs
        .post_job(fx.owner, payload)
        .await
        .expect("post job")
        .id;
    let applicant = Uuid::new_v4();

    let err = fx
        .applications
        .submit_application(applicant, "a@example.com", job_id, String::new(), None)
        .await
        .expect_err("missing resume");
    assert!(matches!(err, Error::BadRequest(_)), "{err}");

    let ok = fx
        .applications
        .submit_application(
            applicant,
            "a@example.com",
            job_id,
            String::new(),
            Some(format!("{}/1.pdf", applicant)),
        )
        .await
        .expect("with resume");
    assert!(matches!(ok, SubmitOutcome::Submitted(_)));
}

#[tokio::test]
async fn submission_snapshots_the_profile_or_falls_back() {
    let fx = Fixture::new();
    let job_id = fx.post_job().await;

    let with_profile = Uuid::new_v4();
    fx.store.insert_profile(Profile {
        user_id: with_profile,
        full_name: Some("Asha Kumar".to_string()),
        email: Some("asha@example.com".to_string()),
        phone: Some("9000000000".to_string()),
        current_city: Some("Pune".to_string()),
    });
    let SubmitOutcome::Submitted(application) = fx
        .applications
        .submit_application(with_profile, "jwt@example.com", job_id, String::new(), None)
        .await
        .expect("submit")
    else {
        panic!("expected a fresh submission");
    };
    assert_eq!(application.applicant_name, "Asha Kumar");
    assert_eq!(application.applicant_email, "asha@example.com");
    assert_eq!(application.applicant_location, "Pune");

    let without_profile = Uuid::new_v4();
    let SubmitOutcome::Submitted(application) = fx
        .applications
        .submit_application(
            without_profile,
            "jwt@example.com",
            job_id,
            String::new(),
            None,
        )
        .await
        .expect("submit")
    else {
        panic!("expected a fresh submission");
    };
    assert_eq!(application.applicant_name, "Anonymous");
    assert_eq!(application.applicant_email, "jwt@example.com");
}
