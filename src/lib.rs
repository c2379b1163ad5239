pub mod cache;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::SessionCaches;
use crate::services::{
    application_service::ApplicationService, job_service::JobService,
    resume_service::ResumeService,
};
use crate::store::StoreGateway;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreGateway>,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub resume_service: ResumeService,
    pub caches: SessionCaches,
    pub reconcile_delay: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        let config = crate::config::get_config();

        let job_service = JobService::new(store.clone());
        let application_service = ApplicationService::new(store.clone());
        let resume_service = ResumeService::new(store.clone());

        Self {
            store,
            job_service,
            application_service,
            resume_service,
            caches: SessionCaches::new(),
            reconcile_delay: Duration::from_millis(config.reconcile_delay_ms),
        }
    }
}
