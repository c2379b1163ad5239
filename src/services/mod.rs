pub mod application_service;
pub mod job_service;
pub mod resume_service;
