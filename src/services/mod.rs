pub mod eval_service;
pub mod normalizer;
pub mod queue_service;
pub mod session_service;

pub use eval_service::{EvalJob, EvalService};
pub use normalizer::{Normalizer, TruthLabels};
pub use queue_service::SubmissionQueue;
pub use session_service::{IdentitySnapshot, SessionService, ANON_USER_ID};
