//! Typed clients for the platform's resource endpoints.
//!
//! These are thin wrappers over the gateway; they carry no session logic of
//! their own.

pub mod evaluations;
pub mod events;
pub mod submissions;
pub mod teams;

pub use evaluations::{Evaluation, EvaluationCreate, EvaluationsClient};
pub use events::{Event, EventCreate, EventsClient};
pub use submissions::{Submission, SubmissionStatus, SubmissionsClient};
pub use teams::{Team, TeamMember, TeamSummary, TeamWithMembers, TeamsClient};
