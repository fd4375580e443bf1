//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument, or `&mut PgConnection` for writes
//! that must join a caller-owned transaction (pass `&mut *tx`).

pub mod booking_repo;
pub mod exam_repo;
pub mod interview_request_repo;
pub mod mentor_repo;
pub mod time_spot_repo;

pub use booking_repo::MentorBookingRepo;
pub use exam_repo::ExamRepo;
pub use interview_request_repo::InterviewRequestRepo;
pub use mentor_repo::MentorRepo;
pub use time_spot_repo::TimeSpotRepo;
