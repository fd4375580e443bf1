//! Row models and create DTOs.

pub mod booking;
pub mod exam;
pub mod interview_request;
pub mod mentor;
pub mod time_spot;

pub use assessly_core::status::{
    InterviewRequestStatus, MentorBookingStatus, StatusId, TimeSpotStatus,
};
