pub mod exams;
pub mod interview_requests;
pub mod mentor_slots;
