//! Role name constants carried in JWT claims.

/// Platform administrator. Passes every role guard.
pub const ROLE_ADMIN: &str = "admin";

/// Mentor who publishes availability and conducts interviews.
pub const ROLE_MENTOR: &str = "mentor";

/// Candidate taking an exam.
pub const ROLE_CANDIDATE: &str = "candidate";
