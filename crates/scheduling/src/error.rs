use assessly_core::error::CoreError;

/// Errors returned by the scheduling services.
///
/// Gateway failures never appear here: they are logged and downgraded at
/// the call site.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SchedulingError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Database(_) => None,
        }
    }
}
