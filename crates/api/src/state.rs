use std::sync::Arc;

use assessly_core::calendar::CalendarGateway;
use assessly_core::clock::{Clock, SystemClock};
use assessly_core::notify::NotificationGateway;
use assessly_scheduling::{
    BookingOrchestrator, MentorSelectionPolicy, OldestActiveMentor, SchedulingSettings,
    SlotReconciler,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the services are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: assessly_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Bulk slot creation and deletion.
    pub reconciler: Arc<SlotReconciler>,
    /// Interview request creation, mentor assignment and self-service booking.
    pub orchestrator: Arc<BookingOrchestrator>,
}

impl AppState {
    /// Wire the scheduling services with the production mentor selection
    /// policy and the wall clock.
    pub fn new(
        pool: assessly_db::DbPool,
        config: ServerConfig,
        calendar: Arc<dyn CalendarGateway>,
        notifier: Arc<dyn NotificationGateway>,
        settings: SchedulingSettings,
    ) -> Self {
        let selection: Arc<dyn MentorSelectionPolicy> = Arc::new(OldestActiveMentor);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let reconciler = SlotReconciler::new(pool.clone(), Arc::clone(&calendar), settings.clone());
        let orchestrator =
            BookingOrchestrator::new(pool.clone(), calendar, notifier, selection, clock, settings);

        Self {
            pool,
            config: Arc::new(config),
            reconciler: Arc::new(reconciler),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
