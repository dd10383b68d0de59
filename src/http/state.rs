//! Shared handler state.

use std::sync::Arc;

use crate::notification::{ports::CommunicationLedger, services::CommunicationHistory};
use crate::workflow::services::{
    BygherreService, OrderConfirmationService, PhotoReportService, WorkflowEngine,
};

/// Services the handlers call into.
#[derive(Clone)]
pub struct AppState {
    pub(super) order_confirmations: OrderConfirmationService,
    pub(super) bygherre: BygherreService,
    pub(super) photo_reports: PhotoReportService,
    pub(super) history: CommunicationHistory,
}

impl AppState {
    /// Wires the workflow services around one engine.
    #[must_use]
    pub fn new(engine: &Arc<WorkflowEngine>, ledger: Arc<dyn CommunicationLedger>) -> Self {
        Self {
            order_confirmations: OrderConfirmationService::new(Arc::clone(engine)),
            bygherre: BygherreService::new(Arc::clone(engine)),
            photo_reports: PhotoReportService::new(Arc::clone(engine)),
            history: CommunicationHistory::new(ledger),
        }
    }
}
