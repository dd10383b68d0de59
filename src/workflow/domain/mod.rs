//! Domain model for the token workflows.
//!
//! [`WorkflowRecord`] carries the structure all three kinds share: an
//! access token, a state, ordered response units and a frozen display
//! snapshot. Each kind implements [`WorkflowDefinition`] to supply its
//! state machine, unit shape and task-side effects.

mod acceptance;
mod bygherre;
mod definition;
mod error;
mod ids;
mod kind;
mod order_confirmation;
mod photo_report;
mod record;
mod token;

pub use acceptance::Acceptance;
pub use bygherre::{
    AccessMethod, Bygherre, BygherreAnswer, BygherreDetails, BygherrePublicView, BygherreRecord,
    BygherreResponse, BygherreSnapshot, BygherreStatus, CommunicationType, ProposedSlot,
};
pub use definition::{WorkflowDefinition, WorkflowEvent, WorkflowPayload, WorkflowState};
pub use error::WorkflowDomainError;
pub use ids::WorkflowId;
pub use kind::WorkflowKind;
pub use order_confirmation::{
    ItemAnswer, LineItemType, OrderConfirmation, OrderConfirmationDetails,
    OrderConfirmationRecord, OrderConfirmationResponse, OrderConfirmationStatus, OrderLineItem,
    OrderOptions, OrderSnapshot, ServiceZone,
};
pub use photo_report::{
    DamageDecision, DamageDraft, DamageEntry, DamageStatus, DamageVerdict, DraftUpdate,
    PhotoReport, PhotoReportDetails, PhotoReportRecord, PhotoReportStatus, PhotoReview,
    ReportContact, ReviewTally,
};
pub use record::{AuditTrail, NewWorkflow, WorkflowRecord};
pub use token::{AccessToken, token_fingerprint};
