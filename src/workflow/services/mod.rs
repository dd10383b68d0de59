//! Application services for the confirmation workflows.
//!
//! [`WorkflowEngine`] holds the collaborators every workflow needs; the
//! three services layer kind-specific send, respond and finalise steps on
//! top of it.

mod bygherre;
mod engine;
mod error;
mod order_confirmation;
mod photo_report;
mod projector;
mod token;

pub use bygherre::{BygherreService, ConfirmFinal, SendBygherre};
pub use engine::{EngineParts, PublicLinks, Recipient, SendOutcome, WorkflowEngine};
pub use error::{WorkflowServiceError, WorkflowServiceResult};
pub use order_confirmation::{
    OrderConfirmationService, ResendOrderConfirmation, SendOrderConfirmation, TestDelivery,
    TestDeliveryOutcome,
};
pub use photo_report::{
    CreatePhotoReport, PhotoReportService, PublicPhotoReport, ReviewReceipt, TaskDisplay,
};
pub use projector::TaskProjector;
pub use token::{ExpiryPolicy, IssuedToken, OsRngTokenSource, TokenIssuer, TokenSource};
