//! Application services for notification delivery.

mod dispatcher;
mod history;
mod templates;

pub use dispatcher::{DispatchPlan, DispatcherConfig, NotificationDispatcher};
pub use history::CommunicationHistory;
pub use templates::{MessageTemplate, MessageTemplates, TemplateError};
