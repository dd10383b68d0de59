//! Domain model for the task read model.
//!
//! Only the fields the confirmation workflows need are modelled: the
//! address and contact snapshot used to address notifications, and the
//! mirror fields other parts of the portal read to render status badges.

mod contact;
mod error;
mod ids;
mod mirror;
mod task;

pub use contact::Contact;
pub use error::ParseTaskStatusError;
pub use ids::{ContactId, TaskId};
pub use mirror::{ScheduledVisit, TaskFieldWrite, WorkflowMirror};
pub use task::{
    ContactSnapshot, PersistedTaskData, PropertyOwner, SiteAddress, Task, TaskDamage, TaskStatus,
};
