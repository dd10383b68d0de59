//! Domain types for activity entries.

mod action;
mod entry;

pub use action::{ActivityAction, ParseActivityActionError};
pub use entry::{ActivityEntry, ActivityEntryId, Actor, EntityType, StaffActor};
