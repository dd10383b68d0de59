//! Shared shape of the token workflows.
//!
//! Every workflow kind is a small state machine over a persisted record.
//! A kind plugs into the shared scaffolding by naming its state enum, its
//! response-unit shape, the frozen display snapshot, kind-specific details
//! and the task fields each lifecycle event writes.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

use super::{WorkflowKind, WorkflowRecord};
use crate::task::domain::TaskFieldWrite;

/// Finite state of one workflow kind.
pub trait WorkflowState:
    Copy + Eq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Returns the canonical storage representation.
    fn as_str(self) -> &'static str;

    /// Returns whether the state machine allows moving to `next`.
    fn can_transition_to(self, next: Self) -> bool;
}

/// Lifecycle events that may have a task-side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowEvent {
    /// The record was created and its link dispatched.
    Sent,
    /// The external party responded.
    Responded,
    /// Staff finalised the record.
    Finalized,
    /// The record's link expired.
    Expired,
}

/// Bound shared by the kind-specific payload types.
pub trait WorkflowPayload:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> WorkflowPayload for T where
    T: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Plugs one workflow kind into the shared scaffolding.
pub trait WorkflowDefinition: Sized + Send + Sync + 'static {
    /// Kind discriminator.
    const KIND: WorkflowKind;

    /// State enum.
    type State: WorkflowState;

    /// Response unit.
    type Item: WorkflowPayload;

    /// Display fields frozen when the record is created.
    type Snapshot: WorkflowPayload;

    /// Kind-specific fields.
    type Details: WorkflowPayload;

    /// Task writes produced by a lifecycle event.
    fn task_writes(record: &WorkflowRecord<Self>, event: WorkflowEvent) -> Vec<TaskFieldWrite>;

    /// Returns whether the record still blocks a new one for the same task.
    fn is_open(record: &WorkflowRecord<Self>, now: DateTime<Utc>) -> bool;
}
