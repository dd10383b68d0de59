//! Diesel schema for activity log persistence.

diesel::table! {
    /// Append-only business events.
    activity_logs (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Entity kind.
        #[max_length = 50]
        entity_type -> Varchar,
        /// Entity identifier.
        entity_id -> Uuid,
        /// Owning task.
        task_id -> Nullable<Uuid>,
        /// Action code.
        #[max_length = 100]
        action -> Varchar,
        /// Human-readable description.
        description -> Text,
        /// Actor payload.
        actor -> Jsonb,
        /// Structured details.
        details -> Jsonb,
        /// Event timestamp.
        created_at -> Timestamptz,
    }
}
