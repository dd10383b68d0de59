//! Diesel schema for workflow record persistence.

diesel::table! {
    /// Workflow records of all kinds.
    workflow_records (id) {
        /// Record identifier.
        id -> Uuid,
        /// Workflow kind code.
        #[max_length = 50]
        kind -> Varchar,
        /// Live access token, unique across kinds.
        token -> Text,
        /// Owning task.
        task_id -> Nullable<Uuid>,
        /// State code.
        #[max_length = 50]
        status -> Varchar,
        /// Whether the live token has a recorded response.
        responded -> Bool,
        /// Full record document.
        document -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest update timestamp.
        updated_at -> Timestamptz,
    }
}
