//! Diesel schema for communication ledger persistence.

diesel::table! {
    /// Append-only delivery attempts.
    communication_ledger (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Delivery channel.
        #[max_length = 10]
        channel -> Varchar,
        /// Recipient address.
        recipient -> Text,
        /// Attempt result.
        #[max_length = 10]
        status -> Varchar,
        /// Failure description.
        error -> Nullable<Text>,
        /// Provider message identifier.
        provider_id -> Nullable<Text>,
        /// Short content description.
        summary -> Text,
        /// Owning task.
        task_id -> Nullable<Uuid>,
        /// Workflow record.
        workflow_id -> Nullable<Uuid>,
        /// Workflow kind path segment.
        #[max_length = 50]
        workflow_kind -> Nullable<Varchar>,
        /// Attempt start.
        created_at -> Timestamptz,
        /// Provider acceptance time.
        sent_at -> Nullable<Timestamptz>,
    }
}
