//! Diesel schema for task and contact reads.

diesel::table! {
    /// Portal tasks with workflow mirror fields.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Human-facing task number.
        #[max_length = 50]
        task_number -> Nullable<Varchar>,
        /// Task status bucket.
        #[max_length = 50]
        status -> Varchar,
        /// Address, contact, owner and damage details.
        details -> Jsonb,
        /// Workflow status mirror.
        workflow_mirror -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Company directory contacts.
    contacts (id) {
        /// Directory identifier.
        id -> Uuid,
        /// Display name.
        name -> Nullable<Text>,
        /// Email address.
        email -> Nullable<Text>,
        /// Phone number.
        phone -> Nullable<Text>,
    }
}
