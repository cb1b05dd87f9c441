//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. Regenerate with `diesel print-schema` when migrations change.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` carries a unique index on `lower(email)` so uniqueness is
    /// case-insensitive at the store, not just in application code.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name as entered at registration.
        full_name -> Varchar,
        /// Case-preserved email address.
        email -> Varchar,
        /// Argon2 PHC-format password hash.
        password_hash -> Varchar,
        /// Account role; canonical lowercase, normalized on read.
        role -> Varchar,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Loan applications and their lifecycle state.
    loans (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning borrower.
        user_id -> Uuid,
        /// Requested principal; NUMERIC, strictly positive.
        amount_requested -> Numeric,
        /// Free-text purpose.
        purpose -> Text,
        /// Repayment term in months.
        term_months -> Int4,
        /// Lifecycle status; canonical lowercase, historical spellings
        /// normalized on read.
        status -> Varchar,
        /// Optional reviewer note captured on rejection.
        decision_note -> Nullable<Text>,
        /// Application timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only ledger of money-movement events.
    transactions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Transaction type; normalized into four buckets on read.
        #[sql_name = "type"]
        kind -> Varchar,
        /// Moved amount; NUMERIC, strictly positive.
        amount -> Numeric,
        /// Loan that produced this entry, when applicable.
        loan_id -> Nullable<Uuid>,
        /// Append timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(loans -> users (user_id));
diesel::joinable!(transactions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, loans, transactions);
