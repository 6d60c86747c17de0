//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the migrations exactly; regenerate with
//! `diesel print-schema` after a migration changes the schema.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key, UUID v4.
        id -> Uuid,
        /// Address as entered; uniqueness is enforced on `lower(email)`.
        email -> Varchar,
        /// Name as entered; uniqueness is enforced on `lower(username)`.
        username -> Varchar,
        /// Argon2 PHC string, or the OAuth sentinel.
        password_hash -> Varchar,
        /// Avatar URL, empty when unset.
        avatar_url -> Varchar,
        /// Monotonic experience total.
        experience -> Int8,
        created_at -> Timestamptz,
        last_seen -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Dated diary entries.
    diary_entries (id) {
        id -> Uuid,
        owner_id -> Uuid,
        /// Denormalised so feed listings avoid a join per row.
        owner_username -> Varchar,
        entry_date -> Date,
        title -> Varchar,
        /// `public`, `friend` or `private`.
        privacy -> Varchar,
        content -> Text,
        created_at -> Timestamptz,
        last_modified -> Timestamptz,
    }
}

diesel::table! {
    /// Friendship edges; one row per unordered pair.
    friendships (requester_id, recipient_id) {
        requester_id -> Uuid,
        recipient_id -> Uuid,
        /// `pending` or `accepted`.
        status -> Varchar,
        /// Historical rows identified the peer by email instead of id.
        legacy_peer_email -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Picture attachment metadata; bytes live in the external file host.
    pictures (id) {
        id -> Uuid,
        owner_id -> Uuid,
        entry_id -> Uuid,
        /// Identifier assigned by the file host, used to release the file.
        file_host_id -> Varchar,
        url -> Varchar,
        sort_order -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(diary_entries -> users (owner_id));
diesel::joinable!(pictures -> diary_entries (entry_id));

diesel::allow_tables_to_appear_in_same_query!(users, diary_entries, friendships, pictures);
