//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after a migration changes.

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        /// One of CUSTOMER, PROVIDER, ADMIN.
        role -> Varchar,
        /// Non-negative credit balance.
        credits -> Int8,
        /// Argon2id PHC string.
        password_hash -> Varchar,
        created_at -> Timestamptz,
        /// Creation order; the first-available provider is the lowest.
        seq -> Int8,
    }
}

diesel::table! {
    services (id) {
        id -> Uuid,
        provider_id -> Nullable<Uuid>,
        title -> Varchar,
        category -> Varchar,
        description -> Nullable<Text>,
        credit_cost -> Int8,
        rating_avg -> Float8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        customer_id -> Uuid,
        service_id -> Uuid,
        provider_id -> Nullable<Uuid>,
        status -> Varchar,
        house_number -> Varchar,
        landmark -> Nullable<Varchar>,
        address_label -> Varchar,
        phone -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only status log.
    booking_events (id) {
        id -> Uuid,
        booking_id -> Uuid,
        from_status -> Nullable<Varchar>,
        to_status -> Varchar,
        actor -> Varchar,
        created_at -> Timestamptz,
        /// Insertion order, breaking ties between equal timestamps.
        seq -> Int8,
    }
}

diesel::table! {
    ratings (id) {
        id -> Uuid,
        booking_id -> Uuid,
        customer_id -> Uuid,
        provider_id -> Uuid,
        rating -> Int2,
        review -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        user_id -> Uuid,
        order_id -> Varchar,
        external_payment_id -> Nullable<Varchar>,
        credits_added -> Int8,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ledger_entries (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        amount -> Int8,
        balance_after -> Int8,
        reference -> Varchar,
        created_at -> Timestamptz,
        seq -> Int8,
    }
}

diesel::joinable!(bookings -> services (service_id));
diesel::joinable!(booking_events -> bookings (booking_id));
diesel::joinable!(ratings -> bookings (booking_id));
diesel::joinable!(payments -> users (user_id));
diesel::joinable!(ledger_entries -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    services,
    bookings,
    booking_events,
    ratings,
    payments,
    ledger_entries,
);
