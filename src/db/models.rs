//! Diesel row structs for the profile store.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

/// Values of `users.role`.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const USER: &str = "user";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::users)]
pub struct User {
    pub id: i64,
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub place_no: Option<String>,
    pub place_name: Option<String>,
    pub role: String,
    pub poles: i32,
    pub feed_url: Option<String>,
    pub ai_feed_url: Option<String>,
    pub timestamp_format: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct NewUser {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub place_no: Option<String>,
    pub place_name: Option<String>,
    pub role: String,
    pub poles: i32,
    pub feed_url: Option<String>,
    pub ai_feed_url: Option<String>,
    pub timestamp_format: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations, Serialize, Deserialize)]
#[diesel(table_name = schema::pole_positions)]
#[diesel(belongs_to(User))]
pub struct PolePosition {
    pub id: i64,
    pub user_id: i64,
    pub pole_number: i32,
    pub x_pct: f64,
    pub y_pct: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::pole_positions)]
pub struct NewPolePosition {
    pub user_id: i64,
    pub pole_number: i32,
    pub x_pct: f64,
    pub y_pct: f64,
}
