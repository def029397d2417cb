//! User profiles and pole placements.
//!
//! Callers talk to [`ProfileStore`]; [`PgProfileStore`] is the diesel/Postgres
//! implementation. It is constructed once in `main` and passed down.

use chrono::Utc;
use diesel::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::client::FeedTarget;
use crate::db::models::{NewPolePosition, NewUser, PolePosition, User, roles};
use crate::pins::{MapPin, PolePlacement, clamp_pct};
use crate::schema;
use crate::timestamp::TimestampFormat;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => roles::ADMIN,
            Role::User => roles::USER,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            roles::ADMIN => Ok(Role::Admin),
            roles::USER => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub place_no: Option<String>,
    pub place_name: Option<String>,
    pub role: Role,
    pub poles: u32,
    pub feed_url: Option<String>,
    pub ai_feed_url: Option<String>,
    pub timestamp_format: TimestampFormat,
}

impl UserProfile {
    pub fn from_row(row: User) -> Result<Self, String> {
        let role = row.role.parse::<Role>().map_err(|e| format!("user {}: {}", row.uid, e))?;
        let timestamp_format = row
            .timestamp_format
            .parse::<TimestampFormat>()
            .map_err(|e| format!("user {}: {}", row.uid, e))?;
        Ok(UserProfile {
            poles: u32::try_from(row.poles).map_err(|_| format!("user {}: negative pole count", row.uid))?,
            uid: row.uid,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            place_no: row.place_no,
            place_name: row.place_name,
            role,
            feed_url: row.feed_url,
            ai_feed_url: row.ai_feed_url,
            timestamp_format,
        })
    }

    /// `None` when the profile has no feed configured.
    pub fn feed_target(&self) -> Option<FeedTarget> {
        let url = self.feed_url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some(FeedTarget {
            url: url.to_string(),
            ai_url: self
                .ai_feed_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            format: self.timestamp_format,
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    fn to_row(&self) -> Result<NewUser, String> {
        Ok(NewUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            place_no: self.place_no.clone(),
            place_name: self.place_name.clone(),
            role: self.role.as_str().to_string(),
            poles: i32::try_from(self.poles).map_err(|_| format!("user {}: too many poles", self.uid))?,
            feed_url: self.feed_url.clone(),
            ai_feed_url: self.ai_feed_url.clone(),
            timestamp_format: self.timestamp_format.to_string(),
        })
    }
}

pub trait ProfileStore {
    fn get_profile(&mut self, uid: &str) -> Result<Option<UserProfile>, String>;
    fn list_by_role(&mut self, role: Role) -> Result<Vec<UserProfile>, String>;
    fn pole_positions(&mut self) -> Result<Vec<PolePlacement>, String>;
    /// Upsert each pin's position by `(uid, pole_number)`. Returns rows written.
    fn save_pin_positions(&mut self, pins: &[MapPin]) -> Result<usize, String>;
}

pub struct PgProfileStore {
    conn: PgConnection,
}

impl PgProfileStore {
    /// Connect and bring the schema up to date.
    pub fn connect(database_url: &str) -> Result<Self, String> {
        let mut conn = PgConnection::establish(database_url).map_err(|e| format!("DB connection failed: {}", e))?;
        info!("Connected to database");
        apply_database_migrations(&mut conn)?;
        Ok(PgProfileStore { conn })
    }

    pub fn upsert_profile(&mut self, profile: &UserProfile) -> Result<(), String> {
        use schema::users::dsl as U;

        let row = profile.to_row()?;
        diesel::insert_into(U::users)
            .values(&row)
            .on_conflict(U::uid)
            .do_update()
            .set((&row, U::updated_at.eq(Utc::now())))
            .execute(&mut self.conn)
            .map_err(|e| format!("upsert user {} failed: {}", profile.uid, e))?;
        Ok(())
    }
}

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) if applied.is_empty() => {
            info!("Database schema is up to date; no migrations were applied");
            Ok(())
        }
        Ok(applied) => {
            let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            info!("Applied {} database migration(s): {}", applied.len(), names);
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

impl ProfileStore for PgProfileStore {
    fn get_profile(&mut self, uid: &str) -> Result<Option<UserProfile>, String> {
        use schema::users::dsl as U;

        let row: Option<User> = U::users
            .filter(U::uid.eq(uid))
            .select(User::as_select())
            .first(&mut self.conn)
            .optional()
            .map_err(|e| format!("fetch user {} failed: {}", uid, e))?;
        row.map(UserProfile::from_row).transpose()
    }

    fn list_by_role(&mut self, role: Role) -> Result<Vec<UserProfile>, String> {
        use schema::users::dsl as U;

        let rows: Vec<User> = U::users
            .filter(U::role.eq(role.as_str()))
            .order(U::uid.asc())
            .select(User::as_select())
            .load(&mut self.conn)
            .map_err(|e| format!("list {} users failed: {}", role, e))?;
        rows.into_iter().map(UserProfile::from_row).collect()
    }

    fn pole_positions(&mut self) -> Result<Vec<PolePlacement>, String> {
        use schema::users::dsl as U;

        let users: Vec<User> = U::users
            .select(User::as_select())
            .load(&mut self.conn)
            .map_err(|e| format!("fetch users failed: {}", e))?;
        let positions: Vec<PolePosition> = PolePosition::belonging_to(&users)
            .select(PolePosition::as_select())
            .load(&mut self.conn)
            .map_err(|e| format!("fetch pole positions failed: {}", e))?;

        Ok(positions
            .grouped_by(&users)
            .into_iter()
            .zip(&users)
            .flat_map(|(positions, user)| {
                positions.into_iter().filter_map(move |p| {
                    Some(PolePlacement {
                        uid: user.uid.clone(),
                        pole_number: u32::try_from(p.pole_number).ok()?,
                        x: p.x_pct,
                        y: p.y_pct,
                    })
                })
            })
            .collect())
    }

    fn save_pin_positions(&mut self, pins: &[MapPin]) -> Result<usize, String> {
        use schema::pole_positions::dsl as P;
        use schema::users::dsl as U;

        let uids: Vec<&str> = pins.iter().map(|p| p.uid.as_str()).collect();
        let ids: HashMap<String, i64> = U::users
            .filter(U::uid.eq_any(uids))
            .select((U::uid, U::id))
            .load::<(String, i64)>(&mut self.conn)
            .map_err(|e| format!("resolve pin owners failed: {}", e))?
            .into_iter()
            .collect();

        let mut rows = Vec::with_capacity(pins.len());
        for pin in pins {
            let user_id = *ids
                .get(&pin.uid)
                .ok_or_else(|| format!("pin {} belongs to unknown user {}", pin.id, pin.uid))?;
            rows.push(NewPolePosition {
                user_id,
                pole_number: i32::try_from(pin.pole_number).map_err(|_| format!("pin {} pole number out of range", pin.id))?,
                x_pct: clamp_pct(pin.x),
                y_pct: clamp_pct(pin.y),
            });
        }

        let written = self
            .conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                let mut written = 0;
                for row in &rows {
                    written += diesel::insert_into(P::pole_positions)
                        .values(row)
                        .on_conflict((P::user_id, P::pole_number))
                        .do_update()
                        .set((
                            P::x_pct.eq(excluded(P::x_pct)),
                            P::y_pct.eq(excluded(P::y_pct)),
                            P::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }
                Ok(written)
            })
            .map_err(|e| format!("save pin positions failed: {}", e))?;
        debug!("Saved {} pin position(s)", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(role: &str, format: &str, poles: i32) -> User {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        User {
            id: 7,
            uid: "u1".into(),
            email: "u1@farm.example".into(),
            first_name: "Malee".into(),
            last_name: "".into(),
            place_no: Some("2".into()),
            place_name: Some("River Plot".into()),
            role: role.into(),
            poles,
            feed_url: Some(" https://script.example/exec ".into()),
            ai_feed_url: Some("".into()),
            timestamp_format: format.into(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn profile_from_row() {
        let profile = UserProfile::from_row(row("user", "day-first", 3)).unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.poles, 3);
        assert_eq!(profile.display_name(), "Malee");

        let target = profile.feed_target().unwrap();
        assert_eq!(target.url, "https://script.example/exec");
        assert_eq!(target.ai_url, None);
        assert_eq!(target.format, TimestampFormat::DayFirst);
    }

    #[test]
    fn bad_rows_are_rejected() {
        assert!(UserProfile::from_row(row("owner", "auto", 1)).is_err());
        assert!(UserProfile::from_row(row("user", "julian", 1)).is_err());
        assert!(UserProfile::from_row(row("user", "auto", -1)).is_err());
    }

    #[test]
    fn profile_without_feed_has_no_target() {
        let mut profile = UserProfile::from_row(row("admin", "auto", 0)).unwrap();
        profile.feed_url = Some("   ".into());
        assert_eq!(profile.feed_target(), None);
        assert_eq!(profile.to_row().unwrap().role, "admin");
    }
}
