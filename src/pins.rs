//! Pole markers on the farm map, positioned in percent of the map image.

use serde::Serialize;
use std::collections::HashMap;

use crate::store::{Role, UserProfile};

pub const DEFAULT_POSITION_PCT: f64 = 50.0;

/// A saved marker position as it comes out of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolePlacement {
    pub uid: String,
    pub pole_number: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    /// `{uid}_{place_name}_{pole_number}`
    pub id: String,
    pub uid: String,
    pub place_name: String,
    pub pole_number: u32,
    pub x: f64,
    pub y: f64,
}

/// Clamp to `[0, 100]`; NaN resets to the centre.
pub fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_POSITION_PCT
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl MapPin {
    pub fn new(uid: &str, place_name: &str, pole_number: u32) -> Self {
        MapPin {
            id: format!("{}_{}_{}", uid, place_name, pole_number),
            uid: uid.to_string(),
            place_name: place_name.to_string(),
            pole_number,
            x: DEFAULT_POSITION_PCT,
            y: DEFAULT_POSITION_PCT,
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = clamp_pct(x);
        self.y = clamp_pct(y);
    }
}

/// One pin per pole of every grower; stored placements override the default.
pub fn pins_for_users(users: &[UserProfile], placements: &[PolePlacement]) -> Vec<MapPin> {
    let saved: HashMap<(&str, u32), &PolePlacement> = placements
        .iter()
        .map(|p| ((p.uid.as_str(), p.pole_number), p))
        .collect();
    let saved = &saved;

    users
        .iter()
        .filter(|user| user.role == Role::User)
        .flat_map(|user| {
            let place_name = user.place_name.as_deref().unwrap_or_default();
            (1..=user.poles).map(move |pole_number| {
                let mut pin = MapPin::new(&user.uid, place_name, pole_number);
                if let Some(p) = saved.get(&(user.uid.as_str(), pole_number)) {
                    pin.move_to(p.x, p.y);
                }
                pin
            })
        })
        .collect()
}
