// ── Fleet records: cars, drivers, damage reports ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity_id::EntityId;
use super::resource::{Reference, impl_resource};

/// A vehicle in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, alias = "licensePlate")]
    pub plate: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    /// Availability as reported by the backend (`available`, `rented`, ...).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub price_per_day: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Car, Cars, cars);

/// A chauffeur that can be booked alongside a car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Driver, Drivers, drivers);

/// A damage report filed against a car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Damage {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub car: Option<Reference>,
    #[serde(default)]
    pub rent: Option<Reference>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Damage, Damages, damages, by_created);
