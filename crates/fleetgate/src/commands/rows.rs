//! Table rows for every resource.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use fleetgate_core::{
    Car, Customer, Damage, Driver, Notification, Payment, Reference, Rent, Resource, User,
};

/// A resource with a table representation.
pub trait Listed: Resource {
    type Row: Tabled;

    fn row(record: &Arc<Self>) -> Self::Row;
}

// ── Cell helpers ────────────────────────────────────────────────────

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn rank(record: &impl Resource) -> String {
    record.rank().map(|r| r.to_string()).unwrap_or_default()
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn link(reference: Option<&Reference>) -> String {
    reference
        .and_then(Reference::id)
        .map(|id| id.to_string())
        .unwrap_or_default()
}

// ── People ──────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct UserRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
}

impl Listed for User {
    type Row = UserRow;

    fn row(u: &Arc<Self>) -> UserRow {
        UserRow {
            rank: rank(u.as_ref()),
            id: u.id.to_string(),
            name: text(u.name.as_ref().or(u.username.as_ref())),
            email: text(u.email.as_ref()),
            role: text(u.role.as_ref()),
        }
    }
}

#[derive(Tabled)]
pub struct CustomerRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Document")]
    document: String,
}

impl Listed for Customer {
    type Row = CustomerRow;

    fn row(c: &Arc<Self>) -> CustomerRow {
        CustomerRow {
            rank: rank(c.as_ref()),
            id: c.id.to_string(),
            name: text(c.name.as_ref()),
            email: text(c.email.as_ref()),
            phone: text(c.phone.as_ref()),
            document: text(c.document_number.as_ref()),
        }
    }
}

// ── Fleet ───────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct CarRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Car")]
    car: String,
    #[tabled(rename = "Plate")]
    plate: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Per day")]
    price: String,
}

impl Listed for Car {
    type Row = CarRow;

    fn row(c: &Arc<Self>) -> CarRow {
        let car = [c.brand.as_deref(), c.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        CarRow {
            rank: rank(c.as_ref()),
            id: c.id.to_string(),
            car,
            plate: text(c.plate.as_ref()),
            year: c.year.map(|y| y.to_string()).unwrap_or_default(),
            status: text(c.status.as_ref()),
            price: money(c.price_per_day),
        }
    }
}

#[derive(Tabled)]
pub struct DriverRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "License")]
    license: String,
    #[tabled(rename = "Available")]
    available: String,
}

impl Listed for Driver {
    type Row = DriverRow;

    fn row(d: &Arc<Self>) -> DriverRow {
        DriverRow {
            rank: rank(d.as_ref()),
            id: d.id.to_string(),
            name: text(d.name.as_ref()),
            phone: text(d.phone.as_ref()),
            license: text(d.license_number.as_ref()),
            available: d.available.map(|a| a.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct DamageRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Car")]
    car: String,
    #[tabled(rename = "Rent")]
    rent: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Reported")]
    reported: String,
}

impl Listed for Damage {
    type Row = DamageRow;

    fn row(d: &Arc<Self>) -> DamageRow {
        DamageRow {
            rank: rank(d.as_ref()),
            id: d.id.to_string(),
            car: link(d.car.as_ref()),
            rent: link(d.rent.as_ref()),
            description: text(d.description.as_ref()),
            cost: money(d.cost),
            reported: date(d.created_at),
        }
    }
}

// ── Rentals ─────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct RentRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Car")]
    car: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl Listed for Rent {
    type Row = RentRow;

    fn row(r: &Arc<Self>) -> RentRow {
        RentRow {
            rank: rank(r.as_ref()),
            id: r.id.to_string(),
            car: link(r.car.as_ref()),
            customer: link(r.customer.as_ref()),
            start: date(r.start_date),
            end: date(r.end_date),
            status: text(r.status.as_ref()),
            total: money(r.total_price),
        }
    }
}

#[derive(Tabled)]
pub struct PaymentRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Rent")]
    rent: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl Listed for Payment {
    type Row = PaymentRow;

    fn row(p: &Arc<Self>) -> PaymentRow {
        PaymentRow {
            rank: rank(p.as_ref()),
            id: p.id.to_string(),
            rent: link(p.rent.as_ref()),
            amount: money(p.amount),
            method: text(p.method.as_ref()),
            status: text(p.status.as_ref()),
            created: date(p.created_at),
        }
    }
}

#[derive(Tabled)]
pub struct NotificationRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl Listed for Notification {
    type Row = NotificationRow;

    fn row(n: &Arc<Self>) -> NotificationRow {
        NotificationRow {
            rank: rank(n.as_ref()),
            id: n.id.to_string(),
            read: if n.read { "✓".into() } else { String::new() },
            title: text(n.title.as_ref()),
            message: text(n.message.as_ref()),
            created: date(n.created_at),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn car_row_joins_brand_and_model() {
        let car: Car = serde_json::from_value(json!({
            "_id": "ff",
            "brand": "Volvo",
            "model": "V60",
            "licensePlate": "B-123",
            "pricePerDay": 49.5
        }))
        .unwrap();
        let row = Car::row(&Arc::new(car));
        assert_eq!(row.car, "Volvo V60");
        assert_eq!(row.plate, "B-123");
        assert_eq!(row.price, "49.50");
        assert_eq!(row.rank, "");
    }

    #[test]
    fn rent_row_shows_linked_ids() {
        let rent: Rent = serde_json::from_value(json!({
            "_id": "r1",
            "car": { "_id": "ff", "brand": "Volvo" },
            "customer": "c1"
        }))
        .unwrap();
        let row = Rent::row(&Arc::new(rent));
        assert_eq!(row.car, "ff");
        assert_eq!(row.customer, "c1");
    }
}
