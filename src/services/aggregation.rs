//! Chart data derived from booking collections. Cancelled bookings never
//! count towards any figure.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::models::{Bike, BikeStatus, Booking, BookingStatus, EntityId};

pub const MAX_MONTHS: usize = 12;
pub const MAX_TOP_BIKES: usize = 10;
pub const MAX_LABEL_CHARS: usize = 25;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPayment {
    pub month: String,
    pub payment: f64,
    pub bookings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeBookingCount {
    pub bike_id: EntityId,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub confirmed_bookings: usize,
    pub active_bookings: usize,
    pub completed_bookings: usize,
    pub cancelled_bookings: usize,
    pub total_bikes: usize,
    pub available_bikes: usize,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Payment totals and booking counts per calendar month, oldest first,
/// limited to the latest [`MAX_MONTHS`] months that have bookings.
/// Bookings without a usable date are skipped.
pub fn monthly_payments(bookings: &[Booking]) -> Vec<MonthlyPayment> {
    let mut months: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();

    for booking in bookings.iter().filter(|b| !b.is_cancelled()) {
        let Some(date) = booking.activity_date else {
            continue;
        };
        let entry = months.entry((date.year(), date.month())).or_insert((0.0, 0));
        entry.0 += booking.total_amount;
        entry.1 += 1;
    }

    let skip = months.len().saturating_sub(MAX_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), (payment, count))| MonthlyPayment {
            month: format!("{} {year}", MONTH_ABBREVIATIONS[(month - 1) as usize]),
            payment: round2(payment),
            bookings: count,
        })
        .collect()
}

/// The [`MAX_TOP_BIKES`] most frequently booked bikes, highest count first.
/// Ties keep the order in which the bikes were first seen.
pub fn most_booked_bikes(bookings: &[Booking]) -> Vec<BikeBookingCount> {
    let mut index: HashMap<&EntityId, usize> = HashMap::new();
    let mut counts: Vec<BikeBookingCount> = Vec::new();

    for booking in bookings.iter().filter(|b| !b.is_cancelled()) {
        let Some(bike_id) = booking.bike_id.as_ref() else {
            continue;
        };
        match index.get(bike_id) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(bike_id, counts.len());
                counts.push(BikeBookingCount {
                    bike_id: bike_id.clone(),
                    label: bike_label(booking, bike_id),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(MAX_TOP_BIKES);
    counts
}

fn bike_label(booking: &Booking, bike_id: &EntityId) -> String {
    let name = booking
        .bike_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Bike {bike_id}"));
    let label = match booking.bike_model.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(model) => format!("{name} ({model})"),
        None => name,
    };
    label.chars().take(MAX_LABEL_CHARS).collect()
}

pub fn dashboard_summary(bookings: &[Booking], bikes: &[Bike]) -> DashboardSummary {
    let count = |status: BookingStatus| {
        bookings
            .iter()
            .filter(|b| b.booking_status == status)
            .count()
    };
    let revenue: f64 = bookings
        .iter()
        .filter(|b| !b.is_cancelled())
        .map(|b| b.total_amount)
        .sum();

    DashboardSummary {
        total_revenue: round2(revenue),
        total_bookings: bookings.len(),
        pending_bookings: count(BookingStatus::Pending),
        confirmed_bookings: count(BookingStatus::Confirmed),
        active_bookings: count(BookingStatus::Active),
        completed_bookings: count(BookingStatus::Completed),
        cancelled_bookings: count(BookingStatus::Cancelled),
        total_bikes: bikes.len(),
        available_bikes: bikes
            .iter()
            .filter(|b| b.status == BikeStatus::Available)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawBike, RawBooking};
    use serde_json::{json, Value};

    fn booking(value: Value) -> Booking {
        serde_json::from_value::<RawBooking>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    fn bookings(values: Vec<Value>) -> Vec<Booking> {
        values.into_iter().map(booking).collect()
    }

    // Deterministic generator so the property tests are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    fn random_bookings(seed: u64, n: usize) -> Vec<Booking> {
        let statuses = ["PENDING", "CONFIRMED", "ACTIVE", "COMPLETED", "CANCELLED"];
        let mut rng = Lcg(seed);
        (0..n)
            .map(|i| {
                let cents = rng.below(100_000);
                let status = statuses[rng.below(5) as usize];
                let month = rng.below(12) + 1;
                let day = rng.below(28) + 1;
                let bike = rng.below(15);
                booking(json!({
                    "id": i,
                    "totalAmount": cents as f64 / 100.0,
                    "bookingStatus": status,
                    "createdAt": [2024, month, day],
                    "bike": {"id": bike, "name": format!("Bike {bike}")}
                }))
            })
            .collect()
    }

    #[test]
    fn test_monthly_example() {
        let input = bookings(vec![
            json!({"id": 1, "amount": 100, "status": "ACTIVE", "date": "2024-01-05"}),
            json!({"id": 2, "amount": 50, "status": "CANCELLED", "date": "2024-01-20"}),
            json!({"id": 3, "amount": 200, "status": "COMPLETED", "date": "2024-02-01"}),
        ]);
        assert_eq!(
            monthly_payments(&input),
            vec![
                MonthlyPayment { month: "Jan 2024".to_string(), payment: 100.0, bookings: 1 },
                MonthlyPayment { month: "Feb 2024".to_string(), payment: 200.0, bookings: 1 },
            ]
        );
    }

    #[test]
    fn test_monthly_skips_undated_and_rounds() {
        let input = bookings(vec![
            json!({"id": 1, "totalAmount": 10.005, "createdAt": "2024-03-02 10:00"}),
            json!({"id": 2, "totalAmount": 0.1, "createdAt": [2024, 3, 9]}),
            json!({"id": 3, "totalAmount": 999, "createdAt": "bogus"}),
            json!({"id": 4, "totalAmount": 999}),
        ]);
        let out = monthly_payments(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].month, "Mar 2024");
        assert_eq!(out[0].bookings, 2);
        assert!((out[0].payment - 10.11).abs() < 0.011);
    }

    #[test]
    fn test_monthly_orders_across_years_and_keeps_latest_twelve() {
        let mut values = Vec::new();
        for i in 0..15 {
            let year = 2023 + (i / 12);
            let month = (i % 12) + 1;
            values.push(json!({"id": i, "totalAmount": 1, "createdAt": [year, month, 1]}));
        }
        values.reverse();
        let out = monthly_payments(&bookings(values));
        assert_eq!(out.len(), 12);
        assert_eq!(out[0].month, "Apr 2023");
        assert_eq!(out[11].month, "Mar 2024");
    }

    #[test]
    fn test_monthly_sum_matches_input_total() {
        for seed in 1..20 {
            let input = random_bookings(seed, 60);
            let expected: f64 = input
                .iter()
                .filter(|b| b.booking_status != BookingStatus::Cancelled)
                .map(|b| b.total_amount)
                .sum();
            let out = monthly_payments(&input);
            let total: f64 = out.iter().map(|m| m.payment).sum();
            assert!(out.len() <= MAX_MONTHS);
            // One rounding step per month.
            assert!((total - expected).abs() <= 0.005 * out.len() as f64 + 1e-6);
        }
    }

    #[test]
    fn test_monthly_ignores_cancelled_bookings() {
        for seed in 1..20 {
            let mut input = random_bookings(seed, 40);
            let before = monthly_payments(&input);
            input.extend(bookings(vec![json!({
                "id": "extra",
                "totalAmount": 5000,
                "bookingStatus": "CANCELLED",
                "createdAt": [2024, 6, 1]
            })]));
            assert_eq!(monthly_payments(&input), before);
        }
    }

    #[test]
    fn test_monthly_is_idempotent() {
        let input = random_bookings(7, 30);
        assert_eq!(monthly_payments(&input), monthly_payments(&input));
    }

    #[test]
    fn test_most_booked_counts_and_labels() {
        let input = bookings(vec![
            json!({"id": 1, "bike": {"id": 5, "name": "Classic", "model": "350"}}),
            json!({"id": 2, "bikeId": 5}),
            json!({"id": 3, "bike": {"id": 8, "name": "Activa"}}),
            json!({"id": 4, "bike_id": "8", "bookingStatus": "CANCELLED"}),
            json!({"id": 5, "bike": {"name": "Nameless"}}),
            json!({"id": 6, "bike": {"id": 9, "name": "Super Meteor Interceptor", "model": "650 Twin"}}),
        ]);
        let out = most_booked_bikes(&input);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].bike_id, EntityId::from("5"));
        assert_eq!(out[0].label, "Classic (350)");
        assert_eq!(out[0].count, 2);
        assert_eq!(out[1].label, "Activa");
        assert_eq!(out[1].count, 1);
        assert_eq!(out[2].label.chars().count(), MAX_LABEL_CHARS);
        assert_eq!(out[2].label, "Super Meteor Interceptor ");
    }

    #[test]
    fn test_most_booked_ties_keep_first_seen_order() {
        let input = bookings(vec![
            json!({"id": 1, "bikeId": "c"}),
            json!({"id": 2, "bikeId": "a"}),
            json!({"id": 3, "bikeId": "b"}),
            json!({"id": 4, "bikeId": "b"}),
            json!({"id": 5, "bikeId": "a"}),
        ]);
        let order: Vec<String> = most_booked_bikes(&input)
            .into_iter()
            .map(|c| c.bike_id.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_most_booked_is_bounded_and_non_increasing() {
        for seed in 1..20 {
            let out = most_booked_bikes(&random_bookings(seed, 80));
            assert!(out.len() <= MAX_TOP_BIKES);
            assert!(out.windows(2).all(|w| w[0].count >= w[1].count));
        }
    }

    #[test]
    fn test_dashboard_summary() {
        let input = bookings(vec![
            json!({"id": 1, "totalAmount": 100.25, "bookingStatus": "ACTIVE"}),
            json!({"id": 2, "totalAmount": 50, "bookingStatus": "CANCELLED"}),
            json!({"id": 3, "totalAmount": 20, "bookingStatus": "COMPLETED"}),
        ]);
        let bikes: Vec<Bike> = vec![json!({"id": 1}), json!({"id": 2, "status": "RENTED"})]
            .into_iter()
            .filter_map(|v| serde_json::from_value::<RawBike>(v).unwrap().normalize())
            .collect();

        let summary = dashboard_summary(&input, &bikes);
        assert_eq!(summary.total_revenue, 120.25);
        assert_eq!(summary.total_bookings, 3);
        assert_eq!(summary.active_bookings, 1);
        assert_eq!(summary.cancelled_bookings, 1);
        assert_eq!(summary.total_bikes, 2);
        assert_eq!(summary.available_bikes, 1);
    }
}
