//! Synthetic people used when nothing has been uploaded yet.

use crate::{RawRow, Scalar};

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Rows generated for the demo dataset.
pub const DEFAULT_DEMO_ROWS: usize = 100;

const FIRST_NAMES: [&str; 10] = [
    "John", "Jane", "Mike", "Sara", "Robert", "Emily", "David", "Sophia", "James", "Olivia",
];

const LAST_NAMES: [&str; 10] = [
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
];

/// City and its state.
const CITIES: [(&str, &str); 10] = [
    ("New York", "NY"),
    ("Los Angeles", "CA"),
    ("Chicago", "IL"),
    ("Houston", "TX"),
    ("Phoenix", "AZ"),
    ("Philadelphia", "PA"),
    ("San Antonio", "TX"),
    ("San Diego", "CA"),
    ("Dallas", "TX"),
    ("San Jose", "CA"),
];

/// Generates `count` people with ids `1..=count`.
///
/// The same `seed` always yields the same rows.
pub fn person_rows(count: usize, seed: u64) -> Vec<RawRow> {
    let mut rng = StdRng::seed_from_u64(seed);

    (1..=count)
        .map(|id| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
            let (city, state) = CITIES[rng.gen_range(0..CITIES.len())];
            let age: i64 = rng.gen_range(20..60);

            RawRow::from_iter([
                ("id", Scalar::from(id as i64)),
                ("firstName", Scalar::from(first)),
                ("lastName", Scalar::from(last)),
                (
                    "email",
                    Scalar::from(format!(
                        "{}.{}@example.com",
                        first.to_lowercase(),
                        last.to_lowercase()
                    )),
                ),
                ("age", Scalar::from(age)),
                ("city", Scalar::from(city)),
                ("state", Scalar::from(state)),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests_mock {
    use super::*;

    #[test]
    fn test_person_rows_are_deterministic_and_well_formed() {
        let rows = person_rows(50, 7);
        assert_eq!(rows.len(), 50);
        assert_eq!(rows, person_rows(50, 7));

        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row.get("id"), Some(&Scalar::from(index as i64 + 1)));

            let age = row.get("age").and_then(Scalar::as_number).unwrap_or(0.0);
            assert!((20.0..60.0).contains(&age));

            let city = row.get("city").map(Scalar::display_text).unwrap_or_default();
            let state = row.get("state").map(Scalar::display_text).unwrap_or_default();
            assert!(CITIES.contains(&(city.as_str(), state.as_str())));

            let email = row.get("email").map(Scalar::display_text).unwrap_or_default();
            assert!(email.ends_with("@example.com"));
            assert_eq!(email, email.to_lowercase());
        }
    }
}
