//! Defines the representation of sorting criteria for the grid.
//! This module contains the core types for managing single and multiple sort column states,
//! and the stable row ordering they produce.

use crate::{DataGridError, DataGridResult, Row, Scalar};

use std::{cmp::Ordering, fmt::Debug, str::FromStr};

/// Represents a single criterion for sorting.
/// Stored in `GridOptions` as the cumulative sort order `Vec<SortBy>`.
/// The order of criteria in the Vec determines sort precedence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SortBy {
    /// The key of the column to sort by.
    pub column_name: String,
    /// The sort direction. `true` for ascending, `false` for descending.
    pub ascending: bool,
    /// How nulls should be ordered. `true` to place nulls last, `false` for first.
    pub nulls_last: bool,
}

impl SortBy {
    /// Ascending or descending, with nulls last.
    pub fn new(column_name: impl Into<String>, ascending: bool) -> Self {
        SortBy {
            column_name: column_name.into(),
            ascending,
            nulls_last: true,
        }
    }

    /// The header state this criterion corresponds to.
    pub fn header_state(&self) -> HeaderSortState {
        match (self.ascending, self.nulls_last) {
            (false, false) => HeaderSortState::DescendingNullsFirst,
            (true, false) => HeaderSortState::AscendingNullsFirst,
            (false, true) => HeaderSortState::DescendingNullsLast,
            (true, true) => HeaderSortState::AscendingNullsLast,
        }
    }

    /// Compares two cells under this criterion.
    ///
    /// Empty cells (null or blank text) are placed by `nulls_last` regardless
    /// of the direction; the direction only reverses non-empty values.
    pub fn compare(&self, a: &Scalar, b: &Scalar) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) if self.nulls_last => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, true) if self.nulls_last => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) if self.ascending => a.sort_cmp(b),
            (false, false) => b.sort_cmp(a),
        }
    }
}

/// Parses `COLUMN`, `COLUMN:asc` or `COLUMN:desc` (nulls last).
/// Column keys may themselves contain `:`.
impl FromStr for SortBy {
    type Err = DataGridError;

    fn from_str(s: &str) -> DataGridResult<Self> {
        let invalid = |reason: &str| DataGridError::InvalidArgument {
            arg_name: "--sort".to_string(),
            reason: format!("'{s}': {reason}"),
        };

        // A suffix other than `asc`/`desc` is part of the column key, e.g. `time:utc`.
        let (column, ascending) = match s.rsplit_once(':') {
            Some((column, direction)) if direction.trim().eq_ignore_ascii_case("asc") => {
                (column.trim(), true)
            }
            Some((column, direction)) if direction.trim().eq_ignore_ascii_case("desc") => {
                (column.trim(), false)
            }
            _ => (s.trim(), true),
        };

        if column.is_empty() {
            return Err(invalid("missing column name"));
        }

        Ok(SortBy::new(column, ascending))
    }
}

/// Represents the *interaction* state for sorting a specific column header.
///
/// This enum manages the click cycle:
/// NotSorted -> DescNullsFirst -> AscNullsFirst -> DescNullsLast -> AscNullsLast -> NotSorted.
/// The actual applied cumulative sort state (`Vec<SortBy>`) is stored and managed separately
/// in `GridOptions`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum HeaderSortState {
    /// Column is not part of the current sort criteria list.
    #[default]
    NotSorted,
    /// Column sorted descending, nulls appear first.
    DescendingNullsFirst, // State 1
    /// Column sorted ascending, nulls appear first.
    AscendingNullsFirst, // State 2
    /// Column sorted descending, nulls appear last.
    DescendingNullsLast, // State 3
    /// Column sorted ascending, nulls appear last.
    AscendingNullsLast, // State 4
}

impl HeaderSortState {
    /// Calculates the next interaction state in the cycle for a header click.
    ///
    /// The cycle progresses as follows:
    /// 1. `NotSorted`            -> `DescendingNullsFirst`
    /// 2. `DescendingNullsFirst` -> `AscendingNullsFirst`
    /// 3. `AscendingNullsFirst`  -> `DescendingNullsLast`
    /// 4. `DescendingNullsLast`  -> `AscendingNullsLast`
    /// 5. `AscendingNullsLast`   -> `NotSorted` (removes the sort for this column)
    ///
    /// Called by `GridOptions::cycle_sort`.
    pub fn cycle_next(&self) -> Self {
        match self {
            HeaderSortState::NotSorted => HeaderSortState::DescendingNullsFirst,
            HeaderSortState::DescendingNullsFirst => HeaderSortState::AscendingNullsFirst,
            HeaderSortState::AscendingNullsFirst => HeaderSortState::DescendingNullsLast,
            HeaderSortState::DescendingNullsLast => HeaderSortState::AscendingNullsLast,
            HeaderSortState::AscendingNullsLast => HeaderSortState::NotSorted,
        }
    }

    /// The criterion for `column_name` in this state; `None` when not sorted.
    pub fn to_sort_by(self, column_name: &str) -> Option<SortBy> {
        let (ascending, nulls_last) = match self {
            HeaderSortState::NotSorted => return None,
            HeaderSortState::DescendingNullsFirst => (false, false),
            HeaderSortState::AscendingNullsFirst => (true, false),
            HeaderSortState::DescendingNullsLast => (false, true),
            HeaderSortState::AscendingNullsLast => (true, true),
        };
        Some(SortBy {
            column_name: column_name.to_string(),
            ascending,
            nulls_last,
        })
    }

    /// Returns a Unicode icon visually representing the interaction state.
    /// Optionally includes the sort precedence index (1-based) if the column is sorted.
    /// Uses different symbols to distinguish nulls placement.
    ///
    /// Used by the table header of the printed grid (e.g., "1⏷", "2⬆", "↕").
    ///
    /// ### Arguments
    /// * `index`: `Option<usize>` - The 0-based index representing the sort precedence. `None` if not sorted.
    pub fn get_icon(&self, index: Option<usize>) -> String {
        let base_icon = match self {
            // Nulls First States
            HeaderSortState::DescendingNullsFirst => "⏷", // U+23F7 (Down arrow)
            HeaderSortState::AscendingNullsFirst => "⏶",  // U+23F6 (Up arrow)

            // Nulls Last States
            HeaderSortState::DescendingNullsLast => "⬇",
            HeaderSortState::AscendingNullsLast => "⬆",

            // Unsorted State
            HeaderSortState::NotSorted => "↕", // U+2195 UP DOWN ARROW
        };

        match index {
            Some(idx) => format!("{}{}", idx + 1, base_icon),
            None => base_icon.to_string(),
        }
    }
}

/// Orders `rows` by `criteria`, first criterion first. The sort is stable:
/// rows equal under every criterion keep their relative order.
pub fn sort_rows(rows: &mut [&Row], criteria: &[SortBy]) {
    if criteria.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        criteria
            .iter()
            .map(|c| c.compare(a.value(&c.column_name), b.value(&c.column_name)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_sort
#[cfg(test)]
mod tests_sort {
    use super::*;
    use crate::{RawRow, RowId};

    fn row(id: i64, name: Scalar, age: Scalar) -> Row {
        Row {
            id: RowId::Number(id),
            fields: RawRow::from_iter([("name", name), ("age", age)]),
        }
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_cycle_returns_to_not_sorted() {
        let mut state = HeaderSortState::NotSorted;
        let mut seen = Vec::new();
        for _ in 0..5 {
            state = state.cycle_next();
            seen.push(state);
        }
        assert_eq!(seen.last(), Some(&HeaderSortState::NotSorted));
        assert_eq!(seen[0], HeaderSortState::DescendingNullsFirst);

        for state in &seen[..4] {
            let sort_by = state.to_sort_by("age");
            assert_eq!(sort_by.map(|s| s.header_state()), Some(*state));
        }
    }

    #[test]
    fn test_numbers_sort_numerically_and_nulls_follow_criterion() {
        let rows = [
            row(1, "b".into(), Scalar::from(100i64)),
            row(2, "a".into(), Scalar::Null),
            row(3, "c".into(), Scalar::from(9i64)),
        ];
        let mut view: Vec<&Row> = rows.iter().collect();

        sort_rows(&mut view, &[SortBy::new("age", true)]);
        assert_eq!(ids(&view), vec!["3", "1", "2"]);

        sort_rows(&mut view, &[SortBy::new("age", false)]);
        assert_eq!(ids(&view), vec!["1", "3", "2"]);

        let nulls_first = HeaderSortState::AscendingNullsFirst.to_sort_by("age");
        sort_rows(&mut view, nulls_first.as_slice());
        assert_eq!(ids(&view), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_multi_column_sort_is_stable() {
        let rows = [
            row(1, "bob".into(), Scalar::from(30i64)),
            row(2, "Alice".into(), Scalar::from(25i64)),
            row(3, "alice".into(), Scalar::from(30i64)),
            row(4, "Bob".into(), Scalar::from(25i64)),
        ];
        let mut view: Vec<&Row> = rows.iter().collect();

        // Text compares case-insensitively, so equal names keep input order.
        sort_rows(&mut view, &[SortBy::new("name", true)]);
        assert_eq!(ids(&view), vec!["2", "3", "1", "4"]);

        sort_rows(
            &mut view,
            &[SortBy::new("age", false), SortBy::new("name", true)],
        );
        assert_eq!(ids(&view), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn test_parse_sort_argument() -> DataGridResult<()> {
        assert_eq!("age".parse::<SortBy>()?, SortBy::new("age", true));
        assert_eq!("age:DESC".parse::<SortBy>()?, SortBy::new("age", false));
        assert_eq!("time:utc".parse::<SortBy>()?, SortBy::new("time:utc", true));
        assert_eq!(
            "time:utc:desc".parse::<SortBy>()?,
            SortBy::new("time:utc", false)
        );
        assert!(":asc".parse::<SortBy>().is_err());
        assert!("  ".parse::<SortBy>().is_err());
        Ok(())
    }

    #[test]
    fn test_icons() {
        assert_eq!(HeaderSortState::NotSorted.get_icon(None), "↕");
        assert_eq!(HeaderSortState::DescendingNullsLast.get_icon(Some(1)), "2⬇");
    }
}
