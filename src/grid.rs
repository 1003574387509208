//! Glue between the filter state and a rendered page of the grid.

use crate::{FilterState, FilterType, HeaderSortState, Row, SortBy, sort_rows};

use std::{collections::HashSet, fmt};

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Display text of an empty grid.
const EMPTY_MESSAGE: &str = "No data available. Upload a CSV or Excel file to get started.";

/// Presentation options of the grid: hidden columns, sort criteria and page.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    hidden: HashSet<String>,
    sort: Vec<SortBy>,
    page_index: usize,
    page_size: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            hidden: HashSet::new(),
            sort: Vec::new(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Visibility ---

    /// Hides a shown column or shows a hidden one.
    pub fn toggle_visibility(&mut self, column_key: &str) {
        if !self.hidden.remove(column_key) {
            self.hidden.insert(column_key.to_string());
        }
    }

    pub fn hide(&mut self, column_key: &str) {
        self.hidden.insert(column_key.to_string());
    }

    /// Shows every column again.
    pub fn reset_visibility(&mut self) {
        self.hidden.clear();
    }

    pub fn is_hidden(&self, column_key: &str) -> bool {
        self.hidden.contains(column_key)
    }

    // --- Sorting ---

    /// Applies one header click to `column_key`.
    ///
    /// A column entering the cycle is appended to the criteria (lowest
    /// precedence); a column leaving it is removed; otherwise its criterion is
    /// updated in place, keeping its precedence.
    pub fn cycle_sort(&mut self, column_key: &str) -> HeaderSortState {
        let next = self.header_state(column_key).cycle_next();
        let position = self.sort.iter().position(|s| s.column_name == column_key);

        match (position, next.to_sort_by(column_key)) {
            (Some(index), Some(sort_by)) => self.sort[index] = sort_by,
            (Some(index), None) => {
                self.sort.remove(index);
            }
            (None, Some(sort_by)) => self.sort.push(sort_by),
            (None, None) => {}
        }

        tracing::debug!("Sort of '{}' is now {:?}.", column_key, next);
        next
    }

    /// Appends a criterion, replacing any earlier one for the same column.
    pub fn add_sort(&mut self, sort_by: SortBy) {
        self.sort.retain(|s| s.column_name != sort_by.column_name);
        self.sort.push(sort_by);
    }

    pub fn sort_criteria(&self) -> &[SortBy] {
        &self.sort
    }

    pub fn header_state(&self, column_key: &str) -> HeaderSortState {
        self.sort
            .iter()
            .find(|s| s.column_name == column_key)
            .map_or(HeaderSortState::NotSorted, SortBy::header_state)
    }

    // --- Pagination ---

    /// Sets the 0-based page. Out-of-range pages are clamped when the view is built.
    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    /// Sets the number of rows per page (at least 1) and returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page_index = 0;
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// One column as the grid shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub key: String,
    pub label: String,
    pub filter_type: FilterType,
    pub filterable: bool,
    pub visible: bool,
    pub sort_state: HeaderSortState,
    /// 0-based precedence among the sort criteria.
    pub sort_index: Option<usize>,
}

/// A page of the grid: every column, and the visible rows of the current page.
#[derive(Debug, Clone)]
pub struct GridView<'a> {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<&'a Row>,
    /// 0-based, clamped to the last page.
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Rows passing the filters, across all pages.
    pub total_rows: usize,
}

impl<'a> GridView<'a> {
    /// Assembles the grid from the current filter state and options.
    pub fn build(state: &'a FilterState, options: &GridOptions) -> Self {
        let dataset = state.dataset();
        let page_size = options.page_size.max(1);

        if dataset.is_empty() {
            return GridView {
                columns: Vec::new(),
                rows: Vec::new(),
                page_index: 0,
                page_count: 0,
                page_size,
                total_rows: 0,
            };
        }

        let columns = dataset
            .columns()
            .iter()
            .map(|column| {
                let sort_index = options
                    .sort
                    .iter()
                    .position(|s| s.column_name == column.key);
                GridColumn {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    filter_type: dataset.filter_type(&column.key).unwrap_or(column.filter_type),
                    filterable: column.filterable,
                    visible: column.visible && !options.is_hidden(&column.key),
                    sort_state: options.header_state(&column.key),
                    sort_index,
                }
            })
            .collect();

        let mut rows = state.visible_rows();
        sort_rows(&mut rows, &options.sort);

        let total_rows = rows.len();
        let page_count = total_rows.div_ceil(page_size);
        let page_index = options.page_index.min(page_count.saturating_sub(1));

        let rows = rows
            .into_iter()
            .skip(page_index * page_size)
            .take(page_size)
            .collect();

        GridView {
            columns,
            rows,
            page_index,
            page_count,
            page_size,
            total_rows,
        }
    }

    /// `true` when no dataset (or a dataset without columns) is loaded.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &GridColumn> {
        self.columns.iter().filter(|c| c.visible)
    }
}

/// Renders the page as an aligned plain-text table.
impl fmt::Display for GridView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{EMPTY_MESSAGE}");
        }

        let columns: Vec<&GridColumn> = self.visible_columns().collect();

        let headers: Vec<String> = columns
            .iter()
            .map(|c| match c.sort_state {
                HeaderSortState::NotSorted => c.label.clone(),
                state => format!("{} {}", c.label, state.get_icon(c.sort_index)),
            })
            .collect();

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.value(&c.key).display_text())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .map(|line| line[i].chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let write_line = |f: &mut fmt::Formatter<'_>, values: &[String]| -> fmt::Result {
            let line = values
                .iter()
                .zip(&widths)
                .map(|(value, &width)| format!("{value:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())
        };

        write_line(f, &headers)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        if cells.is_empty() {
            writeln!(f, "No rows match the current filters.")?;
        }
        for line in &cells {
            write_line(f, line)?;
        }

        writeln!(
            f,
            "Page {} of {} ({} rows)",
            if self.page_count == 0 { 0 } else { self.page_index + 1 },
            self.page_count,
            self.total_rows
        )
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
