//! Split the raw export into per-group, per-participant subsets.

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::{debug, info};

use crate::core::table::{Result, SubsetCollection, Table};

/// Build the subset key for a group and participant.
pub fn subset_key(group: &str, participant: &str) -> String {
    format!("{}_{}", group, participant)
}

/// Group rows of `table` by `groupby_column` into a [`SubsetCollection`].
///
/// Groups are visited in sorted order of their value and keep their rows in
/// input order. Values are compared as numbers when every present value
/// parses as one, as text otherwise. A missing group value sorts last and
/// counts as the empty string in the key. The participant is read from the
/// first row of each group and is not checked against the other rows. Each
/// subset gets a dense 0-based row index. When two groups produce the same
/// key the one later in sorted order replaces the earlier.
///
/// # Errors
///
/// Fails when the grouping column or the participant column is absent.
pub fn divide(
    table: &Table,
    groupby_column: &str,
    participant_column: &str,
) -> Result<SubsetCollection> {
    let groups = table.column(groupby_column)?;
    let participants = table.column(participant_column)?;

    let mut row_groups: IndexMap<Option<&str>, Vec<usize>> = IndexMap::new();
    for (row, value) in groups.iter().enumerate() {
        row_groups.entry(value.as_deref()).or_default().push(row);
    }

    let numeric = row_groups
        .keys()
        .flatten()
        .all(|value| value.trim().parse::<f64>().is_ok());
    row_groups.sort_by(|a, _, b, _| compare_group_values(*a, *b, numeric));

    let mut subsets = SubsetCollection::with_capacity(row_groups.len());
    for (group, rows) in row_groups {
        let participant = participants[rows[0]].as_deref().unwrap_or("");
        let key = subset_key(group.unwrap_or(""), participant);
        let subset = table.take_rows(&rows)?;

        info!("divided: {}", key);
        debug!("{}: {} rows", key, subset.height());

        subsets.insert(key, subset);
    }

    Ok(subsets)
}

fn compare_group_values(a: Option<&str>, b: Option<&str>, numeric: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) if numeric => as_number(a).total_cmp(&as_number(b)),
        (Some(a), Some(b)) => a.cmp(b),
    }
}

fn as_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(f64::NAN)
}
