//! Multi-Route Merger.

use crate::assemble::{cmp_rows, dedup_rows, round_elevation, ProfileRow, ProfileSeries};

/// All routes' rows, sorted by (route, measure) with no repeated
/// (route, measure) pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedTable {
    rows: Vec<ProfileRow>,
}

impl MergedTable {
    pub fn rows(&self) -> &[ProfileRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Concatenates `series` in the given order, then sorts, deduplicates
/// (first occurrence wins), and rounds elevations.
pub fn merge<I>(series: I) -> MergedTable
where
    I: IntoIterator<Item = ProfileSeries>,
{
    let mut rows: Vec<ProfileRow> = series.into_iter().flat_map(|s| s.rows).collect();
    rows.sort_by(cmp_rows);
    dedup_rows(&mut rows);
    for row in &mut rows {
        row.elevation = row.elevation.map(round_elevation);
    }
    MergedTable { rows }
}
