use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage codes of routes eligible for profiling.
pub const PROFILED_STAGES: [&str; 5] = ["0", "1", "3", "4", "5"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle stage code of a route record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(pub String);

impl Stage {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns `true` if routes in this stage get profiled.
    pub fn is_profiled(&self) -> bool {
        PROFILED_STAGES.contains(&self.0.as_str())
    }
}

/// A linearly referenced route record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub stage: Stage,
    pub segment_group: Option<String>,
    pub system: Option<String>,
    pub begin_measure: f64,
    pub end_measure: f64,
}

impl Route {
    /// Measures are finite, non-negative, and in order.
    pub fn has_valid_measures(&self) -> bool {
        self.begin_measure.is_finite()
            && self.end_measure.is_finite()
            && 0.0 <= self.begin_measure
            && self.begin_measure <= self.end_measure
    }
}

/// Route filter: `route_id IN (ids...)`.
///
/// Stores evaluate it structurally (or bind `ids` as query
/// parameters); it is never spliced into query text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteQuery {
    ids: Vec<RouteId>,
}

impl RouteQuery {
    pub fn by_ids(ids: &[RouteId]) -> Self {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    /// The ids to match, sorted and distinct.
    pub fn ids(&self) -> &[RouteId] {
        &self.ids
    }

    pub fn matches(&self, id: RouteId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Route, RouteId, RouteQuery, Stage};

    #[test]
    fn test_profiled_stages() {
        for code in ["0", "1", "3", "4", "5"] {
            assert!(Stage::new(code).is_profiled(), "{code}");
        }
        for code in ["2", "6", "", "00", " 1"] {
            assert!(!Stage::new(code).is_profiled(), "{code:?}");
        }
    }

    #[test]
    fn test_query_matches() {
        let query = RouteQuery::by_ids(&[RouteId(7), RouteId(3), RouteId(7)]);
        assert_eq!(query.ids(), &[RouteId(3), RouteId(7)]);
        assert!(query.matches(RouteId(7)));
        assert!(!query.matches(RouteId(4)));
        assert!(RouteQuery::by_ids(&[]).is_empty());
    }

    #[test]
    fn test_valid_measures() {
        let route = |begin_measure, end_measure| Route {
            id: RouteId(1),
            stage: Stage::new("1"),
            segment_group: None,
            system: None,
            begin_measure,
            end_measure,
        };
        assert!(route(0.0, 120.0).has_valid_measures());
        assert!(route(40.0, 40.0).has_valid_measures());
        assert!(!route(120.0, 0.0).has_valid_measures());
        assert!(!route(-5.0, 10.0).has_valid_measures());
        assert!(!route(0.0, f64::INFINITY).has_valid_measures());
        assert!(!route(f64::NAN, 10.0).has_valid_measures());
    }
}
