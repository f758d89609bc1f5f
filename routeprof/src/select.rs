//! Route Selector: turns a category and names into an ordered list of
//! distinct route ids.

use crate::{
    config::Selection,
    route::{Route, RouteId},
};
use itertools::Itertools;
use log::{debug, info};

/// Returns the ids of profiled-stage routes matching `selection`.
///
/// Ids are ordered by selected name, then by position in `routes`. A
/// route matching several selected names appears once, at its first
/// match.
pub fn select_routes(selection: Selection<'_>, routes: &[Route]) -> Vec<RouteId> {
    let matched: Vec<RouteId> = match selection {
        Selection::SegmentGroups(names) => {
            matching_names(names, routes, |route| route.segment_group.as_deref())
        }
        Selection::Systems(names) => matching_names(names, routes, |route| route.system.as_deref()),
        Selection::All => routes
            .iter()
            .filter(|route| route.stage.is_profiled())
            .map(|route| route.id)
            .collect(),
    };
    for id in &matched {
        debug!("{id} added to route list");
    }
    let selected: Vec<RouteId> = matched.into_iter().unique().collect();
    info!("{} routes selected", selected.len());
    selected
}

fn matching_names<'r>(
    names: &[String],
    routes: &'r [Route],
    field: impl Fn(&'r Route) -> Option<&'r str>,
) -> Vec<RouteId> {
    names
        .iter()
        .flat_map(|name| {
            routes
                .iter()
                .filter(|route| route.stage.is_profiled() && field(*route) == Some(name.as_str()))
                .map(|route| route.id)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::select_routes;
    use crate::{
        config::Selection,
        route::{Route, RouteId, Stage},
    };

    fn route(id: u64, stage: &str, group: &str, system: &str) -> Route {
        Route {
            id: RouteId(id),
            stage: Stage::new(stage),
            segment_group: Some(group.to_string()),
            system: Some(system.to_string()),
            begin_measure: 0.0,
            end_measure: 100.0,
        }
    }

    fn routes() -> Vec<Route> {
        vec![
            route(10, "1", "North", "Alpha"),
            route(11, "2", "North", "Alpha"),
            route(12, "5", "South", "Alpha"),
            route(13, "0", "North", "Beta"),
            route(14, "6", "South", "Beta"),
            route(15, "3", "East", "Beta"),
        ]
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_segment_groups() {
        let selected = names(&["South", "North"]);
        let ids = select_routes(Selection::SegmentGroups(&selected), &routes());
        assert_eq!(ids, vec![RouteId(12), RouteId(10), RouteId(13)]);
    }

    #[test]
    fn test_systems() {
        let selected = names(&["Beta"]);
        let ids = select_routes(Selection::Systems(&selected), &routes());
        assert_eq!(ids, vec![RouteId(13), RouteId(15)]);
    }

    #[test]
    fn test_all() {
        let ids = select_routes(Selection::All, &routes());
        assert_eq!(
            ids,
            vec![RouteId(10), RouteId(12), RouteId(13), RouteId(15)]
        );
    }

    #[test]
    fn test_repeated_names_do_not_duplicate() {
        let selected = names(&["North", "North"]);
        let ids = select_routes(Selection::SegmentGroups(&selected), &routes());
        assert_eq!(ids, vec![RouteId(10), RouteId(13)]);
    }

    #[test]
    fn test_duplicate_records_collapse() {
        let mut records = routes();
        records.push(route(10, "1", "North", "Gamma"));
        let selected = names(&["Alpha", "Gamma"]);
        let ids = select_routes(Selection::Systems(&selected), &records);
        assert_eq!(ids, vec![RouteId(10), RouteId(12)]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let selected = names(&["Nowhere"]);
        assert!(select_routes(Selection::SegmentGroups(&selected), &routes()).is_empty());
        assert!(select_routes(Selection::Systems(&[]), &routes()).is_empty());
        assert!(select_routes(Selection::All, &[]).is_empty());
    }
}
