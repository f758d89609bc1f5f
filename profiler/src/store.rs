//! GeoJSON-backed route store.

use anyhow::{anyhow, bail, Context, Result};
use geo::geometry::{Coord, LineString};
use geojson::{Feature, GeoJson};
use log::{debug, warn};
use routeprof::{Route, RouteId, RouteQuery, RouteStore, ServiceError, Stage};
use serde_json::Value as JsonValue;
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

/// Route records read from a GeoJSON feature collection.
///
/// Each feature carries a `LineString` or `MultiLineString` geometry
/// (parts are joined end to end) and these properties:
///
/// | property             | type             |
/// |----------------------|------------------|
/// | `route_id`           | positive integer |
/// | `route_stage`        | string or number |
/// | `segment_group_name` | string, optional |
/// | `system_name`        | string, optional |
/// | `Beg_Measure`        | number           |
/// | `End_Measure`        | number           |
///
/// Measures must satisfy `0 <= Beg_Measure <= End_Measure`.
pub struct GeoJsonRoutes {
    routes: Vec<Route>,
    lines: HashMap<RouteId, LineString<f64>>,
}

impl GeoJsonRoutes {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {path:?}"))?;
        let geojson = GeoJson::from_reader(BufReader::new(file))?;
        Self::from_geojson(geojson).with_context(|| format!("reading routes from {path:?}"))
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            bail!("expected a feature collection");
        };
        let mut routes = Vec::with_capacity(collection.features.len());
        let mut lines = HashMap::with_capacity(collection.features.len());
        for (idx, feature) in collection.features.iter().enumerate() {
            let route = parse_route(feature).with_context(|| format!("feature {idx}"))?;
            match feature.geometry.as_ref().map(|g| polyline(&g.value)) {
                Some(Some(line)) => {
                    lines.entry(route.id).or_insert(line);
                }
                _ => warn!("route {} has no line geometry", route.id),
            }
            routes.push(route);
        }
        debug!("read {} routes", routes.len());
        Ok(Self { routes, lines })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the route's polyline, if its feature had one.
    pub fn line(&self, id: RouteId) -> Option<&LineString<f64>> {
        self.lines.get(&id)
    }
}

impl RouteStore for GeoJsonRoutes {
    fn scan(&self) -> Result<Vec<Route>, ServiceError> {
        Ok(self.routes.clone())
    }

    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Route>, ServiceError> {
        Ok(self
            .routes
            .iter()
            .filter(|route| query.matches(route.id))
            .cloned()
            .collect())
    }
}

fn parse_route(feature: &Feature) -> Result<Route> {
    let id = match feature.property("route_id") {
        Some(JsonValue::Number(n)) => n.as_u64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| anyhow!("missing or invalid route_id"))?;
    let stage = match feature.property("route_stage") {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => bail!("route {id}: missing route_stage"),
    };
    let measure = |key: &str| -> Result<f64> {
        feature
            .property(key)
            .and_then(JsonValue::as_f64)
            .ok_or_else(|| anyhow!("route {id}: missing {key}"))
    };
    let route = Route {
        id: RouteId(id),
        stage: Stage::new(stage),
        segment_group: text(feature, "segment_group_name"),
        system: text(feature, "system_name"),
        begin_measure: measure("Beg_Measure")?,
        end_measure: measure("End_Measure")?,
    };
    if !route.has_valid_measures() {
        bail!(
            "route {id}: Beg_Measure {} and End_Measure {} must be non-negative and in order",
            route.begin_measure,
            route.end_measure
        );
    }
    Ok(route)
}

fn text(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

/// Flattens a line geometry into one polyline.
pub fn polyline(value: &geojson::Value) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = match value {
        geojson::Value::LineString(positions) => {
            positions.iter().filter_map(|p| coord(p)).collect()
        }
        geojson::Value::MultiLineString(parts) => {
            let mut coords: Vec<Coord<f64>> = Vec::new();
            for next in parts.iter().flatten().filter_map(|p| coord(p)) {
                if coords.last() != Some(&next) {
                    coords.push(next);
                }
            }
            coords
        }
        _ => return None,
    };
    (coords.len() >= 2).then(|| LineString::from(coords))
}

pub fn coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::GeoJsonRoutes;
    use geojson::GeoJson;
    use routeprof::{RouteId, RouteQuery, RouteStore};

    pub(crate) const ROUTES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0]] },
                "properties": {
                    "route_id": 7, "route_stage": "1",
                    "segment_group_name": "North", "system_name": "Loop",
                    "Beg_Measure": 0.0, "End_Measure": 3648.0
                }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[0.0, 0.01], [0.01, 0.01]], [[0.01, 0.01], [0.02, 0.01]]]
                },
                "properties": {
                    "route_id": "12", "route_stage": 2,
                    "segment_group_name": "South", "system_name": null,
                    "Beg_Measure": 10, "End_Measure": 50
                }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "route_id": 3, "route_stage": "0",
                    "Beg_Measure": 0, "End_Measure": 1
                }
            }
        ]
    }"#;

    pub(crate) fn routes() -> GeoJsonRoutes {
        GeoJsonRoutes::from_geojson(ROUTES.parse::<GeoJson>().unwrap()).unwrap()
    }

    #[test]
    fn test_parse() {
        let store = routes();
        let routes = store.routes();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].id, RouteId(7));
        assert!(routes[0].stage.is_profiled());
        assert_eq!(routes[0].system.as_deref(), Some("Loop"));
        assert_eq!(routes[1].id, RouteId(12));
        assert_eq!(routes[1].stage.0, "2");
        assert_eq!(routes[1].system, None);
        assert_eq!(routes[1].begin_measure, 10.0);

        assert_eq!(store.line(RouteId(7)).unwrap().0.len(), 2);
        // Shared vertex between parts is kept once.
        assert_eq!(store.line(RouteId(12)).unwrap().0.len(), 3);
        assert!(store.line(RouteId(3)).is_none());
    }

    #[test]
    fn test_fetch() {
        let store = routes();
        let fetched = store
            .fetch(&RouteQuery::by_ids(&[RouteId(3), RouteId(99), RouteId(7)]))
            .unwrap();
        let ids: Vec<RouteId> = fetched.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RouteId(7), RouteId(3)]);
    }

    #[test]
    fn test_missing_measure() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null,
             "properties": {"route_id": 1, "route_stage": "1", "Beg_Measure": 0}}
        ]}"#;
        let err = GeoJsonRoutes::from_geojson(json.parse().unwrap()).err().unwrap();
        assert!(format!("{err:#}").contains("End_Measure"));
    }

    #[test]
    fn test_reversed_measures() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null,
             "properties": {"route_id": 5, "route_stage": "1", "Beg_Measure": 90, "End_Measure": 10}}
        ]}"#;
        let err = GeoJsonRoutes::from_geojson(json.parse().unwrap()).err().unwrap();
        assert!(format!("{err:#}").contains("route 5: Beg_Measure 90"));

        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null,
             "properties": {"route_id": 6, "route_stage": "1", "Beg_Measure": -1, "End_Measure": 10}}
        ]}"#;
        assert!(GeoJsonRoutes::from_geojson(json.parse().unwrap()).is_err());
    }
}
