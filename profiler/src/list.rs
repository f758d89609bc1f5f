use crate::{
    options::{List, ListField},
    store::GeoJsonRoutes,
};
use anyhow::Result;
use itertools::Itertools;
use routeprof::Route;

impl List {
    pub fn run(&self) -> Result<()> {
        let routes = GeoJsonRoutes::open(&self.routes)?;
        for name in names(routes.routes(), self.field) {
            println!("{name}");
        }
        Ok(())
    }
}

/// Sorted, distinct values of `field` across `routes`.
fn names(routes: &[Route], field: ListField) -> Vec<&str> {
    routes
        .iter()
        .filter_map(|route| match field {
            ListField::Segments => route.segment_group.as_deref(),
            ListField::Systems => route.system.as_deref(),
        })
        .sorted_unstable()
        .dedup()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::names;
    use crate::{options::ListField, store::tests::routes};

    #[test]
    fn test_names() {
        let store = routes();
        assert_eq!(names(store.routes(), ListField::Segments), vec!["North", "South"]);
        assert_eq!(names(store.routes(), ListField::Systems), vec!["Loop"]);
    }
}
