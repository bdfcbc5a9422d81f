//! In-memory source backed by a fixed feature collection.
//!
//! Answers queries the way the proxy would: by `amenity` category and by distance from the
//! query center.

use std::path::Path;

use futures_util::future::BoxFuture;
use geojson::{Feature, FeatureCollection};

use super::{ObjectiveSource, PoiQuery, http::parse_feature_collection};
use crate::{
    error::DataSourceError,
    objective::Objective,
    position::distance_meters,
};

#[derive(Clone, Debug)]
pub struct StaticSource {
    features: Vec<Feature>,
}

impl StaticSource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn from_collection(collection: FeatureCollection) -> Self {
        Self::new(collection.features)
    }

    /// Load a GeoJSON `FeatureCollection` from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(|e| DataSourceError::Request(format!("{}: {e}", path.display())))?;
        parse_feature_collection(&body).map(Self::from_collection)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn matches(feature: &Feature, query: &PoiQuery) -> bool {
        if query.radius_meters <= 0.0 || !query.radius_meters.is_finite() {
            return false;
        }

        Objective::from_feature(feature).is_some_and(|objective| {
            query.categories.contains(&objective.category)
                && distance_meters(query.center, objective.position) <= query.radius_meters
        })
    }

    pub fn query(&self, query: &PoiQuery) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .filter(|feature| Self::matches(feature, query))
                .cloned()
                .collect(),
            foreign_members: None,
        }
    }
}

impl ObjectiveSource for StaticSource {
    fn fetch<'a>(
        &'a self,
        query: &'a PoiQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataSourceError>> {
        let result = self.query(query);
        Box::pin(async move { Ok(result) })
    }
}
