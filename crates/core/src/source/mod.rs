//! Points-of-interest sources.
//!
//! The engine only needs a [`FeatureCollection`] of point features for a query; where it comes
//! from is pluggable.

pub mod http;
pub mod static_source;

use futures_util::future::BoxFuture;
use geojson::FeatureCollection;
use itertools::Itertools;

use crate::{error::DataSourceError, objective::Category, position::Coordinate};

pub use http::ProxySource;
pub use static_source::StaticSource;

/// Features of some categories around a center.
#[derive(Clone, Debug, PartialEq)]
pub struct PoiQuery {
    pub categories: Vec<Category>,
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl PoiQuery {
    /// Comma-separated category names, as the proxy expects them
    pub fn types_param(&self) -> String {
        self.categories.iter().map(Category::as_ref).join(",")
    }
}

/// Fetch point features for a query.
///
/// Implementations make exactly one attempt; retrying is left to the caller.
pub trait ObjectiveSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        query: &'a PoiQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataSourceError>>;
}
