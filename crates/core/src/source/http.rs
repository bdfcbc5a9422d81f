//! Client for the points-of-interest proxy.
//!
//! The proxy answers `GET /geojson?types=..&lat=..&lon=..&radius=..` with a GeoJSON
//! `FeatureCollection` of point features.

use std::time::Duration;

use futures_util::future::BoxFuture;
use geojson::{FeatureCollection, GeoJson};
use reqwest::{Client, Url};
use tracing::debug;

use super::{ObjectiveSource, PoiQuery};
use crate::error::DataSourceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ProxySource {
    client: Client,
    endpoint: Url,
}

impl ProxySource {
    /// `base_url` is the proxy root, e.g. `http://localhost:3000/`
    pub fn new(base_url: &str) -> Result<Self, DataSourceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, DataSourceError> {
        let base = Url::parse(base_url)
            .map_err(|e| DataSourceError::Request(format!("invalid proxy url {base_url}: {e}")))?;
        let endpoint = base
            .join("geojson")
            .map_err(|e| DataSourceError::Request(e.to_string()))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn request_url(&self, query: &PoiQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("types", &query.types_param())
            .append_pair("lat", &query.center.lat.to_string())
            .append_pair("lon", &query.center.lon.to_string())
            .append_pair("radius", &query.radius_meters.to_string());
        url
    }

    async fn fetch_once(&self, query: &PoiQuery) -> Result<FeatureCollection, DataSourceError> {
        let url = self.request_url(query);
        debug!("requesting objectives: {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_feature_collection(&body)
    }
}

impl ObjectiveSource for ProxySource {
    fn fetch<'a>(
        &'a self,
        query: &'a PoiQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataSourceError>> {
        Box::pin(self.fetch_once(query))
    }
}

pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection, DataSourceError> {
    match body.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
        Ok(other) => Err(DataSourceError::Malformed(format!(
            "expected a FeatureCollection, got {}",
            geojson_kind(&other)
        ))),
        Err(e) => Err(DataSourceError::Malformed(e.to_string())),
    }
}

fn geojson_kind(value: &GeoJson) -> &'static str {
    match value {
        GeoJson::Geometry(_) => "a Geometry",
        GeoJson::Feature(_) => "a Feature",
        GeoJson::FeatureCollection(_) => "a FeatureCollection",
    }
}
