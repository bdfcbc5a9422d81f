//! Active objectives and the record of visited ones.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::{
    error::DataSourceError,
    identifiers::ObjectiveId,
    objective::{Category, Objective},
    position::{Coordinate, distance_meters},
    source::{ObjectiveSource, PoiQuery},
};

/// An objective reached by the player
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub objective: Objective,
    pub distance_meters: f64,
}

pub struct ObjectiveRegistry {
    source: Arc<dyn ObjectiveSource>,
    active: Vec<Objective>,
    /// Only ever grows until [`ObjectiveRegistry::clear`]
    visited: HashSet<ObjectiveId>,
}

impl ObjectiveRegistry {
    pub fn new(source: Arc<dyn ObjectiveSource>) -> Self {
        Self {
            source,
            active: Vec::new(),
            visited: HashSet::new(),
        }
    }

    /// Replace the active set with the source's objectives around `center`.
    ///
    /// Objectives that were already visited are left out. On error the previous active set is
    /// kept as it was.
    pub async fn load(
        &mut self,
        categories: &BTreeSet<Category>,
        center: Coordinate,
        radius_meters: f64,
    ) -> Result<&[Objective], DataSourceError> {
        let query = PoiQuery {
            categories: categories.iter().copied().collect(),
            center,
            radius_meters,
        };

        let collection = self.source.fetch(&query).await?;
        let received = collection.features.len();

        let batch: Vec<Objective> = collection
            .features
            .iter()
            .filter_map(|feature| {
                let objective = Objective::from_feature(feature);
                if objective.is_none() {
                    debug!("skipping feature without point geometry: {:?}", feature.id);
                }
                objective
            })
            .unique_by(|objective| objective.id.clone())
            .filter(|objective| !self.visited.contains(&objective.id))
            .collect();

        debug!(
            "loaded {} objectives ({} features received, {} visited so far)",
            batch.len(),
            received,
            self.visited.len()
        );

        self.active = batch;
        Ok(&self.active)
    }

    /// Capture every active objective within `capture_radius_meters` of `position`.
    ///
    /// Captures are ordered by ascending distance. A captured objective is never returned
    /// again.
    pub fn visit(&mut self, position: Coordinate, capture_radius_meters: f64) -> Vec<Capture> {
        let (mut captured, remaining): (Vec<Capture>, Vec<Capture>) = std::mem::take(&mut self.active)
            .into_iter()
            .map(|objective| Capture {
                distance_meters: distance_meters(position, objective.position),
                objective,
            })
            .partition(|capture| {
                capture.distance_meters <= capture_radius_meters
                    && !self.visited.contains(&capture.objective.id)
            });

        self.active = remaining.into_iter().map(|c| c.objective).collect();

        captured.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        for capture in &captured {
            self.visited.insert(capture.objective.id.clone());
        }

        captured
    }

    pub fn active(&self) -> &[Objective] {
        &self.active
    }

    pub fn is_visited(&self, id: &ObjectiveId) -> bool {
        self.visited.contains(id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Drop the active set and forget every visit
    pub fn clear(&mut self) {
        self.active.clear();
        self.visited.clear();
    }

    /// Drop the active set, keeping visits
    pub fn clear_active(&mut self) {
        self.active.clear();
    }
}
