//! Finds the regulation areas at a coordinate.

use serde::{Deserialize, Serialize};

use geom::{Distance, FindClosest, LonLat};

use crate::RegulationArea;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Points this close to an area's edge count as matching it, even from outside.
    pub boundary_threshold: Distance,
    /// When the caller reports a position accuracy worse than this, confidence is low no matter
    /// what matched.
    pub poor_accuracy_threshold: Distance,
}

impl Default for LookupConfig {
    fn default() -> LookupConfig {
        LookupConfig {
            boundary_threshold: Distance::const_meters(10.0),
            poor_accuracy_threshold: Distance::const_meters(50.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    OutsideCoverage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LookupResult<'a> {
    pub primary_area: Option<&'a RegulationArea>,
    /// Always includes the primary area when there is one.
    pub overlapping_areas: Vec<&'a RegulationArea>,
    pub confidence: Confidence,
    /// From the point to the primary area's boundary
    pub boundary_distance: Option<Distance>,
}

impl<'a> LookupResult<'a> {
    pub fn new(
        primary_area: Option<&'a RegulationArea>,
        mut overlapping_areas: Vec<&'a RegulationArea>,
        confidence: Confidence,
        boundary_distance: Option<Distance>,
    ) -> LookupResult<'a> {
        if let Some(primary) = primary_area {
            if !overlapping_areas.iter().any(|a| a.id == primary.id) {
                overlapping_areas.insert(0, primary);
            }
        }
        LookupResult {
            primary_area,
            overlapping_areas,
            confidence,
            boundary_distance,
        }
    }

    pub fn outside_coverage() -> LookupResult<'a> {
        LookupResult::new(None, Vec::new(), Confidence::OutsideCoverage, None)
    }
}

struct Match {
    idx: usize,
    inside: bool,
    boundary_distance: Distance,
}

/// Owns the loaded areas and an index over their boundaries. Queries never mutate anything, so
/// one lookup can be shared across threads.
pub struct AreaLookup {
    areas: Vec<RegulationArea>,
    index: FindClosest<usize>,
    config: LookupConfig,
}

impl AreaLookup {
    pub fn new(areas: Vec<RegulationArea>, config: LookupConfig) -> AreaLookup {
        let index = FindClosest::bulk_load(areas.iter().map(|a| &a.boundary).enumerate());
        info!("Indexed {} regulation areas", index.size());
        AreaLookup {
            areas,
            index,
            config,
        }
    }

    pub fn find_area(&self, pt: LonLat) -> LookupResult {
        self.find_area_with_accuracy(pt, None)
    }

    /// `accuracy` is the caller's estimate of position error, if known. Not finding anything is a
    /// normal result with `OutsideCoverage` confidence.
    pub fn find_area_with_accuracy(&self, pt: LonLat, accuracy: Option<Distance>) -> LookupResult {
        if !pt.is_finite() {
            warn!("Can't look up non-finite point {}", pt);
            return LookupResult::outside_coverage();
        }

        let threshold = self.config.boundary_threshold;
        let candidates = self.index.candidates_near(pt, threshold);
        let mut matches = Vec::new();
        for idx in candidates {
            let boundary = &self.areas[idx].boundary;
            let inside = boundary.contains_pt(pt);
            let boundary_distance = boundary.dist_to_boundary(pt);
            if inside || boundary_distance <= threshold {
                matches.push(Match {
                    idx,
                    inside,
                    boundary_distance,
                });
            }
        }
        debug!("{} matched {} areas", pt, matches.len());

        // Most restrictive first. Among equals, containing beats merely nearby, then IDs keep the
        // order deterministic.
        matches.sort_by(|a, b| {
            let area_a = &self.areas[a.idx];
            let area_b = &self.areas[b.idx];
            area_b
                .restrictiveness
                .cmp(&area_a.restrictiveness)
                .then(b.inside.cmp(&a.inside))
                .then_with(|| area_a.id.cmp(&area_b.id))
        });

        let primary = match matches.first() {
            Some(m) => m,
            None => return LookupResult::outside_coverage(),
        };

        let poor_accuracy = accuracy
            .map(|acc| acc > self.config.poor_accuracy_threshold)
            .unwrap_or(false);
        let confidence = if poor_accuracy {
            Confidence::Low
        } else if matches.len() == 1 && primary.inside && primary.boundary_distance > threshold {
            Confidence::High
        } else {
            Confidence::Medium
        };

        LookupResult::new(
            Some(&self.areas[primary.idx]),
            matches.iter().map(|m| &self.areas[m.idx]).collect(),
            confidence,
            Some(primary.boundary_distance),
        )
    }
}
