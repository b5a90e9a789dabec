//! R-tree over feature positions with radius queries in meters.
//!
//! Points are stored as `[lon, lat]` degrees. A radius query first selects the
//! bounding envelope of the search circle (split at the antimeridian, widened to
//! all longitudes near the poles), then filters and orders the candidates by
//! exact haversine distance.

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use conflate_model::{Feature, Position};

use crate::distance::{angular_extent, haversine_distance};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Slack added to query envelopes so points exactly on the circle are kept.
const ENVELOPE_EPSILON_DEG: f64 = 1e-9;

/// A feature found by a radius query.
#[derive(Debug)]
pub struct Neighbor<'a, I> {
    /// Position of the feature in the slice the index was built from.
    pub index: usize,
    pub feature: &'a Feature<I>,
    pub distance_m: f64,
}

impl<I> Clone for Neighbor<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Neighbor<'_, I> {}

/// Spatial index borrowing the features it was built from.
pub struct SpatialIndex<'a, I> {
    features: &'a [Feature<I>],
    tree: RTree<IndexedPoint>,
}

impl<'a, I> SpatialIndex<'a, I> {
    /// Indexes every feature of the slice.
    ///
    /// Positions are expected to be valid; see [`Position::validate`].
    pub fn build(features: &'a [Feature<I>]) -> Self {
        Self::build_with(features, 0..features.len())
    }

    /// Indexes only the features at `indices`.
    pub fn build_with(features: &'a [Feature<I>], indices: impl IntoIterator<Item = usize>) -> Self {
        let points: Vec<IndexedPoint> = indices
            .into_iter()
            .filter_map(|idx| {
                let position = features.get(idx)?.position;
                Some(GeomWithData::new([position.lon, position.lat], idx))
            })
            .collect();
        Self {
            features,
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All indexed features within `radius_m` of `point` (inclusive), ordered by
    /// ascending distance, then by index.
    pub fn nearest(&self, point: Position, radius_m: f64) -> Vec<Neighbor<'a, I>> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Vec::new();
        }
        let mut candidates: Vec<usize> = Vec::new();
        for envelope in search_envelopes(point, radius_m) {
            candidates.extend(self.tree.locate_in_envelope(&envelope).map(|p| p.data));
        }
        candidates.sort_unstable();
        candidates.dedup();

        let features = self.features;
        let mut neighbors: Vec<Neighbor<'a, I>> = candidates
            .into_iter()
            .filter_map(|index| {
                let feature = &features[index];
                let distance_m = haversine_distance(point, feature.position);
                (distance_m <= radius_m).then_some(Neighbor {
                    index,
                    feature,
                    distance_m,
                })
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then(a.index.cmp(&b.index))
        });
        neighbors
    }

    /// The closest feature within `radius_m`, if any.
    pub fn nearest_one(&self, point: Position, radius_m: f64) -> Option<Neighbor<'a, I>> {
        self.nearest(point, radius_m).into_iter().next()
    }
}

fn search_envelopes(center: Position, radius_m: f64) -> Vec<AABB<[f64; 2]>> {
    let (lat_extent, lon_extent) = angular_extent(center, radius_m);
    let south = (center.lat - lat_extent - ENVELOPE_EPSILON_DEG).max(-90.0);
    let north = (center.lat + lat_extent + ENVELOPE_EPSILON_DEG).min(90.0);
    let band = |west: f64, east: f64| AABB::from_corners([west, south], [east, north]);

    let Some(lon_extent) = lon_extent else {
        return vec![band(-180.0, 180.0)];
    };
    let west = center.lon - lon_extent - ENVELOPE_EPSILON_DEG;
    let east = center.lon + lon_extent + ENVELOPE_EPSILON_DEG;
    if east - west >= 360.0 {
        return vec![band(-180.0, 180.0)];
    }

    let mut envelopes = vec![band(west.max(-180.0), east.min(180.0))];
    if west < -180.0 {
        envelopes.push(band(west + 360.0, 180.0));
    }
    if east > 180.0 {
        envelopes.push(band(-180.0, east - 360.0));
    }
    envelopes
}
