use crate::core::geo::Point;

use rstar::primitives::GeomWithData;
use rstar::RTree;

type Entry<D> = GeomWithData<[f64; 2], D>;

/// R-tree of projected positions an incoming or outgoing marker can animate
/// from or to. Each position carries a payload, typically the geographic
/// coordinate it was projected from.
pub struct CandidateIndex<D> {
    rtree: RTree<Entry<D>>,
}

impl<D> CandidateIndex<D> {
    pub fn new(candidates: Vec<(Point, D)>) -> Self {
        let entries = candidates
            .into_iter()
            .map(|(point, data)| GeomWithData::new(point.into(), data))
            .collect();
        Self {
            rtree: RTree::bulk_load(entries),
        }
    }

    pub fn empty() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Returns the candidate closest to `point` if it lies strictly within
    /// `max_distance`.
    ///
    /// The threshold is compared squared; a negative or NaN distance never
    /// matches.
    pub fn nearest_within(&self, point: &Point, max_distance: f64) -> Option<&D> {
        if self.is_empty() || max_distance.is_nan() || max_distance < 0.0 {
            return None;
        }
        let max_distance_squared = max_distance * max_distance;
        let nearest = self.rtree.nearest_neighbor(&[point.x, point.y])?;
        let distance_squared = Point::from(*nearest.geom()).distance_squared(point);
        (distance_squared < max_distance_squared).then_some(&nearest.data)
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }
}

impl<D> Default for CandidateIndex<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D> FromIterator<(Point, D)> for CandidateIndex<D> {
    fn from_iter<I: IntoIterator<Item = (Point, D)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
