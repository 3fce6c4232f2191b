use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;

use crate::{Distance, GPSBounds, LonLat, Ring};

type Entry<K> = GeomWithData<Rectangle<[f64; 2]>, K>;

/// A bounding-box index over rings, so that point queries only run exact geometry against the
/// handful of shapes nearby instead of everything.
pub struct FindClosest<K> {
    tree: RTree<Entry<K>>,
}

impl<K> FindClosest<K>
where
    K: Clone + PartialEq,
{
    /// Builds the index in one pass. The set of rings never changes after loading.
    pub fn bulk_load<'a, I>(rings: I) -> FindClosest<K>
    where
        I: IntoIterator<Item = (K, &'a Ring)>,
    {
        let entries = rings
            .into_iter()
            .map(|(key, ring)| entry(key, &ring.get_bounds()))
            .collect();
        FindClosest {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Every key whose bounding box comes within `max_dist_away` of the query point. Callers still
    /// need to check the real geometry.
    pub fn candidates_near(&self, query_pt: LonLat, max_dist_away: Distance) -> Vec<K> {
        let query = GPSBounds::from(&[query_pt]).padded(max_dist_away);
        self.tree
            .locate_in_envelope_intersecting(&query.as_envelope())
            .map(|entry| entry.data.clone())
            .collect()
    }
}

fn entry<K>(key: K, bounds: &GPSBounds) -> Entry<K> {
    GeomWithData::new(
        Rectangle::from_corners([bounds.min_lon, bounds.min_lat], [bounds.max_lon, bounds.max_lat]),
        key,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(min_lon: f64, min_lat: f64) -> Ring {
        Ring::new(vec![
            LonLat::new(min_lon, min_lat),
            LonLat::new(min_lon + 0.001, min_lat),
            LonLat::new(min_lon + 0.001, min_lat + 0.001),
            LonLat::new(min_lon, min_lat + 0.001),
        ])
        .unwrap()
    }

    #[test]
    fn prefilters_by_bounding_box() {
        let rings: Vec<Ring> = (0..50)
            .map(|i| block(-122.5 + (i as f64) * 0.002, 37.75))
            .collect();
        let index = FindClosest::bulk_load(rings.iter().enumerate());
        assert_eq!(index.size(), 50);

        let pt = LonLat::new(-122.5 + 0.0005, 37.7505);
        assert_eq!(index.candidates_near(pt, Distance::meters(10.0)), vec![0]);

        // Just outside the first block's eastern edge, within the threshold
        let near_edge = LonLat::new(-122.5 + 0.00105, 37.7505);
        assert_eq!(
            index.candidates_near(near_edge, Distance::meters(10.0)),
            vec![0]
        );
        // Far from everything
        assert!(index
            .candidates_near(LonLat::new(-100.0, 40.0), Distance::meters(10.0))
            .is_empty());
    }
}
