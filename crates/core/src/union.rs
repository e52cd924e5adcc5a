//! Union of axis-aligned boxes into connected regions.
//!
//! Candidate neighbours come from an R-tree envelope query; a disjoint-set
//! forest then joins every pair whose union is a single polygon.

use rstar::primitives::{GeomWithData, Rectangle as RRect};
use rstar::{RTree, AABB};

use crate::geometry::BoundingBox;

type Indexed = GeomWithData<RRect<[f64; 2]>, usize>;

/// A connected component of the union: its member indices (ascending) and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub members: Vec<usize>,
    pub bounds: BoundingBox,
}

/// Partition `boxes` into the connected components of their union.
///
/// Regions are ordered by their lowest member index, so identical input
/// always yields identical output.
pub fn connected_regions(boxes: &[BoundingBox]) -> Vec<Region> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let tree: RTree<Indexed> = RTree::bulk_load(
        boxes
            .iter()
            .enumerate()
            .map(|(i, b)| GeomWithData::new(RRect::from_corners([b.x0, b.y0], [b.x1, b.y1]), i))
            .collect(),
    );

    let mut sets = DisjointSet::new(boxes.len());
    for (i, b) in boxes.iter().enumerate() {
        let envelope = AABB::from_corners([b.x0, b.y0], [b.x1, b.y1]);
        for hit in tree.locate_in_envelope_intersecting(&envelope) {
            let j = hit.data;
            if j > i && joined(b, &boxes[j]) {
                sets.union(i, j);
            }
        }
    }

    let mut regions: Vec<Region> = Vec::new();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; boxes.len()];
    for (i, b) in boxes.iter().enumerate() {
        let root = sets.find(i);
        match slot_of_root[root] {
            Some(slot) => {
                let region = &mut regions[slot];
                region.members.push(i);
                region.bounds = region.bounds.union(b);
            }
            None => {
                slot_of_root[root] = Some(regions.len());
                regions.push(Region { members: vec![i], bounds: *b });
            }
        }
    }
    regions
}

/// Two boxes fuse into one polygon when they overlap with positive area or
/// share an edge of positive length. Corner contact alone keeps them apart.
fn joined(a: &BoundingBox, b: &BoundingBox) -> bool {
    let dx = a.x1.min(b.x1) - a.x0.max(b.x0);
    let dy = a.y1.min(b.y1) - a.y0.max(b.y0);
    dx >= 0.0 && dy >= 0.0 && (dx > 0.0 || dy > 0.0)
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::new(x0, y0, x1, y1)
    }

    #[test]
    fn empty_input_has_no_regions() {
        assert!(connected_regions(&[]).is_empty());
    }

    #[test]
    fn overlapping_chain_is_one_region() {
        let boxes = [
            bx(0.0, 0.0, 10.0, 10.0),
            bx(100.0, 100.0, 110.0, 110.0),
            bx(5.0, 5.0, 20.0, 20.0),
            bx(15.0, 15.0, 30.0, 30.0),
        ];
        let regions = connected_regions(&boxes);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].members, vec![0, 2, 3]);
        assert_eq!(regions[0].bounds, bx(0.0, 0.0, 30.0, 30.0));
        assert_eq!(regions[1].members, vec![1]);
    }

    #[test]
    fn shared_edge_joins_but_shared_corner_does_not() {
        let edge = [bx(0.0, 0.0, 10.0, 10.0), bx(10.0, 0.0, 20.0, 10.0)];
        assert_eq!(connected_regions(&edge).len(), 1);

        let corner = [bx(0.0, 0.0, 10.0, 10.0), bx(10.0, 10.0, 20.0, 20.0)];
        assert_eq!(connected_regions(&corner).len(), 2);
    }

    #[test]
    fn region_order_follows_first_member() {
        let boxes = [
            bx(500.0, 500.0, 510.0, 510.0),
            bx(0.0, 0.0, 10.0, 10.0),
            bx(505.0, 505.0, 520.0, 520.0),
        ];
        let regions = connected_regions(&boxes);
        assert_eq!(regions[0].members, vec![0, 2]);
        assert_eq!(regions[1].members, vec![1]);
    }
}
