//! 2D k-d tree for fixed-radius neighbour queries
//!
//! Used by the Leibovici estimator to find co-located point pairs without
//! an O(n²) scan.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use geo_types::Coord;

/// A 2D k-d tree over a borrowed point slice.
///
/// Query results are indices into the slice passed to [`KdTree::build`].
#[derive(Debug)]
pub struct KdTree<'a> {
    points: &'a [Coord<f64>],
    nodes: Vec<KdNode>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

impl<'a> KdTree<'a> {
    /// Build a k-d tree in O(n log² n) using median splits.
    pub fn build(points: &'a [Coord<f64>]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        let mut indices: Vec<usize> = (0..points.len()).collect();

        if !indices.is_empty() {
            build_recursive(points, &mut indices, 0, &mut nodes);
        }

        Self { points, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of all points within `radius` (inclusive) of `query`,
    /// in no particular order. The query point itself is included when it
    /// is part of the tree.
    pub fn within_radius(&self, query: Coord<f64>, radius: f64) -> Vec<usize> {
        let mut results = Vec::new();
        if self.nodes.is_empty() || radius < 0.0 {
            return results;
        }

        self.radius_recursive(0, query, radius * radius, &mut results);
        results
    }

    fn radius_recursive(&self, node_idx: usize, q: Coord<f64>, radius_sq: f64, out: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];

        let dx = q.x - p.x;
        let dy = q.y - p.y;
        if dx * dx + dy * dy <= radius_sq {
            out.push(node.point_idx);
        }

        // diff < 0: the query lies on the left side of the splitting plane
        let diff = if node.split_dim == 0 { dx } else { dy };
        let crosses = diff * diff <= radius_sq;

        if let Some(left) = node.left {
            if diff <= 0.0 || crosses {
                self.radius_recursive(left, q, radius_sq, out);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || crosses {
                self.radius_recursive(right, q, radius_sq, out);
            }
        }
    }
}

fn build_recursive(
    points: &[Coord<f64>],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let split_dim = (depth % 2) as u8;
    let key = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };

    indices.sort_by(|&a, &b| key(a).total_cmp(&key(b)));

    let median = indices.len() / 2;
    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_dim,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];

    if !left.is_empty() {
        let child = build_recursive(points, left, depth + 1, nodes);
        nodes[node_idx].left = Some(child);
    }
    if !right.is_empty() {
        let child = build_recursive(points, right, depth + 1, nodes);
        nodes[node_idx].right = Some(child);
    }

    node_idx
}
