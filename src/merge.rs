//! Tolerance clustering of vertices.
//!
//! Two vertices closer than `2 * tolerance` belong to the same cluster, and clusters are closed under this
//! relation: a chain of close vertices ends up in one cluster even if its ends are far apart.

use crate::{
    error::Result,
    pslg::Pslg,
    utils::{
        compare::{almost_equal, TOLERANCE},
        types::VertexIdx,
        vec2::Vec2,
    },
};

/// The result of [`merge_vertices`].
#[derive(Clone, Debug, PartialEq)]
pub struct VertexMerge {
    /// One position per cluster, the mean of its members, in order of first appearance.
    pub positions: Vec<Vec2>,
    /// The cluster of each input vertex.
    pub mapping: Vec<VertexIdx>,
}

impl VertexMerge {
    /// Number of input vertices that were merged into another one.
    #[must_use]
    pub fn num_merged(&self) -> usize {
        self.mapping.len() - self.positions.len()
    }

    /// Checks if every vertex forms its own cluster.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.num_merged() == 0
    }
}

fn find_root(parents: &mut [usize], mut idx: usize) -> usize {
    while parents[idx] != idx {
        parents[idx] = parents[parents[idx]];
        idx = parents[idx];
    }

    idx
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let root_a = find_root(parents, a);
    let root_b = find_root(parents, b);

    if root_a != root_b {
        parents[root_a.max(root_b)] = root_a.min(root_b);
    }
}

/// Clusters `positions` with the distance threshold `2 * tolerance`.
///
/// Coinciding positions always merge, also for a zero tolerance. A vertex without close neighbors keeps its
/// exact position, so a set whose vertices are pairwise at least `2 * tolerance` apart comes back unchanged.
///
/// ```
/// use tessel::{merge::merge_vertices, Vec2};
///
/// let merged = merge_vertices(
///     &[Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 0.001)],
///     0.01,
/// );
///
/// assert_eq!(merged.mapping, vec![0, 1, 0]);
/// assert_eq!(merged.positions, vec![Vec2::new(0.0, 0.0005), Vec2::new(3.0, 0.0)]);
/// ```
#[must_use]
pub fn merge_vertices(positions: &[Vec2], tolerance: f64) -> VertexMerge {
    let now = std::time::Instant::now();

    let n = positions.len();
    let threshold = 2.0 * tolerance.max(0.0);
    let mut parents: Vec<usize> = (0..n).collect();

    let mut by_x: Vec<usize> = (0..n).collect();
    by_x.sort_by(|&a, &b| positions[a].x.total_cmp(&positions[b].x));

    for (k, &a) in by_x.iter().enumerate() {
        let pa = positions[a];
        for &b in &by_x[k + 1..] {
            let pb = positions[b];
            if pb.x - pa.x >= threshold && !almost_equal(pa.x, pb.x, TOLERANCE) {
                break;
            }
            if pa.distance(pb) < threshold || pa == pb {
                union(&mut parents, a, b);
            }
        }
    }

    let mut cluster_of_root = vec![usize::MAX; n];
    let mut sums: Vec<Vec2> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut mapping = Vec::with_capacity(n);

    for (idx, &position) in positions.iter().enumerate() {
        let root = find_root(&mut parents, idx);
        if cluster_of_root[root] == usize::MAX {
            cluster_of_root[root] = sums.len();
            sums.push(Vec2::ZERO);
            counts.push(0);
        }

        let cluster = cluster_of_root[root];
        sums[cluster] += position;
        counts[cluster] += 1;
        mapping.push(cluster);
    }

    let positions: Vec<Vec2> = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| sum / count as f64)
        .collect();

    log::trace!(
        "Merged {} vertices into {} clusters in {} µs",
        n,
        positions.len(),
        now.elapsed().as_micros()
    );

    VertexMerge { positions, mapping }
}

/// Merges the vertices of a graph and rewrites its edges through the cluster mapping.
///
/// Edges whose endpoints end up in the same cluster are dropped, edges that become equal are kept once.
pub fn merge_pslg(pslg: &Pslg, tolerance: f64) -> Result<(Pslg, VertexMerge)> {
    let merge = merge_vertices(pslg.vertices(), tolerance);

    let mut merged = Pslg::new();
    for &position in &merge.positions {
        merged.add_vertex(position);
    }

    let mut num_dropped = 0;
    for &[a, b] in pslg.edges() {
        let (a, b) = (merge.mapping[a], merge.mapping[b]);
        if a == b || merge.positions[a] == merge.positions[b] {
            num_dropped += 1;
            continue;
        }
        merged.add_edge(a, b)?;
    }

    if num_dropped > 0 {
        log::debug!("Dropped {} edges collapsed by vertex merging", num_dropped);
    }

    Ok((merged, merge))
}
