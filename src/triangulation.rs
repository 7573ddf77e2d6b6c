use std::cmp::Ordering;

use crate::{
    error::{GeometryError, Result},
    hull::convex_hull_vertices,
    trids::{tri_data_structure::TriDataStructure, tri_iterator::TriIterator},
    utils::{
        compare::{almost_equal, TOLERANCE},
        convexity::{circumcircle, in_circumcircle, orientation},
        point_order::sort_lexicographic,
        types::{TriIdx, Triangle2, VertexIdx},
        vec2::Vec2,
    },
};
use anyhow::{Ok as HowOk, Result as HowResult};
use log::warn;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// A triangle of a triangulation result, counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// Mesh vertex indices of the corners
    pub indices: [VertexIdx; 3],
    /// Positions of the corners
    pub vertices: Triangle2,
    /// Flippability of the edges `v0 -> v1`, `v1 -> v2` and `v2 -> v0`
    pub flippable: [bool; 3],
}

impl Triangle {
    fn from_tri(tri: &TriIterator) -> Option<Self> {
        Some(Self {
            indices: tri.vertices()?,
            vertices: tri.positions()?,
            flippable: tri.can_flip(),
        })
    }

    /// Center and radius of the circumcircle.
    #[must_use]
    pub fn circumcircle(&self) -> Option<(Vec2, f64)> {
        let [a, b, c] = self.vertices;
        circumcircle(a, b, c)
    }

    /// Check if `p` lies strictly inside the circumcircle.
    #[must_use]
    pub fn circumcircle_contains(&self, p: Vec2) -> bool {
        let [a, b, c] = self.vertices;
        in_circumcircle(a, b, c, p)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A 2D Delaunay triangulation, computed by divide and conquer.
///
/// ```
/// use tessel::{Triangulation, Vec2};
///
/// let points = vec![
///     Vec2::new(0.0, 0.0),
///     Vec2::new(-0.5, 1.0),
///     Vec2::new(0.0, 2.5),
///     Vec2::new(2.0, 3.0),
///     Vec2::new(4.0, 2.5),
///     Vec2::new(5.0, 1.5),
///     Vec2::new(4.5, 0.5),
///     Vec2::new(2.5, -0.5),
///     Vec2::new(1.5, 1.5),
///     Vec2::new(3.0, 1.0),
/// ];
///
/// let triangulation = Triangulation::new(&points).unwrap();
///
/// assert_eq!(triangulation.is_delaunay_p(), 1.0);
/// assert_eq!(triangulation.num_tris(), 2 * 10 - 2 - 8);
/// ```
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub tds: TriDataStructure,
    /// Vertices that are part of the triangulation, sorted by position.
    pub used_vertices: Vec<VertexIdx>,
    /// Vertices left out for coinciding with a used vertex, as `(left out, used)`.
    pub duplicates: Vec<(VertexIdx, VertexIdx)>,
    time_sorting: u128,
    time_merging: u128,
}

impl Triangulation {
    /// Triangulates a point set. Vertex `i` of the mesh is the point `points[i]`.
    ///
    /// Fails with [`GeometryError::InvalidInput`] for fewer than three distinct points, non-finite coordinates or
    /// an entirely collinear point set.
    pub fn new(points: &[Vec2]) -> Result<Self> {
        let mut tds = TriDataStructure::new();
        let vertices: Vec<VertexIdx> = points.iter().map(|&p| tds.add_vertex(p)).collect();

        Self::from_vertices(tds, &vertices)
    }

    /// Triangulates the given vertices of a mesh without edges.
    ///
    /// Vertices of `tds` not listed in `vertices` stay isolated.
    pub fn from_vertices(mut tds: TriDataStructure, vertices: &[VertexIdx]) -> Result<Self> {
        if tds.num_edges() > 0 {
            return Err(GeometryError::invalid_input(
                "the mesh to triangulate already has edges",
            ));
        }
        for &v in vertices {
            let position = tds.get_vertex(v)?.position();
            if !position.is_finite() {
                return Err(GeometryError::invalid_input(format!(
                    "vertex {} has the non-finite position {}",
                    v, position
                )));
            }
        }

        let now = std::time::Instant::now();
        let (used_vertices, duplicates) = sort_and_dedup(tds.positions(), vertices);
        let time_sorting = now.elapsed().as_micros();

        for (skipped, used) in &duplicates {
            warn!("Vertex {} coincides with vertex {} and is skipped", skipped, used);
        }

        if used_vertices.len() < 3 {
            return Err(GeometryError::invalid_input(format!(
                "at least 3 distinct points are required, got {}",
                used_vertices.len()
            )));
        }

        log::debug!("Triangulating {} vertices", used_vertices.len());

        let now = std::time::Instant::now();
        divide(&mut tds, &used_vertices)?;
        let num_degenerate = tds.remove_all_degenerate_tris()?;
        let time_merging = now.elapsed().as_micros();

        log::trace!("Removed {} degenerate triangles", num_degenerate);

        if tds.num_casual_tris() == 0 {
            return Err(GeometryError::invalid_input("all vertices are collinear"));
        }

        let triangulation = Self {
            tds,
            used_vertices,
            duplicates,
            time_sorting,
            time_merging,
        };
        triangulation.log_time();

        Ok(triangulation)
    }

    /// The resulting triangles, degenerate ones excluded.
    #[must_use]
    pub fn triangles(&self) -> Vec<Triangle> {
        self.tds
            .casual_tris()
            .filter_map(|tri| Triangle::from_tri(&tri))
            .collect()
    }

    #[must_use]
    pub fn num_tris(&self) -> usize {
        self.tds.num_casual_tris()
    }

    /// Positions of all mesh vertices, including skipped duplicates.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        self.tds.positions()
    }

    /// The mesh vertex standing for vertex `v`, i.e. `v` itself or the used vertex it coincides with.
    #[must_use]
    pub fn vertex_of(&self, v: VertexIdx) -> VertexIdx {
        self.duplicates
            .iter()
            .find(|(skipped, _)| *skipped == v)
            .map_or(v, |&(_, used)| used)
    }

    /// The convex hull corners of the used vertices, counter-clockwise.
    #[must_use]
    pub fn convex_hull(&self) -> Vec<VertexIdx> {
        convex_hull_vertices(&self.tds, &self.used_vertices)
    }

    fn violates_delaunay(&self, tri: &TriIterator) -> bool {
        let Some(corners) = tri.vertices() else {
            return false;
        };

        self.used_vertices
            .iter()
            .filter(|&&v| !corners.contains(&v))
            .any(|&v| tri.circumcircle_contains(self.tds.positions()[v]))
    }

    /// Check the Delaunay property: no used vertex lies strictly inside the circumcircle of any triangle.
    #[must_use]
    pub fn is_delaunay(&self) -> bool {
        self.tds
            .casual_tris()
            .all(|tri| !self.violates_delaunay(&tri))
    }

    /// The fraction of triangles that fulfill the Delaunay property, checked in parallel.
    #[must_use]
    pub fn is_delaunay_p(&self) -> f64 {
        let tris: Vec<TriIdx> = self.tds.casual_tris().map(|tri| tri.idx).collect();
        if tris.is_empty() {
            return 1.0;
        }

        let num_violated = tris
            .into_par_iter()
            .filter(|&t| self.violates_delaunay(&TriIterator::new(&self.tds, t)))
            .count();

        1.0 - num_violated as f64 / self.num_tris() as f64
    }

    /// Check the structural invariants of the underlying mesh.
    #[must_use]
    pub fn is_sound(&self) -> bool {
        self.tds.is_sound()
    }

    fn log_time(&self) {
        log::debug!("-------------------------------------------");
        log::debug!("Time elapsed:");
        log::debug!("Sorting computed in {} µs", self.time_sorting);
        log::debug!("Divide and conquer computed in {} µs", self.time_merging);
    }
}

/// Delaunay triangles of a point set, see [`Triangulation::new`].
pub fn triangulate(points: &[Vec2]) -> Result<Vec<Triangle>> {
    Ok(Triangulation::new(points)?.triangles())
}

/// Sorts the vertices by position and splits off those coinciding with an earlier one.
///
/// Coinciding vertices are neighbors in the sorted order up to vertices with the same y within the tolerance,
/// so only that tail of the kept vertices is searched.
fn sort_and_dedup(
    positions: &[Vec2],
    vertices: &[VertexIdx],
) -> (Vec<VertexIdx>, Vec<(VertexIdx, VertexIdx)>) {
    let mut unique: Vec<VertexIdx> = Vec::with_capacity(vertices.len());
    let mut duplicates = Vec::new();

    for v in sort_lexicographic(positions, vertices) {
        let p = positions[v];
        let coinciding = unique
            .iter()
            .rev()
            .take_while(|&&used| almost_equal(positions[used].y, p.y, TOLERANCE))
            .find(|&&used| positions[used] == p);

        match coinciding {
            Some(&used) => duplicates.push((v, used)),
            None => unique.push(v),
        }
    }

    (unique, duplicates)
}

/// Triangulates the sorted vertices, returns the triangles created, degenerate ones included.
fn divide(tds: &mut TriDataStructure, vertices: &[VertexIdx]) -> HowResult<Vec<TriIdx>> {
    match *vertices {
        [] | [_] => Err(anyhow::Error::msg("Cannot triangulate less than two vertices!")),
        [a, b] => HowOk(vec![tds.add_degenerate_tri(a, b)?]),
        [a, b, c] => {
            let p = tds.positions();
            if orientation(p[a], p[b], p[c]) == Ordering::Equal {
                HowOk(vec![
                    tds.add_degenerate_tri(a, b)?,
                    tds.add_degenerate_tri(b, c)?,
                ])
            } else {
                HowOk(vec![tds.add_tri(a, b, c)?])
            }
        }
        _ => {
            let (left, right) = vertices.split_at((vertices.len() + 1) / 2);

            let left_tris = divide(tds, left)?;
            let right_tris = divide(tds, right)?;

            merge(tds, left, right, left_tris, right_tris)
        }
    }
}

/// Stitches two triangulated halves together, bottom to top, starting at their lower common tangent.
///
/// Takes ownership of the triangle lists of both halves and returns the combined list without the triangles
/// deleted while merging.
fn merge(
    tds: &mut TriDataStructure,
    left: &[VertexIdx],
    right: &[VertexIdx],
    left_tris: Vec<TriIdx>,
    right_tris: Vec<TriIdx>,
) -> HowResult<Vec<TriIdx>> {
    let (mut l, mut r) = lower_tangent(tds, left, right)?;

    let limit = 2 * (left.len() + right.len()) + 2;
    let mut merged: Vec<TriIdx> = Vec::new();
    let mut steps = 0;

    loop {
        let left_candidate = find_candidate(tds, Side::Left, l, r)?;
        let right_candidate = find_candidate(tds, Side::Right, l, r)?;

        let (side, c) = match (left_candidate, right_candidate) {
            (None, None) => {
                // nothing above the base edge, the halves are collinear
                if steps == 0 {
                    merged.push(tds.add_degenerate_tri(l, r)?);
                }
                break;
            }
            (Some(lc), None) => (Side::Left, lc),
            (None, Some(rc)) => (Side::Right, rc),
            (Some(lc), Some(rc)) if lc == rc => {
                match (tds.find_edge(l, lc), tds.find_edge(r, rc)) {
                    (Some(_), None) => (Side::Left, lc),
                    (None, Some(_)) => (Side::Right, rc),
                    _ => {
                        merged.push(tds.add_tri(l, r, lc)?);
                        break;
                    }
                }
            }
            (Some(lc), Some(rc)) => {
                let p = tds.positions();
                if in_circumcircle(p[l], p[r], p[rc], p[lc]) {
                    (Side::Left, lc)
                } else {
                    (Side::Right, rc)
                }
            }
        };

        merged.push(tds.add_tri(l, r, c)?);
        match side {
            Side::Left => l = c,
            Side::Right => r = c,
        }

        steps += 1;
        if steps > limit {
            return Err(GeometryError::IterationLimit {
                what: "merge of two triangulated halves",
                limit,
            }
            .into());
        }
    }

    HowOk(
        left_tris
            .into_iter()
            .chain(right_tris)
            .chain(merged)
            .filter(|&t| !tds.tri_nodes[t][0].is_deleted())
            .collect(),
    )
}

/// The edge connecting both halves that has all other vertices above it, as `(left vertex, right vertex)`.
///
/// Both halves are consecutive runs of the sorted vertices, so the tangent is the one edge of the lower hull of
/// their union that leads from the left half into the right one. The hull keeps vertices lying on it, which makes
/// the tangent connect the closest pair of vertices on the tangent line.
fn lower_tangent(
    tds: &TriDataStructure,
    left: &[VertexIdx],
    right: &[VertexIdx],
) -> HowResult<(VertexIdx, VertexIdx)> {
    if left.is_empty() || right.is_empty() {
        return Err(anyhow::Error::msg("Cannot merge an empty half!"));
    }

    let p = tds.positions();
    let union: Vec<VertexIdx> = left.iter().chain(right).copied().collect();

    let mut lower_hull: Vec<usize> = Vec::with_capacity(union.len());
    for k in 0..union.len() {
        while let [.., i, j] = lower_hull[..] {
            if orientation(p[union[i]], p[union[j]], p[union[k]]) != Ordering::Less {
                break;
            }
            lower_hull.pop();
        }
        lower_hull.push(k);
    }

    lower_hull
        .windows(2)
        .find(|pair| pair[0] < left.len() && pair[1] >= left.len())
        .map(|pair| (union[pair[0]], union[pair[1]]))
        .ok_or_else(|| anyhow::Error::msg("Lower hull does not connect both halves!"))
}

/// Neighbors of the base edge endpoint on `side` that lie above the base edge `l -> r`, by increasing angle to it.
///
/// The angle is measured counter-clockwise around `l` on the left and clockwise around `r` on the right.
fn candidates(
    tds: &TriDataStructure,
    side: Side,
    l: VertexIdx,
    r: VertexIdx,
) -> HowResult<Vec<VertexIdx>> {
    let p = tds.positions();
    let (from, towards) = match side {
        Side::Left => (l, r),
        Side::Right => (r, l),
    };
    let base = (p[towards] - p[from]).normalize();

    let mut by_angle: Vec<(f64, f64, VertexIdx)> = tds
        .get_vertex(from)?
        .neighbors()
        .into_iter()
        .filter(|&c| orientation(p[l], p[r], p[c]) == Ordering::Greater)
        .map(|c| {
            let leg = p[c] - p[from];
            (-base.dot(leg.normalize()), leg.squared_length(), c)
        })
        .collect();

    by_angle.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));

    HowOk(by_angle.into_iter().map(|(_, _, c)| c).collect())
}

/// The candidate vertex on `side` to close a triangle over the base edge `l -> r`.
///
/// An edge to a candidate whose triangle with the base edge would contain the next candidate in its circumcircle
/// is deleted together with its triangles, then the search continues with the next candidate.
fn find_candidate(
    tds: &mut TriDataStructure,
    side: Side,
    l: VertexIdx,
    r: VertexIdx,
) -> HowResult<Option<VertexIdx>> {
    let from = match side {
        Side::Left => l,
        Side::Right => r,
    };

    loop {
        let by_angle = candidates(tds, side, l, r)?;
        let [candidate, next, ..] = by_angle[..] else {
            return HowOk(by_angle.first().copied());
        };

        let p = tds.positions();
        if !in_circumcircle(p[l], p[r], p[candidate], p[next]) {
            return HowOk(Some(candidate));
        }

        let e = tds
            .find_edge(from, candidate)
            .ok_or_else(|| anyhow::Error::msg("Candidate edge is missing!"))?;
        tds.remove_edge(e)?;
    }
}
