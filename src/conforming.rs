//! Conforming Delaunay triangulation of planar straight-line graphs.
//!
//! The pipeline runs in stages, each consuming the result of the previous one:
//!
//! 1. split the constraint edges at their intersections and at nearby free points,
//! 2. merge vertices closer than twice the tolerance, repeating 1 and 2 until nothing is split anymore,
//! 3. triangulate the merged vertex set,
//! 4. recover every constraint edge by flipping the triangulation edges crossing it,
//! 5. optionally legalize the remaining edges to get a constrained Delaunay triangulation.
//!
//! A failing stage is reported as [`GeometryError::TriangulationFailed`] naming the stage.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, trace, warn};

use crate::{
    error::{GeometryError, Result, Stage},
    merge::merge_pslg,
    pslg::Pslg,
    sweep::intersect_detailed,
    triangulation::{Triangle, Triangulation},
    trids::tri_data_structure::TriDataStructure,
    utils::{
        compare::{less, TOLERANCE},
        convexity::orientation,
        point_order::PositionKey,
        segment::{closest_point_on_segment, is_at_endpoint, line_parameters, segments_cross},
        types::{EdgeIdx, VertexIdx},
        vec2::Vec2,
    },
};

/// Flips allowed per mesh edge, for constraint recovery and for legalization each.
const FLIPS_PER_EDGE: usize = 32;

/// Parameters of the conforming pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConformingConfig {
    /// Absolute distance below which geometry counts as touching, vertices closer than twice of it merge.
    pub tolerance: f64,
    /// Cap on the split and merge passes.
    pub max_iterations: usize,
    /// Flip non-constraint edges until they are locally Delaunay.
    pub legalize: bool,
}

impl Default for ConformingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConformingConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 16,
            legalize: true,
        }
    }

    #[must_use]
    pub const fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    #[must_use]
    pub const fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    #[must_use]
    pub const fn with_legalize(self, legalize: bool) -> Self {
        Self { legalize, ..self }
    }
}

/// A triangulation whose edges contain every constraint edge of a graph.
///
/// Mesh vertex `i` is vertex `i` of the resolved graph [`ConformingTriangulation::pslg`].
///
/// ```
/// use tessel::{ConformingConfig, ConformingTriangulation, Pslg, Vec2};
///
/// let pslg = Pslg::from_segments(&[
///     [Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)],
///     [Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0)],
/// ])
/// .unwrap();
///
/// let conforming = ConformingTriangulation::new(&pslg, &[], ConformingConfig::default()).unwrap();
///
/// assert_eq!(conforming.pslg().num_vertices(), 5);
/// assert_eq!(conforming.triangles().len(), 4);
/// assert!(conforming.contains_constraint(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)));
/// ```
#[derive(Debug, Clone)]
pub struct ConformingTriangulation {
    pub triangulation: Triangulation,
    pslg: Pslg,
    config: ConformingConfig,
    num_iterations: usize,
    num_recovery_flips: usize,
    num_legalize_flips: usize,
}

impl ConformingTriangulation {
    /// Runs the pipeline on `pslg` with the additional free points `extra_points`.
    ///
    /// Fails with [`GeometryError::InvalidInput`] for fewer than three vertices or non-finite coordinates, and
    /// with [`GeometryError::TriangulationFailed`] if a stage fails.
    pub fn new(pslg: &Pslg, extra_points: &[Vec2], config: ConformingConfig) -> Result<Self> {
        let num_input = pslg.num_vertices() + extra_points.len();
        if num_input < 3 {
            return Err(GeometryError::invalid_input(format!(
                "at least 3 vertices are required, got {}",
                num_input
            )));
        }
        if let Some(p) = pslg
            .vertices()
            .iter()
            .chain(extra_points)
            .find(|p| !p.is_finite())
        {
            return Err(GeometryError::invalid_input(format!(
                "non-finite position {}",
                p
            )));
        }
        if !config.tolerance.is_finite() || config.tolerance < 0.0 {
            return Err(GeometryError::invalid_input(format!(
                "tolerance must be finite and not negative, got {}",
                config.tolerance
            )));
        }

        let mut input = pslg.clone();
        for &p in extra_points {
            input.add_vertex(p);
        }

        let now = std::time::Instant::now();
        let (resolved, num_iterations) = resolve(input, &config)?;
        trace!(
            "Intersections and merging resolved in {} µs",
            now.elapsed().as_micros()
        );
        debug!(
            "Resolved graph has {} vertices and {} edges after {} passes",
            resolved.num_vertices(),
            resolved.num_edges(),
            num_iterations
        );

        let now = std::time::Instant::now();
        let mut triangulation = Triangulation::new(resolved.vertices())
            .map_err(|err| GeometryError::failed(Stage::Triangulation, err))?;
        trace!("Triangulation computed in {} µs", now.elapsed().as_micros());

        let now = std::time::Instant::now();
        let (constraints, num_recovery_flips) =
            recover_constraints(&mut triangulation, &resolved, config.tolerance)
            .map_err(|err| GeometryError::failed(Stage::ConstraintRecovery, err))?;
        trace!(
            "Constraint recovery computed in {} µs",
            now.elapsed().as_micros()
        );

        let mut pslg = Pslg::new();
        for &position in resolved.vertices() {
            pslg.add_vertex(position);
        }
        for [a, b] in constraints {
            pslg.add_edge(a, b)
                .map_err(|err| GeometryError::failed(Stage::ConstraintRecovery, err))?;
        }

        let num_legalize_flips = if config.legalize {
            let now = std::time::Instant::now();
            let num_flips = legalize(&mut triangulation.tds, &pslg)
                .map_err(|err| GeometryError::failed(Stage::ConstraintRecovery, err))?;
            trace!("Legalization computed in {} µs", now.elapsed().as_micros());
            num_flips
        } else {
            0
        };

        debug!(
            "Recovered {} constraint edges with {} flips, legalized with {} flips",
            pslg.num_edges(),
            num_recovery_flips,
            num_legalize_flips
        );

        Ok(Self {
            triangulation,
            pslg,
            config,
            num_iterations,
            num_recovery_flips,
            num_legalize_flips,
        })
    }

    /// The resulting triangles, counter-clockwise.
    #[must_use]
    pub fn triangles(&self) -> Vec<Triangle> {
        self.triangulation.triangles()
    }

    /// The resolved graph: split at intersections, merged, and split at vertices lying on constraint edges.
    ///
    /// Every edge of it is an edge of the triangulation.
    #[must_use]
    pub const fn pslg(&self) -> &Pslg {
        &self.pslg
    }

    #[must_use]
    pub const fn config(&self) -> &ConformingConfig {
        &self.config
    }

    /// Checks if the constraint edge between the positions `p0` and `p1` is part of the result.
    #[must_use]
    pub fn contains_constraint(&self, p0: Vec2, p1: Vec2) -> bool {
        self.pslg.contains_edge(p0, p1)
    }

    /// Number of split and merge passes until the graph was resolved.
    #[must_use]
    pub const fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Number of edge flips needed to recover the constraint edges.
    #[must_use]
    pub const fn num_recovery_flips(&self) -> usize {
        self.num_recovery_flips
    }

    #[must_use]
    pub const fn num_legalize_flips(&self) -> usize {
        self.num_legalize_flips
    }

    /// Check that every constraint edge is a mesh edge and every other edge is locally Delaunay.
    #[must_use]
    pub fn is_constrained_delaunay(&self) -> bool {
        let tds = &self.triangulation.tds;
        let constraints = constraint_set(&self.pslg);

        self.pslg
            .edges()
            .iter()
            .all(|&[a, b]| tds.find_edge(a, b).is_some())
            && tds
                .edges()
                .all(|edge| constraints.contains(&key(edge.vertices())) || edge.is_delaunay())
    }

    /// The triangles and the resolved graph.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Triangle>, Pslg) {
        (self.triangulation.triangles(), self.pslg)
    }
}

/// Conforming Delaunay triangles of `pslg` and `extra_points`, with the resolved graph.
///
/// Uses [`ConformingConfig::default`] with the given `tolerance`.
pub fn triangulate(
    pslg: &Pslg,
    extra_points: &[Vec2],
    tolerance: f64,
) -> Result<(Vec<Triangle>, Pslg)> {
    let config = ConformingConfig::default().with_tolerance(tolerance);

    Ok(ConformingTriangulation::new(pslg, extra_points, config)?.into_parts())
}

fn key([a, b]: [VertexIdx; 2]) -> (VertexIdx, VertexIdx) {
    (a.min(b), a.max(b))
}

fn constraint_set(pslg: &Pslg) -> BTreeSet<(VertexIdx, VertexIdx)> {
    pslg.edges().iter().map(|&edge| key(edge)).collect()
}

/// Alternates splitting and merging until a pass splits nothing. Returns the graph and the number of passes.
fn resolve(mut pslg: Pslg, config: &ConformingConfig) -> Result<(Pslg, usize)> {
    for iteration in 1..=config.max_iterations {
        let (split, num_splits) = split_edges(&pslg, config.tolerance)
            .map_err(|err| GeometryError::failed(Stage::IntersectionDiscovery, err))?;
        let (merged, merge) = merge_pslg(&split, config.tolerance)
            .map_err(|err| GeometryError::failed(Stage::VertexMerge, err))?;

        trace!(
            "Pass {}: {} splits, {} vertices merged",
            iteration,
            num_splits,
            merge.num_merged()
        );

        pslg = merged;
        if num_splits == 0 {
            return Ok((pslg, iteration));
        }
    }

    Err(GeometryError::failed(
        Stage::IntersectionDiscovery,
        GeometryError::IterationLimit {
            what: "intersection splitting",
            limit: config.max_iterations,
        },
    ))
}

/// Replaces every edge by a chain of sub-edges through the points where other edges or free vertices touch it.
fn split_edges(pslg: &Pslg, tolerance: f64) -> Result<(Pslg, usize)> {
    let segments = pslg.segments();
    let intersections = intersect_detailed(&segments, tolerance);

    let mut split = Pslg::new();
    for &position in pslg.vertices() {
        split.add_vertex(position);
    }

    let mut splits: Vec<Vec<(f64, VertexIdx)>> = vec![Vec::new(); pslg.num_edges()];
    let mut vertex_at: BTreeMap<PositionKey, VertexIdx> = BTreeMap::new();

    for (&e, edge_intersections) in &intersections {
        let length = segments[e][0].distance(segments[e][1]);

        for intersection in edge_intersections {
            if is_at_endpoint(intersection.t, length, tolerance) {
                continue;
            }

            let [_, other] = intersection.edges;
            let [o0, o1] = pslg.edges()[other];
            let other_length = segments[other][0].distance(segments[other][1]);

            let v = if is_at_endpoint(intersection.s, other_length, tolerance) {
                if intersection.s < 0.5 {
                    o0
                } else {
                    o1
                }
            } else {
                *vertex_at
                    .entry(PositionKey(intersection.position))
                    .or_insert_with(|| split.add_vertex(intersection.position))
            };

            splits[e].push((intersection.t, v));
        }
    }

    for v in pslg.free_vertices() {
        let p = pslg.vertices()[v];
        for (e, &[a, b]) in segments.iter().enumerate() {
            let (_, t, distance) = closest_point_on_segment(p, a, b);
            let on_edge = distance <= tolerance || orientation(a, b, p).is_eq();
            if on_edge && less(0.0, t, TOLERANCE) && less(t, 1.0, TOLERANCE) {
                splits[e].push((t, v));
            }
        }
    }

    let mut num_splits = 0;
    for (e, &[a, b]) in pslg.edges().iter().enumerate() {
        let mut chain = vec![a];
        let mut on_edge = std::mem::take(&mut splits[e]);
        on_edge.sort_by(|(t0, _), (t1, _)| t0.total_cmp(t1));

        for (_, v) in on_edge {
            if chain.last() != Some(&v) && v != b {
                chain.push(v);
                num_splits += 1;
            }
        }
        chain.push(b);

        for pair in chain.windows(2) {
            if split.vertices()[pair[0]] != split.vertices()[pair[1]] {
                split.add_edge(pair[0], pair[1])?;
            }
        }
    }

    Ok((split, num_splits))
}

/// Makes every edge of `resolved` an edge of the triangulation, returns the recovered edges and the number of
/// flips.
///
/// Edges running through another vertex, or closer than `tolerance` to it, are recovered as the chain of edges
/// between the vertices on them. Constraints between hull vertices go first, in hull order.
fn recover_constraints(
    triangulation: &mut Triangulation,
    resolved: &Pslg,
    tolerance: f64,
) -> Result<(Vec<[VertexIdx; 2]>, usize)> {
    let hull = triangulation.convex_hull();
    let hull_rank = |v: VertexIdx| hull.iter().position(|&h| h == v).unwrap_or(usize::MAX);

    let mut pending: Vec<[VertexIdx; 2]> = resolved
        .edges()
        .iter()
        .map(|&[a, b]| [triangulation.vertex_of(a), triangulation.vertex_of(b)])
        .filter(|&[a, b]| a != b)
        .collect();
    pending.sort_by_key(|&[a, b]| hull_rank(a).min(hull_rank(b)));

    let used_vertices = triangulation.used_vertices.clone();
    let tds = &mut triangulation.tds;
    let flip_limit = FLIPS_PER_EDGE * tds.num_edges().max(1);

    let mut recovered = Vec::with_capacity(pending.len());
    let mut num_flips = 0;

    // Stack of sub-constraints, the front of an edge is processed before its rest.
    pending.reverse();
    while let Some([a, b]) = pending.pop() {
        if tds.find_edge(a, b).is_some() {
            recovered.push([a, b]);
            continue;
        }

        if let Some(c) = vertex_on_segment(tds, &used_vertices, a, b, tolerance) {
            trace!("Constraint {} -> {} is split at vertex {}", a, b, c);
            pending.push([c, b]);
            pending.push([a, c]);
            continue;
        }

        num_flips += flip_crossing_edges(tds, a, b, flip_limit - num_flips)?;
        recovered.push([a, b]);
    }

    Ok((recovered, num_flips))
}

/// The vertex closest to `a` lying strictly inside the segment `a -> b`.
///
/// A vertex counts as lying on the segment if it is collinear with it or closer than `tolerance`, the same rule
/// the splitting applies to free vertices.
fn vertex_on_segment(
    tds: &TriDataStructure,
    vertices: &[VertexIdx],
    a: VertexIdx,
    b: VertexIdx,
    tolerance: f64,
) -> Option<VertexIdx> {
    let (pa, pb) = (tds.positions()[a], tds.positions()[b]);

    vertices
        .iter()
        .copied()
        .filter(|&v| v != a && v != b)
        .filter_map(|v| {
            let p = tds.positions()[v];
            let (_, t, distance) = closest_point_on_segment(p, pa, pb);
            let on_segment = distance <= tolerance || orientation(pa, pb, p).is_eq();
            (on_segment && less(0.0, t, TOLERANCE) && less(t, 1.0, TOLERANCE)).then_some((t, v))
        })
        .min_by(|(t0, _), (t1, _)| t0.total_cmp(t1))
        .map(|(_, v)| v)
}

/// Mesh edges crossing the segment `a -> b`, ordered along it.
fn crossing_edges(tds: &TriDataStructure, a: VertexIdx, b: VertexIdx) -> Vec<EdgeIdx> {
    let (pa, pb) = (tds.positions()[a], tds.positions()[b]);

    let mut crossing: Vec<(f64, EdgeIdx)> = tds
        .edges()
        .filter_map(|edge| {
            let [p, q] = edge.positions();
            if !segments_cross(pa, pb, p, q) {
                return None;
            }
            line_parameters(pa, pb, p, q).map(|(t, _)| (t, edge.idx))
        })
        .collect();
    crossing.sort_by(|(t0, _), (t1, _)| t0.total_cmp(t1));

    crossing.into_iter().map(|(_, e)| e).collect()
}

/// Flips the edges crossing `a -> b` until the segment is a mesh edge, returns the number of flips.
///
/// An edge whose quadrilateral is not convex is put back and retried after the others. A flipped edge still
/// crossing the segment is queued again.
fn flip_crossing_edges(
    tds: &mut TriDataStructure,
    a: VertexIdx,
    b: VertexIdx,
    flip_limit: usize,
) -> Result<usize> {
    let (pa, pb) = (tds.positions()[a], tds.positions()[b]);
    let mut queue: VecDeque<EdgeIdx> = crossing_edges(tds, a, b).into();
    let mut num_flips = 0;
    let mut num_stalled = 0;

    while let Some(e) = queue.pop_front() {
        if !tds.get_edge(e)?.can_flip() {
            queue.push_back(e);
            num_stalled += 1;
            if num_stalled >= queue.len() {
                return Err(GeometryError::ConstraintRecoveryFailure {
                    from: pa,
                    to: pb,
                    remaining: queue.len(),
                });
            }
            continue;
        }

        if num_flips >= flip_limit {
            return Err(GeometryError::IterationLimit {
                what: "constraint recovery",
                limit: flip_limit,
            });
        }

        let flipped = tds.flip_edge(e)?;
        num_flips += 1;
        num_stalled = 0;

        let [p, q] = tds.get_edge(flipped)?.positions();
        if segments_cross(pa, pb, p, q) {
            queue.push_back(flipped);
        }
    }

    if tds.find_edge(a, b).is_none() {
        return Err(GeometryError::ConstraintRecoveryFailure {
            from: pa,
            to: pb,
            remaining: 0,
        });
    }

    Ok(num_flips)
}

/// Lawson flips on all non-constraint edges that are not locally Delaunay, returns the number of flips.
fn legalize(tds: &mut TriDataStructure, pslg: &Pslg) -> Result<usize> {
    let constraints = constraint_set(pslg);
    let flip_limit = FLIPS_PER_EDGE * tds.num_edges().max(1);

    let mut stack: Vec<EdgeIdx> = tds.edges().map(|edge| edge.idx).collect();
    let mut num_flips = 0;

    while let Some(e) = stack.pop() {
        let (diagonal, [a, b]) = {
            let edge = tds.get_edge(e)?;
            if !edge.is_active() || constraints.contains(&key(edge.vertices())) || edge.is_delaunay() {
                continue;
            }
            match edge.flipped_diagonal() {
                Some(diagonal) => (diagonal, edge.vertices()),
                None => continue,
            }
        };

        if num_flips >= flip_limit {
            warn!(
                "Legalization stopped after {} flips, the result may not be Delaunay",
                num_flips
            );
            break;
        }

        tds.flip_edge(e)?;
        num_flips += 1;

        let [p, q] = diagonal;
        for [u, w] in [[a, p], [p, b], [b, q], [q, a]] {
            if let Some(outer) = tds.find_edge(u, w) {
                stack.push(outer);
            }
        }
    }

    Ok(num_flips)
}
