//! The Simple Temporal Network with Uncertainty (STNU) data structure.
//!
//! This is the "STN ADT" collaborator of the core: a graph of timepoints
//! (vertices) and directed `<=` constraints (edges), some of which are
//! contingent (their duration is drawn by nature rather than controlled).
//! The simulator owns three independent [`Stn`] instances per run (`stn`,
//! `guide_stn`, `assignment_stn`); none of this module's methods assume a
//! particular one of those roles.

pub mod ir;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Stable integer id of a timepoint.
pub type VertexId = u32;

/// The reference timepoint: always at time 0, never assigned via the normal
/// dispatch path.
pub const Z: VertexId = 0;

/// A duration distribution attached to a contingent edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Uniform over `[lo, hi]`.
    Uniform { lo: f64, hi: f64 },
}

impl Distribution {
    fn sample(&self, rng: &mut impl Rng) -> f64 {
        match *self {
            Distribution::Uniform { lo, hi } => {
                if lo >= hi {
                    lo
                } else {
                    rng.gen_range(lo..=hi)
                }
            }
        }
    }

    fn lo(&self) -> f64 {
        match *self {
            Distribution::Uniform { lo, .. } => lo,
        }
    }

    fn hi(&self) -> f64 {
        match *self {
            Distribution::Uniform { hi, .. } => hi,
        }
    }
}

/// The uncertain part of a contingent edge: its distribution and, once
/// resampled, the concrete duration drawn for this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingentSpec {
    pub distribution: Distribution,
    #[serde(default)]
    pub sampled_duration: Option<f64>,
}

/// A directed constraint `t_j - t_i <= weight`. Carries a [`ContingentSpec`]
/// when this edge's duration is drawn by nature rather than fixed by the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub i: VertexId,
    pub j: VertexId,
    pub weight: f64,
    #[serde(default)]
    pub contingent: Option<ContingentSpec>,
}

impl Edge {
    pub fn is_contingent(&self) -> bool {
        self.contingent.is_some()
    }

    /// The current upper bound carried by this edge.
    pub fn get_weight_min(&self) -> f64 {
        self.weight
    }

    /// The duration sampled for this run, if this is a contingent edge and
    /// it has already been resampled.
    pub fn sampled_time(&self) -> Option<f64> {
        self.contingent.as_ref().and_then(|c| c.sampled_duration)
    }

    /// Draw a fresh duration from this edge's distribution. A no-op on a
    /// requirement edge.
    pub fn resample(&mut self, rng: &mut impl Rng) {
        if let Some(spec) = &mut self.contingent {
            spec.sampled_duration = Some(spec.distribution.sample(rng));
        }
    }
}

/// A timepoint. Carries nothing but its id and whether it has fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    executed: bool,
}

impl Vertex {
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn execute(&mut self) {
        self.executed = true;
    }
}

/// A Simple Temporal Network with Uncertainty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stn {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<(VertexId, VertexId), Edge>,
    received_timepoints: HashSet<VertexId>,
}

impl Stn {
    /// An empty network containing only Z.
    pub fn new() -> Self {
        let mut vertices = HashMap::new();
        vertices.insert(
            Z,
            Vertex {
                id: Z,
                executed: false,
            },
        );
        Stn {
            vertices,
            edges: HashMap::new(),
            received_timepoints: HashSet::new(),
        }
    }

    pub fn add_vertex(&mut self, id: VertexId) {
        self.vertices.entry(id).or_insert(Vertex {
            id,
            executed: false,
        });
    }

    /// Add (or overwrite) a requirement edge `i -> j` with bound `weight`.
    pub fn add_requirement_edge(&mut self, i: VertexId, j: VertexId, weight: f64) {
        self.add_vertex(i);
        self.add_vertex(j);
        self.edges.insert(
            (i, j),
            Edge {
                i,
                j,
                weight,
                contingent: None,
            },
        );
    }

    /// Add a contingent edge `i -> j` drawn from `distribution`. `j` becomes
    /// a "received timepoint".
    ///
    /// The distribution's lower bound is not stored as a separate `(j, i)`
    /// requirement edge: that would make `get_incoming(i)` see `j` as a
    /// requirement predecessor of `i`, blocking `i` from dispatch until `j`
    /// fires — backwards, since `i` is the contingent link's source. The
    /// lower bound is enforced directly in [`Stn::floyd_warshall`] instead.
    pub fn add_contingent_edge(&mut self, i: VertexId, j: VertexId, distribution: Distribution) {
        self.add_vertex(i);
        self.add_vertex(j);
        let weight = distribution.hi();
        self.edges.insert(
            (i, j),
            Edge {
                i,
                j,
                weight,
                contingent: Some(ContingentSpec {
                    distribution,
                    sampled_duration: None,
                }),
            },
        );
        self.received_timepoints.insert(j);
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn is_executed(&self, id: VertexId) -> bool {
        id == Z || self.vertices.get(&id).map(|v| v.is_executed()).unwrap_or(false)
    }

    pub fn mark_executed(&mut self, id: VertexId) {
        if let Some(v) = self.vertices.get_mut(&id) {
            v.execute();
        }
    }

    pub fn all_executed(&self) -> bool {
        self.vertices.values().all(|v| v.id == Z || v.is_executed())
    }

    /// Every vertex id, in ascending order. Used to make selection and
    /// propagation deterministic rather than HashMap-order dependent.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.vertices.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Requirement (non-contingent) predecessors of `v`.
    pub fn get_incoming(&self, v: VertexId) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .edges
            .values()
            .filter(|e| e.j == v && !e.is_contingent())
            .collect();
        edges.sort_unstable_by_key(|e| e.i);
        edges
    }

    /// The unique incoming contingent edge into `v`, if any.
    pub fn get_incoming_contingent(&self, v: VertexId) -> Option<&Edge> {
        self.edges.values().find(|e| e.j == v && e.is_contingent())
    }

    pub fn received_timepoints(&self) -> impl Iterator<Item = &VertexId> {
        self.received_timepoints.iter()
    }

    pub fn contingent_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(|e| e.is_contingent())
    }

    /// Every edge in the network, requirement and contingent alike.
    pub fn edge_iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn contingent_edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut().filter(|e| e.is_contingent())
    }

    /// Resample every contingent edge's duration using `rng`.
    pub fn resample_all(&mut self, rng: &mut impl Rng) {
        for edge in self.contingent_edges_mut() {
            edge.resample(rng);
        }
    }

    pub fn get_edge_weight(&self, i: VertexId, j: VertexId) -> Option<f64> {
        self.edges.get(&(i, j)).map(|e| e.weight)
    }

    /// Create or overwrite edge `i -> j` with bound `weight`.
    ///
    /// If the edge exists: tightens it when `force` is set, or when `weight`
    /// is already tighter than the stored bound. If it does not exist:
    /// inserts it only when `create` is set.
    pub fn update_edge(&mut self, i: VertexId, j: VertexId, weight: f64, create: bool, force: bool) -> bool {
        match self.edges.get_mut(&(i, j)) {
            Some(edge) => {
                if force || weight < edge.weight {
                    edge.weight = weight;
                }
                true
            }
            None => {
                if create {
                    self.edges.insert(
                        (i, j),
                        Edge {
                            i,
                            j,
                            weight,
                            contingent: None,
                        },
                    );
                    true
                } else {
                    false
                }
            }
        }
    }

    /// The time at which `v` fired, or `None` if it has not yet been
    /// executed. Z is always defined, at time 0, and is never reassigned.
    pub fn get_assigned_time(&self, v: VertexId) -> Option<f64> {
        if v == Z {
            return Some(0.0);
        }
        if !self.is_executed(v) {
            return None;
        }
        self.get_edge_weight(Z, v)
    }

    /// True iff every edge leaving `v` points at an already-executed vertex
    /// (vacuously true if `v` has no outgoing edges).
    pub fn outgoing_executed(&self, v: VertexId) -> bool {
        self.edges
            .values()
            .filter(|e| e.i == v)
            .all(|e| self.is_executed(e.j))
    }

    /// Assigner: pin `v`'s time to exactly `t` by force-updating the Z<->v
    /// edges, then mark `v` executed.
    pub fn assign_timepoint(&mut self, v: VertexId, t: f64) {
        if v != Z {
            self.update_edge(Z, v, t, true, true);
            self.update_edge(v, Z, -t, true, true);
        }
        self.mark_executed(v);
    }

    /// Cleanup: prune every executed, non-Z vertex whose outgoing edges all
    /// point at already-executed vertices.
    pub fn remove_old_timepoints(&mut self) {
        let doomed: Vec<VertexId> = self
            .vertex_ids()
            .into_iter()
            .filter(|&id| id != Z && self.is_executed(id) && self.outgoing_executed(id))
            .collect();
        for id in doomed {
            self.remove_vertex(id);
        }
    }

    /// Remove `v` and every edge incident to it.
    pub fn remove_vertex(&mut self, v: VertexId) {
        self.vertices.remove(&v);
        self.edges.retain(|(i, j), _| *i != v && *j != v);
        self.received_timepoints.remove(&v);
    }

    /// All-pairs shortest paths (Floyd-Warshall). Tightens every existing
    /// edge to its shortest-path bound and returns `false` iff a negative
    /// cycle is detected (temporal inconsistency), leaving `self` untouched
    /// in that case.
    ///
    /// Only bounds between vertex pairs that already carry an edge are
    /// tightened; new edges are not synthesized between previously
    /// unconnected pairs. This keeps `get_incoming`/`outgoing_executed`
    /// reflecting the network's original adjacency rather than a fully
    /// dense closure, while still performing a genuine all-pairs relaxation
    /// to detect inconsistency.
    pub fn floyd_warshall(&mut self) -> bool {
        let ids = self.vertex_ids();
        let n = ids.len();
        let index: HashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();

        let mut dist = vec![vec![f64::INFINITY; n]; n];
        for i in 0..n {
            dist[i][i] = 0.0;
        }
        for edge in self.edges.values() {
            let i = index[&edge.i];
            let j = index[&edge.j];
            if edge.weight < dist[i][j] {
                dist[i][j] = edge.weight;
            }
            // A contingent edge's lower bound is the reciprocal constraint
            // `i - j <= -lo`, kept out of `self.edges` so it never shows up
            // as a requirement predecessor (see `add_contingent_edge`).
            if let Some(spec) = &edge.contingent {
                let lo_bound = -spec.distribution.lo();
                if lo_bound < dist[j][i] {
                    dist[j][i] = lo_bound;
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                if dist[i][k].is_infinite() {
                    continue;
                }
                for j in 0..n {
                    if dist[k][j].is_infinite() {
                        continue;
                    }
                    let via = dist[i][k] + dist[k][j];
                    if via < dist[i][j] {
                        dist[i][j] = via;
                    }
                }
            }
        }

        for i in 0..n {
            if dist[i][i] < 0.0 {
                return false;
            }
        }

        for edge in self.edges.values_mut() {
            let i = index[&edge.i];
            let j = index[&edge.j];
            if dist[i][j] < edge.weight {
                edge.weight = dist[i][j];
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_network_has_only_z() {
        let stn = Stn::new();
        assert!(stn.is_executed(Z));
        assert_eq!(stn.get_assigned_time(Z), Some(0.0));
        assert!(stn.all_executed() == false || stn.vertex_ids() == vec![Z]);
    }

    #[test]
    fn assign_then_read_back() {
        let mut stn = Stn::new();
        stn.add_vertex(1);
        assert_eq!(stn.get_assigned_time(1), None);
        stn.update_edge(Z, 1, 5.0, true, true);
        stn.update_edge(1, Z, -5.0, true, true);
        stn.mark_executed(1);
        assert_eq!(stn.get_assigned_time(1), Some(5.0));
    }

    #[test]
    fn floyd_warshall_detects_negative_cycle() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 1.0);
        stn.add_requirement_edge(1, Z, -5.0);
        assert!(!stn.floyd_warshall());
    }

    #[test]
    fn floyd_warshall_tightens_existing_edges_only() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 10.0);
        stn.add_requirement_edge(1, 2, 5.0);
        // no direct Z->2 edge exists yet.
        assert!(stn.get_edge_weight(Z, 2).is_none());
        assert!(stn.floyd_warshall());
        assert!(stn.get_edge_weight(Z, 2).is_none());
        assert_eq!(stn.get_edge_weight(Z, 1), Some(10.0));
    }

    #[test]
    fn outgoing_executed_is_vacuously_true_without_edges() {
        let mut stn = Stn::new();
        stn.add_vertex(1);
        assert!(stn.outgoing_executed(1));
    }

    #[test]
    fn remove_vertex_drops_incident_edges() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.remove_vertex(1);
        assert!(stn.vertex(1).is_none());
        assert!(stn.get_edge_weight(Z, 1).is_none());
    }

    #[test]
    fn assign_timepoint_pins_time_and_marks_executed() {
        let mut stn = Stn::new();
        stn.add_vertex(1);
        stn.assign_timepoint(1, 7.0);
        assert!(stn.is_executed(1));
        assert_eq!(stn.get_assigned_time(1), Some(7.0));
        assert_eq!(stn.get_edge_weight(1, Z), Some(-7.0));
    }

    #[test]
    fn remove_old_timepoints_prunes_fully_dispatched_vertices() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.assign_timepoint(1, 5.0);
        stn.remove_old_timepoints();
        assert!(stn.vertex(1).is_none());
    }

    #[test]
    fn remove_old_timepoints_keeps_vertices_with_unexecuted_successors() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.add_requirement_edge(1, 2, 3.0);
        stn.assign_timepoint(1, 5.0);
        stn.remove_old_timepoints();
        assert!(stn.vertex(1).is_some());
    }

    #[test]
    fn contingent_edge_registers_received_timepoint() {
        let mut stn = Stn::new();
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });
        assert!(stn.received_timepoints().any(|&id| id == 2));
        assert!(stn.get_incoming_contingent(2).is_some());
    }
}
