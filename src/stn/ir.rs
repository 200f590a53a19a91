//! JSON intermediate representation for authoring a starting [`Stn`] as a
//! file, mirroring the reference crate's `ir::Graph`/`ir::load_from_json`
//! split between an on-disk shape and the in-memory network.

use super::{Distribution, Edge, Stn, VertexId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeIr {
    pub i: VertexId,
    pub j: VertexId,
    /// Present for a requirement edge.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Present for a contingent edge; overrides `weight`.
    #[serde(default)]
    pub contingent: Option<Distribution>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StnIr {
    pub vertices: Vec<VertexId>,
    #[serde(default)]
    pub edges: Vec<EdgeIr>,
}

impl StnIr {
    /// Read a starting network from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Stn> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading STN IR {}: {}", path, e))?;
        let ir: StnIr = serde_json::from_str(&data)
            .map_err(|e| anyhow::anyhow!("parsing STN IR {}: {}", path, e))?;
        Ok(ir.into_stn())
    }

    pub fn into_stn(self) -> Stn {
        let mut stn = Stn::new();
        for v in self.vertices {
            stn.add_vertex(v);
        }
        for e in self.edges {
            match e.contingent {
                Some(dist) => stn.add_contingent_edge(e.i, e.j, dist),
                None => stn.add_requirement_edge(e.i, e.j, e.weight.unwrap_or(f64::INFINITY)),
            }
        }
        stn
    }
}

impl Stn {
    /// Serialize this network back to its IR form, for round-tripping or
    /// reporting.
    pub fn to_ir(&self) -> StnIr {
        let vertices = self.vertex_ids();
        let edges = self
            .edge_iter()
            .map(|e: &Edge| EdgeIr {
                i: e.i,
                j: e.j,
                weight: if e.is_contingent() { None } else { Some(e.weight) },
                contingent: e.contingent.as_ref().map(|c| c.distribution.clone()),
            })
            .collect();
        StnIr { vertices, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stn::Z;

    #[test]
    fn round_trips_through_json() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });

        let ir = stn.to_ir();
        let json = serde_json::to_string(&ir).unwrap();
        let parsed: StnIr = serde_json::from_str(&json).unwrap();
        let back = parsed.into_stn();

        assert_eq!(back.get_edge_weight(Z, 1), Some(5.0));
        assert!(back.get_incoming_contingent(2).is_some());
    }
}
