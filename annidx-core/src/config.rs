/// Tuning knobs for the layered index, per predicate.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Number of layers in the graph.
    pub max_levels: usize,
    /// Beam width used while linking during insertion.
    pub ef_construction: usize,
    /// Beam width used while descending during search.
    pub ef_search: usize,
    /// Optional cap on neighbors retained per node per layer. `None`
    /// reproduces the original's unbounded adjacency lists.
    pub max_neighbors: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_levels: 5,
            ef_construction: 64,
            ef_search: 32,
            max_neighbors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unbounded() {
        assert_eq!(IndexConfig::default().max_neighbors, None);
    }
}
