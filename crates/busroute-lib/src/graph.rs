use std::collections::HashMap;

use tracing::debug;

use crate::model::{RouteId, RouteRecord, StopRecord};

/// Distance charged for a route with no recorded length, in kilometres.
///
/// Large enough that any route with a real distance is preferred.
pub const MISSING_DISTANCE_PENALTY_KM: f64 = 999_999.0;

/// Quantity minimised by the pathfinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteObjective {
    /// Route length in kilometres.
    Distance,
    /// Ticket fare.
    Fare,
}

impl RouteObjective {
    /// Whole-route weight for this objective.
    pub fn weight(self, route: &RouteRecord) -> f64 {
        match self {
            RouteObjective::Distance => route.distance_km.unwrap_or(MISSING_DISTANCE_PENALTY_KM),
            RouteObjective::Fare => route.fare,
        }
    }

    /// The value a single direct route reports for this objective, if it has one.
    pub fn reported(self, route: &RouteRecord) -> Option<f64> {
        match self {
            RouteObjective::Distance => route.distance_km,
            RouteObjective::Fare => Some(route.fare),
        }
    }
}

/// Directed hop between two consecutive nodes of a single route.
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: String,
    pub weight: f64,
    /// Index of the owning route in [`Graph::routes`].
    pub route: usize,
}

/// Location graph built from a snapshot of route and stop records.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: HashMap<String, Vec<Edge>>,
    routes: Vec<RouteRecord>,
}

impl Graph {
    /// Outgoing hops from a location; empty for unknown names.
    pub fn neighbours(&self, location: &str) -> &[Edge] {
        self.adjacency
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Route that owns an edge.
    pub fn route(&self, index: usize) -> Option<&RouteRecord> {
        self.routes.get(index)
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Total number of directed edges, parallel edges included.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Number of locations with at least one outgoing edge.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.adjacency.contains_key(location)
    }

    fn add_edge(&mut self, from: &str, to: &str, weight: f64, route: usize) {
        if from == to {
            return;
        }
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .push(Edge {
                target: to.to_string(),
                weight,
                route,
            });
    }
}

/// Build the routing graph for `objective`.
///
/// A route with N stops becomes the chain start → stop₁ → … → stopN → end,
/// each hop carrying `weight / (N + 1)`. A route without stops becomes a
/// single start → end edge. Inactive routes are ignored.
pub fn build_graph(
    routes: &[RouteRecord],
    stops_by_route: &HashMap<RouteId, Vec<StopRecord>>,
    objective: RouteObjective,
) -> Graph {
    let mut graph = Graph::default();

    for route in routes.iter().filter(|route| route.is_active) {
        let index = graph.routes.len();
        graph.routes.push(route.clone());

        let weight = objective.weight(route);
        let stops = stops_by_route
            .get(&route.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if stops.is_empty() {
            graph.add_edge(&route.start_location, &route.end_location, weight, index);
            continue;
        }

        let hop_weight = weight / (stops.len() + 1) as f64;
        let mut previous = route.start_location.as_str();
        for stop in stops {
            graph.add_edge(previous, &stop.stop_name, hop_weight, index);
            previous = stop.stop_name.as_str();
        }
        graph.add_edge(previous, &route.end_location, hop_weight, index);
    }

    debug!(
        routes = graph.routes.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        ?objective,
        "built route graph"
    );
    graph
}
