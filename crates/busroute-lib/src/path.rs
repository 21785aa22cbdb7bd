use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::graph::{build_graph, Graph, RouteObjective};
use crate::model::RouteRecord;
use crate::store::TransitStore;

/// Outcome of a successful path search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    /// Route credited with the final hop into the destination.
    pub route: Option<RouteRecord>,
    /// Accumulated weight, or the route's own value for a single direct hop.
    pub total_weight: f64,
    /// Visited locations from source to destination, inclusive.
    pub path: Vec<String>,
}

impl PathResult {
    /// Number of hops travelled.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Run Dijkstra's algorithm over `graph` from `source` to `destination`.
///
/// Returns `None` when the destination is unreachable. Equal-cost frontier
/// entries are expanded in location-name order so results are stable.
pub fn find_best_path(
    graph: &Graph,
    source: &str,
    destination: &str,
    objective: RouteObjective,
) -> Option<PathResult> {
    if source == destination {
        return Some(PathResult {
            route: None,
            total_weight: 0.0,
            path: vec![source.to_string()],
        });
    }

    let mut distances: HashMap<String, f64> = HashMap::new();
    let mut parents: HashMap<String, (String, usize)> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue = BinaryHeap::new();

    distances.insert(source.to_string(), 0.0);
    queue.push(QueueEntry::new(source.to_string(), 0.0));

    while let Some(entry) = queue.pop() {
        if !visited.insert(entry.node.clone()) {
            continue;
        }
        if entry.node == destination {
            break;
        }

        let current_distance = entry.cost.0;
        for edge in graph.neighbours(&entry.node) {
            if visited.contains(&edge.target) {
                continue;
            }
            let next_cost = current_distance + edge.weight;
            if next_cost < *distances.get(&edge.target).unwrap_or(&f64::INFINITY) {
                distances.insert(edge.target.clone(), next_cost);
                parents.insert(edge.target.clone(), (entry.node.clone(), edge.route));
                queue.push(QueueEntry::new(edge.target.clone(), next_cost));
            }
        }
    }

    let accumulated = *distances.get(destination)?;
    let path = reconstruct_path(&parents, source, destination);
    let route = parents
        .get(destination)
        .and_then(|(_, index)| graph.route(*index))
        .cloned();

    let total_weight = match &route {
        Some(route) if path.len() == 2 => objective.reported(route).unwrap_or(accumulated),
        _ => accumulated,
    };

    debug!(
        source,
        destination,
        ?objective,
        hops = path.len() - 1,
        total_weight,
        "path found"
    );

    Some(PathResult {
        route,
        total_weight,
        path,
    })
}

fn reconstruct_path(
    parents: &HashMap<String, (String, usize)>,
    start: &str,
    goal: &str,
) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node.to_string());
        if node == start {
            break;
        }
        current = parents.get(node).map(|(parent, _)| parent.as_str());
    }
    path.reverse();
    path
}

/// Graph-based route planner over a [`TransitStore`] snapshot.
///
/// Every search rebuilds the graph so it always reflects the store's current
/// active routes.
#[derive(Clone)]
pub struct PathFinder {
    store: Arc<dyn TransitStore>,
}

impl PathFinder {
    pub fn new(store: Arc<dyn TransitStore>) -> Self {
        Self { store }
    }

    /// Minimum total distance path.
    pub fn shortest_by_distance(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Option<PathResult>> {
        self.search(source, destination, RouteObjective::Distance)
    }

    /// Minimum total fare path.
    pub fn cheapest_by_fare(&self, source: &str, destination: &str) -> Result<Option<PathResult>> {
        self.search(source, destination, RouteObjective::Fare)
    }

    /// Snapshot the store into a graph weighted for `objective`.
    pub fn load_graph(&self, objective: RouteObjective) -> Result<Graph> {
        let routes = self.store.list_active_routes()?;
        let mut stops_by_route = HashMap::with_capacity(routes.len());
        for route in &routes {
            stops_by_route.insert(route.id, self.store.list_stops_for_route(route.id)?);
        }
        Ok(build_graph(&routes, &stops_by_route, objective))
    }

    fn search(
        &self,
        source: &str,
        destination: &str,
        objective: RouteObjective,
    ) -> Result<Option<PathResult>> {
        if source == destination {
            return Ok(find_best_path(&Graph::default(), source, destination, objective));
        }
        let graph = self.load_graph(objective)?;
        Ok(find_best_path(&graph, source, destination, objective))
    }
}

impl std::fmt::Debug for PathFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathFinder").finish_non_exhaustive()
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: String,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: String, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
