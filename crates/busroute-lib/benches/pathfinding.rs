use std::collections::HashMap;
use std::hint::black_box;

use busroute_lib::model::StopRecord;
use busroute_lib::{build_graph, find_best_path, Graph, RouteObjective, RouteRecord};
use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;

const GRID: usize = 20;

fn node(row: usize, col: usize) -> String {
    format!("Stop {row}-{col}")
}

/// A GRID x GRID city where every row and column is served by a route in
/// each direction, with the interior cells as intermediate stops.
static NETWORK: Lazy<(Vec<RouteRecord>, HashMap<i64, Vec<StopRecord>>)> = Lazy::new(|| {
    let mut routes = Vec::new();
    let mut stops = HashMap::new();
    let mut id = 0i64;

    for line in 0..GRID {
        let lanes: [Vec<String>; 2] = [
            (0..GRID).map(|col| node(line, col)).collect(),
            (0..GRID).map(|row| node(row, line)).collect(),
        ];
        for lane in lanes {
            for ordered in [lane.clone(), lane.into_iter().rev().collect::<Vec<_>>()] {
                id += 1;
                let fare = 10.0 + (id % 7) as f64 * 5.0;
                let distance = GRID as f64 * (1.0 + (id % 3) as f64 * 0.25);
                let first = ordered[0].clone();
                let last = ordered[GRID - 1].clone();
                routes.push(
                    RouteRecord::new(id, format!("B{id}"), first, last, fare)
                        .with_distance(distance),
                );
                let interior = ordered[1..GRID - 1]
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| StopRecord::new(id, name.clone(), idx as u32 + 1))
                    .collect();
                stops.insert(id, interior);
            }
        }
    }
    (routes, stops)
});

static DISTANCE_GRAPH: Lazy<Graph> = Lazy::new(|| {
    let (routes, stops) = &*NETWORK;
    build_graph(routes, stops, RouteObjective::Distance)
});

static FARE_GRAPH: Lazy<Graph> = Lazy::new(|| {
    let (routes, stops) = &*NETWORK;
    build_graph(routes, stops, RouteObjective::Fare)
});

fn benchmark_pathfinding(c: &mut Criterion) {
    let source = node(0, 0);
    let destination = node(GRID - 1, GRID - 1);

    c.bench_function("build_distance_graph", |b| {
        let (routes, stops) = &*NETWORK;
        b.iter(|| black_box(build_graph(routes, stops, RouteObjective::Distance).edge_count()));
    });

    c.bench_function("dijkstra_distance_corner_to_corner", |b| {
        let graph = &*DISTANCE_GRAPH;
        b.iter(|| {
            let result = find_best_path(graph, &source, &destination, RouteObjective::Distance)
                .expect("path exists");
            black_box(result.total_weight)
        });
    });

    c.bench_function("dijkstra_fare_corner_to_corner", |b| {
        let graph = &*FARE_GRAPH;
        b.iter(|| {
            let result = find_best_path(graph, &source, &destination, RouteObjective::Fare)
                .expect("path exists");
            black_box(result.path.len())
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
