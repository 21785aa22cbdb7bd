mod common;

use std::sync::Arc;

use busroute_lib::{EngineConfig, LocationResolver, ResponseKind, RouteSearch, TransitStore};

use common::fixture_store;

fn search() -> RouteSearch {
    let store: Arc<dyn TransitStore> = Arc::new(fixture_store());
    let config = EngineConfig::default();
    let resolver = Arc::new(LocationResolver::new(store.clone(), &config));
    RouteSearch::new(store, resolver, config)
}

fn numbers(routes: &[busroute_lib::RouteRecord]) -> Vec<&str> {
    routes.iter().map(|route| route.route_number.as_str()).collect()
}

#[test]
fn colloquial_endpoints_find_direct_routes() {
    let search = search();
    let routes = search.find_routes("cp", "airport").unwrap();
    assert_eq!(numbers(&routes), ["001", "002"]);
}

#[test]
fn stops_are_searched_when_no_route_matches_endpoints() {
    let search = search();
    let routes = search.find_routes("karol bagh", "janakpuri").unwrap();
    assert_eq!(numbers(&routes), ["025A"]);
}

#[test]
fn unknown_pairs_find_nothing() {
    let search = search();
    assert!(search.find_routes("hauz khas", "noida").unwrap().is_empty());
}

#[test]
fn destination_search_includes_routes_stopping_there() {
    let search = search();
    let routes = search.find_all_routes_to_destination("Karol Bagh").unwrap();
    assert_eq!(numbers(&routes), ["025A", "118"]);

    let routes = search.find_all_routes_to_destination("Dwarka Sector 21").unwrap();
    assert_eq!(numbers(&routes), ["025A", "118"]);
}

#[test]
fn recommendations_rank_by_fare_with_badges() {
    let search = search();
    let routes = search.find_routes("cp", "airport").unwrap();
    let payload = search
        .generate_recommendations(&routes, "Connaught Place", "IGI Airport")
        .unwrap();

    assert_eq!(payload.kind, ResponseKind::RouteList);
    assert!(payload
        .message
        .starts_with("ROUTES: Connaught Place → IGI Airport"));
    assert!(payload.message.contains("Most Used"));
    assert!(payload.message.contains("Popular"));

    let listed = payload.routes.expect("routes");
    assert_eq!(listed[0].route_number, "002");
    assert_eq!(listed[0].bus_type, "Non-AC");
    assert_eq!(listed[0].bookings, Some(6));
    assert_eq!(listed[1].route_number, "001");
    assert_eq!(listed[1].bookings, Some(12));
}

#[test]
fn destination_recommendations_name_each_origin() {
    let search = search();
    let routes = search
        .find_all_routes_to_destination("Dwarka Sector 21")
        .unwrap();
    let payload = search
        .generate_destination_recommendations(&routes, "Dwarka Sector 21")
        .unwrap();

    assert_eq!(payload.kind, ResponseKind::DestinationRoutes);
    assert!(payload.message.contains("Kashmere Gate → Dwarka Sector 21"));
    assert!(payload.message.contains("Connaught Place → Dwarka Sector 21"));
    let listed = payload.routes.expect("routes");
    assert_eq!(listed[0].route_number, "025A");
    assert_eq!(listed[1].bus_type, "Standard");
}
