mod common;

use std::sync::Arc;

use busroute_lib::model::{BusId, RouteId};
use busroute_lib::{
    BusRecord, ConversationEngine, ConversationState, Error, LiveLocation, ResponseKind,
    Result, RouteRecord, StopRecord, TransitStore,
};

use common::{fixture_engine, FlakyStore};

fn route_numbers(payload: &busroute_lib::ResponsePayload) -> Vec<String> {
    payload
        .routes
        .as_ref()
        .map(|routes| routes.iter().map(|r| r.route_number.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn greeting_reports_network_counts() {
    let engine = fixture_engine();
    let reply = engine.process_message("u1", "Hi");

    assert_eq!(reply.kind, ResponseKind::Greeting);
    let stats = reply.stats.expect("stats");
    assert_eq!(stats["routes"], 6);
    assert_eq!(stats["buses"], 3);
    assert_eq!(stats["active"], 1);
    assert!(reply.suggestions.iter().any(|s| s == "Route 001"));
}

#[test]
fn guided_flow_collects_source_then_destination() {
    let engine = fixture_engine();

    let reply = engine.process_message("rider", "find route");
    assert!(reply.message.contains("Where are you starting from?"));
    assert_eq!(
        engine.session("rider").unwrap().conversation.state,
        ConversationState::AwaitingSource
    );

    let reply = engine.process_message("rider", "Connaught Place");
    assert!(reply.message.starts_with("Starting from: Connaught Place"));
    let session = engine.session("rider").unwrap();
    assert_eq!(session.conversation.state, ConversationState::AwaitingDestination);
    assert_eq!(session.conversation.source.as_deref(), Some("Connaught Place"));

    let reply = engine.process_message("rider", "Dwarka Sector 21");
    assert_eq!(reply.kind, ResponseKind::RouteList);
    assert_eq!(route_numbers(&reply), ["118"]);

    let session = engine.session("rider").unwrap();
    assert_eq!(session.conversation.state, ConversationState::Initial);
    let cached = session.last_search.expect("cached search");
    assert_eq!(cached.routes.len(), 1);
    assert_eq!(cached.destination, "Dwarka Sector 21");

    let reply = engine.process_message("rider", "cheapest route");
    assert!(reply
        .message
        .starts_with("CHEAPEST ROUTES: Connaught Place → Dwarka Sector 21"));
}

#[test]
fn fare_flow_ends_with_fare_summary() {
    let engine = fixture_engine();
    engine.process_message("rider", "check fare");
    engine.process_message("rider", "cp");
    assert_eq!(
        engine.session("rider").unwrap().conversation.state,
        ConversationState::AwaitingDestinationFare
    );

    let reply = engine.process_message("rider", "airport");
    assert!(reply.message.starts_with("FARE: Connaught Place → IGI Airport"));
    assert!(reply.message.contains("Fare Range: ₹25 - ₹50"));
    assert!(reply.message.contains("Student: ₹12 - ₹25"));
    assert_eq!(
        engine.session("rider").unwrap().conversation.state,
        ConversationState::Initial
    );
}

#[test]
fn search_then_refinements_reuse_cached_results() {
    let engine = fixture_engine();

    let reply = engine.process_message("rider", "route from cp to airport");
    assert_eq!(reply.kind, ResponseKind::RouteList);
    assert!(reply.message.starts_with("ROUTES: Connaught Place → IGI Airport"));
    assert_eq!(route_numbers(&reply), ["002", "001"]);

    let cheapest = engine.process_message("rider", "cheapest route");
    assert_eq!(route_numbers(&cheapest), ["002", "001"]);

    let fastest = engine.process_message("rider", "fastest");
    assert_eq!(route_numbers(&fastest), ["001", "002"]);
    assert!(fastest.message.contains("Duration: ~45 min"));

    let all = engine.process_message("rider", "all routes");
    assert_eq!(route_numbers(&all), ["002", "001"]);
}

#[test]
fn approximate_locations_are_echoed_back() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "route from rajendra plce to kirti");
    assert!(reply
        .message
        .starts_with("Showing results for: Rajendra Place → Kirti Nagar"));
    assert_eq!(route_numbers(&reply), ["025A"]);
}

#[test]
fn refinement_without_search_asks_for_one() {
    let engine = fixture_engine();
    let reply = engine.process_message("fresh", "cheapest route");
    assert_eq!(reply.kind, ResponseKind::Text);
    assert!(reply.message.starts_with("Please search for routes first."));
    assert!(reply.routes.is_none());

    let reply = engine.process_message("fresh", "all");
    assert!(reply.message.starts_with("No previous search results."));
}

#[test]
fn destination_only_search_lists_every_route_there() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "bus to dwarka");
    assert_eq!(reply.kind, ResponseKind::DestinationRoutes);
    assert_eq!(route_numbers(&reply), ["025A", "118"]);
}

#[test]
fn cheapest_query_uses_fare_graph() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "cheapest route from cp to airport");
    assert!(reply.message.starts_with("CHEAPEST ROUTE"));
    assert!(reply.message.contains("Bus: DTC-078"));
    assert!(reply.message.contains("Total Fare: ₹25.00"));
}

#[test]
fn fastest_query_follows_stops_on_distance_graph() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "fastest route from cp to airport");
    assert!(reply.message.starts_with("SHORTEST PATH"));
    assert!(reply.message.contains("Total Distance: 18.50 km"));
    assert!(reply
        .message
        .contains("Path: Connaught Place → Dhaula Kuan → Mahipalpur → IGI Airport"));
}

#[test]
fn unreachable_cheapest_query_returns_example() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "cheapest route from cp to noida");
    assert!(reply.message.starts_with("Find cheapest route"));
}

#[test]
fn cheapest_query_without_graph_path_falls_back_to_route_names() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "cheapest route from airport to cp");
    assert!(reply.message.starts_with("CHEAPEST ROUTE"));
    assert!(reply.message.contains("From: IGI Airport\nTo: Connaught Place"));
    assert!(reply.message.contains("Fare: ₹25.00"));
    assert!(!reply.message.contains("Total Fare"));
    assert_eq!(route_numbers(&reply), vec!["002"]);
}

#[test]
fn fastest_query_without_graph_path_falls_back_to_route_names() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "fastest route from airport to cp");
    assert!(reply.message.starts_with("FASTEST ROUTE"));
    assert!(reply.message.contains("Bus: DTC-001"));
    assert!(!reply.message.contains("Path:"));
    assert_eq!(route_numbers(&reply), vec!["001"]);
}

#[test]
fn ac_query_filters_on_bus_type() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "ac bus from cp to airport");
    assert_eq!(reply.kind, ResponseKind::RouteList);
    assert_eq!(route_numbers(&reply), ["001"]);

    let reply = engine.process_message("rider", "ac bus from cp to dwarka");
    assert!(reply.message.starts_with("No AC buses available"));
    assert!(reply.message.contains("1 other route(s)"));
}

#[test]
fn route_lookup_truncates_long_stop_lists() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "route 025a");
    assert_eq!(reply.kind, ResponseKind::RouteInfo);
    assert!(reply.message.contains("STOPS (7)"));
    assert!(reply.message.contains("... +2 more stops"));
    assert_eq!(reply.details.expect("details")["stops_count"], 7);

    let missing = engine.process_message("rider", "route 777");
    assert!(missing.message.starts_with("Route 777 not found"));
}

#[test]
fn bus_lookup_lists_assigned_routes() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "bus dtc-078");
    assert_eq!(reply.kind, ResponseKind::BusInfo);
    assert!(reply.message.contains("Type: Non-AC"));
    assert!(reply.suggestions.iter().any(|s| s == "Route 002"));
    assert_eq!(reply.details.expect("details")["air_conditioned"], false);
}

#[test]
fn tracking_reports_live_location_when_known() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "track bus dtc-001");
    assert_eq!(reply.kind, ResponseKind::Tracking);
    assert!(reply.message.contains("Speed: 32.5 km/h"));
    assert!(reply.message.contains("Updated: 09:30 AM"));

    let reply = engine.process_message("rider", "track 078");
    assert_eq!(reply.kind, ResponseKind::Tracking);
    assert!(reply.message.contains("Live tracking unavailable"));

    let reply = engine.process_message("rider", "track");
    assert!(reply.message.contains("DTC-001, DTC-078, DTC-150"));
}

#[test]
fn statistics_count_fleet_and_bookings() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "stats");
    assert_eq!(reply.kind, ResponseKind::Statistics);
    let stats = reply.stats.expect("stats");
    assert_eq!(stats["total_buses"], 3);
    assert_eq!(stats["ac_buses"], 2);
    assert_eq!(stats["non_ac_buses"], 1);
    assert_eq!(stats["total_routes"], 6);
    assert_eq!(stats["total_bookings"], 20);
    assert_eq!(stats["active_buses"], 1);
}

#[test]
fn popular_routes_rank_by_bookings() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "popular routes");
    assert_eq!(reply.kind, ResponseKind::PopularRoutes);
    let numbers = route_numbers(&reply);
    assert_eq!(&numbers[..3], ["001", "002", "025A"]);
    assert!(reply.message.contains("12 bookings"));
}

#[test]
fn static_answers_have_their_own_kinds() {
    let engine = fixture_engine();
    assert_eq!(engine.process_message("u", "help").kind, ResponseKind::Help);
    assert_eq!(
        engine.process_message("u", "how to book").kind,
        ResponseKind::BookingHelp
    );
    assert_eq!(
        engine.process_message("u", "ticket types").kind,
        ResponseKind::TicketTypes
    );
    assert_eq!(
        engine.process_message("u", "contact support").kind,
        ResponseKind::ContactSupport
    );
    let unknown = engine.process_message("u", "qwerty");
    assert!(unknown.message.starts_with("I didn't quite understand that."));
}

#[test]
fn booking_uses_remembered_journey() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "book");
    assert_eq!(reply.kind, ResponseKind::Text);

    engine.process_message("rider", "route from cp to airport");
    let reply = engine.process_message("rider", "book");
    assert_eq!(reply.kind, ResponseKind::Booking);
    assert!(reply.message.contains("Fare: ₹25.00"));
}

#[test]
fn reset_keeps_cached_search() {
    let engine = fixture_engine();
    engine.process_message("rider", "route from cp to airport");
    engine.process_message("rider", "find route");

    engine.reset_conversation("rider");
    let session = engine.session("rider").unwrap();
    assert_eq!(session.conversation.state, ConversationState::Initial);
    assert!(session.last_search.is_some());

    engine.reset_conversation("nobody");
    assert!(engine.session("nobody").is_none());

    engine.process_message("rider", "new search");
    assert!(engine.session("rider").unwrap().conversation.source.is_none());
}

#[test]
fn payload_serializes_with_type_tag() {
    let engine = fixture_engine();
    let reply = engine.process_message("rider", "route from cp to airport");
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "route_list");
    assert_eq!(json["routes"][0]["route_number"], "002");
}

#[test]
fn users_do_not_share_sessions() {
    let engine = fixture_engine();
    std::thread::scope(|scope| {
        for user in ["a", "b", "c", "d"] {
            let engine = &engine;
            scope.spawn(move || {
                engine.process_message(user, "find route");
                engine.process_message(user, "cp");
                engine.process_message(user, "airport");
            });
        }
    });

    for user in ["a", "b", "c", "d"] {
        let session = engine.session(user).expect("session");
        assert_eq!(session.conversation.state, ConversationState::Initial);
        assert_eq!(session.last_search.expect("search").routes.len(), 2);
    }
}

struct OfflineStore;

impl TransitStore for OfflineStore {
    fn list_active_routes(&self) -> Result<Vec<RouteRecord>> {
        Err(Error::store("offline"))
    }
    fn list_stops_for_route(&self, _route_id: RouteId) -> Result<Vec<StopRecord>> {
        Err(Error::store("offline"))
    }
    fn get_bus(&self, _bus_id: BusId) -> Result<Option<BusRecord>> {
        Err(Error::store("offline"))
    }
    fn count_bookings_for_route(&self, _route_id: RouteId) -> Result<u64> {
        Err(Error::store("offline"))
    }
    fn find_route_by_number(&self, _number: &str) -> Result<Option<RouteRecord>> {
        Err(Error::store("offline"))
    }
    fn find_bus_by_number(&self, _number: &str) -> Result<Option<BusRecord>> {
        Err(Error::store("offline"))
    }
    fn list_buses(&self) -> Result<Vec<BusRecord>> {
        Err(Error::store("offline"))
    }
    fn count_bookings(&self) -> Result<u64> {
        Err(Error::store("offline"))
    }
    fn live_location(&self, _bus_id: BusId) -> Result<Option<LiveLocation>> {
        Err(Error::store("offline"))
    }
    fn count_live_locations(&self) -> Result<u64> {
        Err(Error::store("offline"))
    }
}

#[test]
fn store_failures_degrade_to_default_replies() {
    let store: Arc<dyn TransitStore> = Arc::new(OfflineStore);
    let engine = ConversationEngine::with_store(store);

    let reply = engine.process_message("rider", "route 001");
    assert!(reply.message.starts_with("I didn't quite understand that."));

    let reply = engine.process_message("rider", "hello");
    assert_eq!(reply.kind, ResponseKind::Greeting);
    assert!(reply.stats.is_none());

    assert!(engine.resolver().known_locations().is_empty());
}

#[test]
fn failed_search_drops_the_previous_cached_results() {
    let store = Arc::new(FlakyStore::new());
    let engine = ConversationEngine::with_store(store.clone());

    let reply = engine.process_message("rider", "route from cp to airport");
    assert_eq!(route_numbers(&reply), vec!["002", "001"]);

    store.set_offline(true);
    let reply = engine.process_message("rider", "route from hauz khas to saket");
    assert_eq!(reply.kind, ResponseKind::Text);
    assert!(engine
        .session("rider")
        .expect("session")
        .last_search
        .is_none());

    store.set_offline(false);
    let reply = engine.process_message("rider", "cheapest route");
    assert!(reply.message.starts_with("Please search for routes first."));
    assert!(reply.routes.is_none());
}

#[test]
fn failed_guided_search_drops_the_previous_cached_results() {
    let store = Arc::new(FlakyStore::new());
    let engine = ConversationEngine::with_store(store.clone());

    engine.process_message("rider", "route from cp to airport");
    engine.process_message("rider", "find route");
    engine.process_message("rider", "Connaught Place");

    store.set_offline(true);
    engine.process_message("rider", "Dwarka Sector 21");
    store.set_offline(false);

    let reply = engine.process_message("rider", "all routes");
    assert!(reply.message.starts_with("No previous search results."));
}

#[test]
fn recommendations_survive_failed_bus_lookups() {
    let store: Arc<dyn TransitStore> = Arc::new(FlakyStore::failing_bus_lookups());
    let engine = ConversationEngine::with_store(store);

    let reply = engine.process_message("rider", "route from cp to airport");
    assert_eq!(reply.kind, ResponseKind::RouteList);
    assert_eq!(route_numbers(&reply), vec!["002", "001"]);
    assert!(reply.message.contains("1. Bus 002 (Standard)"));

    let reply = engine.process_message("rider", "bus to dwarka");
    assert_eq!(reply.kind, ResponseKind::DestinationRoutes);
    assert_eq!(route_numbers(&reply), vec!["025A", "118"]);
}
