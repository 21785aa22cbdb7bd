use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use super::intent::Utterance;
use super::ConversationEngine;
use crate::error::Result;
use crate::location::{extract_locations, POPULAR_DESTINATIONS};
use crate::model::{BusRecord, RouteRecord};
use crate::path::PathResult;
use crate::response::{
    bus_label, bus_type_label, rupees, whole_rupees, ResponseKind, ResponsePayload, RouteSummary,
};
use crate::search::sort_by_fare;
use crate::session::{ConversationState, LastSearchResult, Session};

static ROUTE_ID_CAPTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)route\s+(?:id|number|no\.?)?\s*([A-Z0-9-]+)").expect("valid regex")
});
static BUS_ID_CAPTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bus\s+(?:id|number|no\.?)?\s*([A-Z0-9-]+)").expect("valid regex")
});
static TRACKING_CAPTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(DTC-\d{3}|[A-Z]+-\d{2,4}|\d{2,4})\b").expect("valid regex")
});

const FLOW_SUGGESTIONS: &[&str] = &[
    "Connaught Place",
    "IGI Airport",
    "Kashmere Gate",
    "Anand Vihar",
    "Dwarka",
    "Noida",
];
const ENTRY_SUGGESTIONS: &[&str] = &["Route 001", "Bus DTC-078", "Find Route", "Help"];
const SEARCH_HINT: &str = "Try: 'Find Route' or 'Route from [source] to [destination]'";
/// Sort key used when a route has no duration or distance.
const UNKNOWN_RANK: f64 = 999.0;
const TRACKING_EXAMPLES: usize = 5;

struct NetworkCounts {
    routes: usize,
    buses: usize,
    air_conditioned: usize,
    live: u64,
}

pub(super) fn default_response() -> ResponsePayload {
    ResponsePayload::text(
        "I didn't quite understand that. Try:\n\n\
         • 'Route 001' - Get route details\n\
         • 'Bus DTC-078' - Get bus information\n\
         • 'Help' - See all commands",
    )
    .with_suggestions(["Route 001", "Bus DTC-078", "Help"])
}

pub(super) fn help_response() -> ResponsePayload {
    ResponsePayload::new(
        ResponseKind::Help,
        "BUS ROUTE ASSISTANT\nCOMMAND REFERENCE\n\n\
         ROUTE SEARCH\n\
         • Route from [location] to [destination]\n\
         • Bus to [destination]\n\
         • Cheapest route from [location] to [destination]\n\
         • Fastest route from [location] to [destination]\n\n\
         DIRECT INFORMATION\n\
         • Route [number] - e.g., 'Route 001'\n\
         • Bus [number] - e.g., 'Bus DTC-078'\n\n\
         OTHER COMMANDS\n\
         • Track bus [number]\n\
         • Fare from [location] to [destination]\n\
         • Stats - System statistics\n\
         • Help - This message",
    )
    .with_suggestions(["Route 001", "Bus DTC-078", "Find Route", "Stats"])
}

pub(super) fn reset(session: &mut Session) -> ResponsePayload {
    session.conversation.restart(ConversationState::Initial);
    ResponsePayload::text("Starting fresh! How can I help you?")
        .with_suggestions(["Find Route", "Route 001", "Check Fare", "Track Bus"])
}

pub(super) fn booking_instructions() -> ResponsePayload {
    ResponsePayload::new(
        ResponseKind::BookingHelp,
        "HOW TO BOOK TICKETS\n\n\
         STEP 1: FIND YOUR ROUTE\n\
         • Search: 'Route from [source] to [destination]'\n\
         • Or use a route number: 'Route 001'\n\n\
         STEP 2: SELECT ROUTE\n\
         • Review fare and timing\n\
         • Choose 'Book Ticket'\n\n\
         STEP 3: PASSENGER DETAILS\n\
         • Select a passenger category\n\
         • Enter passenger information\n\n\
         STEP 4: PAYMENT\n\
         • Review booking details\n\
         • Complete payment and keep the QR ticket\n\n\
         PASSENGER CATEGORIES\n\
         • General: Full fare\n\
         • Student: 50% discount\n\
         • Senior Citizen: 50% discount\n\
         • Disabled: Free travel",
    )
    .with_suggestions(["Ticket Types", "General", "Student", "Senior Citizen"])
}

pub(super) fn ticket_types() -> ResponsePayload {
    ResponsePayload::new(
        ResponseKind::TicketTypes,
        "PASSENGER CATEGORIES & FARES\n\n\
         GENERAL\n\
         • Full fare, valid ID required\n\n\
         STUDENT\n\
         • 50% discount, student ID required\n\
         • Up to 25 years\n\n\
         SENIOR CITIZEN\n\
         • 50% discount, age proof required\n\
         • 60 years and above\n\n\
         DISABLED\n\
         • Free travel, disability certificate required\n\
         • Companion travels at 50% fare",
    )
    .with_details(json!({
        "categories": [
            { "name": "General", "discount_percent": 0 },
            { "name": "Student", "discount_percent": 50 },
            { "name": "Senior Citizen", "discount_percent": 50 },
            { "name": "Disabled", "discount_percent": 100 },
        ]
    }))
    .with_suggestions(["How to Book", "Check Fare", "Find Route"])
}

pub(super) fn contact_support() -> ResponsePayload {
    ResponsePayload::new(
        ResponseKind::ContactSupport,
        "SUPPORT\n\n\
         HELPLINE\n\
         • Phone: 1800-XXX-XXXX (toll-free, 24/7)\n\n\
         EMAIL\n\
         • General: support@example.com\n\
         • Bookings: bookings@example.com\n\n\
         EMERGENCY\n\
         • Accident/Emergency: 100",
    )
    .with_details(json!({
        "helpline": "1800-XXX-XXXX",
        "email": "support@example.com",
        "hours": "24/7",
        "emergency": "100",
    }))
    .with_suggestions(["How to Book", "Ticket Types", "Find Route", "Stats"])
}

pub(super) fn start_route_flow(session: &mut Session) -> ResponsePayload {
    session
        .conversation
        .restart(ConversationState::AwaitingSource);
    ResponsePayload::text(
        "Let's find your route!\n\nWhere are you starting from?\n\nPlease enter your starting location:",
    )
    .with_suggestions(FLOW_SUGGESTIONS.iter().copied())
}

pub(super) fn start_fare_flow(session: &mut Session) -> ResponsePayload {
    session
        .conversation
        .restart(ConversationState::AwaitingSourceFare);
    ResponsePayload::text(
        "I can help you check fares!\n\nWhere are you starting from?\n\nPlease enter your starting location:",
    )
    .with_suggestions(FLOW_SUGGESTIONS.iter().copied())
}

fn ask_destination(source: &str) -> ResponsePayload {
    ResponsePayload::text(format!(
        "Starting from: {source}\n\nWhere do you want to go?\n\nPlease enter your destination:"
    ))
    .with_suggestions(FLOW_SUGGESTIONS.iter().copied())
}

fn search_first() -> ResponsePayload {
    ResponsePayload::text(format!("Please search for routes first.\n\n{SEARCH_HINT}"))
        .with_suggestions(["Find Route", "Route 001", "Help"])
}

fn popular(count: usize) -> impl Iterator<Item = &'static str> {
    POPULAR_DESTINATIONS.iter().copied().take(count)
}

fn path_display(result: &PathResult, source: &str, destination: &str) -> String {
    if result.path.len() > 2 {
        result.path.join(" → ")
    } else {
        format!("{source} → {destination}")
    }
}

fn optional_km(distance: Option<f64>) -> String {
    distance.map_or_else(|| "N/A".to_string(), |km| format!("{km} km"))
}

fn optional_minutes(minutes: Option<u32>) -> String {
    minutes.map_or_else(|| "N/A".to_string(), |min| format!("{min} min"))
}

fn fastest_rank(route: &RouteRecord) -> (f64, f64) {
    (
        route
            .estimated_duration_minutes
            .map_or(UNKNOWN_RANK, f64::from),
        route.distance_km.unwrap_or(UNKNOWN_RANK),
    )
}

impl ConversationEngine {
    pub(super) fn greeting(&self, session: &mut Session) -> ResponsePayload {
        session.conversation.restart(ConversationState::Initial);

        match self.network_counts() {
            Ok(counts) => ResponsePayload::new(
                ResponseKind::Greeting,
                format!(
                    "Namaste! I'm your bus route assistant\n\n\
                     SYSTEM STATUS\n\
                     Active Routes: {}\n\
                     Fleet Size: {} buses\n\
                     Currently Operating: {} buses\n\n\
                     QUICK LOOKUPS\n\
                     • Route details: 'Route 001'\n\
                     • Bus details: 'Bus DTC-078'\n\n\
                     How may I assist you today?",
                    counts.routes, counts.buses, counts.live
                ),
            )
            .with_stats(json!({
                "routes": counts.routes,
                "buses": counts.buses,
                "active": counts.live,
            }))
            .with_suggestions(ENTRY_SUGGESTIONS.iter().copied()),
            Err(err) => {
                warn!(error = %err, "network counts unavailable for greeting");
                ResponsePayload::new(
                    ResponseKind::Greeting,
                    "Namaste! I'm your bus route assistant\n\nHow may I assist you?",
                )
                .with_suggestions(ENTRY_SUGGESTIONS.iter().copied())
            }
        }
    }

    fn network_counts(&self) -> Result<NetworkCounts> {
        let routes = self.store.list_active_routes()?.len();
        let buses: Vec<BusRecord> = self
            .store
            .list_buses()?
            .into_iter()
            .filter(|bus| bus.is_active)
            .collect();
        let air_conditioned = buses.iter().filter(|bus| bus.is_air_conditioned()).count();
        let live = self.store.count_live_locations()?;
        Ok(NetworkCounts {
            routes,
            buses: buses.len(),
            air_conditioned,
            live,
        })
    }

    pub(super) fn statistics(&self) -> Result<ResponsePayload> {
        let counts = self.network_counts()?;
        let bookings = self.store.count_bookings()?;
        Ok(ResponsePayload::new(
            ResponseKind::Statistics,
            format!(
                "NETWORK STATISTICS\n\nBuses: {}\nAC Buses: {}\nRoutes: {}\nBookings: {}\nLive Buses: {}",
                counts.buses, counts.air_conditioned, counts.routes, bookings, counts.live
            ),
        )
        .with_stats(json!({
            "total_buses": counts.buses,
            "active_buses": counts.live,
            "ac_buses": counts.air_conditioned,
            "non_ac_buses": counts.buses - counts.air_conditioned,
            "total_routes": counts.routes,
            "total_bookings": bookings,
        }))
        .with_suggestions(["Find Route", "Track Bus", "Route 001"]))
    }

    pub(super) fn popular_routes(&self) -> Result<ResponsePayload> {
        let mut ranked = Vec::new();
        for route in self.store.list_active_routes()? {
            let bookings = self.store.count_bookings_for_route(route.id)?;
            ranked.push((route, bookings));
        }
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.config.popular_route_limit);

        if ranked.is_empty() {
            return Ok(ResponsePayload::text("No popular routes data available yet.")
                .with_suggestions(["Find Route", "Route 001", "Stats"]));
        }

        let mut message = String::from("POPULAR ROUTES\nMost frequently used routes\n\n");
        let mut summaries = Vec::with_capacity(ranked.len());
        for (idx, (route, bookings)) in ranked.iter().enumerate() {
            let bus = self.search.bus_for(route)?;
            let _ = writeln!(
                message,
                "{}. {} → {}",
                idx + 1,
                route.start_location,
                route.end_location
            );
            let _ = write!(
                message,
                "   Bus {} | {}",
                bus_label(route, bus.as_ref()),
                rupees(route.fare)
            );
            if *bookings > 0 {
                let _ = write!(message, " | {bookings} bookings");
            }
            message.push_str("\n\n");
            summaries.push(RouteSummary::new(route, bus.as_ref()).with_bookings(*bookings));
        }

        Ok(ResponsePayload::new(ResponseKind::PopularRoutes, message)
            .with_routes(summaries)
            .with_suggestions(["Book Ticket", "Find Route", "Stats"]))
    }

    /// Run a two-location search and cache it as the session's last search.
    ///
    /// The previous cache is dropped first, so a failed search never leaves
    /// an older journey's routes behind for refinements.
    fn record_search(
        &self,
        session: &mut Session,
        query_source: &str,
        query_destination: &str,
        source: &str,
        destination: &str,
    ) -> Result<Vec<RouteRecord>> {
        session.last_search = None;
        let routes = self.search.find_routes(query_source, query_destination)?;
        session.last_search = Some(LastSearchResult {
            routes: routes.clone(),
            source: source.to_string(),
            destination: destination.to_string(),
        });
        Ok(routes)
    }

    pub(super) fn continue_flow(
        &self,
        utterance: &Utterance,
        session: &mut Session,
    ) -> Result<ResponsePayload> {
        let answer = utterance.original();
        let conversation = &mut session.conversation;

        match conversation.state {
            ConversationState::AwaitingSource => {
                let source = self.resolver.find_best_location_match(answer).name;
                conversation.source = Some(source.clone());
                conversation.state = ConversationState::AwaitingDestination;
                Ok(ask_destination(&source))
            }
            ConversationState::AwaitingSourceFare => {
                let source = self.resolver.find_best_location_match(answer).name;
                conversation.source = Some(source.clone());
                conversation.state = ConversationState::AwaitingDestinationFare;
                Ok(ask_destination(&source))
            }
            ConversationState::AwaitingDestination => {
                let destination = self.resolver.find_best_location_match(answer).name;
                let source = conversation.source.clone().unwrap_or_default();
                conversation.destination = Some(destination.clone());
                conversation.state = ConversationState::Initial;

                let routes =
                    self.record_search(session, &source, &destination, &source, &destination)?;

                if routes.is_empty() {
                    return Ok(ResponsePayload::text(format!(
                        "No routes found\n\nFrom: {source}\nTo: {destination}\n\n\
                         Try different locations or check popular routes."
                    ))
                    .with_suggestions(["Popular Routes", "New Search", "Help"]));
                }
                self.search
                    .generate_recommendations(&routes, &source, &destination)
            }
            ConversationState::AwaitingDestinationFare => {
                let destination = self.resolver.find_best_location_match(answer).name;
                let source = conversation.source.clone().unwrap_or_default();
                conversation.destination = Some(destination.clone());
                conversation.state = ConversationState::Initial;
                self.fare_between(&source, &destination)
            }
            ConversationState::Initial => Ok(default_response()),
        }
    }

    pub(super) fn refine_cheapest(&self, session: &Session) -> Result<ResponsePayload> {
        let Some(cached) = session.cached_search() else {
            return Ok(search_first());
        };

        let mut routes = cached.routes.clone();
        sort_by_fare(&mut routes);
        routes.truncate(self.config.max_refinements);

        let mut message = format!(
            "CHEAPEST ROUTES: {} → {}\n\n",
            cached.source, cached.destination
        );
        let mut summaries = Vec::with_capacity(routes.len());
        for (idx, route) in routes.iter().enumerate() {
            let bus = self.search.bus_for(route)?;
            let _ = writeln!(
                message,
                "{}. Bus {} ({})",
                idx + 1,
                bus_label(route, bus.as_ref()),
                bus_type_label(bus.as_ref())
            );
            let _ = write!(message, "   Fare: {}", rupees(route.fare));
            if let Some(distance) = route.distance_km {
                let _ = write!(message, " | {distance} km");
            }
            if let Some(minutes) = route.estimated_duration_minutes {
                let _ = write!(message, " | ~{minutes} min");
            }
            message.push_str("\n\n");
            summaries.push(RouteSummary::new(route, bus.as_ref()));
        }

        Ok(ResponsePayload::new(ResponseKind::RouteList, message)
            .with_routes(summaries)
            .with_suggestions(["Book Ticket", "Fastest Route", "All Routes", "New Search"]))
    }

    pub(super) fn refine_fastest(&self, session: &Session) -> Result<ResponsePayload> {
        let Some(cached) = session.cached_search() else {
            return Ok(search_first());
        };

        let mut routes = cached.routes.clone();
        routes.sort_by(|a, b| {
            let (a_time, a_km) = fastest_rank(a);
            let (b_time, b_km) = fastest_rank(b);
            a_time.total_cmp(&b_time).then(a_km.total_cmp(&b_km))
        });
        routes.truncate(self.config.max_refinements);

        let mut message = format!(
            "FASTEST ROUTES: {} → {}\n\n",
            cached.source, cached.destination
        );
        let mut summaries = Vec::with_capacity(routes.len());
        for (idx, route) in routes.iter().enumerate() {
            let bus = self.search.bus_for(route)?;
            let _ = writeln!(
                message,
                "{}. Bus {} ({})",
                idx + 1,
                bus_label(route, bus.as_ref()),
                bus_type_label(bus.as_ref())
            );
            match (route.estimated_duration_minutes, route.distance_km) {
                (Some(minutes), _) => {
                    let _ = write!(message, "   Duration: ~{minutes} min | ");
                }
                (None, Some(distance)) => {
                    let _ = write!(message, "   Distance: {distance} km | ");
                }
                (None, None) => message.push_str("   "),
            }
            let _ = write!(message, "Fare: {}\n\n", rupees(route.fare));
            summaries.push(RouteSummary::new(route, bus.as_ref()));
        }

        Ok(ResponsePayload::new(ResponseKind::RouteList, message)
            .with_routes(summaries)
            .with_suggestions(["Book Ticket", "Cheapest Route", "All Routes", "New Search"]))
    }

    pub(super) fn refine_all(&self, session: &Session) -> Result<ResponsePayload> {
        match session.cached_search() {
            Some(cached) => self.search.generate_recommendations(
                &cached.routes,
                &cached.source,
                &cached.destination,
            ),
            None => Ok(ResponsePayload::text(format!(
                "No previous search results.\n\n{SEARCH_HINT}"
            ))
            .with_suggestions(["Find Route", "Route 001", "Help"])),
        }
    }

    pub(super) fn route_by_id(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let Some(number) = ROUTE_ID_CAPTURE
            .captures(utterance.lower())
            .map(|caps| caps[1].to_uppercase())
        else {
            return Ok(default_response());
        };

        let Some(route) = self.store.find_route_by_number(&number)? else {
            return Ok(ResponsePayload::text(format!(
                "Route {number} not found\n\nTry: 'Route 001' or 'Route 025A'"
            ))
            .with_suggestions(["Find Route", "Help"]));
        };
        debug!(query = %number, route = %route.route_number, "route lookup");

        let bus = self.search.bus_for(&route)?;
        let stops = self.store.list_stops_for_route(route.id)?;

        let mut message = format!(
            "ROUTE INFORMATION\n\nRoute: {}\nName: {}\n\nJOURNEY\nFrom: {}\nTo: {}\n\n",
            route.route_number, route.route_name, route.start_location, route.end_location
        );
        if let Some(bus) = &bus {
            let _ = write!(
                message,
                "ASSIGNED BUS\nBus: {}\nType: {}\nCapacity: {} seats\nStatus: {}\n\n",
                bus.bus_number,
                bus.bus_type,
                bus.capacity,
                if bus.is_active { "Active" } else { "Inactive" }
            );
        }
        let _ = writeln!(message, "Fare: {}", rupees(route.fare));
        if let Some(distance) = route.distance_km {
            let _ = writeln!(message, "Distance: {distance} km");
        }
        if let Some(minutes) = route.estimated_duration_minutes {
            let _ = writeln!(message, "Duration: ~{minutes} min");
        }
        if !stops.is_empty() {
            let limit = self.config.stop_display_limit;
            let _ = writeln!(message, "\nSTOPS ({})", stops.len());
            for (idx, stop) in stops.iter().take(limit).enumerate() {
                let _ = writeln!(message, "{}. {}", idx + 1, stop.stop_name);
            }
            if stops.len() > limit {
                let _ = writeln!(message, "... +{} more stops", stops.len() - limit);
            }
        }

        Ok(ResponsePayload::new(ResponseKind::RouteInfo, message)
            .with_routes(vec![RouteSummary::new(&route, bus.as_ref())])
            .with_details(json!({
                "route_number": route.route_number,
                "route_name": route.route_name,
                "start": route.start_location,
                "end": route.end_location,
                "fare": route.fare,
                "stops_count": stops.len(),
            }))
            .with_suggestions(["Book Ticket", "Track Bus", "New Search"]))
    }

    pub(super) fn bus_by_id(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let Some(number) = BUS_ID_CAPTURE
            .captures(utterance.lower())
            .map(|caps| caps[1].to_uppercase())
        else {
            return Ok(default_response());
        };

        let Some(bus) = self.store.find_bus_by_number(&number)? else {
            return Ok(ResponsePayload::text(format!(
                "Bus {number} not found\n\nTry: 'Bus DTC-001' or 'Bus 078'"
            ))
            .with_suggestions(["Find Route", "Help"]));
        };

        let assigned: Vec<RouteRecord> = self
            .store
            .list_active_routes()?
            .into_iter()
            .filter(|route| route.bus_id == Some(bus.id))
            .collect();
        let live = self.store.live_location(bus.id)?;

        let mut message = format!(
            "BUS INFORMATION\n\nBus: {}\nRegistration: {}\nType: {}\nCapacity: {} seats\nStatus: {}\n\n",
            bus.bus_number,
            bus.registration_number,
            bus.bus_type,
            bus.capacity,
            if bus.is_active { "Active" } else { "Inactive" }
        );
        if let Some(live) = &live {
            let _ = write!(
                message,
                "LIVE LOCATION\nSpeed: {} km/h\nUpdated: {}\n\n",
                live.speed_kmh.unwrap_or(0.0),
                live.last_updated.format("%I:%M %p")
            );
        }
        if assigned.is_empty() {
            message.push_str("ASSIGNED ROUTES: None\n");
        } else {
            let _ = write!(message, "ASSIGNED ROUTES ({})\n\n", assigned.len());
            for (idx, route) in assigned.iter().enumerate() {
                let _ = write!(
                    message,
                    "{}. Route {}\n   {} → {}\n   Fare: {}\n\n",
                    idx + 1,
                    route.route_number,
                    route.start_location,
                    route.end_location,
                    rupees(route.fare)
                );
            }
        }

        let suggestions: Vec<String> = if assigned.is_empty() {
            vec!["Find Route".into(), "New Search".into()]
        } else {
            assigned
                .iter()
                .take(3)
                .map(|route| format!("Route {}", route.route_number))
                .chain(["Track Bus".to_string(), "New Search".to_string()])
                .collect()
        };

        Ok(ResponsePayload::new(ResponseKind::BusInfo, message)
            .with_routes(
                assigned
                    .iter()
                    .map(|route| RouteSummary::new(route, Some(&bus)))
                    .collect(),
            )
            .with_details(json!({
                "bus_number": bus.bus_number,
                "bus_type": bus.bus_type,
                "capacity": bus.capacity,
                "is_active": bus.is_active,
                "air_conditioned": bus.is_air_conditioned(),
            }))
            .with_suggestions(suggestions))
    }

    pub(super) fn tracking(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let Some(number) = TRACKING_CAPTURE
            .captures(utterance.lower())
            .map(|caps| caps[1].to_uppercase())
        else {
            let examples: Vec<String> = self
                .store
                .list_buses()?
                .into_iter()
                .filter(|bus| bus.is_active)
                .take(TRACKING_EXAMPLES)
                .map(|bus| bus.bus_number)
                .collect();
            let suggestion = examples
                .first()
                .map_or_else(|| "Find Route".to_string(), |first| format!("Track {first}"));
            return Ok(ResponsePayload::text(format!(
                "Track a bus\n\nExample buses: {}\n\nSay: 'Track bus [number]'",
                examples.join(", ")
            ))
            .with_suggestions([suggestion]));
        };

        let Some(bus) = self.store.find_bus_by_number(&number)? else {
            return Ok(ResponsePayload::text(format!("Bus {number} not found"))
                .with_suggestions(["Try Again", "Find Route"]));
        };

        match self.store.live_location(bus.id)? {
            Some(live) => Ok(ResponsePayload::new(
                ResponseKind::Tracking,
                format!(
                    "Bus {}\n\nType: {}\nCapacity: {} seats\nSpeed: {} km/h\nUpdated: {}",
                    bus.bus_number,
                    bus.bus_type,
                    bus.capacity,
                    live.speed_kmh.unwrap_or(0.0),
                    live.last_updated.format("%I:%M %p")
                ),
            )
            .with_details(json!({
                "bus_number": bus.bus_number,
                "latitude": live.latitude,
                "longitude": live.longitude,
                "speed_kmh": live.speed_kmh,
                "last_updated": live.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
            }))
            .with_suggestions(["Track Another", "Find Route"])),
            None => Ok(ResponsePayload::new(
                ResponseKind::Tracking,
                format!("Bus {}\n\nLive tracking unavailable", bus.bus_number),
            )
            .with_suggestions(["Find Route"])),
        }
    }

    pub(super) fn cheapest_query(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let locations = extract_locations(utterance.original());
        if let [source, destination, ..] = locations.as_slice() {
            let source_match = self.resolver.find_best_location_match(source).name;
            let destination_match = self.resolver.find_best_location_match(destination).name;

            if let Some(result) = self
                .paths
                .cheapest_by_fare(&source_match, &destination_match)?
            {
                if let Some(route) = &result.route {
                    let bus = self.search.bus_for(route)?;
                    return Ok(ResponsePayload::text(format!(
                        "CHEAPEST ROUTE\n\nFrom: {source_match}\nTo: {destination_match}\n\n\
                         Bus: {}\nType: {}\nTotal Fare: {}\nDistance: {}\nPath: {}",
                        bus_label(route, bus.as_ref()),
                        bus_type_label(bus.as_ref()),
                        rupees(result.total_weight),
                        optional_km(route.distance_km),
                        path_display(&result, &source_match, &destination_match)
                    ))
                    .with_routes(vec![RouteSummary::new(route, bus.as_ref())])
                    .with_suggestions(["Book Ticket", "Fastest Route", "New Search"]));
                }
            }

            let routes = self.search.find_routes(source, destination)?;
            if let Some(cheapest) = routes.iter().min_by(|a, b| a.fare.total_cmp(&b.fare)) {
                let bus = self.search.bus_for(cheapest)?;
                return Ok(ResponsePayload::text(format!(
                    "CHEAPEST ROUTE\n\nFrom: {source_match}\nTo: {destination_match}\n\n\
                     Bus: {}\nType: {}\nFare: {}\nDistance: {}",
                    bus_label(cheapest, bus.as_ref()),
                    bus_type_label(bus.as_ref()),
                    rupees(cheapest.fare),
                    optional_km(cheapest.distance_km)
                ))
                .with_routes(vec![RouteSummary::new(cheapest, bus.as_ref())])
                .with_suggestions(["Book Ticket", "View All Routes", "New Search"]));
            }
        }

        Ok(
            ResponsePayload::text("Find cheapest route\n\nExample: 'Cheapest route from CP to Dwarka'")
                .with_suggestions(["Find Route"]),
        )
    }

    pub(super) fn fastest_query(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let locations = extract_locations(utterance.original());
        if let [source, destination, ..] = locations.as_slice() {
            let source_match = self.resolver.find_best_location_match(source).name;
            let destination_match = self.resolver.find_best_location_match(destination).name;

            if let Some(result) = self
                .paths
                .shortest_by_distance(&source_match, &destination_match)?
            {
                if let Some(route) = &result.route {
                    let bus = self.search.bus_for(route)?;
                    return Ok(ResponsePayload::text(format!(
                        "SHORTEST PATH\n\nFrom: {source_match}\nTo: {destination_match}\n\n\
                         Bus: {}\nType: {}\nTotal Distance: {:.2} km\nFare: {}\nDuration: {}\nPath: {}",
                        bus_label(route, bus.as_ref()),
                        bus_type_label(bus.as_ref()),
                        result.total_weight,
                        rupees(route.fare),
                        optional_minutes(route.estimated_duration_minutes),
                        path_display(&result, &source_match, &destination_match)
                    ))
                    .with_routes(vec![RouteSummary::new(route, bus.as_ref())])
                    .with_suggestions(["Book Ticket", "Cheapest Route", "New Search"]));
                }
            }

            let routes = self.search.find_routes(source, destination)?;
            let fastest = routes.iter().min_by(|a, b| {
                let rank = |route: &RouteRecord| {
                    route
                        .estimated_duration_minutes
                        .map(f64::from)
                        .or(route.distance_km)
                        .unwrap_or(UNKNOWN_RANK)
                };
                rank(a).total_cmp(&rank(b))
            });
            if let Some(fastest) = fastest {
                let bus = self.search.bus_for(fastest)?;
                return Ok(ResponsePayload::text(format!(
                    "FASTEST ROUTE\n\nFrom: {source_match}\nTo: {destination_match}\n\n\
                     Bus: {}\nType: {}\nDuration: {}\nDistance: {}\nFare: {}",
                    bus_label(fastest, bus.as_ref()),
                    bus_type_label(bus.as_ref()),
                    optional_minutes(fastest.estimated_duration_minutes),
                    optional_km(fastest.distance_km),
                    rupees(fastest.fare)
                ))
                .with_routes(vec![RouteSummary::new(fastest, bus.as_ref())])
                .with_suggestions(["Book Ticket", "View All Routes", "New Search"]));
            }
        }

        Ok(
            ResponsePayload::text("Find fastest route\n\nExample: 'Fastest route from CP to Dwarka'")
                .with_suggestions(["Find Route"]),
        )
    }

    pub(super) fn ac_bus_query(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let locations = extract_locations(utterance.original());
        if let [source, destination, ..] = locations.as_slice() {
            let source_match = self.resolver.find_best_location_match(source).name;
            let destination_match = self.resolver.find_best_location_match(destination).name;

            let routes = self.search.find_routes(source, destination)?;
            if !routes.is_empty() {
                let mut air_conditioned = Vec::new();
                for route in &routes {
                    if self
                        .search
                        .bus_for(route)?
                        .is_some_and(|bus| bus.is_air_conditioned())
                    {
                        air_conditioned.push(route.clone());
                    }
                }

                if !air_conditioned.is_empty() {
                    return self.search.generate_recommendations(
                        &air_conditioned,
                        &source_match,
                        &destination_match,
                    );
                }
                return Ok(ResponsePayload::text(format!(
                    "No AC buses available\n\nFrom: {source_match}\nTo: {destination_match}\n\n\
                     {} other route(s) serve this journey.",
                    routes.len()
                ))
                .with_suggestions(["View All Routes", "New Search"]));
            }
        }

        Ok(
            ResponsePayload::text("Find AC bus routes\n\nExample: 'AC bus from CP to Dwarka'")
                .with_suggestions(["Find Route"]),
        )
    }

    pub(super) fn fare_inquiry(&self, utterance: &Utterance) -> Result<ResponsePayload> {
        let locations = extract_locations(utterance.original());
        match locations.as_slice() {
            [source, destination, ..] => self.fare_between(source, destination),
            [destination] => {
                let destination = self.resolver.find_best_location_match(destination).name;
                Ok(ResponsePayload::text(format!(
                    "To check fare to {destination}\n\nWhere are you starting from?"
                ))
                .with_suggestions(popular(4)))
            }
            [] => Ok(ResponsePayload::text(
                "Check fare between locations\n\nExample:\n\
                 • 'Fare from CP to Dwarka'\n\
                 • 'How much from CP to Airport'",
            )
            .with_suggestions(["Find Route", "Help"])),
        }
    }

    /// Fare summary with per-category prices for a journey.
    pub(super) fn fare_between(&self, source: &str, destination: &str) -> Result<ResponsePayload> {
        let source_match = self.resolver.find_best_location_match(source).name;
        let destination_match = self.resolver.find_best_location_match(destination).name;

        let routes = self.search.find_routes(source, destination)?;
        let (Some(cheapest), Some(dearest)) = (
            routes.iter().min_by(|a, b| a.fare.total_cmp(&b.fare)),
            routes.iter().max_by(|a, b| a.fare.total_cmp(&b.fare)),
        ) else {
            return Ok(ResponsePayload::text(format!(
                "No routes found\n\nFrom: {source_match}\nTo: {destination_match}"
            ))
            .with_suggestions(popular(4)));
        };

        let low = cheapest.fare;
        let high = dearest.fare;
        let mut message = format!("FARE: {source_match} → {destination_match}\n\n");
        if low == high {
            let _ = writeln!(message, "Route: {}", cheapest.route_number);
            if let Some(distance) = cheapest.distance_km {
                let _ = write!(message, "Distance: {distance} km\n\n");
            }
            let _ = write!(
                message,
                "• General: {}\n• Student: {}\n• Senior: {}\n• Disabled: Free",
                whole_rupees(low),
                whole_rupees(low * 0.5),
                whole_rupees(low * 0.5)
            );
        } else {
            let _ = write!(
                message,
                "Fare Range: {} - {}\nRoutes available: {}\n\n",
                whole_rupees(low),
                whole_rupees(high),
                routes.len()
            );
            let _ = write!(
                message,
                "• General: {} - {}\n• Student: {} - {}\n• Senior: {} - {}\n• Disabled: Free",
                whole_rupees(low),
                whole_rupees(high),
                whole_rupees(low * 0.5),
                whole_rupees(high * 0.5),
                whole_rupees(low * 0.5),
                whole_rupees(high * 0.5)
            );
        }

        Ok(ResponsePayload::text(message)
            .with_details(json!({
                "source": source_match,
                "destination": destination_match,
                "min_fare": low,
                "max_fare": high,
                "routes": routes.len(),
            }))
            .with_suggestions(["Book Ticket", "View Routes", "New Search"]))
    }

    pub(super) fn route_query(
        &self,
        utterance: &Utterance,
        session: &mut Session,
    ) -> Result<ResponsePayload> {
        let locations = extract_locations(utterance.original());
        match locations.as_slice() {
            [destination] => {
                let destination = self.resolver.find_best_location_match(destination).name;
                let routes = self.search.find_all_routes_to_destination(&destination)?;
                if routes.is_empty() {
                    return Ok(ResponsePayload::text(format!(
                        "No routes found to {destination}\n\nTry these popular destinations:"
                    ))
                    .with_suggestions(popular(6)));
                }
                self.search
                    .generate_destination_recommendations(&routes, &destination)
            }
            [source, destination, ..] => {
                let source_match = self.resolver.find_best_location_match(source);
                let destination_match = self.resolver.find_best_location_match(destination);
                session.conversation.source = Some(source_match.name.clone());
                session.conversation.destination = Some(destination_match.name.clone());

                let routes = self.record_search(
                    session,
                    source,
                    destination,
                    &source_match.name,
                    &destination_match.name,
                )?;

                if routes.is_empty() {
                    return Ok(ResponsePayload::text(format!(
                        "No routes found\n\nFrom: {}\nTo: {}\n\nTry these popular destinations:",
                        source_match.name, destination_match.name
                    ))
                    .with_suggestions(popular(6)));
                }

                let payload = self.search.generate_recommendations(
                    &routes,
                    &source_match.name,
                    &destination_match.name,
                )?;
                if source_match.is_exact() && destination_match.is_exact() {
                    Ok(payload)
                } else {
                    Ok(payload.prepend_message(&format!(
                        "Showing results for: {} → {}\n\n",
                        source_match.name, destination_match.name
                    )))
                }
            }
            [] => {
                session.conversation.state = ConversationState::AwaitingSource;
                Ok(
                    ResponsePayload::text("Let's find your route!\n\nWhere are you starting from?")
                        .with_suggestions(popular(4)),
                )
            }
        }
    }

    pub(super) fn booking_intent(&self, session: &Session) -> Result<ResponsePayload> {
        let conversation = &session.conversation;
        if let (Some(source), Some(destination)) = (&conversation.source, &conversation.destination)
        {
            let routes = self.search.find_routes(source, destination)?;
            if let Some(cheapest) = routes.iter().min_by(|a, b| a.fare.total_cmp(&b.fare)) {
                return Ok(ResponsePayload::new(
                    ResponseKind::Booking,
                    format!(
                        "BOOKING\n\nFrom: {source}\nTo: {destination}\nFare: {}\n\nSelect category:",
                        rupees(cheapest.fare)
                    ),
                )
                .with_routes(vec![RouteSummary::new(cheapest, None)])
                .with_suggestions(["General", "Student", "Senior", "Disabled"]));
            }
        }

        Ok(ResponsePayload::text("To book, tell me your journey details first")
            .with_suggestions(["Find Route"]))
    }
}
