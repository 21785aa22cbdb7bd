//! Structured replies returned to the conversational surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{BusRecord, RouteRecord};

/// Category of a reply; clients use it to pick a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Greeting,
    Help,
    Text,
    RouteList,
    RouteInfo,
    BusInfo,
    Statistics,
    Booking,
    Tracking,
    PopularRoutes,
    DestinationRoutes,
    TicketTypes,
    BookingHelp,
    ContactSupport,
}

/// Compact, display-oriented view of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub route_number: String,
    pub start_location: String,
    pub end_location: String,
    pub fare: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub bus_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookings: Option<u64>,
}

impl RouteSummary {
    pub fn new(route: &RouteRecord, bus: Option<&BusRecord>) -> Self {
        Self {
            route_number: route.route_number.clone(),
            start_location: route.start_location.clone(),
            end_location: route.end_location.clone(),
            fare: route.fare,
            distance_km: route.distance_km,
            duration_minutes: route.estimated_duration_minutes,
            bus_type: bus_type_label(bus).to_string(),
            bookings: None,
        }
    }

    pub fn with_bookings(mut self, bookings: u64) -> Self {
        self.bookings = Some(bookings);
        self
    }
}

/// Reply to a single rider message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ResponsePayload {
    pub fn new(kind: ResponseKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            suggestions: Vec::new(),
            routes: None,
            stats: None,
            details: None,
        }
    }

    /// Plain text reply.
    pub fn text(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::Text, message)
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_routes(mut self, routes: Vec<RouteSummary>) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn with_stats(mut self, stats: Value) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Prefix the message body, keeping everything else.
    pub fn prepend_message(mut self, prefix: &str) -> Self {
        self.message.insert_str(0, prefix);
        self
    }
}

/// Format a fare in rupees with paise.
pub fn rupees(amount: f64) -> String {
    format!("₹{amount:.2}")
}

/// Format a fare in whole rupees, truncating paise.
pub fn whole_rupees(amount: f64) -> String {
    format!("₹{}", amount.trunc() as i64)
}

/// Bus number shown for a route: the assigned bus, or the route number.
pub fn bus_label<'a>(route: &'a RouteRecord, bus: Option<&'a BusRecord>) -> &'a str {
    bus.map_or(route.route_number.as_str(), |bus| bus.bus_number.as_str())
}

pub fn bus_type_label(bus: Option<&BusRecord>) -> &str {
    bus.map_or("Standard", |bus| bus.bus_type.as_str())
}
