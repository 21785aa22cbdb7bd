//! Ordered intent rules.
//!
//! The rule order is behaviour: several rules exist only to claim a message
//! before a broader rule further down would (ticket types before the generic
//! "to"/"from" route search, for example). [`classify_intent`] returns the
//! first rule whose predicate accepts the message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::ConversationState;

static ROUTE_ID_GUARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\broute\s+(?:id|number|no\.?)?\s*[A-Z0-9-]+\b").expect("valid regex")
});
static BUS_ID_GUARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbus\s+(?:id|number|no\.?)?\s*[A-Z0-9-]+\b").expect("valid regex")
});

const GREETING_WORDS: &[&str] = &["hi", "hey", "start"];
const GREETING_PHRASES: &[&str] = &["hello", "namaste"];
const ROUTE_FLOW_COMMANDS: &[&str] =
    &["find route", "find a route", "search route", "plan journey"];
const FARE_FLOW_COMMANDS: &[&str] = &["check fare", "fare", "check price"];
const REFINE_CHEAPEST: &[&str] = &["cheapest route", "cheapest", "lowest fare", "cheap"];
const REFINE_FASTEST: &[&str] = &["fastest route", "fastest", "quickest", "shortest time", "quick"];
const REFINE_ALL: &[&str] = &["all routes", "show all", "all"];

/// What a rider message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Help,
    Reset,
    PopularRoutes,
    BookingInstructions,
    TicketTypes,
    ContactSupport,
    StartRouteFlow,
    StartFareFlow,
    /// The message answers the pending source/destination question.
    ContinueFlow,
    RefineCheapest,
    RefineFastest,
    RefineAll,
    BusStatistics,
    RouteById,
    BusById,
    Statistics,
    Tracking,
    CheapestQuery,
    FastestQuery,
    AcBusQuery,
    FareInquiry,
    RouteSearch,
    Booking,
    Unknown,
}

/// A rider message prepared for keyword tests.
#[derive(Debug, Clone)]
pub struct Utterance {
    original: String,
    lower: String,
    words: Vec<String>,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        let original = text.trim().to_string();
        let lower = original.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            original,
            lower,
            words,
        }
    }

    /// Trimmed text as typed.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Trimmed, lowercased text.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|candidate| candidate == word)
    }

    fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|word| self.has_word(word))
    }

    fn contains(&self, phrase: &str) -> bool {
        self.lower.contains(phrase)
    }

    fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.contains(phrase))
    }

    fn is_one_of(&self, commands: &[&str]) -> bool {
        commands.contains(&self.lower.as_str())
    }

    fn mentions_direction(&self) -> bool {
        self.has_any_word(&["from", "to"])
    }
}

type Predicate = fn(&Utterance, ConversationState) -> bool;

/// Intent rules in precedence order.
pub const RULES: &[(Intent, Predicate)] = &[
    (Intent::Greeting, |m, _| {
        m.has_any_word(GREETING_WORDS) || m.contains_any(GREETING_PHRASES)
    }),
    (Intent::Help, |m, _| m.contains("help")),
    (Intent::Reset, |m, _| m.contains_any(&["new search", "reset"])),
    (Intent::PopularRoutes, |m, _| m.contains("popular")),
    (Intent::BookingInstructions, |m, _| {
        m.contains_any(&["how to book", "booking process"])
    }),
    (Intent::TicketTypes, |m, _| {
        m.contains_any(&["ticket types", "ticket categories", "passenger categories"])
    }),
    (Intent::ContactSupport, |m, _| {
        m.contains_any(&["contact support", "support", "contact"])
    }),
    (Intent::StartRouteFlow, |m, _| m.is_one_of(ROUTE_FLOW_COMMANDS)),
    (Intent::StartFareFlow, |m, _| m.is_one_of(FARE_FLOW_COMMANDS)),
    (Intent::ContinueFlow, |_, state| state.is_mid_flow()),
    (Intent::RefineCheapest, |m, _| m.is_one_of(REFINE_CHEAPEST)),
    (Intent::RefineFastest, |m, _| m.is_one_of(REFINE_FASTEST)),
    (Intent::RefineAll, |m, _| m.is_one_of(REFINE_ALL)),
    (Intent::BusStatistics, |m, _| m.contains("bus statistics")),
    (Intent::RouteById, |m, _| {
        ROUTE_ID_GUARD.is_match(&m.lower) && !m.mentions_direction()
    }),
    (Intent::BusById, |m, _| {
        BUS_ID_GUARD.is_match(&m.lower) && !m.mentions_direction() && !m.contains("ac")
    }),
    (Intent::Statistics, |m, _| {
        m.contains_any(&["stats", "statistics", "count"])
    }),
    (Intent::Tracking, |m, _| m.contains("track")),
    (Intent::CheapestQuery, |m, _| {
        m.contains_any(&["cheapest", "cheap", "lowest fare"]) && m.mentions_direction()
    }),
    (Intent::FastestQuery, |m, _| {
        m.contains_any(&["fastest", "quick", "shortest"]) && m.mentions_direction()
    }),
    (Intent::AcBusQuery, |m, _| {
        m.contains_any(&["ac bus", "air conditioned"]) && m.has_word("to")
    }),
    (Intent::FareInquiry, |m, _| {
        m.contains_any(&["fare", "price", "cost", "how much"]) && m.mentions_direction()
    }),
    (Intent::RouteSearch, |m, _| {
        m.mentions_direction() || m.contains_any(&["go to", "reach", "going", "travel"])
    }),
    (Intent::Booking, |m, _| m.contains_any(&["book", "ticket"])),
];

/// First matching rule for `utterance`, or [`Intent::Unknown`].
pub fn classify(utterance: &Utterance, state: ConversationState) -> Intent {
    RULES
        .iter()
        .find(|(_, predicate)| predicate(utterance, state))
        .map_or(Intent::Unknown, |(intent, _)| *intent)
}

/// Classify raw rider text.
pub fn classify_intent(text: &str, state: ConversationState) -> Intent {
    classify(&Utterance::new(text), state)
}
