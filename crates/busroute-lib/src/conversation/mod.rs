//! Multi-turn conversational front for the route engine.
//!
//! [`ConversationEngine::process_message`] classifies a rider message with
//! the ordered rules in [`intent`], runs the matching handler against the
//! rider's [`Session`], and always answers with a [`ResponsePayload`]. Handler
//! failures are logged and replaced by the default reply.

mod handlers;
pub mod intent;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::location::LocationResolver;
use crate::path::PathFinder;
use crate::response::ResponsePayload;
use crate::search::RouteSearch;
use crate::session::{InMemorySessionStore, Session, SessionStore};
use crate::store::TransitStore;

pub use intent::{classify_intent, Intent, Utterance};

/// Stateful assistant that answers rider messages.
pub struct ConversationEngine {
    store: Arc<dyn TransitStore>,
    sessions: Arc<dyn SessionStore>,
    resolver: Arc<LocationResolver>,
    search: RouteSearch,
    paths: PathFinder,
    config: EngineConfig,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn TransitStore>,
        sessions: Arc<dyn SessionStore>,
        config: EngineConfig,
    ) -> Self {
        let resolver = Arc::new(LocationResolver::new(store.clone(), &config));
        let search = RouteSearch::new(store.clone(), resolver.clone(), config.clone());
        let paths = PathFinder::new(store.clone());
        Self {
            store,
            sessions,
            resolver,
            search,
            paths,
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Engine with in-memory sessions and default tunables.
    pub fn with_store(store: Arc<dyn TransitStore>) -> Self {
        Self::new(
            store,
            Arc::new(InMemorySessionStore::new()),
            EngineConfig::default(),
        )
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn search(&self) -> &RouteSearch {
        &self.search
    }

    pub fn paths(&self) -> &PathFinder {
        &self.paths
    }

    /// Current session for a user, if one has been stored.
    pub fn session(&self, user_id: &str) -> Option<Session> {
        self.sessions.get(user_id)
    }

    /// Answer one rider message, updating that rider's session.
    pub fn process_message(&self, user_id: &str, text: &str) -> ResponsePayload {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut session = self.sessions.get(user_id).unwrap_or_default();
        let utterance = Utterance::new(text);
        let intent = intent::classify(&utterance, session.conversation.state);
        debug!(user_id, ?intent, state = ?session.conversation.state, "dispatching message");

        let outcome = self.dispatch(intent, &utterance, &mut session);
        self.sessions.put(user_id, session);

        match outcome {
            Ok(payload) => payload,
            Err(err) => {
                warn!(user_id, ?intent, error = %err, "handler failed, using default reply");
                handlers::default_response()
            }
        }
    }

    /// Return the user's conversation to `initial`, keeping cached results.
    ///
    /// The user's turn lock is released afterwards unless another call is
    /// still holding or waiting on it.
    pub fn reset_conversation(&self, user_id: &str) {
        let lock = self.user_lock(user_id);
        {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(mut session) = self.sessions.get(user_id) {
                session.conversation = Default::default();
                self.sessions.put(user_id, session);
            }
        }
        drop(lock);
        self.release_user_lock(user_id);
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(user_id.to_string()).or_default().clone()
    }

    fn release_user_lock(&self, user_id: &str) {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }
    }

    fn dispatch(
        &self,
        intent: Intent,
        utterance: &Utterance,
        session: &mut Session,
    ) -> Result<ResponsePayload> {
        match intent {
            Intent::Greeting => Ok(self.greeting(session)),
            Intent::Help => Ok(handlers::help_response()),
            Intent::Reset => Ok(handlers::reset(session)),
            Intent::PopularRoutes => self.popular_routes(),
            Intent::BookingInstructions => Ok(handlers::booking_instructions()),
            Intent::TicketTypes => Ok(handlers::ticket_types()),
            Intent::ContactSupport => Ok(handlers::contact_support()),
            Intent::StartRouteFlow => Ok(handlers::start_route_flow(session)),
            Intent::StartFareFlow => Ok(handlers::start_fare_flow(session)),
            Intent::ContinueFlow => self.continue_flow(utterance, session),
            Intent::RefineCheapest => self.refine_cheapest(session),
            Intent::RefineFastest => self.refine_fastest(session),
            Intent::RefineAll => self.refine_all(session),
            Intent::BusStatistics | Intent::Statistics => self.statistics(),
            Intent::RouteById => self.route_by_id(utterance),
            Intent::BusById => self.bus_by_id(utterance),
            Intent::Tracking => self.tracking(utterance),
            Intent::CheapestQuery => self.cheapest_query(utterance),
            Intent::FastestQuery => self.fastest_query(utterance),
            Intent::AcBusQuery => self.ac_bus_query(utterance),
            Intent::FareInquiry => self.fare_inquiry(utterance),
            Intent::RouteSearch => self.route_query(utterance, session),
            Intent::Booking => self.booking_intent(session),
            Intent::Unknown => Ok(handlers::default_response()),
        }
    }
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
