//! Location typeahead for the dive site picker
//!
//! [`TypeaheadController`] turns keystrokes into suggestion lists:
//! - Activation pre-populates suggestions from the device position
//! - Keystrokes echo immediately and schedule a debounced lookup
//! - Lookups go to the remote search API when connected, to the offline index otherwise
//! - Selecting a place emits a [`SelectedLocation`]; selecting the trailing
//!   row asks the host to open the "new dive site" flow
//!
//! Every issued lookup carries a generation number. A result is committed
//! only if no newer lookup was issued (and the picker was not closed or
//! cleared) in the meantime, so later-issued lookups always win regardless
//! of completion order.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;

use crate::debounce::Debouncer;
use crate::places::{normalize_candidates, PlaceCandidate, SelectedLocation};
use crate::providers::{
    CategoryFilter, GeolocationProvider, NetworkStatusProvider, OfflineSearchIndex,
    RemoteSearchClient,
};
use crate::suggestion_list::{render_rows, SuggestionRow};

/// Default quiet period before a typed query is dispatched
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Page type logged when the picker opens
const PAGE_VIEW_TYPE: &str = "dive_log__select_location";

/// Errors from caller actions on the controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeaheadError {
    /// The picker is not open
    #[error("Location search is not active")]
    Inactive,

    /// The candidate cannot be confirmed as a location
    #[error("Place {0} has no coordinates")]
    MissingCoordinates(String),
}

/// Result type for typeahead operations
pub type Result<T> = std::result::Result<T, TypeaheadError>;

/// Typeahead configuration
#[derive(Debug, Clone)]
pub struct TypeaheadConfig {
    /// Quiet period before a typed query is dispatched
    pub debounce: Duration,

    /// Category scored by remote free-text searches
    pub category: CategoryFilter,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            category: CategoryFilter::DiveSites,
        }
    }
}

impl TypeaheadConfig {
    /// Set the debounce quiet period
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the remote search category
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }
}

/// Collaborators the controller consumes
#[derive(Clone)]
pub struct TypeaheadProviders {
    /// Device position
    pub geolocation: Arc<dyn GeolocationProvider>,
    /// Connectivity
    pub network: Arc<dyn NetworkStatusProvider>,
    /// Remote place search
    pub remote: Arc<dyn RemoteSearchClient>,
    /// Offline dataset
    pub offline: Arc<dyn OfflineSearchIndex>,
}

impl std::fmt::Debug for TypeaheadProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeaheadProviders").finish_non_exhaustive()
    }
}

/// Input and suggestion state of one picker session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Visible input text
    pub display_text: String,
    /// Live suggestions in result order (the "add new" row is not stored)
    pub suggestions: Vec<PlaceCandidate>,
    /// Text of the scheduled lookup that has not fired yet
    pub pending_query: Option<String>,
}

/// Notifications for the host screen
#[derive(Debug, Clone, PartialEq)]
pub enum ModalEvent {
    /// Hide the on-screen keyboard
    DismissKeyboard,
    /// The user confirmed a place
    LocationSelected(SelectedLocation),
    /// The user asked to create a new dive site
    CreateNewRequested,
    /// Close the picker
    Close,
}

#[derive(Debug, Clone)]
enum Lookup {
    Nearby,
    Text(String),
}

#[derive(Debug, Default)]
struct Session {
    state: QueryState,
    generation: u64,
    active: bool,
    in_flight: Vec<AbortHandle>,
}

struct Inner {
    providers: TypeaheadProviders,
    config: TypeaheadConfig,
    session: Mutex<Session>,
    debouncer: Debouncer,
    events: mpsc::UnboundedSender<ModalEvent>,
    suggestions_tx: watch::Sender<Vec<PlaceCandidate>>,
}

impl Inner {
    fn publish(&self, suggestions: &[PlaceCandidate]) {
        self.suggestions_tx.send_replace(suggestions.to_vec());
    }

    fn emit(&self, event: ModalEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("location picker event dropped, no listener");
        }
    }

    /// End the session: no pending or in-flight lookup may touch state afterwards
    fn teardown(&self, session: &mut Session) {
        self.debouncer.cancel();
        for handle in session.in_flight.drain(..) {
            handle.abort();
        }
        session.generation += 1;
        session.active = false;
        session.state.pending_query = None;
        session.state.suggestions.clear();
        self.publish(&[]);
    }

    fn issue(self: &Arc<Self>, lookup: Lookup) {
        let mut session = self.session.lock();
        if !session.active {
            return;
        }

        session.generation += 1;
        let generation = session.generation;
        if matches!(lookup, Lookup::Text(_)) {
            session.state.pending_query = None;
        }
        tracing::debug!(generation, ?lookup, "issuing location lookup");

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(run_lookup(weak, lookup, generation));
        session.in_flight.retain(|h| !h.is_finished());
        session.in_flight.push(handle.abort_handle());
    }

    fn commit(&self, generation: u64, candidates: Vec<PlaceCandidate>) -> bool {
        let mut session = self.session.lock();
        if !session.active || session.generation != generation {
            tracing::debug!(
                generation,
                current = session.generation,
                "discarding stale location lookup"
            );
            return false;
        }

        session.state.suggestions = normalize_candidates(candidates);
        self.publish(&session.state.suggestions);
        true
    }
}

async fn run_lookup(weak: Weak<Inner>, lookup: Lookup, generation: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let providers = inner.providers.clone();
    let category = inner.config.category;
    drop(inner);

    let outcome = match lookup {
        Lookup::Nearby => match providers.geolocation.current_position().await {
            Ok(position) => match providers.remote.search_nearby(position).await {
                Ok(candidates) => Some(candidates),
                Err(e) => {
                    tracing::warn!("Nearby place search failed: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Skipping nearby places: {}", e);
                None
            }
        },
        Lookup::Text(query) => {
            if providers.network.is_connected().await {
                match providers.remote.search_text(&query, category).await {
                    Ok(candidates) => Some(candidates),
                    Err(e) => {
                        tracing::warn!("Place search for {:?} failed: {}", query, e);
                        None
                    }
                }
            } else {
                tracing::debug!(%query, "offline, searching local place index");
                Some(providers.offline.search(&query))
            }
        }
    };

    if let (Some(candidates), Some(inner)) = (outcome, weak.upgrade()) {
        inner.commit(generation, candidates);
    }
}

/// Location typeahead state machine
///
/// Cheap to clone; clones share the same session. All methods that start
/// lookups must be called from within a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use app_core::typeahead::{ModalEvent, TypeaheadConfig, TypeaheadController, TypeaheadProviders};
///
/// # async fn example(providers: TypeaheadProviders) {
/// let (picker, mut events) = TypeaheadController::new(providers, TypeaheadConfig::default());
///
/// picker.activate(None);
/// picker.on_text_changed("blue heron");
///
/// while let Some(event) = events.recv().await {
///     if let ModalEvent::LocationSelected(location) = event {
///         println!("{} ({}, {})", location.description, location.latitude, location.longitude);
///     }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct TypeaheadController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TypeaheadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeaheadController")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .finish()
    }
}

impl TypeaheadController {
    /// Create a controller and the receiver for its host events
    pub fn new(
        providers: TypeaheadProviders,
        config: TypeaheadConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ModalEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (suggestions_tx, _) = watch::channel(Vec::new());

        let inner = Arc::new(Inner {
            debouncer: Debouncer::new(config.debounce),
            providers,
            config,
            session: Mutex::new(Session::default()),
            events,
            suggestions_tx,
        });

        (Self { inner }, events_rx)
    }

    /// Open the picker
    ///
    /// Starts a fresh session whose text is the prior selection's description
    /// (or empty), then looks up places near the device.
    pub fn activate(&self, prior: Option<&SelectedLocation>) {
        {
            let mut session = self.inner.session.lock();
            if session.active {
                self.inner.teardown(&mut session);
            }
            session.state = QueryState {
                display_text: prior.map(|p| p.description.clone()).unwrap_or_default(),
                ..QueryState::default()
            };
            session.active = true;
        }

        tracing::info!(page = PAGE_VIEW_TYPE, "location search opened");
        self.inner.issue(Lookup::Nearby);
    }

    /// Handle an edit of the search input
    pub fn on_text_changed(&self, text: &str) {
        {
            let mut session = self.inner.session.lock();
            if !session.active {
                tracing::debug!("ignoring input while location search is closed");
                return;
            }
            session.state.display_text = text.to_string();

            if text.trim().is_empty() {
                self.inner.debouncer.cancel();
                session.generation += 1;
                session.state.pending_query = None;
                if !session.state.suggestions.is_empty() {
                    session.state.suggestions.clear();
                    self.inner.publish(&[]);
                }
                return;
            }

            session.state.pending_query = Some(text.to_string());
        }

        let weak = Arc::downgrade(&self.inner);
        let query = text.to_string();
        self.inner.debouncer.schedule(move || {
            if let Some(inner) = weak.upgrade() {
                inner.issue(Lookup::Text(query));
            }
        });
    }

    /// Issue a lookup for `text` right away, bypassing the debounce timer
    ///
    /// This is the action the debouncer runs.
    pub fn resolve_lookup(&self, text: &str) {
        self.inner.issue(Lookup::Text(text.to_string()));
    }

    /// Confirm a place
    ///
    /// Clears the suggestions, echoes the place name, then emits
    /// [`ModalEvent::DismissKeyboard`], [`ModalEvent::LocationSelected`], and
    /// [`ModalEvent::Close`] in that order. Ends the session.
    pub fn select_candidate(&self, candidate: &PlaceCandidate) -> Result<SelectedLocation> {
        let selected = {
            let mut session = self.inner.session.lock();
            if !session.active {
                return Err(TypeaheadError::Inactive);
            }
            let selected = SelectedLocation::from_candidate(candidate)
                .ok_or_else(|| TypeaheadError::MissingCoordinates(candidate.id.clone()))?;

            self.inner.teardown(&mut session);
            session.state.display_text = candidate.primary_text.clone();
            selected
        };

        self.inner.emit(ModalEvent::DismissKeyboard);
        self.inner.emit(ModalEvent::LocationSelected(selected.clone()));
        self.inner.emit(ModalEvent::Close);
        Ok(selected)
    }

    /// Choose the trailing "add new dive site" row
    ///
    /// Emits [`ModalEvent::Close`] then [`ModalEvent::CreateNewRequested`];
    /// never a selection. Ends the session.
    pub fn select_sentinel(&self) -> Result<()> {
        {
            let mut session = self.inner.session.lock();
            if !session.active {
                return Err(TypeaheadError::Inactive);
            }
            self.inner.teardown(&mut session);
        }

        self.inner.emit(ModalEvent::Close);
        self.inner.emit(ModalEvent::CreateNewRequested);
        Ok(())
    }

    /// Handle a tap on a rendered row
    pub fn select_row(&self, row: &SuggestionRow) -> Result<Option<SelectedLocation>> {
        match row {
            SuggestionRow::Place(candidate) => self.select_candidate(candidate).map(Some),
            SuggestionRow::AddNew => self.select_sentinel().map(|()| None),
        }
    }

    /// Back button: close the picker without a selection
    pub fn close(&self) {
        let was_active = {
            let mut session = self.inner.session.lock();
            let was_active = session.active;
            self.inner.teardown(&mut session);
            was_active
        };

        if was_active {
            self.inner.emit(ModalEvent::Close);
        }
    }

    /// The picker went away: drop suggestions and stop all lookups
    ///
    /// Idempotent. No lookup started before this call will touch state.
    pub fn deactivate(&self) {
        let mut session = self.inner.session.lock();
        self.inner.teardown(&mut session);
    }

    /// Whether a session is open
    pub fn is_active(&self) -> bool {
        self.inner.session.lock().active
    }

    /// Snapshot of the session state
    pub fn state(&self) -> QueryState {
        self.inner.session.lock().state.clone()
    }

    /// Current input text
    pub fn display_text(&self) -> String {
        self.inner.session.lock().state.display_text.clone()
    }

    /// Current suggestions, without the "add new" row
    pub fn suggestions(&self) -> Vec<PlaceCandidate> {
        self.inner.session.lock().state.suggestions.clone()
    }

    /// Rows to render: suggestions plus the trailing "add new" row
    pub fn rows(&self) -> Vec<SuggestionRow> {
        render_rows(&self.inner.session.lock().state.suggestions)
    }

    /// Watch suggestion updates
    pub fn subscribe(&self) -> watch::Receiver<Vec<PlaceCandidate>> {
        self.inner.suggestions_tx.subscribe()
    }

    /// Controller configuration
    pub fn config(&self) -> &TypeaheadConfig {
        &self.inner.config
    }
}
