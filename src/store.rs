// Centralized state container. All mutation goes through named reducer
// transitions, one at a time; view layers read snapshots. Only the
// itinerary slice (items + notes) is ever persisted; schedule, conflicts
// and drag state are derived and rebuilt from it.

use crate::catalog::{BookableItem, ItemCategory};
use crate::itinerary::Itinerary;
use crate::providers::{BookingRecord, UserProfile};
use crate::schedule::DateRange;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const PERSIST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Golf,
    Hotels,
    Dining,
    Experiences,
    Packages,
    Itinerary,
    Checkout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    SignIn,
    ItemDetail { category: ItemCategory, id: String },
    Checkout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub itinerary: Itinerary,
    pub user: Option<UserProfile>,
    pub date_range: DateRange,
    pub active_section: Section,
    pub open_modal: Option<Modal>,
    pub notifications: Vec<Notification>,
    pub bookings: Vec<BookingRecord>,
    next_notification_id: u64,
}

impl AppState {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            itinerary: Itinerary::new(),
            user: None,
            date_range,
            active_section: Section::Home,
            open_modal: None,
            notifications: Vec::new(),
            bookings: Vec::new(),
            next_notification_id: 1,
        }
    }
}

// The full set of state transitions; nothing else mutates AppState
#[derive(Debug, Clone)]
pub enum Action {
    AddItem(BookableItem),
    RemoveItem { category: ItemCategory, id: String },
    SetNotes(String),
    SetDateRange(DateRange),
    SignedIn(UserProfile),
    SignedOut,
    ShowSection(Section),
    OpenModal(Modal),
    CloseModal,
    Notify { severity: Severity, message: String },
    DismissNotification(u64),
    RecordBookings(Vec<BookingRecord>),
    ClearItinerary,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::AddItem(_) => "add_item",
            Action::RemoveItem { .. } => "remove_item",
            Action::SetNotes(_) => "set_notes",
            Action::SetDateRange(_) => "set_date_range",
            Action::SignedIn(_) => "signed_in",
            Action::SignedOut => "signed_out",
            Action::ShowSection(_) => "show_section",
            Action::OpenModal(_) => "open_modal",
            Action::CloseModal => "close_modal",
            Action::Notify { .. } => "notify",
            Action::DismissNotification(_) => "dismiss_notification",
            Action::RecordBookings(_) => "record_bookings",
            Action::ClearItinerary => "clear_itinerary",
        }
    }
}

fn apply(state: &mut AppState, action: Action) {
    match action {
        Action::AddItem(item) => {
            state.itinerary.add(item);
        }
        Action::RemoveItem { category, id } => {
            state.itinerary.remove(category, &id);
        }
        Action::SetNotes(notes) => state.itinerary.set_notes(notes),
        Action::SetDateRange(range) => state.date_range = range,
        Action::SignedIn(user) => state.user = Some(user),
        Action::SignedOut => state.user = None,
        Action::ShowSection(section) => state.active_section = section,
        Action::OpenModal(modal) => state.open_modal = Some(modal),
        Action::CloseModal => state.open_modal = None,
        Action::Notify { severity, message } => {
            let id = state.next_notification_id;
            state.next_notification_id += 1;
            state.notifications.push(Notification {
                id,
                severity,
                message,
            });
        }
        Action::DismissNotification(id) => {
            state.notifications.retain(|n| n.id != id);
        }
        Action::RecordBookings(records) => state.bookings.extend(records),
        Action::ClearItinerary => state.itinerary.clear(),
    }
}

// The persisted slice: items per category plus notes, nothing else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub itinerary: Itinerary,
}

// Handle over the shared state; transitions are serialized by the lock
pub struct Store {
    state: RwLock<AppState>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    pub fn dispatch(&self, action: Action) {
        debug!(action = action.name(), "state transition");
        let mut state = self.state.write();
        apply(&mut state, action);
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    pub fn export_persisted(&self) -> serde_json::Result<String> {
        let state = self.state.read();
        serde_json::to_string(&PersistedState {
            version: PERSIST_VERSION,
            itinerary: state.itinerary.clone(),
        })
    }

    // Restore the persisted slice into a fresh session. Everything derived
    // (schedule, conflicts) is rebuilt by the view layer afterwards.
    pub fn hydrate_persisted(&self, json: &str) -> serde_json::Result<()> {
        let persisted: PersistedState = serde_json::from_str(json)?;
        debug!(
            version = persisted.version,
            items = persisted.itinerary.item_count(),
            "hydrated persisted itinerary"
        );
        self.state.write().itinerary = persisted.itinerary;
        Ok(())
    }
}
