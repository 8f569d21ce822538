// Domain core for the golf-travel planning and booking storefront

// Export the state, catalog and flow modules
pub mod cache;
pub mod catalog;
pub mod checkout;
pub mod clients;
pub mod feed;
pub mod itinerary;
pub mod providers;
pub mod reservation;
pub mod schedule;
pub mod store;

// Re-export key types for convenience
pub use cache::{CacheConfig, CacheStats, CatalogCache};
pub use catalog::{BookableItem, ItemCategory};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutOutcome};
pub use feed::{FeedError, TeeSheet, TeeTimeSlot};
pub use itinerary::Itinerary;
pub use providers::{
    BookingProvider, BookingRecord, CatalogProvider, IdentityProvider, PaymentProvider,
    ProviderConfig, ProviderError, ReservationProvider, UserProfile,
};
pub use reservation::{DiningFlow, DiningReservation, HoldState};
pub use schedule::{
    conflict_summary, detect_conflicts, Conflict, DateRange, Schedule, ScheduledEntry,
};
pub use store::{Action, AppState, PersistedState, Store};
