// Contracts expected from the hosted collaborators: identity, catalog,
// payment, booking and dining reservation. Every capability here is a thin
// call-through to an external service; the traits are the seam the rest of
// the crate is written against.

use crate::catalog::{BookableItem, ItemCategory};
use crate::feed::{FeedError, TeeSheet};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Default slot-lock hold issued by the dining provider
pub const DEFAULT_HOLD_MINUTES: i64 = 5;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout after {0}ms")]
    Timeout(u64),

    #[error("provider error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("sign-in required")]
    AuthRequired,

    #[error("slot hold expired at {expired_at}")]
    SlotExpired { expired_at: DateTime<Utc> },

    #[error("feed decode error: {0}")]
    Decode(#[from] FeedError),
}

// Shared configuration for the REST clients
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_ms: 10_000,
        }
    }
}

// Snapshot of the signed-in visitor; the only identity data checkout needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<UserProfile>, ProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, ProviderError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(
        &self,
        category: ItemCategory,
        destination: &str,
    ) -> Result<Vec<BookableItem>, ProviderError>;

    async fn fetch_tee_sheet(
        &self,
        course_id: &str,
        date: NaiveDate,
    ) -> Result<TeeSheet, ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestLine {
    pub category: ItemCategory,
    pub item_id: String,
    pub label: String,
    pub amount_minor: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub idempotency_key: String,
    pub manifest: Vec<ManifestLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    pub payment_id: String,
}

// Single opaque capture; no partial payment or split tender exists
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentConfirmation, ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub user_email: String,
    pub category: ItemCategory,
    pub item_id: String,
    pub label: String,
    pub trip_start: NaiveDate,
    pub amount_minor: i64,
    pub confirmation_code: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub category: ItemCategory,
    pub item_id: String,
    pub label: String,
    pub confirmation_code: String,
    pub status: BookingStatus,
}

#[async_trait]
pub trait BookingProvider: Send + Sync {
    async fn create_booking(&self, request: BookingRequest) -> Result<BookingRecord, ProviderError>;

    // Compensation path for partially completed checkouts
    async fn cancel_booking(&self, booking_id: &str) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotRequest {
    pub restaurant_id: String,
    pub date: NaiveDate,
    pub time_minutes: u16,
    pub party_size: u8,
}

// A time-boxed hold on a table. The provider owns the LOCKED -> CONFIRMED |
// EXPIRED machine; the token is only good until expires_at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotLock {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SlotLock {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservationConfirmation {
    pub reservation_id: String,
    pub restaurant_id: String,
}

#[async_trait]
pub trait ReservationProvider: Send + Sync {
    async fn lock_slot(&self, request: SlotRequest) -> Result<SlotLock, ProviderError>;

    // Fails with SlotExpired once the hold has lapsed; the caller restarts
    // from lock_slot
    async fn confirm_slot(&self, token: &str) -> Result<ReservationConfirmation, ProviderError>;
}
