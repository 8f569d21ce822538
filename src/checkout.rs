// Checkout: one payment capture for the whole itinerary, then one booking
// per item across every category. A partial fan-out failure is compensated
// by cancelling the bookings that already went through; nothing is left
// silently half-booked.

use crate::catalog::{BookableItem, ItemCategory};
use crate::itinerary::Itinerary;
use crate::providers::{
    BookingProvider, BookingRecord, BookingRequest, ManifestLine, PaymentProvider, PaymentRequest,
    ProviderError, UserProfile,
};
use crate::schedule::DateRange;
use futures::future::join_all;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("sign-in required before checkout")]
    SignInRequired,

    #[error("itinerary is empty")]
    EmptyItinerary,

    #[error("payment failed")]
    Payment(#[source] ProviderError),

    #[error("{failed} of {attempted} bookings failed ({compensated} compensated, {dangling} dangling)")]
    BookingFanOut {
        attempted: usize,
        failed: usize,
        compensated: usize,
        dangling: usize,
        report: FanOutReport,
    },
}

// What actually happened, booking by booking, when the fan-out broke
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub created: Vec<BookingRecord>,
    pub failures: Vec<(String, ProviderError)>,
    pub compensated: Vec<String>,
    pub compensation_failures: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub payment_id: String,
    pub idempotency_key: String,
    pub bookings: Vec<BookingRecord>,
    pub total_minor: i64,
}

// Cosmetic random identifier; not security material
pub fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn line_amount(item: &BookableItem, nights: u32) -> i64 {
    match item.category() {
        ItemCategory::Hotel => item.price_minor() * i64::from(nights.max(1)),
        _ => item.price_minor(),
    }
}

pub struct CheckoutFlow {
    payment: Arc<dyn PaymentProvider>,
    bookings: Arc<dyn BookingProvider>,
    currency: String,
}

impl CheckoutFlow {
    pub fn new(
        payment: Arc<dyn PaymentProvider>,
        bookings: Arc<dyn BookingProvider>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payment,
            bookings,
            currency: currency.into(),
        }
    }

    pub async fn checkout(
        &self,
        user: Option<&UserProfile>,
        itinerary: &Itinerary,
        range: DateRange,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let user = user.ok_or(CheckoutError::SignInRequired)?;
        if itinerary.is_empty() {
            return Err(CheckoutError::EmptyItinerary);
        }

        let nights = range.nights();
        let total_minor = itinerary.total_minor(nights);
        // One key per attempt; the payment provider dedupes on it
        let idempotency_key = random_base36(16);

        let manifest: Vec<ManifestLine> = itinerary
            .items()
            .into_iter()
            .map(|item| ManifestLine {
                category: item.category(),
                item_id: item.id().to_string(),
                label: item.name().to_string(),
                amount_minor: line_amount(item, nights),
            })
            .collect();

        info!(
            total_minor,
            items = manifest.len(),
            key = %idempotency_key,
            "charging payment provider"
        );
        let payment = self
            .payment
            .charge(PaymentRequest {
                amount_minor: total_minor,
                currency: self.currency.clone(),
                idempotency_key: idempotency_key.clone(),
                manifest,
            })
            .await
            .map_err(CheckoutError::Payment)?;

        let requests: Vec<BookingRequest> = itinerary
            .items()
            .into_iter()
            .map(|item| BookingRequest {
                user_id: user.id.clone(),
                user_email: user.email.clone(),
                category: item.category(),
                item_id: item.id().to_string(),
                label: item.name().to_string(),
                trip_start: range.start(),
                amount_minor: line_amount(item, nights),
                confirmation_code: random_base36(8).to_uppercase(),
                idempotency_key: idempotency_key.clone(),
            })
            .collect();

        let results = join_all(requests.into_iter().map(|request| {
            let provider = Arc::clone(&self.bookings);
            async move {
                let label = request.label.clone();
                (label, provider.create_booking(request).await)
            }
        }))
        .await;

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for (label, result) in results {
            match result {
                Ok(record) => created.push(record),
                Err(error) => failures.push((label, error)),
            }
        }

        if failures.is_empty() {
            info!(count = created.len(), payment_id = %payment.payment_id, "all bookings confirmed");
            return Ok(CheckoutOutcome {
                payment_id: payment.payment_id,
                idempotency_key,
                bookings: created,
                total_minor,
            });
        }

        warn!(
            failed = failures.len(),
            created = created.len(),
            "booking fan-out failed, cancelling created bookings"
        );
        let mut compensated = Vec::new();
        let mut compensation_failures = Vec::new();
        for record in &created {
            match self.bookings.cancel_booking(&record.booking_id).await {
                Ok(()) => compensated.push(record.booking_id.clone()),
                Err(error) => {
                    warn!(booking_id = %record.booking_id, %error, "compensating cancellation failed");
                    compensation_failures.push(record.booking_id.clone());
                }
            }
        }

        let attempted = created.len() + failures.len();
        Err(CheckoutError::BookingFanOut {
            attempted,
            failed: failures.len(),
            compensated: compensated.len(),
            dangling: compensation_failures.len(),
            report: FanOutReport {
                created,
                failures,
                compensated,
                compensation_failures,
            },
        })
    }
}
