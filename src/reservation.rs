// Client-side driver for the dining provider's two-phase contract:
// lock a slot, then confirm it with the hold token before the hold lapses.
// The LOCKED -> CONFIRMED | EXPIRED machine lives with the provider; this
// module only steers it.

use crate::providers::{
    ProviderError, ReservationConfirmation, ReservationProvider, SlotLock, SlotRequest,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Locked,
    Confirmed,
    Expired,
}

pub fn hold_state(lock: &SlotLock, now: DateTime<Utc>) -> HoldState {
    if lock.is_expired(now) {
        HoldState::Expired
    } else {
        HoldState::Locked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiningReservation {
    pub confirmation: ReservationConfirmation,
    pub state: HoldState,
}

pub struct DiningFlow {
    provider: Arc<dyn ReservationProvider>,
}

impl DiningFlow {
    pub fn new(provider: Arc<dyn ReservationProvider>) -> Self {
        Self { provider }
    }

    // Lock then confirm. An expired hold is restarted from lock exactly
    // once; a second expiry is surfaced to the caller.
    pub async fn reserve(
        &self,
        request: SlotRequest,
    ) -> Result<DiningReservation, ProviderError> {
        let lock = self.provider.lock_slot(request.clone()).await?;
        debug!(
            restaurant = %request.restaurant_id,
            expires_at = %lock.expires_at,
            "slot hold acquired"
        );

        match self.confirm(&lock).await {
            Err(ProviderError::SlotExpired { expired_at }) => {
                warn!(
                    restaurant = %request.restaurant_id,
                    %expired_at,
                    "slot hold expired, restarting from lock"
                );
                let lock = self.provider.lock_slot(request).await?;
                self.confirm(&lock).await
            }
            other => other,
        }
        .map(|confirmation| DiningReservation {
            confirmation,
            state: HoldState::Confirmed,
        })
    }

    async fn confirm(&self, lock: &SlotLock) -> Result<ReservationConfirmation, ProviderError> {
        // Check locally before spending the round trip on a dead token
        if let HoldState::Expired = hold_state(lock, Utc::now()) {
            return Err(ProviderError::SlotExpired {
                expired_at: lock.expires_at,
            });
        }
        self.provider.confirm_slot(&lock.token).await
    }
}
