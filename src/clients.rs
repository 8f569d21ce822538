// REST implementations of the collaborator contracts. These are thin
// call-throughs: JSON in and out, an api-key header, the configured
// timeout, and no retry policy; a failed call is reported once.

use crate::cache::{catalog_key, tee_sheet_key, CatalogCache};
use crate::catalog::{BookableItem, ItemCategory};
use crate::feed::{self, FeedError, TeeSheet};
use crate::providers::{
    BookingProvider, BookingRecord, BookingRequest, CatalogProvider, IdentityProvider,
    PaymentConfirmation, PaymentProvider, PaymentRequest, ProviderConfig, ProviderError,
    ReservationConfirmation, ReservationProvider, SlotLock, SlotRequest, UserProfile,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-api-key";

fn build_http(config: &ProviderConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

fn transport_error(error: reqwest::Error, timeout_ms: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_ms)
    } else {
        ProviderError::Network(error.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> ProviderError {
    ProviderError::Api {
        status: status.as_u16(),
        message,
        retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
    }
}

async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "provider call failed");
    status_error(status, message)
}

// Shared plumbing for one provider host
struct RestEndpoint {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl RestEndpoint {
    fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = build_http(&config)?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_bytes(&self, path: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_ms))
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        response
            .json()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_ms))
    }
}

// Catalog client: cache first, then the supplier feed
pub struct RestCatalogClient {
    endpoint: RestEndpoint,
    cache: Arc<CatalogCache>,
}

impl RestCatalogClient {
    pub fn new(config: ProviderConfig, cache: Arc<CatalogCache>) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: RestEndpoint::new(config)?,
            cache,
        })
    }

    async fn cached_fetch(&self, key: String, path: &str) -> Result<Bytes, ProviderError> {
        if let Some(payload) = self.cache.get(&key) {
            debug!(%key, "catalog cache hit");
            return Ok(payload);
        }
        let payload = self.endpoint.get_bytes(path).await?;
        self.cache.store(key, payload.clone(), None);
        Ok(payload)
    }
}

#[async_trait]
impl CatalogProvider for RestCatalogClient {
    async fn fetch_catalog(
        &self,
        category: ItemCategory,
        destination: &str,
    ) -> Result<Vec<BookableItem>, ProviderError> {
        let key = catalog_key(category, destination);
        let path = format!("/catalog/{}?destination={}", category.key(), destination);
        let payload = self.cached_fetch(key, &path).await?;
        Ok(feed::decode_catalog(&payload)?)
    }

    async fn fetch_tee_sheet(
        &self,
        course_id: &str,
        date: NaiveDate,
    ) -> Result<TeeSheet, ProviderError> {
        let key = tee_sheet_key(course_id, date);
        let path = format!("/tee-sheets/{}?date={}", course_id, date);
        let payload = self.cached_fetch(key, &path).await?;
        let xml = std::str::from_utf8(&payload)
            .map_err(|_| FeedError::Xml("tee sheet is not valid UTF-8".to_string()))?;
        Ok(feed::decode_tee_sheet(xml)?)
    }
}

pub struct RestIdentityClient {
    endpoint: RestEndpoint,
}

impl RestIdentityClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: RestEndpoint::new(config)?,
        })
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[async_trait]
impl IdentityProvider for RestIdentityClient {
    async fn current_user(&self) -> Result<Option<UserProfile>, ProviderError> {
        let response = self
            .endpoint
            .http
            .get(self.endpoint.url("/session"))
            .header(API_KEY_HEADER, &self.endpoint.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.endpoint.config.timeout_ms))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            Ok(None)
        } else if status.is_success() {
            Ok(Some(self.endpoint.decode(response).await?))
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, ProviderError> {
        let response = self
            .endpoint
            .post_json("/session", &Credentials { email, password })
            .await?;
        self.endpoint.decode(response).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, ProviderError> {
        let response = self
            .endpoint
            .post_json(
                "/users",
                &SignUpBody {
                    email,
                    password,
                    display_name,
                },
            )
            .await?;
        self.endpoint.decode(response).await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let response = self
            .endpoint
            .http
            .delete(self.endpoint.url("/session"))
            .header(API_KEY_HEADER, &self.endpoint.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.endpoint.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

pub struct RestPaymentClient {
    endpoint: RestEndpoint,
}

impl RestPaymentClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: RestEndpoint::new(config)?,
        })
    }
}

#[async_trait]
impl PaymentProvider for RestPaymentClient {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentConfirmation, ProviderError> {
        debug!(
            amount_minor = request.amount_minor,
            key = %request.idempotency_key,
            "submitting charge"
        );
        let response = self.endpoint.post_json("/charges", &request).await?;
        self.endpoint.decode(response).await
    }
}

pub struct RestBookingClient {
    endpoint: RestEndpoint,
}

impl RestBookingClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: RestEndpoint::new(config)?,
        })
    }
}

#[async_trait]
impl BookingProvider for RestBookingClient {
    async fn create_booking(&self, request: BookingRequest) -> Result<BookingRecord, ProviderError> {
        let response = self.endpoint.post_json("/bookings", &request).await?;
        self.endpoint.decode(response).await
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<(), ProviderError> {
        let response = self
            .endpoint
            .http
            .delete(self.endpoint.url(&format!("/bookings/{}", booking_id)))
            .header(API_KEY_HEADER, &self.endpoint.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.endpoint.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

pub struct RestDiningClient {
    endpoint: RestEndpoint,
}

impl RestDiningClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: RestEndpoint::new(config)?,
        })
    }
}

#[async_trait]
impl ReservationProvider for RestDiningClient {
    async fn lock_slot(&self, request: SlotRequest) -> Result<SlotLock, ProviderError> {
        let response = self.endpoint.post_json("/slots", &request).await?;
        self.endpoint.decode(response).await
    }

    async fn confirm_slot(&self, token: &str) -> Result<ReservationConfirmation, ProviderError> {
        let response = self
            .endpoint
            .http
            .post(self.endpoint.url(&format!("/slots/{}/confirm", token)))
            .header(API_KEY_HEADER, &self.endpoint.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.endpoint.config.timeout_ms))?;

        // The provider answers GONE once the hold has lapsed
        if response.status() == StatusCode::GONE {
            return Err(ProviderError::SlotExpired {
                expired_at: Utc::now(),
            });
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        self.endpoint.decode(response).await
    }
}
