//! # HTTP Backend Adapter
//!
//! One `reqwest::Client` bound to the backend base URL, authenticated with
//! the project API key (`apikey` header plus bearer token), and implementing
//! the `kunda-pricing` collaborator traits.
//!
//! ## Error Handling
//!
//! Transport failures, timeouts and non-2xx statuses map to
//! [`BackendError`] with the endpoint and a body excerpt. At the trait
//! boundary they become `SourceError`, wrapped in the trait's own error
//! type where it has one.
//!
//! ## Timeout & Retry
//!
//! Per-request timeout from [`BackendConfig`]. No retries.

use std::future::Future;
use std::time::Duration;

use kunda_core::{Corridor, Currency, PromoCodeId, TransferReference, UserId};
use kunda_pricing::limits::{
    validate_weekly_limit, LimitCheck, LimitError, WeeklyLimitChecker, WeeklyLimitRequest,
};
use kunda_pricing::loyalty::{LoyaltyDiscount, LoyaltyError, LoyaltyService};
use kunda_pricing::promo::{DiscountType, PromoError, PromoGrant, PromoValidator};
use kunda_pricing::reference::ReferenceRegistry;
use kunda_pricing::source::{ConfigSource, FeeKey, FeeSource, RateSource};
use kunda_pricing::SourceError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::{BackendConfig, ConfigError};
use crate::error::{BackendError, BACKEND_NAME};

/// Longest response body excerpt kept in an error.
const BODY_EXCERPT_LEN: usize = 512;

/// Name of the weekly-cap row in `transfer_limits`.
const WEEKLY_LIMIT_NAME: &str = "weekly_transfer_limit";

#[derive(Debug, Deserialize)]
struct RateRow {
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct FeeRow {
    fee_percentage: f64,
}

#[derive(Debug, Deserialize)]
struct LimitRow {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[allow(dead_code)]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct PromoValidationRow {
    valid: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    discount_type: Option<DiscountType>,
    #[serde(default)]
    discount_value: Option<f64>,
    #[serde(default)]
    promo_code_id: Option<PromoCodeId>,
}

/// HTTP client for the KundaPay backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    timeout_ms: u64,
}

impl HttpBackend {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let key = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| ConfigError::InvalidApiKey)?;
        let bearer = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Http {
                endpoint: "client".into(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            timeout_ms: config.timeout_secs.saturating_mul(1_000),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Config(ConfigError::InvalidUrl(path.to_string(), e.to_string())))
    }

    /// Drive a request future to completion on the current runtime.
    fn run<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| BackendError::NoRuntime)?;
        rt.block_on(fut)
    }

    /// Send a request and handle HTTP errors consistently.
    async fn send_request(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(endpoint, "backend request");
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                BackendError::Http {
                    endpoint: endpoint.to_string(),
                    source: e,
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > BODY_EXCERPT_LEN {
                let mut cut = BODY_EXCERPT_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, BackendError> {
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Deserialization {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// `GET /rest/v1/{table}` with PostgREST filters.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;
        let resp = self
            .send_request(self.client.get(url).query(query), table)
            .await?;
        Self::decode(resp, table).await
    }

    /// `POST /rest/v1/rpc/{function}`.
    async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        body: &serde_json::Value,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        let resp = self
            .send_request(self.client.post(url).json(body), function)
            .await?;
        Self::decode(resp, function).await
    }

    /// Current weekly cap in EUR, if configured on the backend.
    pub fn fetch_weekly_limit(&self) -> Result<Option<f64>, BackendError> {
        self.run(async {
            let rows: Vec<LimitRow> = self
                .select(
                    "transfer_limits",
                    &[
                        ("name", format!("eq.{WEEKLY_LIMIT_NAME}")),
                        ("select", "value".to_string()),
                    ],
                )
                .await?;
            Ok(rows.first().map(|r| r.value))
        })
    }

    /// Change the weekly cap. The value is validated before any request.
    pub fn update_weekly_limit(&self, value: f64) -> Result<(), LimitError> {
        let value = validate_weekly_limit(value)?;
        self.run(async {
            let url = self.endpoint("rest/v1/transfer_limits")?;
            self.send_request(
                self.client
                    .patch(url)
                    .query(&[("name", format!("eq.{WEEKLY_LIMIT_NAME}"))])
                    .json(&serde_json::json!({ "value": value })),
                "transfer_limits",
            )
            .await?;
            Ok(())
        })
        .map_err(|e| LimitError::Backend(e.into()))?;
        tracing::info!(value, "weekly transfer limit updated");
        Ok(())
    }
}

impl ConfigSource for HttpBackend {
    fn source_name(&self) -> &str {
        BACKEND_NAME
    }
}

impl RateSource for HttpBackend {
    fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError> {
        let rows: Vec<RateRow> = self.run(self.select(
            "exchange_rates",
            &[
                ("from_currency", format!("eq.{from}")),
                ("to_currency", format!("eq.{to}")),
                ("select", "rate".to_string()),
            ],
        ))?;
        Ok(rows.first().map(|r| r.rate))
    }
}

impl FeeSource for HttpBackend {
    fn fee_percentage(&self, key: &FeeKey) -> Result<Option<f64>, SourceError> {
        let rows: Vec<FeeRow> = self.run(self.select(
            "transfer_fees",
            &[
                ("from_country", format!("eq.{}", key.corridor.origin().code())),
                (
                    "to_country",
                    format!("eq.{}", key.corridor.destination().code()),
                ),
                ("payment_method", format!("eq.{}", key.rails.payment)),
                ("receiving_method", format!("eq.{}", key.rails.receiving)),
                ("select", "fee_percentage".to_string()),
            ],
        ))?;
        Ok(rows.first().map(|r| r.fee_percentage))
    }
}

impl PromoValidator for HttpBackend {
    fn validate(
        &self,
        code: &str,
        corridor: Corridor,
        user: Option<UserId>,
    ) -> Result<PromoGrant, PromoError> {
        let mut body = serde_json::json!({
            "code_text": code.trim(),
            "transfer_direction": corridor.to_string(),
        });
        if let Some(user) = user {
            body["user_id"] = serde_json::json!(user);
        }

        let rows: Vec<PromoValidationRow> = self
            .run(self.rpc("validate_promo_code", &body))
            .map_err(|e| PromoError::Backend(e.into()))?;
        let Some(row) = rows.into_iter().next() else {
            return Err(PromoError::Unknown(code.to_string()));
        };
        if !row.valid {
            return Err(PromoError::Rejected(
                row.message
                    .unwrap_or_else(|| "invalid promo code".to_string()),
            ));
        }
        match (row.promo_code_id, row.discount_type, row.discount_value) {
            (Some(promo_code_id), Some(discount_type), Some(discount_value)) => Ok(PromoGrant {
                promo_code_id,
                discount_type,
                discount_value,
            }),
            _ => Err(PromoError::Backend(SourceError::InvalidValue {
                backend: BACKEND_NAME.to_string(),
                reason: "valid promo code without discount details".to_string(),
            })),
        }
    }
}

impl LoyaltyService for HttpBackend {
    fn discount(
        &self,
        user: UserId,
        points_to_use: u32,
        transfer_amount: f64,
        currency: Currency,
    ) -> Result<LoyaltyDiscount, LoyaltyError> {
        let body = serde_json::json!({
            "user_id_param": user,
            "points_to_use": points_to_use,
            "transfer_amount": transfer_amount,
            "sender_currency": currency,
        });
        let rows: Vec<LoyaltyDiscount> = self
            .run(self.rpc("calculate_loyalty_discount", &body))
            .map_err(|e| LoyaltyError::Backend(e.into()))?;
        Ok(rows.into_iter().next().unwrap_or_else(|| {
            tracing::debug!(%user, "no loyalty discount returned");
            LoyaltyDiscount::none(0)
        }))
    }
}

impl WeeklyLimitChecker for HttpBackend {
    fn check(&self, request: &WeeklyLimitRequest) -> Result<LimitCheck, LimitError> {
        if !request.corridor.is_outbound_from_home() {
            return Ok(LimitCheck::allowed(
                "Weekly limit only applies to transfers from Gabon",
            ));
        }
        let b = &request.beneficiary;
        let body = serde_json::json!({
            "p_sender_user_id": request.sender,
            "p_beneficiary_first_name": b.first_name,
            "p_beneficiary_last_name": b.last_name,
            "p_beneficiary_email": b.email,
            "p_beneficiary_phone": b.phone,
            "p_transfer_amount": request.amount,
            "p_transfer_currency": request.currency,
        });
        self.run(self.rpc("check_weekly_transfer_limit", &body))
            .map_err(|e| LimitError::Backend(e.into()))
    }
}

impl ReferenceRegistry for HttpBackend {
    fn exists(&self, reference: &TransferReference) -> Result<bool, SourceError> {
        let rows: Vec<ReferenceRow> = self.run(self.select(
            "transfers",
            &[
                ("reference", format!("eq.{reference}")),
                ("select", "reference".to_string()),
            ],
        ))?;
        Ok(!rows.is_empty())
    }
}
