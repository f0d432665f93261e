//! Zarinpal payment gateway client.
//!
//! The gateway is treated as an opaque remote service: one request endpoint
//! that issues an authority token, one verification endpoint that settles a
//! payment against that token. Calls are awaited inline with no timeout or
//! retry; error handling happens at the service layer.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gateway verification result code for a successful settlement.
pub const VERIFY_STATUS_OK: i64 = 100;
/// Result code returned when the same authority was already verified.
pub const VERIFY_STATUS_ALREADY_VERIFIED: i64 = 101;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Serialize)]
pub struct PaymentRequest<'a> {
    pub merchant_id: &'a str,
    /// Order total in the smallest currency unit.
    pub amount: i64,
    pub description: &'a str,
    pub callback_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestResponse {
    authority: Option<String>,
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    merchant_id: &'a str,
    amount: i64,
    authority: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponseBody {
    status_code: Option<i64>,
    ref_id: Option<i64>,
    errors: Option<serde_json::Value>,
}

/// Outcome of a verification call, with the raw body preserved so the
/// order can keep it as an opaque record.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub status_code: i64,
    pub ref_id: Option<i64>,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct ZarinpalClient {
    http: Client,
    merchant_id: String,
    base_url: String,
}

impl ZarinpalClient {
    pub fn new(merchant_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            merchant_id: merchant_id.into(),
            base_url: base_url.into(),
        }
    }

    /// Submit a payment request; returns the authority token on success.
    pub async fn request_payment(
        &self,
        amount: i64,
        description: &str,
        callback_url: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/pg/v4/payment/request.json", self.base_url);
        let payload = PaymentRequest {
            merchant_id: &self.merchant_id,
            amount,
            description,
            callback_url,
        };

        let response = self.http.post(&url).json(&payload).send().await?;
        let body: PaymentRequestResponse = response.json().await?;

        match body.authority {
            Some(authority) if !authority.is_empty() => Ok(authority),
            _ => Err(GatewayError::Rejected(
                body.errors
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no authority in response".to_string()),
            )),
        }
    }

    /// Verify a payment attempt against its authority token.
    pub async fn verify_payment(
        &self,
        amount: i64,
        authority: &str,
    ) -> Result<VerifyOutcome, GatewayError> {
        let url = format!("{}/pg/v4/payment/verify.json", self.base_url);
        let payload = VerifyRequest {
            merchant_id: &self.merchant_id,
            amount,
            authority,
        };

        let response = self.http.post(&url).json(&payload).send().await?;
        let raw = response.text().await?;

        let body: VerifyResponseBody = serde_json::from_str(&raw)
            .map_err(|err| GatewayError::Rejected(format!("malformed verify response: {err}")))?;

        match body.status_code {
            Some(status_code) => Ok(VerifyOutcome {
                status_code,
                ref_id: body.ref_id,
                raw,
            }),
            None => Err(GatewayError::Rejected(
                body.errors
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no status code in response".to_string()),
            )),
        }
    }

    /// Hosted payment page the customer is redirected to after initiation.
    pub fn payment_page_url(&self, authority: &str) -> String {
        format!("{}/pg/StartPay/{}", self.base_url, authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_request_serializes_to_gateway_contract() {
        let payload = PaymentRequest {
            merchant_id: "m-123",
            amount: 200,
            description: "Order 42",
            callback_url: "http://localhost:3000/api/orders/verify",
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["merchant_id"], "m-123");
        assert_eq!(value["amount"], 200);
        assert_eq!(value["description"], "Order 42");
        assert_eq!(
            value["callback_url"],
            "http://localhost:3000/api/orders/verify"
        );
    }

    #[test]
    fn payment_page_url_embeds_authority() {
        let client = ZarinpalClient::new("m-123", "https://sandbox.zarinpal.com");
        assert_eq!(
            client.payment_page_url("A0000012345"),
            "https://sandbox.zarinpal.com/pg/StartPay/A0000012345"
        );
    }

    #[test]
    fn verify_response_parses_ref_id_and_status() {
        let raw = r#"{"status_code":100,"ref_id":987654}"#;
        let body: VerifyResponseBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.status_code, Some(100));
        assert_eq!(body.ref_id, Some(987654));
        assert!(body.errors.is_none());
    }
}
