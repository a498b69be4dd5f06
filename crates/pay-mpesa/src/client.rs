//! # Daraja STK Push Client
//!
//! Lipa Na M-Pesa Online: fetch an OAuth token, sign a push request with the
//! shortcode passkey and ask Safaricom to prompt the payer's handset.
//!
//! One invocation is exactly one token fetch followed by one push submission.
//! Nothing is retried and nothing is cached between invocations.

use crate::config::MpesaConfig;
use crate::credentials::{derive_password, format_timestamp};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use pay_core::{PaymentError, PaymentResult, PushOrder, PushPaymentGateway, PushReceipt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, instrument};

/// Daraja STK push client
pub struct MpesaClient {
    config: MpesaConfig,
    client: Client,
}

impl MpesaClient {
    /// Create a new client; connect and request timeouts come from the config
    pub fn new(config: MpesaConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = MpesaConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    /// Exchange consumer key/secret for a bearer token.
    #[instrument(skip(self))]
    pub async fn get_access_token(&self) -> PaymentResult<AccessToken> {
        debug!("Requesting Daraja access token");

        let response = self
            .client
            .get(self.config.token_url())
            .header(AUTHORIZATION, self.config.basic_auth_header())
            .send()
            .await
            .map_err(PaymentError::network)?;

        let status = response.status();
        let body = response.text().await.map_err(PaymentError::network)?;

        if !status.is_success() {
            error!("Daraja token error: status={}, body={}", status, body);
            return Err(PaymentError::Auth {
                http_status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse token response: {}", e))
        })?;

        debug!("Access token received, expires_in={:?}", token.expires_in);

        Ok(AccessToken {
            value: token.access_token,
            expires_in: token.expires_in,
        })
    }

    /// Prompt `phone_number` to pay `amount`.
    ///
    /// Steps run in this order:
    /// 1. local validation of phone, amount, reference and description
    /// 2. token fetch
    /// 3. push submission
    ///
    /// Invalid input therefore fails with `Validation` even when the
    /// credentials would also be rejected, and no network call is made.
    /// A token failure means the push endpoint is never contacted.
    pub async fn initiate_push(
        &self,
        phone_number: &str,
        amount: &str,
        account_reference: &str,
        description: &str,
    ) -> PaymentResult<PushReceipt> {
        let order = PushOrder::new(phone_number, amount, account_reference, description);
        self.push(&order).await
    }

    /// Build the signed request body for `order` at instant `at`.
    ///
    /// The timestamp and password are scoped to the returned request and
    /// must not be reused for another attempt.
    pub fn build_request(
        &self,
        order: &PushOrder,
        at: &DateTime<FixedOffset>,
    ) -> PaymentResult<StkPushRequest> {
        let order = order.validated(&self.config.phone_format)?;
        let timestamp = format_timestamp(at);
        let password = derive_password(&self.config.short_code, &self.config.passkey, &timestamp);

        Ok(StkPushRequest {
            business_short_code: self.config.short_code.clone(),
            password,
            timestamp,
            transaction_type: TransactionType::CustomerPayBillOnline,
            amount: order.amount,
            party_a: order.phone_number.clone(),
            party_b: self.config.short_code.clone(),
            phone_number: order.phone_number,
            callback_url: self.config.callback_url.clone(),
            account_reference: order.account_reference,
            transaction_desc: order.description,
        })
    }

    #[instrument(skip(self, order), fields(amount = %order.amount, reference = %order.account_reference))]
    async fn push(&self, order: &PushOrder) -> PaymentResult<PushReceipt> {
        // Reject bad input before spending a token request on it
        let order = order.validated(&self.config.phone_format)?;

        let token = self.get_access_token().await?;

        let now = Utc::now().with_timezone(&self.config.utc_offset);
        let request = self.build_request(&order, &now)?;

        debug!(
            "Submitting STK push: timestamp={}, party_a={}",
            request.timestamp,
            mask_msisdn(&request.party_a)
        );

        let response = self
            .client
            .post(self.config.stk_push_url())
            .header(AUTHORIZATION, token.authorization_header())
            .json(&request)
            .send()
            .await
            .map_err(PaymentError::network)?;

        let status = response.status();
        let body = response.text().await.map_err(PaymentError::network)?;

        if !status.is_success() {
            error!("Daraja STK push error: status={}, body={}", status, body);
            return Err(PaymentError::Provider {
                http_status: status.as_u16(),
                body,
            });
        }

        let push_response: StkPushResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse STK push response: {}", e))
        })?;

        info!(
            "STK push accepted: checkout_request_id={}, response_code={}",
            push_response.checkout_request_id, push_response.response_code
        );

        Ok(push_response.into())
    }

    /// Confirm the configured credentials are accepted.
    #[instrument(skip(self), fields(base_url = %self.config.api_base_url))]
    pub async fn check_connection(&self) -> PaymentResult<()> {
        self.get_access_token().await?;
        info!("Daraja credentials accepted");
        Ok(())
    }
}

/// Keep the last three digits of a payer number for logs
fn mask_msisdn(msisdn: &str) -> String {
    let hidden = msisdn.chars().count().saturating_sub(3);
    msisdn
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

#[async_trait]
impl PushPaymentGateway for MpesaClient {
    async fn initiate_push(&self, order: &PushOrder) -> PaymentResult<PushReceipt> {
        self.push(order).await
    }

    fn provider_name(&self) -> &'static str {
        "mpesa"
    }
}

/// OAuth bearer credential, valid for one attempt
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    /// Lifetime in seconds as reported by Daraja; not tracked locally
    pub expires_in: Option<String>,
}

impl AccessToken {
    pub const SCHEME: &'static str = "Bearer";

    pub fn authorization_header(&self) -> String {
        format!("{} {}", Self::SCHEME, self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("scheme", &Self::SCHEME)
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// =============================================================================
// Daraja API Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionType {
    CustomerPayBillOnline,
}

/// Body of `POST /mpesa/stkpush/v1/processrequest`
#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: TransactionType,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    response_code: String,
    #[serde(rename = "ResponseDescription")]
    response_description: String,
    #[serde(rename = "CustomerMessage")]
    customer_message: String,
}

impl From<StkPushResponse> for PushReceipt {
    fn from(response: StkPushResponse) -> Self {
        PushReceipt {
            merchant_request_id: response.merchant_request_id,
            checkout_request_id: response.checkout_request_id,
            response_code: response.response_code,
            response_description: response.response_description,
            customer_message: response.customer_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHORT_CODE: &str = "174379";
    const PASSKEY: &str = "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919";
    const TOKEN_PATH: &str = "/oauth/v1/generate";
    const PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

    fn config(base_url: &str) -> MpesaConfig {
        MpesaConfig::new(
            "key",
            "secret",
            SHORT_CODE,
            PASSKEY,
            "https://example.com/mpesa/callback",
        )
        .with_api_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
    }

    fn client(server: &MockServer) -> MpesaClient {
        MpesaClient::new(config(&server.uri())).unwrap()
    }

    fn accepted_body() -> Value {
        json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        })
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(query_param("grant_type", "client_credentials"))
            .and(header("Authorization", "Basic a2V5OnNlY3JldA=="))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "tok123", "expires_in": "3599" })),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_build_request_fields() {
        let client = MpesaClient::new(config("http://localhost")).unwrap();
        let at = FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .unwrap();

        let order = PushOrder::new("+254712345678", "150", "LUNARK", "Order payment");
        let request = client.build_request(&order, &at).unwrap();

        assert_eq!(request.timestamp, "20240301093000");
        assert_eq!(
            request.password,
            derive_password(SHORT_CODE, PASSKEY, "20240301093000")
        );
        assert_eq!(request.party_a, "254712345678");
        assert_eq!(request.phone_number, "254712345678");
        assert_eq!(request.party_b, SHORT_CODE);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["TransactionType"], "CustomerPayBillOnline");
        assert_eq!(json["CallBackURL"], "https://example.com/mpesa/callback");
        assert_eq!(json["BusinessShortCode"], SHORT_CODE);
        assert_eq!(json["TransactionDesc"], "Order payment");
    }

    #[tokio::test]
    async fn test_get_access_token() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        let token = client(&server).get_access_token().await.unwrap();
        assert_eq!(token.value, "tok123");
        assert_eq!(token.expires_in.as_deref(), Some("3599"));
        assert_eq!(token.authorization_header(), "Bearer tok123");
        assert!(!format!("{:?}", token).contains("tok123"));
    }

    #[tokio::test]
    async fn test_push_success_returns_fields_as_received() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .and(header("Authorization", "Bearer tok123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted_body()))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client(&server)
            .initiate_push("0712345678", "150", "LUNARK", "Order payment")
            .await
            .unwrap();

        assert_eq!(receipt.merchant_request_id, "29115-34620561-1");
        assert_eq!(receipt.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(receipt.response_code, "0");
        assert_eq!(
            receipt.response_description,
            "Success. Request accepted for processing"
        );
        assert_eq!(
            receipt.customer_message,
            "Success. Request accepted for processing"
        );
        assert!(receipt.is_accepted());

        // The submitted body is signed with the timestamp it carries
        let requests = server.received_requests().await.unwrap();
        let push = requests
            .iter()
            .find(|r| r.url.path() == PUSH_PATH)
            .unwrap();
        let body: Value = serde_json::from_slice(&push.body).unwrap();
        let timestamp = body["Timestamp"].as_str().unwrap();
        assert_eq!(timestamp.len(), 14);

        let password = STANDARD.decode(body["Password"].as_str().unwrap()).unwrap();
        assert_eq!(
            String::from_utf8(password).unwrap(),
            format!("{}{}{}", SHORT_CODE, PASSKEY, timestamp)
        );
        assert_eq!(body["PartyA"], "254712345678");
        assert_eq!(body["PhoneNumber"], "254712345678");
        assert_eq!(body["PartyB"], SHORT_CODE);
        assert_eq!(body["Amount"], "150");
        assert_eq!(body["AccountReference"], "LUNARK");
    }

    #[tokio::test]
    async fn test_token_rejection_skips_push() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted_body()))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .initiate_push("0712345678", "150", "LUNARK", "Order payment")
            .await
            .unwrap_err();

        match err {
            PaymentError::Auth { http_status, body } => {
                assert_eq!(http_status, 401);
                assert_eq!(body, "Invalid credentials");
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_push_server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        let raw = r#"{"requestId":"1-2-3","errorCode":"500.001.1001","errorMessage":"Unable to lock subscriber"}"#;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string(raw))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .initiate_push("254712345678", "150", "LUNARK", "Order payment")
            .await
            .unwrap_err();

        match err {
            PaymentError::Provider { http_status, body } => {
                assert_eq!(http_status, 500);
                assert_eq!(body, raw);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_phone_makes_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .initiate_push("07123", "150", "LUNARK", "Order payment")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Validation(ref m) if m == "invalid phone format"));
    }

    #[tokio::test]
    async fn test_malformed_token_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).get_access_token().await.unwrap_err();
        assert!(matches!(err, PaymentError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        // Nothing listens on the discard port
        let client = MpesaClient::new(config("http://127.0.0.1:9")).unwrap();

        let err = client.check_connection().await.unwrap_err();
        assert!(matches!(err, PaymentError::Network { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_push_timeout_after_token_is_network_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(accepted_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = MpesaClient::new(
            config(&server.uri()).with_timeout(Duration::from_millis(300)),
        )
        .unwrap();

        let err = client
            .initiate_push("0712345678", "150", "LUNARK", "Order payment")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Network { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_mask_msisdn() {
        assert_eq!(mask_msisdn("254712345678"), "*********678");
        assert_eq!(mask_msisdn("78"), "78");
    }

    #[tokio::test]
    async fn test_gateway_trait_dispatch() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted_body()))
            .mount(&server)
            .await;

        let gateway: pay_core::BoxedPushGateway = std::sync::Arc::new(client(&server));
        let order = PushOrder::new("0712345678", "10", "LUNARK", "Order payment");

        let receipt = gateway.initiate_push(&order).await.unwrap();
        assert_eq!(gateway.provider_name(), "mpesa");
        assert_eq!(receipt.response_code, "0");
    }
}
