use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The slice of the checkout session the redirect flow needs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Creates checkout sessions for the fixed monthly Pro subscription
/// ($10/month). The payment provider owns the rest of the flow; this client
/// only initiates sessions, no webhooks or entitlement tracking.
#[derive(Clone)]
pub struct Billing {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl Billing {
    pub fn new(secret_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub async fn create_checkout_session(&self) -> Result<CheckoutSession> {
        let result_url = format!("{}result?session_id={{CHECKOUT_SESSION_ID}}", self.base_url);
        let params = [
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][product_data][name]", "Pro subscription"),
            ("line_items[0][price_data][unit_amount]", "1000"),
            ("line_items[0][price_data][recurring][interval]", "month"),
            ("line_items[0][price_data][recurring][interval_count]", "1"),
            ("line_items[0][quantity]", "1"),
            ("success_url", result_url.as_str()),
            ("cancel_url", result_url.as_str()),
        ];

        let response = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "checkout session creation returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))
    }
}
