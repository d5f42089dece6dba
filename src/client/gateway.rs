use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    config::ClientConfig,
    orders::{
        dto::{
            CreateOrderForm, CreateOrderResponse, OrderListResponse, OrderView, StatusResponse,
            UpdateStatusForm, UserOrdersForm,
        },
        OrderStatus,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    /// The server answered `success: false`; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),
}

/// The order endpoints as seen from the app.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, form: &CreateOrderForm)
        -> Result<CreateOrderResponse, GatewayError>;
    async fn list_user_orders(&self, phone_number: &str) -> Result<Vec<OrderView>, GatewayError>;
    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<String, GatewayError>;
}

/// Minimal view of every reply, used to spot `success: false` before
/// decoding the endpoint-specific body.
#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpOrderGateway {
    client: Client,
    base_url: String,
}

impl HttpOrderGateway {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn post_form<F, T>(&self, path: &str, form: &F) -> Result<T, GatewayError>
    where
        F: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(path, %status, bytes = body.len(), "order api replied");

        // Error replies use the same envelope with a non-2xx status.
        if let Ok(env) = serde_json::from_slice::<Envelope>(&body) {
            if !env.success {
                let msg = env
                    .error
                    .or(env.message)
                    .unwrap_or_else(|| format!("request failed with status {}", status));
                warn!(path, %status, reason = %msg, "order api rejected request");
                return Err(GatewayError::Rejected(msg));
            }
        }
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{} (status {})", e, status)))
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    #[instrument(skip(self, form))]
    async fn create_order(
        &self,
        form: &CreateOrderForm,
    ) -> Result<CreateOrderResponse, GatewayError> {
        self.post_form("/orders", form).await
    }

    #[instrument(skip(self))]
    async fn list_user_orders(&self, phone_number: &str) -> Result<Vec<OrderView>, GatewayError> {
        let form = UserOrdersForm {
            phone_number: phone_number.to_string(),
        };
        let res: OrderListResponse = self.post_form("/orders/mine", &form).await?;
        Ok(res.data)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<String, GatewayError> {
        let form = UpdateStatusForm {
            id: id.to_string(),
            status: status.as_str().to_string(),
        };
        let res: StatusResponse = self.post_form("/orders/status", &form).await?;
        Ok(res.message)
    }
}
