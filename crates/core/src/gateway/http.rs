use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::account::{Account, AccountId};
use crate::models::category::Category;
use crate::models::settings::GatewayConfig;
use crate::models::transaction::{Transaction, TransactionId};

use super::dto::{AccountUpdateRequest, TransactionRequest};
use super::traits::RemoteGateway;

/// REST gateway to the finance server.
///
/// - **Auth**: `Authorization: Bearer <token>` on every request.
/// - **Format**: JSON bodies, decimal amounts as strings, ISO-8601 timestamps.
/// - **Endpoints**: `accounts`, `accounts/{id}`, `transactions`,
///   `transactions/{id}`, `transactions/account/{id}/period`,
///   `categories`, `categories/type/{isIncome}`
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(endpoint))
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
    }

    /// Send a request, check the status and decode a non-empty JSON body.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CoreError> {
        let bytes = self.execute_raw(builder).await?;
        if bytes.is_empty() {
            return Err(CoreError::ProtocolMismatch(
                "empty response body where content was expected".into(),
            ));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::ProtocolMismatch(format!("Failed to decode response: {e}")))
    }

    /// Send a request and return the raw body of a 2xx response.
    async fn execute_raw(&self, builder: RequestBuilder) -> Result<Vec<u8>, CoreError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(CoreError::from_status(status.as_u16(), body));
        }
        Ok(bytes.to_vec())
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T, CoreError> {
        let builder = self.request(method, endpoint).json(body);
        self.execute(builder).await
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_account(&self) -> Result<Account, CoreError> {
        let accounts: Vec<Account> = self.execute(self.request(Method::GET, "accounts")).await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::ProtocolMismatch("server returned no accounts".into()))
    }

    async fn update_account(&self, account: &Account) -> Result<Account, CoreError> {
        let body = AccountUpdateRequest::from(account);
        debug!("PUT accounts/{}", account.id);
        self.send_json(Method::PUT, &format!("accounts/{}", account.id), &body)
            .await
    }

    async fn fetch_transactions(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError> {
        // The server filters by calendar day; exact bounds are applied by the caller.
        let endpoint = format!(
            "transactions/account/{account_id}/period?startDate={}&endDate={}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        );
        self.execute(self.request(Method::GET, &endpoint)).await
    }

    async fn create_transaction(
        &self,
        payload: &TransactionRequest,
    ) -> Result<Transaction, CoreError> {
        self.send_json(Method::POST, "transactions", payload).await
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        payload: &TransactionRequest,
    ) -> Result<Transaction, CoreError> {
        self.send_json(Method::PUT, &format!("transactions/{id}"), payload)
            .await
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), CoreError> {
        // 204 No Content is the normal answer here, so the body is not decoded.
        self.execute_raw(self.request(Method::DELETE, &format!("transactions/{id}")))
            .await
            .map(|_| ())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CoreError> {
        self.execute(self.request(Method::GET, "categories")).await
    }

    async fn fetch_categories_by_direction(
        &self,
        is_income: bool,
    ) -> Result<Vec<Category>, CoreError> {
        self.execute(self.request(Method::GET, &format!("categories/type/{is_income}")))
            .await
    }
}
