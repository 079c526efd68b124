use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Server-assigned account identifier.
pub type AccountId = i64;

/// Name used when the user clears the account name; the server rejects empty names.
pub const DEFAULT_ACCOUNT_NAME: &str = "Main account";

/// A bank account as known to the server.
///
/// `balance` always reflects every transaction the engine considers applied
/// (server-confirmed or still pending). Only the reconciliation engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,

    /// Owner of the account. Omitted by some server responses.
    #[serde(default)]
    pub user_id: Option<i64>,

    pub name: String,

    /// Serialized as a decimal string so no precision is lost on the wire.
    pub balance: Decimal,

    /// ISO currency code (`RUB`, `USD`, `EUR`, ...).
    pub currency: String,

    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Returns a copy with `delta` added to the balance.
    #[must_use]
    pub fn with_delta(&self, delta: Decimal) -> Self {
        Self {
            balance: self.balance + delta,
            ..self.clone()
        }
    }

    /// Display symbol for the account currency (`₽`, `$`, `€`), or the code itself.
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        currency_symbol(&self.currency)
    }
}

/// Map a currency symbol typed by the user to its ISO code. Unknown input is returned unchanged.
#[must_use]
pub fn currency_code(symbol: &str) -> String {
    match symbol.trim() {
        "$" => "USD".to_string(),
        "₽" => "RUB".to_string(),
        "€" => "EUR".to_string(),
        other => other.to_uppercase(),
    }
}

/// Map an ISO currency code to its display symbol.
#[must_use]
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "RUB" => "₽",
        "EUR" => "€",
        other => other,
    }
}
