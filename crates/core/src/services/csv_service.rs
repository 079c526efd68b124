use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::category::Category;
use crate::models::timestamp;
use crate::models::transaction::Transaction;

/// Column layout shared by import and export.
pub const CSV_HEADER: [&str; 15] = [
    "id",
    "accountId",
    "accountName",
    "accountBalance",
    "accountCurrency",
    "categoryId",
    "categoryName",
    "categoryEmoji",
    "categoryIsIncome",
    "amount",
    "transactionDate",
    "comment",
    "createdAt",
    "updatedAt",
    "userId",
];

/// Import/export of transactions as flat CSV.
pub struct CsvService;

impl CsvService {
    pub fn new() -> Self {
        Self
    }

    /// Parse transactions from CSV text with a header row.
    ///
    /// Rows with the wrong column count or an unparsable field are skipped.
    /// A header with the wrong column count is a `ValidationError`.
    pub fn parse(&self, input: &str) -> Result<Vec<Transaction>, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input.as_bytes());

        let header_len = rdr.headers()?.len();
        if header_len != CSV_HEADER.len() {
            return Err(CoreError::ValidationError(format!(
                "expected {} CSV columns, found {header_len}",
                CSV_HEADER.len()
            )));
        }

        let mut transactions = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let Ok(record) = result else { continue };
            match Self::parse_record(&record) {
                Some(t) => transactions.push(t),
                None => debug!("Skipping malformed CSV row {}", line + 2),
            }
        }
        Ok(transactions)
    }

    /// Write transactions in the same layout `parse` reads.
    pub fn export(&self, transactions: &[Transaction]) -> Result<String, CoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CSV_HEADER)?;
        for t in transactions {
            wtr.write_record([
                t.id.to_string(),
                t.account.id.to_string(),
                t.account.name.clone(),
                t.account.balance.to_string(),
                t.account.currency.clone(),
                t.category.id.to_string(),
                t.category.name.clone(),
                t.category.emoji.to_string(),
                t.category.is_income.to_string(),
                t.amount.to_string(),
                timestamp::format(&t.transaction_date),
                t.comment.clone().unwrap_or_default(),
                timestamp::format(&t.created_at),
                timestamp::format(&t.updated_at),
                t.account.user_id.map(|u| u.to_string()).unwrap_or_default(),
            ])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| CoreError::Serialization(format!("CSV output is not UTF-8: {e}")))
    }

    fn parse_record(record: &csv::StringRecord) -> Option<Transaction> {
        if record.len() != CSV_HEADER.len() {
            return None;
        }
        let date = |i: usize| -> Option<DateTime<Utc>> { timestamp::parse(record.get(i)?.trim()) };
        let decimal = |i: usize| -> Option<Decimal> { record.get(i)?.trim().parse().ok() };

        let account = Account {
            id: record[1].trim().parse().ok()?,
            user_id: record[14].trim().parse().ok(),
            name: record[2].to_string(),
            balance: decimal(3)?,
            currency: record[4].to_string(),
            created_at: None,
            updated_at: None,
        };
        let category = Category {
            id: record[5].trim().parse().ok()?,
            name: record[6].to_string(),
            emoji: record[7].chars().next()?,
            is_income: record[8].trim().parse().ok()?,
        };
        let comment = match record[11].trim() {
            "" => None,
            c => Some(c.to_string()),
        };

        Some(Transaction {
            id: record[0].trim().parse().ok()?,
            account,
            category,
            amount: decimal(9)?,
            transaction_date: date(10)?,
            comment,
            created_at: date(12)?,
            updated_at: date(13)?,
        })
    }
}

impl Default for CsvService {
    fn default() -> Self {
        Self::new()
    }
}
