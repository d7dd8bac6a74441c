//! Keyset pagination over stock records.
//!
//! A page token is the last returned row's sort-key values (sku, available,
//! safety delta), serialized and base64-encoded. Resuming a scan means
//! "rows strictly after `(metric, sku)`" in the active filter's order, so
//! rows inserted or updated ahead of the cursor never shift the next page the
//! way an offset would. The token layout is private to this module.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use stockhold_core::{InventoryError, InventoryResult, Sku, ValueObject};

use crate::stock::StockRecord;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

const TOKEN_VERSION: u8 = 1;

/// Which records count as low stock, and how they are ordered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LowStockFilter {
    /// `available <= threshold`, ordered by `(available, sku)`.
    AvailableAtMost(i64),
    /// `safety_delta < 0`, ordered by `(safety_delta, sku)`.
    BelowSafetyStock,
}

impl LowStockFilter {
    /// Non-positive or absent thresholds fall back to the safety-stock path.
    pub fn from_threshold(threshold: Option<i64>) -> Self {
        match threshold {
            Some(t) if t > 0 => LowStockFilter::AvailableAtMost(t),
            _ => LowStockFilter::BelowSafetyStock,
        }
    }

    pub fn matches(&self, record: &StockRecord) -> bool {
        match self {
            LowStockFilter::AvailableAtMost(t) => record.available() <= *t,
            LowStockFilter::BelowSafetyStock => record.safety_delta() < 0,
        }
    }

    pub fn sort_key<'a>(&self, record: &'a StockRecord) -> (i64, &'a str) {
        let metric = match self {
            LowStockFilter::AvailableAtMost(_) => record.available(),
            LowStockFilter::BelowSafetyStock => record.safety_delta(),
        };
        (metric, record.sku().as_str())
    }

    fn cursor_key<'a>(&self, cursor: &'a StockCursor) -> (i64, &'a str) {
        let metric = match self {
            LowStockFilter::AvailableAtMost(_) => cursor.available,
            LowStockFilter::BelowSafetyStock => cursor.safety_delta,
        };
        (metric, cursor.sku.as_str())
    }

    /// True when `record` sorts strictly after `cursor`.
    pub fn is_after(&self, record: &StockRecord, cursor: &StockCursor) -> bool {
        self.sort_key(record) > self.cursor_key(cursor)
    }
}

/// Sort-key values of the last row of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCursor {
    #[serde(rename = "s")]
    pub sku: Sku,
    #[serde(rename = "a")]
    pub available: i64,
    #[serde(rename = "d")]
    pub safety_delta: i64,
}

impl ValueObject for StockCursor {}

impl StockCursor {
    pub fn from_record(record: &StockRecord) -> Self {
        Self {
            sku: record.sku().clone(),
            available: record.available(),
            safety_delta: record.safety_delta(),
        }
    }

    pub fn encode(&self) -> String {
        let envelope = TokenEnvelope {
            v: TOKEN_VERSION,
            cursor: self.clone(),
        };
        // Serializing plain strings and integers cannot fail.
        let bytes = serde_json::to_vec(&envelope).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(token: &str) -> InventoryResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| InventoryError::invalid_input("malformed page token"))?;
        let envelope: TokenEnvelope = serde_json::from_slice(&bytes)
            .map_err(|_| InventoryError::invalid_input("malformed page token"))?;
        if envelope.v != TOKEN_VERSION {
            return Err(InventoryError::invalid_input(format!(
                "unsupported page token version {}",
                envelope.v
            )));
        }
        Ok(envelope.cursor)
    }
}

#[derive(Serialize, Deserialize)]
struct TokenEnvelope {
    v: u8,
    #[serde(flatten)]
    cursor: StockCursor,
}

/// A bounded, ordered scan request handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockScan {
    pub filter: LowStockFilter,
    pub start_after: Option<StockCursor>,
    pub limit: usize,
}

impl LowStockScan {
    /// Apply the scan to an unordered set of records.
    ///
    /// Store backends without a native ordered index use this directly.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a StockRecord>) -> Vec<StockRecord> {
        let mut selected: Vec<&StockRecord> = records
            .into_iter()
            .filter(|r| self.filter.matches(r))
            .filter(|r| self.start_after.as_ref().is_none_or(|c| self.filter.is_after(r, c)))
            .collect();
        selected.sort_by(|a, b| self.filter.sort_key(a).cmp(&self.filter.sort_key(b)));
        selected.into_iter().take(self.limit).cloned().collect()
    }
}

/// One page of low-stock results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockPage {
    pub items: Vec<StockRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl LowStockPage {
    /// Build a page from up to `page_size + 1` scanned rows.
    ///
    /// The extra row only signals that another page exists; the token is
    /// taken from the last row actually returned.
    pub fn from_rows(mut rows: Vec<StockRecord>, page_size: usize) -> Self {
        if rows.len() <= page_size {
            return Self {
                items: rows,
                next_page_token: None,
            };
        }
        rows.truncate(page_size);
        let next_page_token = rows.last().map(|r| StockCursor::from_record(r).encode());
        Self {
            items: rows,
            next_page_token,
        }
    }
}

/// Resolve a requested page size: absent or zero means `default`, anything
/// else is clamped to `[1, max]`.
pub fn clamp_page_size(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        None | Some(0) => default.clamp(1, max.max(1)),
        Some(n) => n.clamp(1, max.max(1)),
    }
}
