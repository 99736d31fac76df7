//! Versioned booking snapshot stored in `appointment_meta.extra`.

use serde::{Deserialize, Serialize};

use crate::aggregation::{BookingTotals, ServiceLineItem};
use crate::client_match::ClientContact;
use crate::error::CoreError;
use crate::types::Money;

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u16 = 1;

fn legacy_version() -> u16 {
    1
}

/// Denormalized copy of the request's client and money fields at write time.
///
/// Never recomputed; every create/update replaces it. Untagged blobs written
/// before versioning are read as version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    #[serde(default = "legacy_version")]
    pub version: u16,
    #[serde(default)]
    pub client: Option<ClientContact>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub prepaid: Money,
    #[serde(default)]
    pub full_price: Money,
    /// Remaining amount to collect (`final_price - prepaid`).
    #[serde(default, alias = "final_price")]
    pub balance: Money,
    #[serde(default)]
    pub services: Option<Vec<ServiceLineItem>>,
}

impl BookingSnapshot {
    pub fn from_totals(client: Option<ClientContact>, totals: &BookingTotals) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            client,
            quantity: totals.quantity,
            discount: totals.discount,
            prepaid: totals.prepaid,
            full_price: totals.full_price,
            balance: totals.balance,
            services: totals.lines.clone(),
        }
    }

    /// Decode a stored blob, rejecting versions this build does not know.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        let snapshot: Self = serde_json::from_value(value)
            .map_err(|e| CoreError::Internal(format!("Malformed booking snapshot: {e}")))?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(CoreError::Internal(format!(
                "Unsupported booking snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of plain data with string keys cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
