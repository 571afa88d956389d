//! Transaction context: who is calling, when, and with how much native value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, TxId};

/// Environment of one logical transaction.
///
/// All engine operations are deterministic functions of their arguments and
/// this context; nothing reads the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub tx_id: TxId,
    pub caller: Address,
    /// Unix seconds. Drives interest accrual and offer expiry.
    pub timestamp: u64,
    /// Block height. Drives auctions and oracle freshness.
    pub block_number: u64,
    /// Native currency attached to the call.
    pub value: u128,
}

impl TxContext {
    #[must_use]
    pub fn new(caller: Address, timestamp: u64, block_number: u64) -> Self {
        Self {
            tx_id: TxId::new(),
            caller,
            timestamp,
            block_number,
            value: 0,
        }
    }

    /// Same context with native `value` attached.
    #[must_use]
    pub fn with_value(self, value: u128) -> Self {
        Self { value, ..self }
    }

    /// Block timestamp as a calendar time, for logs and event records.
    #[must_use]
    pub fn block_time(&self) -> DateTime<Utc> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
