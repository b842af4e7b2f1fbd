//! Replay protection for cheques.
//!
//! Each channel, identified by its verification key and tag, has a highest
//! redeemed index. A cheque is only paid if its index is strictly above it.
//! The index is claimed before the payment is attempted and never released,
//! so a failed payment cannot be retried with the same cheque.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::AdaptorError;
use crate::types::{Tag, VerificationKey};

/// Identifies a payment channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    /// Key the channel's cheques are signed with.
    pub verification_key: VerificationKey,
    /// Channel tag.
    pub tag: Tag,
}

/// Storage for the highest redeemed index per channel.
pub trait RedemptionLedger: Send + Sync {
    /// Atomically records `index` as redeemed on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::ChequeReplayed`] if `index` is not greater than
    /// the highest index already redeemed on the channel.
    fn claim(&self, channel: &ChannelKey, index: u64) -> Result<(), AdaptorError>;
}

/// Process-local ledger. Forgets everything on restart.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    highest: DashMap<ChannelKey, u64>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RedemptionLedger for InMemoryLedger {
    fn claim(&self, channel: &ChannelKey, index: u64) -> Result<(), AdaptorError> {
        match self.highest.entry(channel.clone()) {
            Entry::Occupied(mut entry) => {
                let highest = *entry.get();
                if index <= highest {
                    return Err(AdaptorError::ChequeReplayed { index, highest });
                }
                entry.insert(index);
            }
            Entry::Vacant(entry) => {
                entry.insert(index);
            }
        }
        Ok(())
    }
}
