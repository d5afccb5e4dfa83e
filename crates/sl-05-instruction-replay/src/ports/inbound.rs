//! # Inbound Ports (Driving Ports)

use shared_types::BeaconBlock;

use crate::domain::effects::Effects;
use crate::domain::errors::ReplayResult;

/// Replay API used by shard processing.
pub trait ReplayApi: Send + Sync {
    /// Fold the instructions of `blocks` into a fresh [`Effects`].
    ///
    /// Blocks are processed in ascending height order regardless of input
    /// order. Same input, same output.
    ///
    /// ## Errors
    ///
    /// - `Committee`: epoch committee lookup failed
    /// - `Overflow`: an accumulated amount left `u64`
    /// - `DuplicateHeight`: a height appears twice in `blocks`
    fn replay(&self, blocks: &[BeaconBlock]) -> ReplayResult<Effects>;
}
