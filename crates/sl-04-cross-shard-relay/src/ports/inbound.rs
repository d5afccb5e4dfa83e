//! # Inbound Ports (Driving Ports)

use shared_types::{BlockHeight, ShardId};

use crate::domain::entities::RelayBatch;
use crate::domain::errors::RelayResult;

/// Relay API used by shard-block production.
pub trait CrossShardRelayApi: Send + Sync {
    /// Accepted payloads from `from_shard` for `to_shard` above `start_height`.
    ///
    /// ## Errors
    ///
    /// - `Storage` / `Source`: lookup failed, nothing delivered
    /// - `Checkpoint` (fatal variants only): committee tables corrupt
    fn get_relay_batch(&self, from_shard: ShardId, to_shard: ShardId, start_height: BlockHeight) -> RelayResult<RelayBatch>;
}
