use super::*;

/// Block hash with the most significant byte first, so that leading zero bytes come first.
pub type Digest = [u8; 32];

/// A block under construction for one height.
///
/// A [`MiningPeriod`] owns exactly one template and calls the mutating methods only while holding
/// its job lock, so implementations need no synchronization of their own.
pub trait Template: Clone + Send + Sync + 'static {
    fn height(&self) -> Height;

    /// Rewrites the coinbase so that it encodes `work_unit`.
    fn set_coinbase_work_unit(&mut self, work_unit: WorkUnit);

    /// Recomputes the header merkle root from the current transactions.
    fn update_merkle_root(&mut self);

    /// Serialized header and coinbase sent to workers in a job message.
    fn head_meta(&self) -> Vec<u8>;

    /// Copy of this template with a worker's solution applied.
    fn solve(&self, work_unit: WorkUnit, coinbase_nonce: &CoinbaseNonce, head_nonce: HeadNonce)
    -> Self;

    fn digest(&self) -> Digest;

    fn meets_target(&self) -> bool;
}
