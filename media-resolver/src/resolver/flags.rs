use async_trait::async_trait;

use super::error::ResolveResult;

/// When on, video requests resolve to a direct stream URL instead of a download.
pub const DIRECT_STREAM_FLAG: u32 = 1;

#[async_trait]
pub trait FeatureFlags: Send + Sync {
    async fn is_on(&self, flag: u32) -> ResolveResult<bool>;
}
