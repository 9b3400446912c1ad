//! Seams to the outside world: the batched on-chain client and the
//! subgraph/indexer pool source.

use crate::pool::{Pool, PoolReference, Protocol};
use crate::types::{ChainId, Currency, QuoteError, Result};
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// One read call inside a batch: a target contract plus raw calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub target: Address,
    pub calldata: Bytes,
}

/// Per-call result of a batched multicall with allow-failure semantics.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    Success(Bytes),
    Failure(String),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }
}

/// Opaque batched on-chain read capability. Implementations own transport,
/// timeout and retry policy; the pipeline treats a timeout like any other
/// per-call failure.
#[async_trait]
pub trait OnChainClient: Send + Sync {
    /// Issue all calls in one round trip. With `allow_failure` a failed call
    /// becomes a `CallOutcome::Failure` in its slot; result order matches
    /// input order. The returned vector always has `calls.len()` entries.
    async fn multicall(&self, calls: &[CallRequest], allow_failure: bool) -> Result<Vec<CallOutcome>>;

    /// Single unbatched read.
    async fn call(&self, call: &CallRequest) -> Result<Bytes>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<U256>;
}

/// Source of candidate pools for one protocol family.
#[async_trait]
pub trait PoolProvider: Send + Sync {
    async fn pools(
        &self,
        chain_id: ChainId,
        protocol: Protocol,
        currency_a: &Currency,
        currency_b: &Currency,
    ) -> Result<Vec<Pool>>;

    /// Chain-wide TVL reference: pool id -> TVL in USD, as decimal strings.
    async fn tvl_reference(&self, chain_id: ChainId) -> Result<Vec<TvlReference>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvlReference {
    pub id: String,
    #[serde(rename = "tvlUSD")]
    pub tvl_usd: String,
}

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    data: Vec<PoolReference>,
}

#[derive(Debug, Deserialize)]
struct TvlResponse {
    data: Vec<TvlReference>,
}

/// HTTP pool source backed by the subgraph/indexer endpoint. Best-effort: a
/// non-200 response is a soft failure (empty result), transport errors are
/// surfaced for the resolver to downgrade.
pub struct SubgraphProvider {
    client: reqwest::Client,
    base_url: String,
}

impl SubgraphProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl PoolProvider for SubgraphProvider {
    async fn pools(
        &self,
        chain_id: ChainId,
        protocol: Protocol,
        currency_a: &Currency,
        currency_b: &Currency,
    ) -> Result<Vec<Pool>> {
        let url = format!("{}/pools", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("chain", chain_id.to_string()),
                ("protocol", protocol.as_str().to_string()),
                ("token0", format!("{:#x}", currency_a.wrapped_address())),
                ("token1", format!("{:#x}", currency_b.wrapped_address())),
            ])
            .send()
            .await
            .map_err(|e| QuoteError::Subgraph(format!("pool query failed: {e}")))?;

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), %protocol, "subgraph returned non-200, treating as empty");
            return Ok(Vec::new());
        }

        let body: PoolsResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Subgraph(format!("pool response decode failed: {e}")))?;

        let mut pools = Vec::with_capacity(body.data.len());
        for reference in body.data {
            match reference.into_pool(chain_id) {
                Ok(pool) => pools.push(pool),
                // A malformed entry must not sink the rest of the family.
                Err(e) => debug!(error = %e, "skipping malformed pool reference"),
            }
        }
        Ok(pools)
    }

    async fn tvl_reference(&self, chain_id: ChainId) -> Result<Vec<TvlReference>> {
        let url = format!("{}/tvl", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("chain", chain_id.to_string())])
            .send()
            .await
            .map_err(|e| QuoteError::Subgraph(format!("tvl query failed: {e}")))?;

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "tvl endpoint returned non-200, treating as empty");
            return Ok(Vec::new());
        }

        let body: TvlResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Subgraph(format!("tvl response decode failed: {e}")))?;
        Ok(body.data)
    }
}
