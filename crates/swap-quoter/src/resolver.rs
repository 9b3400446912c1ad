//! Candidate pool resolution: per-protocol fan-out, TVL annotation, ranking.

use crate::cache::RefStore;
use crate::pool::{Pool, Protocol};
use crate::provider::PoolProvider;
use crate::types::{ChainId, Currency, Result};
use futures::future::join_all;
use futures::FutureExt;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Chain-keyed TVL reference map: pool id (lowercase hex) -> TVL in USD.
pub type TvlMap = Arc<HashMap<String, Decimal>>;

const TVL_CACHE_TTL: Duration = Duration::from_secs(10);
const TVL_CACHE_CAPACITY: usize = 100;

/// Query for one candidate-pool resolution.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub currency_a: Currency,
    pub currency_b: Currency,
    pub chain_id: ChainId,
    pub protocols: Vec<Protocol>,
}

/// Resolves the pool universe for a currency pair across protocol families.
/// A failing family contributes an empty list; the TVL reference is advisory
/// and its absence never drops a pool.
pub struct CandidatePoolResolver {
    provider: Arc<dyn PoolProvider>,
    tvl_store: RefStore<ChainId, TvlMap>,
}

impl CandidatePoolResolver {
    pub fn new(provider: Arc<dyn PoolProvider>) -> Self {
        let tvl_provider = provider.clone();
        let tvl_store = RefStore::new(
            move |chain_id: ChainId| {
                let provider = tvl_provider.clone();
                async move {
                    let references = provider.tvl_reference(chain_id).await?;
                    let mut map = HashMap::with_capacity(references.len());
                    for reference in references {
                        // Unparseable TVL strings read as missing, not fatal.
                        if let Ok(tvl) = Decimal::from_str(&reference.tvl_usd) {
                            map.insert(reference.id.to_lowercase(), tvl);
                        }
                    }
                    Ok(Arc::new(map))
                }
                .boxed()
            },
            TVL_CACHE_TTL,
            TVL_CACHE_CAPACITY,
        );
        Self { provider, tvl_store }
    }

    /// Resolve candidates for `query`: every requested family is queried
    /// concurrently, Infinity families go through the lite path with TVL
    /// annotation, results are deduplicated and ranked by TVL descending.
    pub async fn candidate_pools(&self, query: &CandidateQuery) -> Result<Vec<Pool>> {
        let infinity: Vec<Protocol> =
            query.protocols.iter().copied().filter(Protocol::is_infinity).unique().collect();
        let regular: Vec<Protocol> =
            query.protocols.iter().copied().filter(|p| !p.is_infinity()).unique().collect();

        let regular_fetches = regular.iter().map(|protocol| {
            let protocol = *protocol;
            async move {
                match self
                    .provider
                    .pools(query.chain_id, protocol, &query.currency_a, &query.currency_b)
                    .await
                {
                    Ok(pools) => pools,
                    Err(e) => {
                        warn!(%protocol, chain = query.chain_id, error = %e, "pool source unavailable, family yields no candidates");
                        Vec::new()
                    }
                }
            }
        });

        let (mut pools, infinity_pools) = futures::join!(
            join_all(regular_fetches).map(|per_family| per_family.into_iter().flatten().collect::<Vec<_>>()),
            self.infinity_candidate_pools_lite(query, &infinity),
        );
        pools.extend(infinity_pools);

        let ranked = pools
            .into_iter()
            .filter(|pool| pool.involves(&query.currency_a) || pool.involves(&query.currency_b))
            .unique_by(|pool| pool.id())
            .sorted_by(|a, b| b.tvl_usd().cmp(&a.tvl_usd()))
            .collect();
        Ok(ranked)
    }

    /// Infinity CL/Bin candidates annotated with the cached TVL reference.
    /// TVL absence (missing entry or a failed reference fetch) reads as zero;
    /// it never filters a pool out.
    pub async fn infinity_candidate_pools_lite(
        &self,
        query: &CandidateQuery,
        protocols: &[Protocol],
    ) -> Vec<Pool> {
        if protocols.is_empty() {
            return Vec::new();
        }

        let tvl_map: TvlMap = match self.tvl_store.get_or_fetch(query.chain_id).await {
            Ok(map) => map,
            Err(e) => {
                warn!(chain = query.chain_id, error = %e, "tvl reference unavailable, candidates keep tvl 0");
                Arc::new(HashMap::new())
            }
        };

        let fetches = protocols.iter().map(|protocol| {
            let protocol = *protocol;
            async move {
                match self
                    .provider
                    .pools(query.chain_id, protocol, &query.currency_a, &query.currency_b)
                    .await
                {
                    Ok(pools) => pools,
                    Err(e) => {
                        warn!(%protocol, chain = query.chain_id, error = %e, "pool source unavailable, family yields no candidates");
                        Vec::new()
                    }
                }
            }
        });

        join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .map(|pool| {
                let tvl = tvl_map.get(&pool.id()).copied().unwrap_or(Decimal::ZERO);
                pool.with_tvl(tvl)
            })
            .collect()
    }

    /// Expose the TVL store for observability and tests.
    pub fn tvl_store(&self) -> &RefStore<ChainId, TvlMap> {
        &self.tvl_store
    }
}
