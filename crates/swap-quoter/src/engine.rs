//! The quote engine: candidate resolution, batched quoting, trace
//! instrumentation and best-order selection behind one entrypoint.

use crate::config::AppConfig;
use crate::loadable::{Fallback, Loadable, RetryCache};
use crate::pool::Protocol;
use crate::provider::OnChainClient;
use crate::quoter::{best_quote, fetch_quotes, QuoteResult, QuoterAddresses};
use crate::resolver::{CandidatePoolResolver, CandidateQuery};
use crate::route::{build_routes, Route};
use crate::tracker::{QuoteTracker, TraceMeta, STAGE_FAIL, STAGE_POOLS_READY, STAGE_SUCCESS};
use crate::types::{ChainId, Currency, CurrencyAmount, QuoteError, Result, TradeKind};
use alloy_primitives::{Address, U256};
use futures::FutureExt;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info};

// 30 gwei, same default the quoter falls back to before the first gas fetch.
const DEFAULT_GAS_PRICE_WEI: u64 = 30_000_000_000;

/// One quote request as the UI hands it over.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub currency_in: Currency,
    pub currency_out: Currency,
    pub amount: CurrencyAmount,
    pub chain_id: ChainId,
    pub protocols: Vec<Protocol>,
    pub direction: TradeKind,
    pub account: Option<Address>,
}

impl QuoteRequest {
    /// Content hash of the request; repeated identical requests share a
    /// trace identity.
    pub fn hash_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.chain_id.hash(&mut hasher);
        self.currency_in.hash(&mut hasher);
        self.currency_out.hash(&mut hasher);
        self.amount.raw.hash(&mut hasher);
        self.direction.hash(&mut hasher);
        self.account.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// The assembled outcome of one quote request. `results[i]` corresponds to
/// `routes[i]`; `None` slots are routes with no quote available.
#[derive(Debug, Clone)]
pub struct TradeQuote {
    pub routes: Vec<Route>,
    pub results: Vec<Option<QuoteResult>>,
    pub best: Option<usize>,
}

impl TradeQuote {
    pub fn best_result(&self) -> Option<(&Route, &QuoteResult)> {
        let i = self.best?;
        match (self.routes.get(i), self.results.get(i)) {
            (Some(route), Some(Some(result))) => Some((route, result)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Orchestrates the quoting pipeline. Owns the only long-lived mutable
/// state (the TVL store inside the resolver and the gas-price retry cache);
/// everything on the request path works on immutable inputs.
pub struct QuoteEngine {
    resolver: CandidatePoolResolver,
    client: Arc<dyn OnChainClient>,
    quoters: QuoterAddresses,
    gas_price: RetryCache<U256>,
}

impl QuoteEngine {
    pub fn new(resolver: CandidatePoolResolver, client: Arc<dyn OnChainClient>, quoters: QuoterAddresses) -> Self {
        let gas_client = client.clone();
        let gas_price = RetryCache::new(
            "gas_price",
            move || {
                let client = gas_client.clone();
                async move { client.gas_price().await }.boxed()
            },
            Fallback::Lazy(Box::new(|| U256::from(DEFAULT_GAS_PRICE_WEI))),
        );
        Self { resolver, client, quoters, gas_price }
    }

    pub fn from_config(config: &AppConfig, resolver: CandidatePoolResolver, client: Arc<dyn OnChainClient>) -> Result<Self> {
        let quoters = config.quoter_addresses()?;
        Ok(Self::new(resolver, client, quoters))
    }

    /// Compute a quote: resolve candidates, build routes, fetch quotes in one
    /// batched multicall, pick the best order. Per-family and per-route
    /// failures degrade to fewer candidates or `None` slots; only
    /// caller-contract violations and batch-level transport failures error.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<TradeQuote> {
        if request.chain_id == 0 {
            return Err(QuoteError::MissingChainId);
        }
        if request.protocols.is_empty() {
            return Err(QuoteError::Config("at least one protocol family is required".into()));
        }

        let tracker = QuoteTracker::new(
            request.hash_key(),
            format!(
                "{:#x}->{:#x}",
                request.currency_in.wrapped_address(),
                request.currency_out.wrapped_address()
            ),
            TraceMeta {
                currency_in: request.currency_in.to_string(),
                currency_out: request.currency_out.to_string(),
                amount: request.amount.raw.to_string(),
                chain_id: request.chain_id,
                account: request.account.map(|a| format!("{a:#x}")),
            },
        );

        let query = CandidateQuery {
            currency_a: request.currency_in.clone(),
            currency_b: request.currency_out.clone(),
            chain_id: request.chain_id,
            protocols: request.protocols.clone(),
        };
        let pools = self.resolver.candidate_pools(&query).await?;
        tracker.track(STAGE_POOLS_READY);
        debug!(candidates = pools.len(), "candidate pools resolved");

        let routes = build_routes(
            &pools,
            &request.currency_in,
            &request.currency_out,
            &request.amount,
            request.direction,
        );
        if routes.is_empty() {
            info!(request = %tracker.request_hash(), "no candidate route connects the pair");
            tracker.track(STAGE_FAIL);
            tracker.report();
            return Ok(TradeQuote { routes: Vec::new(), results: Vec::new(), best: None });
        }

        let results = match fetch_quotes(&routes, self.client.as_ref(), &self.quoters, Some(&tracker)).await {
            Ok(results) => results,
            Err(e) => {
                tracker.track(STAGE_FAIL);
                tracker.report();
                return Err(e);
            }
        };

        let best = best_quote(&routes, &results);
        tracker.track(if best.is_some() { STAGE_SUCCESS } else { STAGE_FAIL });
        tracker.report();

        Ok(TradeQuote { routes, results, best })
    }

    /// Last known gas price, or the built-in default while the first fetch
    /// is still in flight or failing.
    pub fn gas_price_wei(&self) -> U256 {
        self.gas_price.value_or_fallback()
    }

    /// Trigger one gas-price fetch cycle (binaries call this on a timer).
    pub async fn refresh_gas_price(&self) -> Loadable<U256> {
        self.gas_price.refresh().await
    }

    pub fn resolver(&self) -> &CandidatePoolResolver {
        &self.resolver
    }
}
