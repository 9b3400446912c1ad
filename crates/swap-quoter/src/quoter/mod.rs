//! Multicall quote batching: one call descriptor per route, one batched
//! round trip, order-preserving reduction with partial-failure tolerance.

pub mod decode;
pub mod encode;

pub use decode::{reduce_quote, QuoteResult};
pub use encode::{encode_quote_call, QuoteCallKind, QuoterAddresses};

use crate::provider::{CallRequest, OnChainClient};
use crate::route::Route;
use crate::tracker::QuoteTracker;
use crate::types::{Result, TradeKind};
use tracing::debug;

/// Fetch quotes for `routes` in one batched multicall. The returned vector
/// has exactly one slot per input route, in input order; a route whose call
/// failed holds `None`, which callers must read as "no quote available for
/// this route", not as a pipeline failure. Only a failure of the batch
/// itself (transport-level) is an error.
pub async fn fetch_quotes(
    routes: &[Route],
    client: &dyn OnChainClient,
    quoters: &QuoterAddresses,
    tracker: Option<&QuoteTracker>,
) -> Result<Vec<Option<QuoteResult>>> {
    if routes.is_empty() {
        return Ok(Vec::new());
    }

    let mut kinds: Vec<QuoteCallKind> = Vec::with_capacity(routes.len());
    let mut calls: Vec<CallRequest> = Vec::with_capacity(routes.len());
    for route in routes {
        let (kind, call) = encode_quote_call(route, quoters);
        kinds.push(kind);
        calls.push(call);
    }
    debug!(routes = routes.len(), "issuing batched quote multicall");

    let outcomes = client.multicall(&calls, true).await?;

    let results: Vec<Option<QuoteResult>> = routes
        .iter()
        .zip(kinds.iter())
        .zip(outcomes.iter())
        .enumerate()
        .map(|(i, ((route, kind), outcome))| {
            let result = reduce_quote(*kind, route, outcome);
            if let Some(t) = tracker {
                // The stage name carries the batch slot so one route's
                // outcome never overwrites another's on a shared tracker.
                match &result {
                    Some(_) => t.track(&format!("{}_{i}", crate::tracker::STAGE_POOL_SUCCESS)),
                    None => t.track(&format!("{}_{i}", crate::tracker::STAGE_POOL_ERROR)),
                }
            }
            result
        })
        .collect();

    // The zip above silently truncates if the client misbehaved; surface
    // that as a contract violation instead of returning a short vector.
    if results.len() != routes.len() {
        return Err(crate::types::QuoteError::Provider(format!(
            "multicall returned {} results for {} calls",
            results.len(),
            routes.len()
        )));
    }
    Ok(results)
}

/// Pick the best order among returned amounts: the largest output for
/// exact-input trades, the smallest required input for exact-output trades.
/// Gas estimate breaks ties (cheaper wins). Returns the winning route index.
pub fn best_quote(routes: &[Route], results: &[Option<QuoteResult>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, result) in results.iter().enumerate() {
        let Some(candidate) = result else { continue };
        let Some(route) = routes.get(i) else { continue };
        let Some(best_idx) = best else {
            best = Some(i);
            continue;
        };
        let incumbent = match &results[best_idx] {
            Some(q) => q,
            None => {
                best = Some(i);
                continue;
            }
        };
        let better = match route.inferred_direction() {
            TradeKind::ExactInput => match candidate.amount.raw().cmp(&incumbent.amount.raw()) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => candidate.gas_estimate < incumbent.gas_estimate,
                std::cmp::Ordering::Less => false,
            },
            TradeKind::ExactOutput => match candidate.amount.raw().cmp(&incumbent.amount.raw()) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => candidate.gas_estimate < incumbent.gas_estimate,
                std::cmp::Ordering::Greater => false,
            },
        };
        if better {
            best = Some(i);
        }
    }
    best
}
