//! Routes: ordered pool paths from an input to an output currency, plus the
//! assembly of candidate routes out of a resolved pool set.

use crate::pool::{Pool, Protocol};
use crate::types::{Currency, CurrencyAmount, QuoteError, Result, TradeKind};
use itertools::Itertools;

/// Call-encoding family a route falls into, derived from the pool-type
/// composition of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    ClassicV2,
    V3,
    InfinityCl,
    InfinityBin,
    /// CL and Bin pools mixed on one path.
    MixedInfinity,
    /// Anything spanning classic/V3 and other families.
    Mixed,
}

/// An ordered pool path routing `amount` from `input` to `output`.
/// Construction validates adjacency; a built `Route` is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pools: Vec<Pool>,
    input: Currency,
    output: Currency,
    amount: CurrencyAmount,
    direction: TradeKind,
}

impl Route {
    pub fn new(
        pools: Vec<Pool>,
        input: Currency,
        output: Currency,
        amount: CurrencyAmount,
        direction: TradeKind,
    ) -> Result<Self> {
        if pools.is_empty() {
            return Err(QuoteError::InvalidRoute("route must contain at least one pool".into()));
        }
        if !pools[0].involves(&input) {
            return Err(QuoteError::InvalidRoute("first pool does not touch the input currency".into()));
        }
        // Walk the path and check every consecutive pair shares a currency.
        let mut hop = input.clone();
        for pool in &pools {
            hop = pool
                .other_currency(&hop)
                .cloned()
                .ok_or_else(|| QuoteError::InvalidRoute("consecutive pools do not share a currency".into()))?;
        }
        if !hop.equals_wrapped(&output) {
            return Err(QuoteError::InvalidRoute("last pool does not reach the output currency".into()));
        }
        Ok(Self { pools, input, output, amount, direction })
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn input(&self) -> &Currency {
        &self.input
    }

    pub fn output(&self) -> &Currency {
        &self.output
    }

    pub fn amount(&self) -> &CurrencyAmount {
        &self.amount
    }

    pub fn direction(&self) -> TradeKind {
        self.direction
    }

    /// Direction as the call encoder sees it: when the trailing currency
    /// equals the wrapped form of the amount's currency the fixed amount is
    /// on the output side.
    pub fn inferred_direction(&self) -> TradeKind {
        if self.output.equals_wrapped(&self.amount.currency) {
            TradeKind::ExactOutput
        } else {
            TradeKind::ExactInput
        }
    }

    /// Encoding family of the path.
    pub fn kind(&self) -> RouteKind {
        let protocols: Vec<Protocol> = self.pools.iter().map(|p| p.protocol()).unique().collect();
        if protocols.len() == 1 {
            return match protocols[0] {
                Protocol::ClassicV2 => RouteKind::ClassicV2,
                Protocol::V3Concentrated => RouteKind::V3,
                Protocol::InfinityCl => RouteKind::InfinityCl,
                Protocol::InfinityBin => RouteKind::InfinityBin,
            };
        }
        if protocols.iter().all(Protocol::is_infinity) {
            RouteKind::MixedInfinity
        } else {
            RouteKind::Mixed
        }
    }

    /// Stable identity of the path, used for tracker dedup and logging.
    pub fn key(&self) -> String {
        self.pools.iter().map(|p| p.id()).join("-")
    }

    pub fn hops(&self) -> usize {
        self.pools.len()
    }
}

/// Assemble candidate routes out of a resolved pool set: direct pools first,
/// then one-intermediate-hop paths. Pools not connectable to the pair are
/// ignored, duplicate paths are dropped.
pub fn build_routes(
    pools: &[Pool],
    input: &Currency,
    output: &Currency,
    amount: &CurrencyAmount,
    direction: TradeKind,
) -> Vec<Route> {
    let mut routes: Vec<Route> = Vec::new();

    // Direct hops.
    for pool in pools {
        if pool.involves(input) && pool.involves(output) {
            if let Ok(route) = Route::new(
                vec![pool.clone()],
                input.clone(),
                output.clone(),
                amount.clone(),
                direction,
            ) {
                routes.push(route);
            }
        }
    }

    // One intermediate hop: input -> mid -> output.
    for first in pools {
        let Some(mid) = first.other_currency(input) else { continue };
        if mid.equals_wrapped(output) {
            continue; // already covered as a direct hop
        }
        for second in pools {
            if second.id() == first.id() {
                continue;
            }
            if !second.involves(mid) || !second.involves(output) {
                continue;
            }
            if let Ok(route) = Route::new(
                vec![first.clone(), second.clone()],
                input.clone(),
                output.clone(),
                amount.clone(),
                direction,
            ) {
                routes.push(route);
            }
        }
    }

    routes.into_iter().unique_by(|r| r.key()).collect()
}
