use anyhow::Result;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use swap_quoter::config::AppConfig;
use swap_quoter::pool::Pool;
use swap_quoter::provider::SubgraphProvider;
use swap_quoter::resolver::{CandidatePoolResolver, CandidateQuery};
use swap_quoter::route::build_routes;
use swap_quoter::types::{Currency, CurrencyAmount, TradeKind};

// Format a route path as "pool-id (protocol)" segments.
fn format_route_pools(pools: &[Pool]) -> String {
    pools
        .iter()
        .map(|p| format!("{} ({})", &p.id()[..8.min(p.id().len())], p.protocol()))
        .collect::<Vec<String>>()
        .join(" -> ")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // CLI args > config file > env vars.
    let config = AppConfig::load_with_cli();

    let sell_token_str = config
        .sell_token_address
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--sell-token is required"))?;
    let buy_token_str = config
        .buy_token_address
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--buy-token is required"))?;
    let sell_amount_raw = config
        .sell_amount_raw
        .ok_or_else(|| anyhow::anyhow!("--sell-amount-raw is required"))?;

    let sell_token = Address::from_str(&sell_token_str)
        .map_err(|e| anyhow::anyhow!("invalid sell token '{sell_token_str}': {e}"))?;
    let buy_token = Address::from_str(&buy_token_str)
        .map_err(|e| anyhow::anyhow!("invalid buy token '{buy_token_str}': {e}"))?;

    let currency_in = Currency::erc20(config.chain_id, sell_token, 18, "SELL");
    let currency_out = Currency::erc20(config.chain_id, buy_token, 18, "BUY");
    let amount = CurrencyAmount::from_raw(currency_in.clone(), sell_amount_raw);

    let provider = Arc::new(SubgraphProvider::new(config.subgraph_url.clone()));
    let resolver = CandidatePoolResolver::new(provider);

    let query = CandidateQuery {
        currency_a: currency_in.clone(),
        currency_b: currency_out.clone(),
        chain_id: config.chain_id,
        protocols: config.protocols.clone(),
    };
    let pools = resolver.candidate_pools(&query).await?;

    println!("Candidate pools for {sell_token_str} -> {buy_token_str} (chain {}):", config.chain_id);
    for pool in &pools {
        println!("  {} protocol={} tvlUSD={}", pool.id(), pool.protocol(), pool.tvl_usd());
    }

    let routes = build_routes(&pools, &currency_in, &currency_out, &amount, TradeKind::ExactInput);
    println!("\n{} candidate route(s):", routes.len());
    for route in &routes {
        println!("  [{} hop] {}", route.hops(), format_route_pools(route.pools()));
    }

    if routes.is_empty() {
        println!("No route found for this pair.");
    }
    Ok(())
}
