use std::str::FromStr;
use std::sync::Arc;

use crate::pool::Protocol;
use crate::resolver::{CandidatePoolResolver, CandidateQuery};
use crate::types::{ChainId, Currency};
use alloy_primitives::Address;
use axum::{extract::Query, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Simple JSON schema returned from /health and error cases
#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
}

#[derive(Deserialize)]
struct PoolsParams {
    chain: ChainId,
    token0: String,
    token1: String,
}

#[derive(Serialize)]
struct PoolResp {
    id: String,
    protocol: String,
    tvl_usd: String,
}

#[derive(Serialize)]
struct PoolsResp {
    data: Vec<PoolResp>,
}

pub struct ApiServer {
    resolver: Arc<CandidatePoolResolver>,
}

impl ApiServer {
    pub fn new(resolver: Arc<CandidatePoolResolver>) -> Self {
        Self { resolver }
    }

    pub async fn start(self, addr: &str) -> anyhow::Result<()> {
        let resolver = self.resolver.clone();

        let health_route =
            Router::new().route("/health", get(|| async { Json(HealthResp { status: "ok" }) }));

        // Candidate pools for a pair; decimals are display-only here so the
        // default of 18 is fine for the lookup.
        let pools_route = Router::new().route(
            "/pools",
            get(move |Query(params): Query<PoolsParams>| {
                let resolver = resolver.clone();
                async move {
                    let (Ok(token0), Ok(token1)) =
                        (Address::from_str(&params.token0), Address::from_str(&params.token1))
                    else {
                        return Json(PoolsResp { data: Vec::new() });
                    };
                    let query = CandidateQuery {
                        currency_a: Currency::erc20(params.chain, token0, 18, "token0"),
                        currency_b: Currency::erc20(params.chain, token1, 18, "token1"),
                        chain_id: params.chain,
                        protocols: vec![
                            Protocol::ClassicV2,
                            Protocol::V3Concentrated,
                            Protocol::InfinityCl,
                            Protocol::InfinityBin,
                        ],
                    };
                    let pools = resolver.candidate_pools(&query).await.unwrap_or_default();
                    Json(PoolsResp {
                        data: pools
                            .into_iter()
                            .map(|p| PoolResp {
                                id: p.id(),
                                protocol: p.protocol().to_string(),
                                tvl_usd: p.tvl_usd().to_string(),
                            })
                            .collect(),
                    })
                }
            }),
        );

        let app = health_route.merge(pools_route);

        let addr: std::net::SocketAddr = addr.parse()?;
        tracing::info!(%addr, "starting API server");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}
