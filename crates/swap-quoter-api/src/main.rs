use std::sync::Arc;

use swap_quoter::api::ApiServer;
use swap_quoter::config::AppConfig;
use swap_quoter::provider::SubgraphProvider;
use swap_quoter::resolver::CandidatePoolResolver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = AppConfig::load();
    let addr = config.api_addr.clone().unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let provider = Arc::new(SubgraphProvider::new(config.subgraph_url.clone()));
    let resolver = Arc::new(CandidatePoolResolver::new(provider));

    ApiServer::new(resolver).start(&addr).await
}
