//! Configuration loading, env vars, CLI flags.

use crate::pool::Protocol;
use crate::quoter::QuoterAddresses;
use crate::types::{ChainId, QuoteError, Result};
use alloy_primitives::Address;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use tracing::info;

#[cfg(feature = "cli")]
use clap::Parser;

#[derive(Clone)]
pub struct AppConfig {
    pub subgraph_url: String,
    pub chain_id: ChainId,
    pub protocols: Vec<Protocol>,
    pub quoter_classic: Option<String>,
    pub quoter_v3: Option<String>,
    pub quoter_infinity_cl: Option<String>,
    pub quoter_infinity_bin: Option<String>,
    pub quoter_mixed_infinity: Option<String>,
    pub api_addr: Option<String>,
    pub sell_token_address: Option<String>,
    pub buy_token_address: Option<String>,
    pub sell_amount_raw: Option<u128>,
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub subgraph_url: Option<String>,
    pub chain_id: Option<ChainId>,
    pub protocols: Option<Vec<String>>,
    pub quoter_classic: Option<String>,
    pub quoter_v3: Option<String>,
    pub quoter_infinity_cl: Option<String>,
    pub quoter_infinity_bin: Option<String>,
    pub quoter_mixed_infinity: Option<String>,
    pub api_addr: Option<String>,
    pub sell_token_address: Option<String>,
    pub buy_token_address: Option<String>,
    pub sell_amount_raw: Option<u128>,
}

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliConfig {
    #[arg(long)]
    pub config: Option<String>,
    #[arg(long)]
    pub subgraph_url: Option<String>,
    #[arg(long)]
    pub chain_id: Option<ChainId>,
    /// Comma-separated: v2,v3,infinity_cl,infinity_bin
    #[arg(long)]
    pub protocols: Option<String>,
    #[arg(long)]
    pub quoter_classic: Option<String>,
    #[arg(long)]
    pub quoter_v3: Option<String>,
    #[arg(long)]
    pub quoter_infinity_cl: Option<String>,
    #[arg(long)]
    pub quoter_infinity_bin: Option<String>,
    #[arg(long)]
    pub quoter_mixed_infinity: Option<String>,
    #[arg(long)]
    pub api_addr: Option<String>,
    #[arg(long)]
    pub sell_token: Option<String>,
    #[arg(long)]
    pub buy_token: Option<String>,
    #[arg(long)]
    pub sell_amount_raw: Option<u128>,
}

fn parse_protocols(raw: &str) -> Vec<Protocol> {
    raw.split(',')
        .filter_map(|p| match p.trim() {
            "v2" => Some(Protocol::ClassicV2),
            "v3" => Some(Protocol::V3Concentrated),
            "infinity_cl" => Some(Protocol::InfinityCl),
            "infinity_bin" => Some(Protocol::InfinityBin),
            other => {
                if !other.is_empty() {
                    info!(protocol = other, "ignoring unknown protocol family");
                }
                None
            }
        })
        .collect()
}

fn all_protocols() -> Vec<Protocol> {
    vec![Protocol::ClassicV2, Protocol::V3Concentrated, Protocol::InfinityCl, Protocol::InfinityBin]
}

impl AppConfig {
    pub fn load() -> Self {
        let subgraph_url = env::var("SUBGRAPH_URL")
            .unwrap_or_else(|_| "https://pools.example-indexer.xyz".to_string());
        let chain_id = env::var("CHAIN_ID").ok().and_then(|s| s.parse().ok()).unwrap_or(56);
        let protocols = env::var("PROTOCOLS")
            .ok()
            .map(|s| parse_protocols(&s))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(all_protocols);

        Self {
            subgraph_url,
            chain_id,
            protocols,
            quoter_classic: env::var("QUOTER_CLASSIC").ok(),
            quoter_v3: env::var("QUOTER_V3").ok(),
            quoter_infinity_cl: env::var("QUOTER_INFINITY_CL").ok(),
            quoter_infinity_bin: env::var("QUOTER_INFINITY_BIN").ok(),
            quoter_mixed_infinity: env::var("QUOTER_MIXED_INFINITY").ok(),
            api_addr: env::var("API_ADDR").ok(),
            sell_token_address: env::var("SELL_TOKEN").ok(),
            buy_token_address: env::var("BUY_TOKEN").ok(),
            sell_amount_raw: env::var("SELL_AMOUNT_RAW").ok().and_then(|s| s.parse().ok()),
        }
    }

    #[cfg(feature = "cli")]
    pub fn load_with_cli() -> Self {
        let cli = CliConfig::parse();
        let mut file_config = FileConfig {
            subgraph_url: None,
            chain_id: None,
            protocols: None,
            quoter_classic: None,
            quoter_v3: None,
            quoter_infinity_cl: None,
            quoter_infinity_bin: None,
            quoter_mixed_infinity: None,
            api_addr: None,
            sell_token_address: None,
            buy_token_address: None,
            sell_amount_raw: None,
        };
        if let Some(ref path) = cli.config {
            if let Ok(contents) = std::fs::read_to_string(path) {
                if let Ok(cfg) = toml::from_str::<FileConfig>(&contents) {
                    file_config = cfg;
                }
            }
        }

        let base = Self::load();
        let protocols = cli
            .protocols
            .as_deref()
            .map(parse_protocols)
            .or_else(|| file_config.protocols.map(|p| parse_protocols(&p.join(","))))
            .filter(|p| !p.is_empty())
            .unwrap_or(base.protocols);

        Self {
            subgraph_url: cli.subgraph_url.or(file_config.subgraph_url).unwrap_or(base.subgraph_url),
            chain_id: cli.chain_id.or(file_config.chain_id).unwrap_or(base.chain_id),
            protocols,
            quoter_classic: cli.quoter_classic.or(file_config.quoter_classic).or(base.quoter_classic),
            quoter_v3: cli.quoter_v3.or(file_config.quoter_v3).or(base.quoter_v3),
            quoter_infinity_cl: cli
                .quoter_infinity_cl
                .or(file_config.quoter_infinity_cl)
                .or(base.quoter_infinity_cl),
            quoter_infinity_bin: cli
                .quoter_infinity_bin
                .or(file_config.quoter_infinity_bin)
                .or(base.quoter_infinity_bin),
            quoter_mixed_infinity: cli
                .quoter_mixed_infinity
                .or(file_config.quoter_mixed_infinity)
                .or(base.quoter_mixed_infinity),
            api_addr: cli.api_addr.or(file_config.api_addr).or(base.api_addr),
            sell_token_address: cli.sell_token.or(file_config.sell_token_address).or(base.sell_token_address),
            buy_token_address: cli.buy_token.or(file_config.buy_token_address).or(base.buy_token_address),
            sell_amount_raw: cli.sell_amount_raw.or(file_config.sell_amount_raw).or(base.sell_amount_raw),
        }
    }

    /// Parse the five quoter contract addresses. Missing or malformed
    /// addresses are a configuration error, not a soft failure: quoting
    /// cannot proceed without them.
    pub fn quoter_addresses(&self) -> Result<QuoterAddresses> {
        fn parse(name: &str, value: &Option<String>) -> Result<Address> {
            let raw = value
                .as_deref()
                .ok_or_else(|| QuoteError::Config(format!("{name} quoter address not configured")))?;
            Address::from_str(raw)
                .map_err(|e| QuoteError::Config(format!("bad {name} quoter address '{raw}': {e}")))
        }

        Ok(QuoterAddresses {
            classic: parse("classic", &self.quoter_classic)?,
            v3: parse("v3", &self.quoter_v3)?,
            infinity_cl: parse("infinity_cl", &self.quoter_infinity_cl)?,
            infinity_bin: parse("infinity_bin", &self.quoter_infinity_bin)?,
            mixed_infinity: parse("mixed_infinity", &self.quoter_mixed_infinity)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_protocols_skips_unknown_families() {
        let parsed = parse_protocols("v2, v3,bogus,infinity_cl,");
        assert_eq!(parsed, vec![Protocol::ClassicV2, Protocol::V3Concentrated, Protocol::InfinityCl]);
    }

    #[test]
    fn quoter_addresses_require_all_families() {
        let mut config = AppConfig {
            subgraph_url: "http://localhost".into(),
            chain_id: 56,
            protocols: all_protocols(),
            quoter_classic: Some("0x0101010101010101010101010101010101010101".into()),
            quoter_v3: Some("0x0202020202020202020202020202020202020202".into()),
            quoter_infinity_cl: Some("0x0303030303030303030303030303030303030303".into()),
            quoter_infinity_bin: Some("0x0404040404040404040404040404040404040404".into()),
            quoter_mixed_infinity: None,
            api_addr: None,
            sell_token_address: None,
            buy_token_address: None,
            sell_amount_raw: None,
        };
        assert!(config.quoter_addresses().is_err());
        config.quoter_mixed_infinity = Some("0x0505050505050505050505050505050505050505".into());
        assert!(config.quoter_addresses().is_ok());
    }
}
