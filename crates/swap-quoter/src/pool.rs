//! Pool variants across the supported protocol families, plus the subgraph
//! wire shape they are discovered through.

use crate::types::{ChainId, Currency, QuoteError, Result};
use alloy_primitives::{Address, B256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol families the resolver can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "v2")]
    ClassicV2,
    #[serde(rename = "v3")]
    V3Concentrated,
    #[serde(rename = "infinity_cl")]
    InfinityCl,
    #[serde(rename = "infinity_bin")]
    InfinityBin,
}

impl Protocol {
    /// Wire name used in subgraph query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ClassicV2 => "v2",
            Protocol::V3Concentrated => "v3",
            Protocol::InfinityCl => "infinity_cl",
            Protocol::InfinityBin => "infinity_bin",
        }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Protocol::InfinityCl | Protocol::InfinityBin)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered liquidity pool. Identity is immutable once discovered; live
/// state (reserves, ticks, bins) is fetched lazily by the quoter and never
/// stored here. `tvl_usd` on the Infinity variants is an advisory ranking
/// reference, zero when the TVL source was unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum Pool {
    ClassicV2 {
        pair: Address,
        currency0: Currency,
        currency1: Currency,
        fee_bps: u32,
    },
    V3Concentrated {
        address: Address,
        currency0: Currency,
        currency1: Currency,
        fee: u32,
        tick_spacing: i32,
    },
    InfinityCl {
        pool_id: B256,
        currency0: Currency,
        currency1: Currency,
        fee: u32,
        tvl_usd: Decimal,
    },
    InfinityBin {
        pool_id: B256,
        currency0: Currency,
        currency1: Currency,
        bin_step: u16,
        tvl_usd: Decimal,
    },
}

impl Pool {
    pub fn protocol(&self) -> Protocol {
        match self {
            Pool::ClassicV2 { .. } => Protocol::ClassicV2,
            Pool::V3Concentrated { .. } => Protocol::V3Concentrated,
            Pool::InfinityCl { .. } => Protocol::InfinityCl,
            Pool::InfinityBin { .. } => Protocol::InfinityBin,
        }
    }

    pub fn currencies(&self) -> (&Currency, &Currency) {
        match self {
            Pool::ClassicV2 { currency0, currency1, .. }
            | Pool::V3Concentrated { currency0, currency1, .. }
            | Pool::InfinityCl { currency0, currency1, .. }
            | Pool::InfinityBin { currency0, currency1, .. } => (currency0, currency1),
        }
    }

    pub fn involves(&self, currency: &Currency) -> bool {
        let (c0, c1) = self.currencies();
        c0.equals_wrapped(currency) || c1.equals_wrapped(currency)
    }

    /// The currency on the far side of `currency`, if this pool touches it.
    pub fn other_currency(&self, currency: &Currency) -> Option<&Currency> {
        let (c0, c1) = self.currencies();
        if c0.equals_wrapped(currency) {
            Some(c1)
        } else if c1.equals_wrapped(currency) {
            Some(c0)
        } else {
            None
        }
    }

    /// Stable hex identity used for dedup, cache keys and route keys.
    pub fn id(&self) -> String {
        match self {
            Pool::ClassicV2 { pair, .. } => hex::encode(pair.as_slice()),
            Pool::V3Concentrated { address, .. } => hex::encode(address.as_slice()),
            Pool::InfinityCl { pool_id, .. } | Pool::InfinityBin { pool_id, .. } => {
                hex::encode(pool_id.as_slice())
            }
        }
    }

    pub fn tvl_usd(&self) -> Decimal {
        match self {
            Pool::InfinityCl { tvl_usd, .. } | Pool::InfinityBin { tvl_usd, .. } => *tvl_usd,
            // Classic and V3 candidates carry no TVL reference; ranking
            // treats them as zero.
            Pool::ClassicV2 { .. } | Pool::V3Concentrated { .. } => Decimal::ZERO,
        }
    }

    /// Replace the advisory TVL reference on Infinity variants; no-op for the
    /// other families.
    pub fn with_tvl(mut self, tvl: Decimal) -> Self {
        match &mut self {
            Pool::InfinityCl { tvl_usd, .. } | Pool::InfinityBin { tvl_usd, .. } => *tvl_usd = tvl,
            Pool::ClassicV2 { .. } | Pool::V3Concentrated { .. } => {}
        }
        self
    }
}

/// One pool as returned by the subgraph endpoint (`{ "data": [...] }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReference {
    pub id: String,
    pub protocol: Protocol,
    pub token0: TokenReference,
    pub token1: TokenReference,
    #[serde(default)]
    pub fee: u32,
    #[serde(default)]
    pub tick_spacing: i32,
    #[serde(default)]
    pub bin_step: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenReference {
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
}

impl TokenReference {
    fn to_currency(&self, chain_id: ChainId) -> Result<Currency> {
        let address = Address::from_str(&self.address)
            .map_err(|e| QuoteError::Subgraph(format!("bad token address '{}': {e}", self.address)))?;
        Ok(Currency::erc20(chain_id, address, self.decimals, self.symbol.clone()))
    }
}

impl PoolReference {
    /// Convert the wire shape into a typed pool for `chain_id`. Malformed
    /// entries are an error here; the resolver decides whether to skip them.
    pub fn into_pool(self, chain_id: ChainId) -> Result<Pool> {
        let currency0 = self.token0.to_currency(chain_id)?;
        let currency1 = self.token1.to_currency(chain_id)?;
        match self.protocol {
            Protocol::ClassicV2 => {
                let pair = Address::from_str(&self.id)
                    .map_err(|e| QuoteError::Subgraph(format!("bad pair address '{}': {e}", self.id)))?;
                Ok(Pool::ClassicV2 { pair, currency0, currency1, fee_bps: self.fee })
            }
            Protocol::V3Concentrated => {
                let address = Address::from_str(&self.id)
                    .map_err(|e| QuoteError::Subgraph(format!("bad pool address '{}': {e}", self.id)))?;
                Ok(Pool::V3Concentrated {
                    address,
                    currency0,
                    currency1,
                    fee: self.fee,
                    tick_spacing: self.tick_spacing,
                })
            }
            Protocol::InfinityCl => {
                let pool_id = B256::from_str(&self.id)
                    .map_err(|e| QuoteError::Subgraph(format!("bad pool id '{}': {e}", self.id)))?;
                Ok(Pool::InfinityCl { pool_id, currency0, currency1, fee: self.fee, tvl_usd: Decimal::ZERO })
            }
            Protocol::InfinityBin => {
                let pool_id = B256::from_str(&self.id)
                    .map_err(|e| QuoteError::Subgraph(format!("bad pool id '{}': {e}", self.id)))?;
                Ok(Pool::InfinityBin {
                    pool_id,
                    currency0,
                    currency1,
                    bin_step: self.bin_step,
                    tvl_usd: Decimal::ZERO,
                })
            }
        }
    }
}
