//! Common types, enums, error handling, data models.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

pub type ChainId = u64;

/// Common error type for the swap-quoter system.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("subgraph error: {0}")]
    Subgraph(String),
    #[error("cache fetch failed: {0}")]
    CacheFetch(String),
    #[error("invalid route: {0}")]
    InvalidRoute(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("chain id is required for this request")]
    MissingChainId,
    #[error("amount overflow")]
    AmountOverflow,
}

pub type Result<T> = std::result::Result<T, QuoteError>;

/// Trade direction: whether the fixed amount sits on the input or output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    ExactInput,
    ExactOutput,
}

/// Native-asset marker vs a plain ERC-20 address. The native variant carries
/// the wrapped form so direction inference never needs a chain lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyKind {
    Native { wrapped: Address },
    Erc20 { address: Address },
}

/// On-chain asset identity. Equality and hashing consider `(chain_id, kind)`
/// only; `decimals` and `symbol` are display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub chain_id: ChainId,
    pub kind: CurrencyKind,
    pub decimals: u8,
    pub symbol: String,
}

impl Currency {
    pub fn erc20(chain_id: ChainId, address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self { chain_id, kind: CurrencyKind::Erc20 { address }, decimals, symbol: symbol.into() }
    }

    pub fn native(chain_id: ChainId, wrapped: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self { chain_id, kind: CurrencyKind::Native { wrapped }, decimals, symbol: symbol.into() }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, CurrencyKind::Native { .. })
    }

    /// The ERC-20 address quoting contracts operate on: the wrapped form for
    /// the native asset, the token address otherwise.
    pub fn wrapped_address(&self) -> Address {
        match self.kind {
            CurrencyKind::Native { wrapped } => wrapped,
            CurrencyKind::Erc20 { address } => address,
        }
    }

    /// Same asset modulo wrapping, on the same chain.
    pub fn equals_wrapped(&self, other: &Currency) -> bool {
        self.chain_id == other.chain_id && self.wrapped_address() == other.wrapped_address()
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.kind == other.kind
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.chain_id)
    }
}

/// A currency plus an integer raw amount. Immutable; arithmetic produces new
/// instances and never goes through floating point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub raw: U256,
}

impl CurrencyAmount {
    pub fn new(currency: Currency, raw: U256) -> Self {
        Self { currency, raw }
    }

    pub fn from_raw(currency: Currency, raw: u128) -> Self {
        Self { currency, raw: U256::from(raw) }
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn checked_add(&self, other: &CurrencyAmount) -> Result<CurrencyAmount> {
        if self.currency != other.currency {
            return Err(QuoteError::InvalidRoute("cannot add amounts of different currencies".into()));
        }
        let raw = self.raw.checked_add(other.raw).ok_or(QuoteError::AmountOverflow)?;
        Ok(CurrencyAmount::new(self.currency.clone(), raw))
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.raw, self.currency.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_equality_ignores_display_metadata() {
        let a = Currency::erc20(1, Address::repeat_byte(0xaa), 18, "WETH");
        let b = Currency::erc20(1, Address::repeat_byte(0xaa), 6, "weth-mislabeled");
        assert_eq!(a, b);
        let c = Currency::erc20(56, Address::repeat_byte(0xaa), 18, "WETH");
        assert_ne!(a, c);
    }

    #[test]
    fn native_wraps_to_configured_address() {
        let wrapped = Address::repeat_byte(0x11);
        let native = Currency::native(1, wrapped, 18, "ETH");
        assert!(native.is_native());
        assert_eq!(native.wrapped_address(), wrapped);
        let erc = Currency::erc20(1, wrapped, 18, "WETH");
        assert!(native.equals_wrapped(&erc));
        assert_ne!(native, erc);
    }

    #[test]
    fn amount_addition_is_checked() {
        let cur = Currency::erc20(1, Address::repeat_byte(0x01), 18, "T");
        let a = CurrencyAmount::from_raw(cur.clone(), 100);
        let b = CurrencyAmount::from_raw(cur.clone(), 23);
        assert_eq!(a.checked_add(&b).unwrap().raw(), U256::from(123u64));

        let other = Currency::erc20(1, Address::repeat_byte(0x02), 18, "U");
        let c = CurrencyAmount::from_raw(other, 1);
        assert!(a.checked_add(&c).is_err());
    }
}
