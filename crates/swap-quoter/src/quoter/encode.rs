//! Per-family quote call construction. Every route maps to exactly one call
//! descriptor; dispatch is an exhaustive match on the route's kind so a new
//! pool family cannot silently fall through.

use crate::pool::Pool;
use crate::provider::CallRequest;
use crate::route::{Route, RouteKind};
use crate::types::TradeKind;
use alloy_primitives::{Address, Bytes, U256};

/// `quoteExactInput(bytes,uint256)`
const SEL_QUOTE_EXACT_INPUT: [u8; 4] = [0xcd, 0xca, 0x17, 0x53];
/// `quoteExactOutput(bytes,uint256)`
const SEL_QUOTE_EXACT_OUTPUT: [u8; 4] = [0x2f, 0x80, 0xbb, 0x1d];

/// Deployed quoter contracts per pool-type family for one chain.
#[derive(Debug, Clone)]
pub struct QuoterAddresses {
    /// Classic V2 and mixed classic/V3 paths (two-word return layout).
    pub classic: Address,
    pub v3: Address,
    pub infinity_cl: Address,
    pub infinity_bin: Address,
    pub mixed_infinity: Address,
}

/// Which quoter contract answered and in which direction, threaded through
/// to the decoder so the return layout is never inferred from tuple arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteCallKind {
    Classic { exact_out: bool },
    V3 { exact_out: bool },
    InfinityCl { exact_out: bool },
    InfinityBin { exact_out: bool },
    MixedInfinity { exact_out: bool },
}

impl QuoteCallKind {
    pub fn exact_out(&self) -> bool {
        match *self {
            QuoteCallKind::Classic { exact_out }
            | QuoteCallKind::V3 { exact_out }
            | QuoteCallKind::InfinityCl { exact_out }
            | QuoteCallKind::InfinityBin { exact_out }
            | QuoteCallKind::MixedInfinity { exact_out } => exact_out,
        }
    }
}

/// Build the one call descriptor for `route`. Direction follows the route's
/// inferred direction: an amount denominated in the trailing currency means
/// the fixed side is the output.
pub fn encode_quote_call(route: &Route, quoters: &QuoterAddresses) -> (QuoteCallKind, CallRequest) {
    let exact_out = route.inferred_direction() == TradeKind::ExactOutput;
    let (kind, target) = match route.kind() {
        RouteKind::ClassicV2 | RouteKind::Mixed => (QuoteCallKind::Classic { exact_out }, quoters.classic),
        RouteKind::V3 => (QuoteCallKind::V3 { exact_out }, quoters.v3),
        // Single-family CL/Bin exact-input goes to the direct quoter; the
        // exact-output variant and mixed infinity paths use the mixed quoter.
        RouteKind::InfinityCl if !exact_out => (QuoteCallKind::InfinityCl { exact_out }, quoters.infinity_cl),
        RouteKind::InfinityBin if !exact_out => (QuoteCallKind::InfinityBin { exact_out }, quoters.infinity_bin),
        RouteKind::InfinityCl => (QuoteCallKind::InfinityCl { exact_out }, quoters.mixed_infinity),
        RouteKind::InfinityBin => (QuoteCallKind::InfinityBin { exact_out }, quoters.mixed_infinity),
        RouteKind::MixedInfinity => (QuoteCallKind::MixedInfinity { exact_out }, quoters.mixed_infinity),
    };

    let selector = if exact_out { SEL_QUOTE_EXACT_OUTPUT } else { SEL_QUOTE_EXACT_INPUT };
    let path = packed_path(route, exact_out);
    let calldata = encode_path_and_amount(selector, &path, route.amount().raw());

    (kind, CallRequest { target, calldata: Bytes::from(calldata) })
}

/// V3-style packed path: token(20) ++ feeParam(3) ++ token(20) ...; the fee
/// parameter is the fee tier for classic/V3/CL hops and the bin step for Bin
/// hops. Exact-output paths are encoded back-to-front.
fn packed_path(route: &Route, exact_out: bool) -> Vec<u8> {
    let mut hops: Vec<(Address, u32)> = Vec::with_capacity(route.pools().len());
    let mut cursor = route.input().clone();
    for pool in route.pools() {
        let fee_param = match pool {
            Pool::ClassicV2 { fee_bps, .. } => *fee_bps,
            Pool::V3Concentrated { fee, .. } => *fee,
            Pool::InfinityCl { fee, .. } => *fee,
            Pool::InfinityBin { bin_step, .. } => u32::from(*bin_step),
        };
        hops.push((cursor.wrapped_address(), fee_param));
        if let Some(next) = pool.other_currency(&cursor) {
            cursor = next.clone();
        }
    }
    hops.push((route.output().wrapped_address(), 0));

    if exact_out {
        hops.reverse();
    }

    let mut path = Vec::with_capacity(hops.len() * 23);
    let last = hops.len() - 1;
    for (i, (token, fee_param)) in hops.iter().enumerate() {
        path.extend_from_slice(token.as_slice());
        if i < last {
            // uint24 fee parameter of the hop that follows this token.
            let fee = if exact_out { hops[i + 1].1 } else { *fee_param };
            path.extend_from_slice(&fee.to_be_bytes()[1..4]);
        }
    }
    path
}

/// ABI-encode `(bytes path, uint256 amount)` after the 4-byte selector:
/// head = [offset 0x40, amount], tail = [len, padded path bytes].
fn encode_path_and_amount(selector: [u8; 4], path: &[u8], amount: U256) -> Vec<u8> {
    let padded_len = path.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(4 + 64 + 32 + padded_len);
    out.extend_from_slice(&selector);
    out.extend_from_slice(&U256::from(0x40u64).to_be_bytes::<32>());
    out.extend_from_slice(&amount.to_be_bytes::<32>());
    out.extend_from_slice(&U256::from(path.len() as u64).to_be_bytes::<32>());
    out.extend_from_slice(path);
    out.resize(4 + 64 + 32 + padded_len, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, CurrencyAmount};
    use alloy_primitives::B256;

    fn cur(byte: u8, symbol: &str) -> Currency {
        Currency::erc20(1, Address::repeat_byte(byte), 18, symbol)
    }

    fn quoters() -> QuoterAddresses {
        QuoterAddresses {
            classic: Address::repeat_byte(0xc1),
            v3: Address::repeat_byte(0xc3),
            infinity_cl: Address::repeat_byte(0xc5),
            infinity_bin: Address::repeat_byte(0xc6),
            mixed_infinity: Address::repeat_byte(0xc7),
        }
    }

    #[test]
    fn classic_route_targets_classic_quoter() {
        let a = cur(0x01, "A");
        let b = cur(0x02, "B");
        let pool = Pool::ClassicV2 { pair: Address::repeat_byte(0xa0), currency0: a.clone(), currency1: b.clone(), fee_bps: 25 };
        let route = Route::new(vec![pool], a.clone(), b, CurrencyAmount::from_raw(a, 1_000), TradeKind::ExactInput).unwrap();

        let (kind, call) = encode_quote_call(&route, &quoters());
        assert_eq!(kind, QuoteCallKind::Classic { exact_out: false });
        assert_eq!(call.target, Address::repeat_byte(0xc1));
        assert_eq!(&call.calldata[..4], &SEL_QUOTE_EXACT_INPUT);
    }

    #[test]
    fn cl_exact_output_uses_mixed_quoter_and_output_selector() {
        let a = cur(0x01, "A");
        let b = cur(0x02, "B");
        let pool = Pool::InfinityCl {
            pool_id: B256::repeat_byte(0x10),
            currency0: a.clone(),
            currency1: b.clone(),
            fee: 500,
            tvl_usd: Default::default(),
        };
        // Amount denominated in the output currency => exact output.
        let route = Route::new(vec![pool], a, b.clone(), CurrencyAmount::from_raw(b, 1_000), TradeKind::ExactOutput).unwrap();

        let (kind, call) = encode_quote_call(&route, &quoters());
        assert_eq!(kind, QuoteCallKind::InfinityCl { exact_out: true });
        assert_eq!(call.target, Address::repeat_byte(0xc7));
        assert_eq!(&call.calldata[..4], &SEL_QUOTE_EXACT_OUTPUT);
    }

    #[test]
    fn packed_path_is_token_fee_token() {
        let a = cur(0x01, "A");
        let b = cur(0x02, "B");
        let pool = Pool::V3Concentrated {
            address: Address::repeat_byte(0xa3),
            currency0: a.clone(),
            currency1: b.clone(),
            fee: 500,
            tick_spacing: 10,
        };
        let route = Route::new(vec![pool], a.clone(), b.clone(), CurrencyAmount::from_raw(a.clone(), 1), TradeKind::ExactInput).unwrap();

        let path = packed_path(&route, false);
        assert_eq!(path.len(), 20 + 3 + 20);
        assert_eq!(&path[..20], a.wrapped_address().as_slice());
        assert_eq!(&path[20..23], &[0x00, 0x01, 0xf4]); // fee 500 as uint24
        assert_eq!(&path[23..], b.wrapped_address().as_slice());
    }
}
