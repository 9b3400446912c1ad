//! Quote result reduction: raw multicall outcomes to typed amounts. Pure,
//! total and idempotent; a failed or undecodable call reduces to `None`.

use crate::provider::CallOutcome;
use crate::quoter::encode::QuoteCallKind;
use crate::route::Route;
use crate::types::{CurrencyAmount, TradeKind};
use alloy_primitives::U256;
use tracing::warn;

/// A usable quote for one route: the resolved amount (output side for
/// exact-input, required input side for exact-output) plus a gas-use
/// estimate from the quoter contract.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    pub amount: CurrencyAmount,
    pub gas_estimate: u64,
}

/// Return-data layout of a quoter family. Threaded explicitly from the
/// encoder; the decoder never infers the layout from what arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnLayout {
    /// `(amount, gasEstimate)`: classic and mixed classic/V3 quoters.
    TwoWord,
    /// `(amount, afterState[], ticksOrBins[], gasEstimate)`: V3 and
    /// Infinity quoters. The head tuple is four words with the gas estimate
    /// last; the two array slots are offsets the reducer ignores.
    FourWordHead,
}

impl QuoteCallKind {
    fn layout(&self) -> ReturnLayout {
        match self {
            QuoteCallKind::Classic { .. } => ReturnLayout::TwoWord,
            QuoteCallKind::V3 { .. }
            | QuoteCallKind::InfinityCl { .. }
            | QuoteCallKind::InfinityBin { .. }
            | QuoteCallKind::MixedInfinity { .. } => ReturnLayout::FourWordHead,
        }
    }
}

/// Reduce one multicall slot into a quote. Never panics and performs no I/O;
/// applying it twice to the same raw outcome yields the same result.
pub fn reduce_quote(kind: QuoteCallKind, route: &Route, outcome: &CallOutcome) -> Option<QuoteResult> {
    let data = match outcome {
        CallOutcome::Success(data) => data,
        CallOutcome::Failure(reason) => {
            warn!(route = %route.key(), %reason, "quote call failed, no quote for this route");
            return None;
        }
    };

    let words = decode_words(data);
    let (amount_raw, gas_word) = match kind.layout() {
        ReturnLayout::TwoWord => {
            if words.len() != 2 {
                warn!(route = %route.key(), words = words.len(), "unexpected two-word quote layout");
                return None;
            }
            (words[0], words[1])
        }
        ReturnLayout::FourWordHead => {
            if words.len() < 4 {
                warn!(route = %route.key(), words = words.len(), "unexpected four-word quote layout");
                return None;
            }
            (words[0], words[3])
        }
    };

    let gas_estimate = match u64::try_from(gas_word) {
        Ok(gas) => gas,
        Err(_) => {
            warn!(route = %route.key(), "gas estimate does not fit u64");
            return None;
        }
    };

    // Exact-input quotes are denominated in the output currency, exact-output
    // quotes in the input currency (the required amount in).
    let currency = match route.inferred_direction() {
        TradeKind::ExactInput => route.output().clone(),
        TradeKind::ExactOutput => route.input().clone(),
    };

    Some(QuoteResult { amount: CurrencyAmount::new(currency, amount_raw), gas_estimate })
}

/// Split return data into 32-byte words; a trailing partial word is dropped
/// as malformed rather than padded.
fn decode_words(data: &[u8]) -> Vec<U256> {
    data.chunks_exact(32).map(U256::from_be_slice).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;
    use crate::route::Route;
    use crate::types::Currency;
    use alloy_primitives::{Address, Bytes};

    fn route() -> Route {
        let a = Currency::erc20(1, Address::repeat_byte(0x01), 18, "A");
        let b = Currency::erc20(1, Address::repeat_byte(0x02), 18, "B");
        let pool = Pool::ClassicV2 { pair: Address::repeat_byte(0xa0), currency0: a.clone(), currency1: b.clone(), fee_bps: 25 };
        Route::new(vec![pool], a.clone(), b, CurrencyAmount::from_raw(a, 1_000), TradeKind::ExactInput).unwrap()
    }

    fn words(values: &[u64]) -> CallOutcome {
        let mut data = Vec::new();
        for v in values {
            data.extend_from_slice(&U256::from(*v).to_be_bytes::<32>());
        }
        CallOutcome::Success(Bytes::from(data))
    }

    #[test]
    fn two_word_layout_reduces_amount_and_gas() {
        let r = route();
        let kind = QuoteCallKind::Classic { exact_out: false };
        let result = reduce_quote(kind, &r, &words(&[2_000, 120_000])).unwrap();
        assert_eq!(result.amount.raw(), U256::from(2_000u64));
        assert_eq!(result.gas_estimate, 120_000);
        assert_eq!(result.amount.currency.symbol, "B");
    }

    #[test]
    fn four_word_layout_takes_gas_from_fourth_word() {
        let r = route();
        let kind = QuoteCallKind::V3 { exact_out: false };
        let result = reduce_quote(kind, &r, &words(&[2_000, 0x80, 0xc0, 95_000])).unwrap();
        assert_eq!(result.amount.raw(), U256::from(2_000u64));
        assert_eq!(result.gas_estimate, 95_000);
    }

    #[test]
    fn failure_and_layout_mismatch_reduce_to_none() {
        let r = route();
        let kind = QuoteCallKind::Classic { exact_out: false };
        assert!(reduce_quote(kind, &r, &CallOutcome::Failure("revert".into())).is_none());
        assert!(reduce_quote(kind, &r, &words(&[1, 2, 3])).is_none());
        assert!(reduce_quote(QuoteCallKind::V3 { exact_out: false }, &r, &words(&[1, 2])).is_none());
    }

    #[test]
    fn reduction_is_idempotent() {
        let r = route();
        let kind = QuoteCallKind::Classic { exact_out: false };
        let outcome = words(&[2_000, 120_000]);
        assert_eq!(reduce_quote(kind, &r, &outcome), reduce_quote(kind, &r, &outcome));
    }
}
