//! Re-amortized linear release.
//!
//! Every settlement recomputes the rate from the stream's *current*
//! `remaining` and *current* remaining duration, so missed intervals turn
//! into a larger catch-up release and the stream reaches exactly zero at
//! `end` no matter how irregularly it is settled. There is no stored
//! per-second rate.
//!
//! All arithmetic is integer-only with u128 intermediates.

use drip_core::types::Stream;

/// Amount a settlement of `stream` at `now` would release.
///
/// ```text
/// elapsed            = now - last_settlement
/// remaining_duration = max(end - last_settlement, elapsed)
/// release            = remaining                                   if remaining_duration == elapsed
///                      floor(remaining * elapsed / remaining_duration)  otherwise
/// ```
///
/// Returns 0 for a drained stream or when `now` is not after the last
/// settlement. Never returns more than `remaining`.
pub fn release_amount(stream: &Stream, now: u64) -> u64 {
    if stream.remaining == 0 || now <= stream.last_settlement {
        return 0;
    }

    let elapsed = now - stream.last_settlement;
    let remaining_duration = stream.end.saturating_sub(stream.last_settlement).max(elapsed);

    // At or past the end: drain exactly.
    if remaining_duration == elapsed {
        return stream.remaining;
    }

    // u64 * u64 always fits in u128.
    let scaled = stream.remaining as u128 * elapsed as u128 / remaining_duration as u128;
    u64::try_from(scaled).unwrap_or(stream.remaining).min(stream.remaining)
}

/// Settle `stream` at `now`, returning the released amount.
///
/// A zero release leaves the stream untouched, including
/// `last_settlement`, so the elapsed window keeps growing until a
/// settlement is large enough to move at least one unit.
pub fn settle(stream: &mut Stream, now: u64) -> u64 {
    let amount = release_amount(stream, now);
    if amount > 0 {
        stream.remaining -= amount;
        stream.last_settlement = now;
    }
    amount
}
