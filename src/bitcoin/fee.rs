//! Fee model and balance sufficiency check
//!
//! Sizes follow the legacy P2PKH approximation: 180 bytes per input,
//! 34 bytes per output, 10 bytes of overhead, minus one byte per input.

use bitcoin::Amount;

pub const INPUT_SIZE_BYTES: u64 = 180;
pub const OUTPUT_SIZE_BYTES: u64 = 34;
pub const OVERHEAD_BYTES: u64 = 10;

/// Payment + change
pub const OUTPUT_COUNT: usize = 2;

/// Estimated transaction size in bytes
pub fn transaction_size(input_count: usize, output_count: usize) -> u64 {
    let inputs = input_count as u64;
    let outputs = output_count as u64;

    inputs * INPUT_SIZE_BYTES + outputs * OUTPUT_SIZE_BYTES + OVERHEAD_BYTES - inputs
}

/// Total fee in satoshis for the given shape and rate
pub fn calculate_total_fee(input_count: usize, output_count: usize, sat_per_byte: u64) -> Amount {
    let size = transaction_size(input_count, output_count);
    Amount::from_sat(size.saturating_mul(sat_per_byte))
}

/// Whether `available` covers `amount` plus `fee`
pub fn is_amount_sufficient(available: Amount, amount: Amount, fee: Amount) -> bool {
    match amount.checked_add(fee) {
        Some(required) => available >= required,
        None => false,
    }
}
