//! Constant-product curve primitives
//!
//! Exact `f64` renditions of the marketplace's conversion formulas. The
//! float path and the truncating conversion are part of the contract with
//! the external market; integer closed forms give different results on
//! boundary values and must not be substituted.

use cistern_core::CurrencyAmount;

/// Input-reserve units needed to take `out` units from the output reserve
///
/// Callers must keep `out` below `out_reserve`; the quote layer guards
/// this before reaching the raw formula.
pub fn bancor_input(out_reserve: i64, inp_reserve: i64, out: i64) -> i64 {
    let ob = out_reserve as f64;
    let ib = inp_reserve as f64;

    let inp = ((ib * out as f64) / (ob - out as f64)) as i64;

    if inp < 0 {
        return 0;
    }
    inp
}

/// Output-reserve units received for adding `inp` units to the input reserve
pub fn bancor_output(inp_reserve: i64, out_reserve: i64, inp: i64) -> i64 {
    let ib = inp_reserve as f64;
    let ob = out_reserve as f64;
    let inp = inp as f64;

    let out = ((inp * ob) / (ib + inp)) as i64;

    if out < 0 {
        return 0;
    }
    out
}

/// 0.5% fee, rounded up, carved out of market sales and deposits
pub fn purchase_fee(amount: CurrencyAmount) -> CurrencyAmount {
    (amount + 199) / 200
}
