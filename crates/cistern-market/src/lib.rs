//! # Cistern Market
//!
//! Bancor-style pricing for the storage resource that backs drops.
//!
//! The external marketplace holds two reserves (resource bytes and settlement
//! currency) on a constant-product curve. This crate reproduces the
//! marketplace's arithmetic so quotes computed here match what the market
//! contract will actually charge: the formulas run in `f64` and truncate,
//! digit for digit.
//!
//! ```text
//!       buy:  currency_in  = C·b / (R − b), then / 0.995      (fee on top)
//!      sell:  currency_out = b·C / (R + b), minus 0.5%        (rounded up)
//!   deposit:  bytes_out    = q'·R / (C + q'), q' = q − fee(q)
//! ```

pub mod bancor;
pub mod quotes;
pub mod reserves;

pub use bancor::*;
pub use quotes::*;
pub use reserves::*;
