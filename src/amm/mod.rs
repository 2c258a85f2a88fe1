//! AMM primitives: pair ordering, quoting and slippage bounds

pub mod pair;
pub mod quote;
pub mod slippage;

pub use pair::{sort_tokens, TokenPair};
pub use quote::{Quote, QuoteService};
pub use slippage::{min_accepted, with_margin, Fraction, Tolerance};
