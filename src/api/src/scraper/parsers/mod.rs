//! HTML parsers for netkeiba.com pages.

pub mod refund;

pub use refund::RefundParser;
