//! Built-in diagnostic modules.
//!
//! Each module pairs a collector with a pure scorer and owns a serde
//! configuration struct whose defaults are the stock thresholds.

pub mod accessibility;
pub mod dependencies;
pub mod dns_tls;
pub mod js_css;
pub mod performance;
pub mod pwa;
pub mod security;
pub mod seo;
pub mod sri;
pub mod storage;

/// Byte limit for a kilobyte option. Thresholds come from user config, so
/// huge values clamp to `u64::MAX` instead of overflowing.
pub(crate) fn kb_to_bytes(kb: u64) -> u64 {
    kb.saturating_mul(1000)
}

/// Sum of byte counts reported by the page or a server, clamped at
/// `u64::MAX`.
pub(crate) fn total_bytes(sizes: impl IntoIterator<Item = u64>) -> u64 {
    sizes.into_iter().fold(0, u64::saturating_add)
}
