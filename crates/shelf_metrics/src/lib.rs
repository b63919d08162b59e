//! Shelf Metrics - named counters for catalog activity
//!
//! Counters completely vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use shelf_metrics::Counter;
//!
//! let mut counters = Counter::new();
//! counters.increment("spawned", 1);
//! println!("spawned: {}", counters.get("spawned"));
//! ```

#[cfg(feature = "metrics")]
mod counter;

#[cfg(feature = "metrics")]
pub use counter::Counter;

// ============================================================================
// No-op stub when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn merge(&mut self, _other: &Counter) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ { std::iter::empty() }
}
