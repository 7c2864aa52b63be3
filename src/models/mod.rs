//! Data models module
//!
//! Contains the data structures shared by every analysis stage:
//! - Parsed transaction records and semantic fields
//! - Payment tiers
//! - Canonical date keys

pub mod date_key;
pub mod record;
pub mod tier;

pub use date_key::DateKey;
pub use record::{CellValue, Field, Record};
pub use tier::{PaymentTier, TierBucket};
