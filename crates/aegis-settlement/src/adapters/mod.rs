//! Ledger and rail adapters.

pub mod escrow;
