//! Aegis transport status layer.
//!
//! Resolves the real-world status of a trip (delay / cancellation) from an
//! upstream provider, falling back to a deterministic synthetic source when
//! the provider is unavailable. Resolution never fails toward callers.

pub mod error;
pub mod live;
pub mod resolver;
pub mod synthetic;
pub mod traits;

pub use error::StatusError;
pub use live::LiveStatusProvider;
pub use resolver::StatusResolver;
pub use synthetic::SyntheticStatusProvider;
pub use traits::StatusProvider;
