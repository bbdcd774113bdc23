//! Infrastructure Adapters
//!
//! Adapter implementations for the domain ports, following the Port/Adapter
//! (Hexagonal) architecture pattern.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Domain Ports (Traits)      │
//! │        HostResolver          │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │   Adapters (This Module)     │
//! │ SystemResolver │ StaticResolver │
//! └──────────────────────────────┘
//! ```

mod dns;

pub use dns::{StaticResolver, SystemResolver};
