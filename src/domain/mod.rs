//! Domain Layer
//!
//! Ports (trait abstractions) for the few external effects the Galera core
//! depends on. Infrastructure adapters in [`crate::adapters`] implement them.
//!
//! # Usage
//!
//! ```ignore
//! use galera_operator::adapters::SystemResolver;
//! use galera_operator::galera::address;
//!
//! let ip = address::node_address("mariadb-galera-1", &spec, &SystemResolver).await?;
//! ```

pub mod ports;

pub use ports::HostResolver;
