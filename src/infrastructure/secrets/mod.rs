//! Secrets resolution adapters.

pub mod onepassword;

pub use onepassword::OnePasswordResolver;
