//! Sample records used by the CLI.

pub mod account;

pub use account::{Account, AccountMapping};
