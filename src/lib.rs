//! gomod2nix: deterministic Nix dependency hashing for Go modules.
//!
//! Converts a Go module manifest into a sorted list of content-addressed
//! package records (import path, version, NAR SRI hash) so a Nix build can
//! know every dependency's exact content before any network access happens.

pub mod cli;
pub mod download;
pub mod error;
pub mod generate;
pub mod hash;
pub mod logging;
pub mod modfile;
pub mod nar;
pub mod pool;
pub mod schema;
