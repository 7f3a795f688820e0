//! aws-names
//!
//! Enumerates the names of AWS resources across profiles, regions and
//! resource types and writes them as CSV rows.

pub mod aws;
pub mod config;
pub mod console;
pub mod driver;
pub mod output;
pub mod progress;
pub mod resource;

/// Version injected at compile time via AWS_NAMES_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AWS_NAMES_VERSION") {
    Some(v) => v,
    None => "dev",
};
