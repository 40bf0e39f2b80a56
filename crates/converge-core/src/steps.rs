//! Well-known step identifiers.
//!
//! A step is a named unit of configuration work that runs at most once per
//! convergence pass. The engine only ever hands these ids to a `StepRunner`;
//! what a step actually does is up to the runner.

pub const APT: &str = "apt::default";
pub const BUILD_ESSENTIAL: &str = "build-essential::default";
pub const CLIENT: &str = "mysql::client";
pub const PERCONA_REPO: &str = "mysql::percona_repo";
pub const MARIADB_REPO: &str = "mysql::_mariadb_repo";

/// Prerequisites applied at the start of every pass, in order.
pub const PREREQUISITES: &[&str] = &[APT, BUILD_ESSENTIAL, CLIENT];

pub fn all() -> &'static [&'static str] {
    &[APT, BUILD_ESSENTIAL, CLIENT, PERCONA_REPO, MARIADB_REPO]
}

pub fn is_known(step: &str) -> bool {
    all().contains(&step)
}
