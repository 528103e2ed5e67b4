//! Tests for environment-driven configuration.

use crate::{database_url_from_env, Error};

// Single test: DATABASE_URL is process-global state, so the set/unset
// sequence must not run concurrently with itself.
#[test]
fn test_database_url_from_env() {
    std::env::remove_var("DATABASE_URL");
    let err = database_url_from_env().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("DATABASE_URL"));

    std::env::set_var("DATABASE_URL", "postgres://tides@localhost/tides");
    let url = database_url_from_env().unwrap();
    assert_eq!(url, "postgres://tides@localhost/tides");
    std::env::remove_var("DATABASE_URL");
}
