//! Common assertions for azfs testing

use azfs_core::Error;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Asserts that two listings hold the same entries, ignoring order
pub fn assert_same_entries<A, E>(actual: &[A], expected: &[E])
where
    A: AsRef<str>,
    E: AsRef<str>,
{
    let actual_set: BTreeSet<&str> = actual.iter().map(|s| s.as_ref()).collect();
    let expected_set: BTreeSet<&str> = expected.iter().map(|s| s.as_ref()).collect();

    assert_eq!(
        actual.len(),
        actual_set.len(),
        "Listing contains duplicates: {:?}",
        actual_set
    );
    assert_eq!(actual_set, expected_set, "Listing mismatch");
}

/// Asserts that an operation failed because the object is missing
pub fn assert_not_found<T: Debug>(result: azfs_core::Result<T>) {
    match result {
        Err(Error::NotFound(_)) => {}
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

/// Asserts that an operation was rejected as an invalid path
pub fn assert_invalid_path<T: Debug>(result: azfs_core::Result<T>) {
    match result {
        Err(Error::InvalidPath(_)) => {}
        other => panic!("Expected InvalidPath, got {:?}", other),
    }
}
