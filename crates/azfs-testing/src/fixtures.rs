//! Common storage trees for azfs testing

use crate::TestStorage;
use anyhow::Result;

/// Objects of the directory-listing tree, relative to the container
pub const LISTING_TREE: [&str; 3] = ["test1.csv", "test2.csv", "dir/nested.csv"];

/// Objects of the glob tree, relative to the container
pub const GLOB_TREE: [&str; 3] = ["root/a.csv", "root/b.json", "root/sub/c.csv"];

/// A folder with files at two depths, mirroring a typical dataset layout
pub const DATASET_TREE: [&str; 7] = [
    "root_folder/test1.csv",
    "root_folder/test2.csv",
    "root_folder/test1.json",
    "root_folder/dir1/test1.csv",
    "root_folder/dir1/test2.csv",
    "root_folder/dir2/test1.csv",
    "root_folder/dir2/test2.csv",
];

/// Header and rows shared by CSV fixtures
pub const PEOPLE_CSV: &[u8] = b"name,age\nalice,30\nbob,25\n";

/// Seed `names` through `url_for`, each object holding [`PEOPLE_CSV`]
pub fn seed_tree(
    storage: &TestStorage,
    names: &[&str],
    url_for: impl Fn(&TestStorage, &str) -> String,
) -> Result<()> {
    for name in names {
        storage.seed(&url_for(storage, name), PEOPLE_CSV)?;
    }
    Ok(())
}

/// Seed [`LISTING_TREE`] through Blob URLs
pub fn seed_listing_tree(storage: &TestStorage) -> Result<()> {
    seed_tree(storage, &LISTING_TREE, TestStorage::blob_url)
}

/// Seed [`GLOB_TREE`] through Blob URLs
pub fn seed_glob_tree(storage: &TestStorage) -> Result<()> {
    seed_tree(storage, &GLOB_TREE, TestStorage::blob_url)
}

/// Seed [`DATASET_TREE`] through Blob URLs
pub fn seed_dataset_tree(storage: &TestStorage) -> Result<()> {
    seed_tree(storage, &DATASET_TREE, TestStorage::blob_url)
}
