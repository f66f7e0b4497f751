//! End-to-end client behavior over in-memory storage

use azfs_core::{Config, Error, ObjectKind};
use azfs_testing::assertions::{assert_invalid_path, assert_not_found, assert_same_entries};
use azfs_testing::fixtures::{self, PEOPLE_CSV};
use azfs_testing::{TestDir, TestStorage};
use serde::Deserialize;

#[derive(Debug, PartialEq, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

#[test]
fn test_ls_collapses_nested_content() {
    let storage = TestStorage::new();
    fixtures::seed_listing_tree(&storage).unwrap();

    for base in [storage.blob_url(""), storage.dfs_url("")] {
        let names = storage.client().ls(&base, false).unwrap();
        assert_same_entries(&names, &["test1.csv", "test2.csv", "dir/"]);
    }
}

#[test]
fn test_ls_attach_prefix() {
    let storage = TestStorage::new();
    fixtures::seed_listing_tree(&storage).unwrap();

    let names = storage.client().ls(&storage.dfs_url(""), true).unwrap();
    assert_same_entries(
        &names,
        &[
            storage.dfs_url("test1.csv"),
            storage.dfs_url("test2.csv"),
            storage.dfs_url("dir/"),
        ],
    );
}

#[test]
fn test_ls_lists_marked_directories() {
    let storage = TestStorage::new();
    let client = storage.client();
    client.mkdir(&storage.dfs_url("data")).unwrap();
    client.mkdir(&storage.dfs_url("data/empty")).unwrap();
    storage.seed(&storage.dfs_url("data/a.csv"), PEOPLE_CSV).unwrap();

    let names = client.ls(&storage.dfs_url("data"), false).unwrap();
    assert_same_entries(&names, &["empty/", "a.csv"]);
}

#[test]
fn test_glob_star_does_not_cross_segments() {
    let storage = TestStorage::new();
    fixtures::seed_glob_tree(&storage).unwrap();
    let client = storage.client();

    for url in [TestStorage::blob_url, TestStorage::dfs_url] {
        let matched = client.glob(&url(&storage, "root/*.csv")).unwrap();
        assert_eq!(matched, vec![url(&storage, "root/a.csv")]);

        let matched = client.glob(&url(&storage, "root/*/*.csv")).unwrap();
        assert_eq!(matched, vec![url(&storage, "root/sub/c.csv")]);
    }
}

#[test]
fn test_glob_dataset_layout() {
    let storage = TestStorage::new();
    fixtures::seed_dataset_tree(&storage).unwrap();
    let client = storage.client();

    let matched = client.glob(&storage.blob_url("root_folder/*.csv")).unwrap();
    assert_same_entries(
        &matched,
        &[
            storage.blob_url("root_folder/test1.csv"),
            storage.blob_url("root_folder/test2.csv"),
        ],
    );

    let matched = client.glob(&storage.dfs_url("root_folder/test1.*")).unwrap();
    assert_same_entries(
        &matched,
        &[
            storage.dfs_url("root_folder/test1.csv"),
            storage.dfs_url("root_folder/test1.json"),
        ],
    );

    let matched = client.glob(&storage.blob_url("root_folder/*/*.csv")).unwrap();
    assert_eq!(matched.len(), 4);

    let matched = client.glob(&storage.blob_url("root_folder/dir1/*.csv")).unwrap();
    assert_same_entries(
        &matched,
        &[
            storage.blob_url("root_folder/dir1/test1.csv"),
            storage.blob_url("root_folder/dir1/test2.csv"),
        ],
    );
}

#[test]
fn test_glob_rejections() {
    let storage = TestStorage::new();
    let client = storage.client();

    assert_invalid_path(client.glob(&storage.blob_url("*")));
    assert_invalid_path(client.glob(&storage.dfs_url("*")));
    assert_invalid_path(client.glob(&storage.blob_url("root_folder/test1.csv")));
    assert!(matches!(
        client.glob("https://testazfs.queue.core.windows.net/q/root/*"),
        Err(Error::UnsupportedBackend(_))
    ));
}

#[test]
fn test_round_trip_on_both_backends() {
    let storage = TestStorage::new();
    let client = storage.client();
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    for url in [storage.blob_url("bin/a.bin"), storage.dfs_url("bin/b.bin")] {
        client.put(&url, payload.clone()).unwrap();
        assert_eq!(client.get(&url).unwrap().as_ref(), payload.as_slice());
        assert_eq!(
            client.get_range(&url, Some(100), Some(5)).unwrap().as_ref(),
            &payload[100..105]
        );
    }
}

#[test]
fn test_exists_and_remove_twice() {
    let storage = TestStorage::new();
    let client = storage.client();

    for url in [storage.blob_url("test1.csv"), storage.dfs_url("test3.csv")] {
        storage.seed(&url, PEOPLE_CSV).unwrap();
        assert!(client.exists(&url).unwrap());

        client.remove(&url).unwrap();
        assert!(!client.exists(&url).unwrap());
        assert_not_found(client.remove(&url));
        assert_not_found(client.get(&url));
    }
}

#[test]
fn test_copy_overwrite_rules() {
    let storage = TestStorage::new();
    let client = storage.client();
    let src = storage.blob_url("src.csv");
    let dst = storage.dfs_url("copies/dst.csv");
    storage.seed(&src, PEOPLE_CSV).unwrap();
    storage.seed(&dst, b"old").unwrap();

    assert!(matches!(
        client.copy(&src, &dst, false),
        Err(Error::AlreadyExists(_))
    ));
    client.copy(&src, &dst, true).unwrap();
    assert_eq!(client.get(&dst).unwrap().as_ref(), PEOPLE_CSV);
}

#[test]
fn test_stat_classification() {
    let storage = TestStorage::new();
    let client = storage.client();
    storage.seed(&storage.blob_url("dir/a.csv"), PEOPLE_CSV).unwrap();
    client.mkdir(&storage.dfs_url("marked")).unwrap();

    let info = client.stat(&storage.blob_url("dir/a.csv")).unwrap();
    assert_eq!(info.kind, ObjectKind::File);
    assert_eq!(info.size, PEOPLE_CSV.len() as u64);
    assert_eq!(info.name, "dir/a.csv");

    let info = client.stat(&storage.dfs_url("marked")).unwrap();
    assert_eq!(info.kind, ObjectKind::Directory);

    // The marker is Data Lake metadata; Blob storage never reports directories.
    let info = client.stat(&storage.blob_url("marked")).unwrap();
    assert_ne!(info.kind, ObjectKind::Directory);

    assert_not_found(client.stat(&storage.blob_url("dir")));
    assert_eq!(
        client.stat(&storage.dfs_url("dir")).unwrap().kind,
        ObjectKind::Directory
    );
}

#[test]
fn test_invalid_paths_fail_before_io() {
    let storage = TestStorage::new();
    let client = storage.client();

    assert_invalid_path(client.get("https://testazfs.blob.core.windows.net"));
    assert_invalid_path(client.put("https://example.com/c/a.csv", "x"));
    assert_invalid_path(client.stat(&storage.blob_url("")));
}

#[test]
fn test_read_csv_from_gz_and_batch() {
    let storage = TestStorage::new();
    let client = storage.client();
    fixtures::seed_dataset_tree(&storage).unwrap();

    let packed = azfs_core::Compression::Gzip.compress(PEOPLE_CSV).unwrap();
    storage.seed(&storage.blob_url("gz/people.csv.gz"), &packed).unwrap();
    let people: Vec<Person> = client.read_csv(&storage.blob_url("gz/people.csv.gz")).unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0], Person { name: "alice".to_string(), age: 30 });

    let all: Vec<Person> = client
        .read(storage.blob_url("root_folder/*/*.csv"))
        .unwrap()
        .csv()
        .unwrap();
    assert_eq!(all.len(), 8);
}

#[test]
fn test_parallel_reads_from_config() {
    let mut config = Config::default();
    config.read.parallel = true;
    let storage = TestStorage::with_config(config);
    fixtures::seed_dataset_tree(&storage).unwrap();

    let people: Vec<Person> = storage
        .client()
        .read(storage.dfs_url("root_folder/*.csv"))
        .unwrap()
        .csv()
        .unwrap();
    assert_eq!(people.len(), 4);
}

#[test]
fn test_upload_local_file() {
    let storage = TestStorage::new();
    let dir = TestDir::new().unwrap();
    let local = dir.create_file("people.csv", PEOPLE_CSV).unwrap();

    let url = storage.blob_url("uploads/people.csv");
    storage
        .client()
        .put(&url, std::fs::read(&local).unwrap())
        .unwrap();
    assert_eq!(storage.client().size(&url).unwrap(), PEOPLE_CSV.len() as u64);
}

#[test]
fn test_listed_names_address_their_objects() {
    let storage = TestStorage::new();
    let client = storage.client();
    storage
        .seed(&storage.blob_url("root/data[1].csv"), PEOPLE_CSV)
        .unwrap();
    storage
        .seed(&storage.blob_url("root/100% {raw}.csv"), PEOPLE_CSV)
        .unwrap();

    for url in [TestStorage::blob_url, TestStorage::dfs_url] {
        let listed = client.ls(&url(&storage, "root"), true).unwrap();
        assert_same_entries(
            &listed,
            &[url(&storage, "root/data[1].csv"), url(&storage, "root/100% {raw}.csv")],
        );
        for entry in &listed {
            assert_eq!(client.get(entry).unwrap().as_ref(), PEOPLE_CSV);
        }

        let matched = client.glob(&url(&storage, "root/*.csv")).unwrap();
        assert_eq!(matched.len(), 2);
        for entry in &matched {
            assert_eq!(client.stat(entry).unwrap().size, PEOPLE_CSV.len() as u64);
        }

        let literal = client.glob(&url(&storage, "root/data[1]*")).unwrap();
        assert_eq!(literal, vec![url(&storage, "root/data[1].csv")]);
    }
}

#[test]
fn test_range_overflow_is_invalid_argument() {
    let storage = TestStorage::new();
    let url = storage.blob_url("a.bin");
    storage.seed(&url, b"abc").unwrap();

    assert!(matches!(
        storage.client().get_range(&url, Some(usize::MAX), Some(2)),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_ls_missing_directory() {
    let storage = TestStorage::new();
    fixtures::seed_listing_tree(&storage).unwrap();
    let client = storage.client();

    assert_not_found(client.ls(&storage.dfs_url("missing"), false));
    assert!(client.ls(&storage.blob_url("missing"), false).unwrap().is_empty());
}
