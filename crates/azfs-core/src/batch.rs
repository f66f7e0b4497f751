//! Reading many objects as one collection

use crate::client::AzFileClient;
use crate::Result;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use tracing::debug;

/// The paths handed to [`AzFileClient::read`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    /// A single URL, globbed when it contains `*`
    One(String),
    /// An explicit list of URLs
    Many(Vec<String>),
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        PathSpec::One(path.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        PathSpec::One(path)
    }
}

impl From<Vec<String>> for PathSpec {
    fn from(paths: Vec<String>) -> Self {
        PathSpec::Many(paths)
    }
}

impl From<&[&str]> for PathSpec {
    fn from(paths: &[&str]) -> Self {
        PathSpec::Many(paths.iter().map(|p| p.to_string()).collect())
    }
}

/// Concatenates the records of several objects in path order.
///
/// Objects are read one after another unless [`BatchReader::parallel`] is
/// enabled; the parallel mode uses the rayon thread pool and keeps the
/// result order.
#[derive(Debug)]
pub struct BatchReader<'a> {
    client: &'a AzFileClient,
    paths: Vec<String>,
    parallel: bool,
}

impl<'a> BatchReader<'a> {
    pub(crate) fn new(client: &'a AzFileClient, paths: Vec<String>) -> Self {
        Self {
            client,
            paths,
            parallel: false,
        }
    }

    /// Read objects concurrently
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The resolved object URLs, in read order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Records of every CSV object
    pub fn csv<T: DeserializeOwned + Send>(&self) -> Result<Vec<T>> {
        self.load_all(|path| self.client.read_csv(path))
    }

    /// Records of every tab-separated object
    pub fn table<T: DeserializeOwned + Send>(&self) -> Result<Vec<T>> {
        self.load_all(|path| self.client.read_table(path))
    }

    /// Elements of every JSON object, each holding an array
    pub fn json<T: DeserializeOwned + Send>(&self) -> Result<Vec<T>> {
        self.load_all(|path| self.client.read_json::<Vec<T>>(path))
    }

    fn load_all<T, F>(&self, load: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&str) -> Result<Vec<T>> + Sync,
    {
        debug!(
            "Reading {} objects ({})",
            self.paths.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let parts: Vec<Vec<T>> = if self.parallel {
            self.paths
                .par_iter()
                .map(|path| load(path.as_str()))
                .collect::<Result<_>>()?
        } else {
            self.paths
                .iter()
                .map(|path| load(path.as_str()))
                .collect::<Result<_>>()?
        };
        Ok(parts.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::InMemoryStoreProvider;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
    }

    const BASE: &str = "https://acct.blob.core.windows.net/c/parts";

    fn seeded() -> AzFileClient {
        let client =
            AzFileClient::with_provider(Arc::new(InMemoryStoreProvider::new()), Config::default());
        for part in 0..4u32 {
            let rows: Vec<Row> = (0..3).map(|i| Row { id: part * 10 + i }).collect();
            client
                .write_csv(&format!("{}/part-{}.csv", BASE, part), &rows)
                .unwrap();
            client
                .write_json(&format!("{}/part-{}.json", BASE, part), &rows)
                .unwrap();
        }
        client
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_glob_path_reads_in_order() {
        let client = seeded();
        let reader = client.read(format!("{}/*.csv", BASE)).unwrap();
        assert_eq!(reader.paths().len(), 4);

        let rows: Vec<Row> = reader.csv().unwrap();
        assert_eq!(
            ids(&rows),
            vec![0, 1, 2, 10, 11, 12, 20, 21, 22, 30, 31, 32]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let client = seeded();
        let sequential: Vec<Row> = client
            .read(format!("{}/*.json", BASE))
            .unwrap()
            .json()
            .unwrap();
        let parallel: Vec<Row> = client
            .read(format!("{}/*.json", BASE))
            .unwrap()
            .parallel(true)
            .json()
            .unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 12);
    }

    #[test]
    fn test_explicit_list() {
        let client = seeded();
        let paths = vec![
            format!("{}/part-3.csv", BASE),
            format!("{}/part-0.csv", BASE),
        ];
        let rows: Vec<Row> = client.read(paths).unwrap().csv().unwrap();
        assert_eq!(ids(&rows), vec![30, 31, 32, 0, 1, 2]);
    }

    #[test]
    fn test_missing_object_fails_the_batch() {
        let client = seeded();
        let paths = vec![format!("{}/part-0.csv", BASE), format!("{}/nope.csv", BASE)];
        let result: Result<Vec<Row>> = client.read(paths).unwrap().parallel(true).csv();
        assert!(matches!(result, Err(crate::Error::NotFound(_))));
    }
}
