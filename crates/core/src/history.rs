//! Replay history: argument vectors recorded per config file.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::file_handling::{get_history, write_history};

/// Recorded argument vectors, keyed by config path, oldest first.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct History(IndexMap<String, Vec<Vec<String>>>);

impl History {
    /// Finds the newest entry for `path` that starts with `query`.
    ///
    /// An empty query matches the most recent entry.
    #[must_use]
    pub fn lookup(&self, path: &str, query: &[String]) -> Option<&Vec<String>> {
        self.0
            .get(path)?
            .iter()
            .rev()
            .find(|entry| entry.starts_with(query))
    }

    /// Records `entry` for `path` unless it repeats the most recent entry.
    pub fn append(&mut self, path: &str, entry: Vec<String>) {
        let entries = self.0.entry(path.to_string()).or_default();

        if entries.last() == Some(&entry) {
            debug!("Not recording duplicate history entry for `{path}`");
            return;
        }

        entries.push(entry);
    }

    /// Keeps only the newest `limit` entries of every path.
    pub fn truncate(&mut self, limit: usize) {
        for entries in self.0.values_mut() {
            if entries.len() > limit {
                entries.drain(..entries.len() - limit);
            }
        }
        self.0.retain(|_, entries| !entries.is_empty());
    }

    #[must_use]
    pub fn entries(&self, path: &str) -> &[Vec<String>] {
        self.0.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// Where history is loaded from and saved to.
pub trait HistoryStore {
    /// # Errors
    ///
    /// Returns an error if stored history exists but can't be read.
    fn load(&self) -> Result<History>;

    /// # Errors
    ///
    /// Returns an error if the history can't be persisted.
    fn save(&self, history: &History) -> Result<()>;
}

impl<H: HistoryStore + ?Sized> HistoryStore for Box<H> {
    fn load(&self) -> Result<History> {
        (**self).load()
    }

    fn save(&self, history: &History) -> Result<()> {
        (**self).save(history)
    }
}

/// History kept in a YAML file.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    pub path: String,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<History> {
        get_history(&self.path)
    }

    fn save(&self, history: &History) -> Result<()> {
        debug!("Writing history to `{}`", self.path);
        write_history(&self.path, history)
    }
}

/// Used when history is disabled: nothing is read and nothing is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledHistoryStore;

impl HistoryStore for DisabledHistoryStore {
    fn load(&self) -> Result<History> {
        Ok(History::default())
    }

    fn save(&self, _history: &History) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn sample() -> History {
        let mut history = History::default();
        history.append("/a.yml", args("deploy web -env=staging"));
        history.append("/a.yml", args("deploy db -env=prod"));
        history.append("/a.yml", args("build"));
        history.append("/b.yml", args("other"));
        history
    }

    #[test]
    fn test_lookup_prefers_newest_match() {
        let history = sample();
        assert_eq!(
            history.lookup("/a.yml", &args("deploy")),
            Some(&args("deploy db -env=prod"))
        );
        assert_eq!(
            history.lookup("/a.yml", &args("deploy web")),
            Some(&args("deploy web -env=staging"))
        );
    }

    #[test]
    fn test_lookup_empty_query_returns_latest() {
        assert_eq!(sample().lookup("/a.yml", &[]), Some(&args("build")));
    }

    #[test]
    fn test_lookup_is_per_path_and_elementwise() {
        let history = sample();
        assert_eq!(history.lookup("/c.yml", &[]), None);
        // `dep` is not an element prefix of `deploy`
        assert_eq!(history.lookup("/a.yml", &args("dep")), None);
        // Query longer than every entry
        assert_eq!(
            history.lookup("/a.yml", &args("build now please")),
            None
        );
    }

    #[test]
    fn test_append_skips_repeat_of_latest() {
        let mut history = History::default();
        history.append("/a.yml", args("build"));
        history.append("/a.yml", args("build"));
        assert_eq!(history.entries("/a.yml").len(), 1);

        history.append("/a.yml", args("test"));
        history.append("/a.yml", args("build"));
        assert_eq!(history.entries("/a.yml").len(), 3);
    }

    #[test]
    fn test_truncate_keeps_newest() {
        let mut history = sample();
        history.truncate(1);
        assert_eq!(history.entries("/a.yml"), &[args("build")]);
        assert_eq!(history.entries("/b.yml"), &[args("other")]);

        history.truncate(0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_reads_path_keyed_yaml() {
        let history: History = serde_yaml::from_str(
            r#"
/a.yml:
  - [deploy, "-env=prod"]
  - [build]
"#,
        )
        .unwrap();
        assert_eq!(history.entries("/a.yml").len(), 2);
        assert_eq!(history.lookup("/a.yml", &args("deploy")), Some(&args("deploy -env=prod")));
    }

    #[test]
    fn test_disabled_store() {
        let store = DisabledHistoryStore;
        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("history.yml");
        let store = FileHistoryStore::new(path.to_str().unwrap());

        assert!(store.load().unwrap().is_empty());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }
}
