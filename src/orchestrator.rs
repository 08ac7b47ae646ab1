//! Repository-wide blame: annotate many files concurrently and merge them
//!
//! Files are annotated on a dedicated rayon pool sized to the configured
//! concurrency limit. The first failing file aborts the whole run.

use crate::backend::VcsBackend;
use crate::error::{BlameError, Result};
use crate::types::RepositoryBlame;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Whether `path` contains any of the ignore substrings
pub fn is_ignored(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| path.contains(pattern.as_str()))
}

/// Annotate `files` at `revision` and merge the results
///
/// Empty paths and paths matching `ignore_patterns` are skipped. At most
/// `max_concurrency` files are annotated at once (a limit of 0 is treated
/// as 1). Commits shared between files are stored once.
pub fn blame_files<B: VcsBackend + ?Sized>(
    backend: &B,
    repo: &Path,
    revision: &str,
    files: &[String],
    ignore_patterns: &[String],
    max_concurrency: usize,
) -> Result<RepositoryBlame> {
    let start = Instant::now();

    let selected: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|path| !path.is_empty() && !is_ignored(path, ignore_patterns))
        .collect();

    tracing::info!(
        "Blaming {} of {} files in {} at {} ({} backend, {} workers)",
        selected.len(),
        files.len(),
        repo.display(),
        revision,
        backend.kind(),
        max_concurrency.max(1)
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_concurrency.max(1))
        .thread_name(|i| format!("charblame-worker-{}", i))
        .build()
        .map_err(|e| BlameError::other(format!("Failed to build worker pool: {}", e)))?;

    let merged = Mutex::new(RepositoryBlame::default());
    let done = AtomicUsize::new(0);
    let total = selected.len();

    pool.install(|| {
        selected.par_iter().try_for_each(|path| -> Result<()> {
            let blame = backend.annotate_file(repo, path, revision).map_err(|e| {
                tracing::warn!("Failed to blame {}: {}", path, e);
                e
            })?;

            let mut repo_blame = merged
                .lock()
                .map_err(|_| BlameError::other("Blame merge lock poisoned"))?;
            repo_blame.insert_file(*path, blame);
            drop(repo_blame);

            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(
                "[{}/{} {:.1}%] Blamed {}",
                n,
                total,
                n as f64 / total as f64 * 100.0,
                path
            );
            Ok(())
        })
    })?;

    let blame = merged
        .into_inner()
        .map_err(|_| BlameError::other("Blame merge lock poisoned"))?;

    tracing::info!(
        "Blamed {} files ({} hunks, {} commits) in {:?}",
        blame.file_count(),
        blame.total_hunks(),
        blame.commits.len(),
        start.elapsed()
    );

    Ok(blame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::error::{ParseError, QueryError};
    use crate::types::{Author, Commit, FileBlame, Hunk};
    use chrono::DateTime;
    use std::collections::HashMap;

    /// Backend serving canned per-file blame
    struct MockBackend {
        files: HashMap<String, FileBlame>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockBackend {
        fn new(files: HashMap<String, FileBlame>) -> Self {
            Self {
                files,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl VcsBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Git
        }

        fn list_files(&self, _repo: &Path, _revision: &str) -> Result<Vec<String>> {
            let mut files: Vec<String> = self.files.keys().cloned().collect();
            files.sort();
            Ok(files)
        }

        fn annotate_file(&self, _repo: &Path, path: &str, _revision: &str) -> Result<FileBlame> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| ParseError::EmptyOutput(path.to_string()).into())
        }
    }

    fn commit(id: &str, name: &str) -> Commit {
        Commit {
            id: id.to_string(),
            author: Author::new(name, format!("{}@example.com", name)),
            message: format!("commit {}", id),
            author_date: DateTime::parse_from_rfc3339("2014-03-01T12:00:00+00:00").unwrap(),
        }
    }

    fn file(segments: &[(&str, usize)], commits: &[Commit]) -> FileBlame {
        let mut hunks = Vec::new();
        let mut offset = 0;
        for (i, (id, len)) in segments.iter().enumerate() {
            hunks.push(Hunk {
                commit_id: id.to_string(),
                line_start: i,
                line_end: i + 1,
                char_start: offset,
                char_end: offset + len,
            });
            offset += len;
        }
        FileBlame {
            hunks,
            commits: commits.iter().map(|c| (c.id.clone(), c.clone())).collect(),
        }
    }

    fn two_files_sharing_a_commit() -> HashMap<String, FileBlame> {
        let c1 = commit("c1", "alice");
        let c2 = commit("c2", "bob");
        let c3 = commit("c3", "carol");
        HashMap::from([
            ("f1".to_string(), file(&[("c1", 10), ("c2", 5)], &[c1.clone(), c2])),
            ("f2".to_string(), file(&[("c1", 3), ("c3", 7)], &[c1, c3])),
        ])
    }

    #[test]
    fn test_is_ignored() {
        let patterns = vec!["vendor/".to_string(), ".min.js".to_string()];
        assert!(is_ignored("third_party/vendor/x.c", &patterns));
        assert!(is_ignored("static/app.min.js", &patterns));
        assert!(!is_ignored("src/main.rs", &patterns));
        assert!(!is_ignored("anything", &[]));
    }

    #[test]
    fn test_merges_files_and_dedups_commits() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let files = backend.list_files(Path::new("."), "HEAD").unwrap();

        let blame = blame_files(&backend, Path::new("."), "HEAD", &files, &[], 4).unwrap();

        assert_eq!(blame.file_count(), 2);
        assert_eq!(blame.hunks["f1"].len(), 2);
        assert_eq!(blame.hunks["f2"].len(), 2);

        let mut ids: Vec<&String> = blame.commits.keys().collect();
        ids.sort();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        // Every hunk references a known commit.
        for hunks in blame.hunks.values() {
            for hunk in hunks {
                assert!(blame.commits.contains_key(&hunk.commit_id));
            }
        }
    }

    #[test]
    fn test_default_annotate_repository_uses_list_files() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let blame = backend
            .annotate_repository(Path::new("."), "HEAD", &["f2".to_string()], 2)
            .unwrap();

        assert_eq!(blame.file_count(), 1);
        assert!(blame.hunks.contains_key("f1"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_skips_empty_and_ignored_paths() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let files = vec![String::new(), "f1".to_string(), "f2".to_string()];

        let blame = blame_files(&backend, Path::new("."), "HEAD", &files, &["2".to_string()], 2).unwrap();

        assert_eq!(blame.file_count(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_error_aborts_run() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let files = vec!["f1".to_string(), "missing".to_string(), "f2".to_string()];

        let err = blame_files(&backend, Path::new("."), "HEAD", &files, &[], 1).unwrap_err();
        assert!(matches!(err, BlameError::Parse(ParseError::EmptyOutput(ref p)) if p == "missing"));
    }

    #[test]
    fn test_respects_concurrency_limit() {
        let mut files = HashMap::new();
        for i in 0..16 {
            files.insert(format!("file{}", i), file(&[("c1", 1)], &[commit("c1", "alice")]));
        }
        let backend = MockBackend::new(files);
        let paths = backend.list_files(Path::new("."), "HEAD").unwrap();

        let blame = blame_files(&backend, Path::new("."), "HEAD", &paths, &[], 2).unwrap();

        assert_eq!(blame.file_count(), 16);
        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_zero_concurrency_runs_serially() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let files = backend.list_files(Path::new("."), "HEAD").unwrap();

        let blame = blame_files(&backend, Path::new("."), "HEAD", &files, &[], 0).unwrap();
        assert_eq!(blame.file_count(), 2);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_over_merged_result() {
        let backend = MockBackend::new(two_files_sharing_a_commit());
        let files = backend.list_files(Path::new("."), "HEAD").unwrap();
        let blame = blame_files(&backend, Path::new("."), "HEAD", &files, &[], 2).unwrap();

        let histogram = blame.query_file("f1", 8, 12).unwrap();
        assert_eq!(histogram[&Author::new("alice", "alice@example.com")], 2);
        assert_eq!(histogram[&Author::new("bob", "bob@example.com")], 2);

        let err = blame.query_file("f1", 0, 100).unwrap_err();
        assert!(matches!(err, BlameError::Query(QueryError::OutOfRange { .. })));
    }
}
