use super::*;
use crate::error::{BlameError, QueryError};
use chrono::DateTime;
use tempfile::TempDir;

fn create_test_client() -> BlameClient {
    BlameClient::with_config(Config::default())
}

// ===== Client Initialization Tests =====

#[test]
fn test_with_config() {
    let mut config = Config::default();
    config.blame.max_concurrency = 2;

    let client = BlameClient::with_config(config);
    assert_eq!(client.config().blame.max_concurrency, 2);
    assert!(client.message_cache().is_empty());
}

#[test]
fn test_client_clone_shares_cache() {
    let client = create_test_client();
    let cloned = client.clone();
    assert!(Arc::ptr_eq(client.message_cache(), cloned.message_cache()));
}

// ===== Ignore Pattern Tests =====

#[test]
fn test_merged_ignore_patterns() {
    let mut config = Config::default();
    config.blame.ignore_patterns = vec!["vendor/".to_string()];
    let client = BlameClient::with_config(config);

    let merged = client.merged_ignore_patterns(&["vendor/".to_string(), "dist/".to_string()]);
    assert_eq!(merged, vec!["vendor/".to_string(), "dist/".to_string()]);
}

// ===== Validation Tests =====

#[test]
fn test_blame_file_nonexistent_repo() {
    let client = create_test_client();
    let err = client
        .blame_file(Path::new("/nonexistent/charblame/repo"), "a.txt", "HEAD")
        .unwrap_err();
    assert!(matches!(err, BlameError::Validation(ValidationError::RepoNotFound(_))));
    assert!(err.is_user_error());
}

#[test]
fn test_blame_repository_not_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("plain.txt");
    std::fs::write(&file, "hello\n").unwrap();

    let client = create_test_client();
    let err = client.blame_repository(&file, "HEAD", &[]).unwrap_err();
    assert!(matches!(err, BlameError::Validation(ValidationError::NotADirectory(_))));
}

#[test]
fn test_blame_file_empty_arguments() {
    let temp_dir = TempDir::new().unwrap();
    let client = create_test_client();

    let err = client.blame_file(temp_dir.path(), "", "HEAD").unwrap_err();
    assert!(matches!(err, BlameError::Validation(ValidationError::Empty(_))));

    let err = client.blame_file(temp_dir.path(), "a.txt", "").unwrap_err();
    assert!(matches!(err, BlameError::Validation(ValidationError::Empty(_))));
}

#[test]
fn test_blame_repository_rejects_empty_pattern() {
    let temp_dir = TempDir::new().unwrap();
    let client = create_test_client();

    let err = client
        .blame_repository(temp_dir.path(), "HEAD", &[String::new()])
        .unwrap_err();
    assert!(matches!(err, BlameError::Validation(ValidationError::Empty(_))));
}

// ===== Query Tests =====

fn scenario_a() -> (Vec<Hunk>, HashMap<String, Commit>) {
    let hunk = |id: &str, ls, le, cs, ce| Hunk {
        commit_id: id.to_string(),
        line_start: ls,
        line_end: le,
        char_start: cs,
        char_end: ce,
    };
    let commit = |id: &str, name: &str| Commit {
        id: id.to_string(),
        author: Author::new(name, ""),
        message: String::new(),
        author_date: DateTime::parse_from_rfc3339("2014-01-01T00:00:00Z").unwrap(),
    };

    let hunks = vec![hunk("0", 0, 1, 0, 2), hunk("1", 1, 2, 2, 4), hunk("2", 2, 4, 4, 8)];
    let commits = [commit("0", "Bob"), commit("1", "Joe"), commit("2", "Bob")]
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
    (hunks, commits)
}

#[test]
fn test_query_delegates_to_engine() {
    let client = create_test_client();
    let (hunks, commits) = scenario_a();

    let histogram = client.query(&hunks, &commits, 0, 6).unwrap();
    assert_eq!(histogram[&Author::new("Bob", "")], 4);
    assert_eq!(histogram[&Author::new("Joe", "")], 2);
}

#[test]
fn test_query_out_of_range() {
    let client = create_test_client();
    let (hunks, commits) = scenario_a();

    let err = client.query(&hunks, &commits, 0, 9).unwrap_err();
    assert!(matches!(err, BlameError::Query(QueryError::OutOfRange { .. })));
}
