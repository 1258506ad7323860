use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::LaunchError;
use crate::experiment::REQUIRED_FILES;
use crate::repo::{Commit, Repository};
use crate::WorkingDirectory;

/// Copy the required files touched by a commit into the working directory
///
/// Files are matched by name, so `alice/exp1/config.json` satisfies `config.json`. Touched files
/// are visited in path order. If two paths share a required name the later path's content is the
/// one left in the working directory, which is almost certainly a mistake by the user, so it's
/// logged.
///
/// Fails with [`LaunchError::MissingFiles`] listing every required name the commit didn't touch.
pub fn validate_and_copy(
    repo: &impl Repository,
    wd: &WorkingDirectory,
    commit: &Commit,
) -> Result<(), LaunchError> {
    let mut missing: BTreeSet<String> = REQUIRED_FILES.iter().map(|f| f.to_string()).collect();

    for (path, stats) in &commit.files {
        let filename = match Path::new(path).file_name().and_then(|f| f.to_str()) {
            Some(filename) => filename,
            None => continue,
        };
        if !REQUIRED_FILES.contains(&filename) {
            continue;
        }
        if !missing.remove(filename) {
            warn!("{filename} appears more than once in commit {}, using {path}", commit.id);
        }

        let out_path = wd.path.join(filename);
        match (stats.insertions, stats.deletions) {
            (Some(added), Some(deleted)) => info!("Copying {path} (+{added} -{deleted}) to {}", out_path.display()),
            _ => info!("Copying binary {path} to {}", out_path.display()),
        }
        let content = repo.read_file(commit, path)?;
        fs::write(out_path, content)?;
    }

    match missing.is_empty() {
        true => Ok(()),
        false => {
            warn!("Commit {} is missing required files: {:?}", commit.id, missing);
            Err(LaunchError::MissingFiles(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::fake::FakeRepository;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, WorkingDirectory, FakeRepository, Commit) {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let repo = FakeRepository::with_commit("abc123", files);
        repo.sync().unwrap();
        let commit = repo.resolve("abc123").unwrap();
        (dir, wd, repo, commit)
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn superset_copies_only_required_files() {
        let (_dir, wd, repo, commit) = setup(&[
            ("alice/exp/Singularity.def", "Bootstrap: docker\n"),
            ("alice/exp/parameters.csv", "a,b\n1,2\n"),
            ("alice/exp/config.json", "{}"),
            ("README.md", "hello"),
        ]);

        validate_and_copy(&repo, &wd, &commit).unwrap();

        let mut copied: Vec<String> = fs::read_dir(&wd.path)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        copied.sort();
        assert_eq!(copied, vec!["Singularity.def", "config.json", "parameters.csv"]);
        assert_eq!(fs::read_to_string(wd.path.join("parameters.csv")).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn missing_files_are_reported_exactly() {
        let (_dir, wd, repo, commit) = setup(&[("Singularity.def", "x"), ("README.md", "hello")]);

        match validate_and_copy(&repo, &wd, &commit) {
            Err(LaunchError::MissingFiles(missing)) => {
                assert_eq!(missing, names(&["config.json", "parameters.csv"]))
            }
            other => panic!("expected missing files, got {other:?}"),
        }
    }

    #[test]
    fn empty_commit_is_missing_everything() {
        let (_dir, wd, repo, commit) = setup(&[]);
        match validate_and_copy(&repo, &wd, &commit) {
            Err(LaunchError::MissingFiles(missing)) => assert_eq!(missing, names(&REQUIRED_FILES)),
            other => panic!("expected missing files, got {other:?}"),
        }
    }

    #[test]
    fn names_must_match_exactly() {
        let (_dir, wd, repo, commit) = setup(&[
            ("Singularity.def", "x"),
            ("parameters.csv.bak", "x"),
            ("old_config.json", "{}"),
            ("parameters.csv/notes.txt", "x"),
        ]);
        match validate_and_copy(&repo, &wd, &commit) {
            Err(LaunchError::MissingFiles(missing)) => {
                assert_eq!(missing, names(&["config.json", "parameters.csv"]))
            }
            other => panic!("expected missing files, got {other:?}"),
        }
    }

    #[test]
    fn existing_copies_are_overwritten() {
        let (_dir, wd, repo, commit) = setup(&[
            ("Singularity.def", "new def"),
            ("parameters.csv", "h\n"),
            ("config.json", "{}"),
        ]);
        fs::write(wd.path.join("Singularity.def"), "old def").unwrap();

        validate_and_copy(&repo, &wd, &commit).unwrap();
        assert_eq!(fs::read_to_string(wd.path.join("Singularity.def")).unwrap(), "new def");
    }

    #[test]
    fn duplicate_names_last_path_wins() {
        let (_dir, wd, repo, commit) = setup(&[
            ("a/config.json", "{\"from\": \"a\"}"),
            ("b/config.json", "{\"from\": \"b\"}"),
            ("Singularity.def", "x"),
            ("parameters.csv", "h\n"),
        ]);

        validate_and_copy(&repo, &wd, &commit).unwrap();
        assert_eq!(fs::read_to_string(wd.path.join("config.json")).unwrap(), "{\"from\": \"b\"}");
    }
}
