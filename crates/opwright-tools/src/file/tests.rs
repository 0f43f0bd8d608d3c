//! Tests for the project file store

use super::security::resolve_in_root;
use super::*;
use crate::error::Error;
use std::path::Path;

#[test]
fn test_resolve_relative_path() {
    let root = Path::new("/work/app");
    let resolved = resolve_in_root(root, "src/./main.ts").unwrap();
    assert_eq!(resolved, Path::new("/work/app/src/main.ts"));
}

#[test]
fn test_resolve_rejects_traversal() {
    let root = Path::new("/work/app");
    assert!(matches!(
        resolve_in_root(root, "../secrets.txt"),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        resolve_in_root(root, "src/../../x"),
        Err(Error::PermissionDenied(_))
    ));
}

#[test]
fn test_resolve_absolute_paths() {
    let root = Path::new("/work/app");
    assert_eq!(
        resolve_in_root(root, "/work/app/README.md").unwrap(),
        Path::new("/work/app/README.md")
    );
    assert!(resolve_in_root(root, "/etc/passwd").is_err());
    assert!(resolve_in_root(root, "   ").is_err());
}

#[tokio::test]
async fn test_write_creates_parent_folders() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());

    store.write("src/components/App.tsx", "export {}").await.unwrap();

    let written = std::fs::read_to_string(dir.path().join("src/components/App.tsx")).unwrap();
    assert_eq!(written, "export {}");
}

#[tokio::test]
async fn test_delete_and_rename() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());
    store.write("a.txt", "a").await.unwrap();

    store.rename("a.txt", "moved/b.txt").await.unwrap();
    assert!(!dir.path().join("a.txt").exists());
    assert!(dir.path().join("moved/b.txt").exists());

    store.delete("moved/b.txt").await.unwrap();
    assert!(!dir.path().join("moved/b.txt").exists());
}

#[tokio::test]
async fn test_delete_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());
    assert!(matches!(store.delete("nope.txt").await, Err(Error::Io(_))));
}

#[tokio::test]
async fn test_delete_refuses_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());
    store.mkdir("lib").await.unwrap();
    assert!(matches!(store.delete("lib").await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_folder_create_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());

    store.mkdir("a/b/c").await.unwrap();
    store.write("a/b/c/file.txt", "x").await.unwrap();
    assert!(dir.path().join("a/b/c").is_dir());

    store.remove_dir("a").await.unwrap();
    assert!(!dir.path().join("a").exists());
}

#[tokio::test]
async fn test_remove_dir_refuses_root() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());
    assert!(matches!(
        store.remove_dir(".").await,
        Err(Error::PermissionDenied(_))
    ));
    assert!(dir.path().exists());
}

#[tokio::test]
async fn test_snapshot_skips_vcs_and_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFileStore::new(dir.path());
    store.write("index.html", "<h1>hi</h1>").await.unwrap();
    store.write("src/app.js", "console.log(1)").await.unwrap();
    store.write(".git/HEAD", "ref: refs/heads/main").await.unwrap();
    store.write("node_modules/x/index.js", "").await.unwrap();

    let files = store.snapshot().await.unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

    assert_eq!(paths, vec!["index.html", "src/app.js"]);
    assert_eq!(files[0].data, b"<h1>hi</h1>");
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_out_of_project_is_rejected() {
    let project = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), project.path().join("link")).unwrap();
    let store = LocalFileStore::new(project.path());

    assert!(matches!(
        store.write("link/pwned.txt", "x").await,
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        store.mkdir("link/nested").await,
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        store.remove_dir("link").await,
        Err(Error::PermissionDenied(_))
    ));
    assert!(!outside.path().join("pwned.txt").exists());
    assert!(outside.path().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_inside_project_is_allowed() {
    let project = tempfile::tempdir().unwrap();
    std::fs::create_dir(project.path().join("real")).unwrap();
    std::os::unix::fs::symlink(project.path().join("real"), project.path().join("alias")).unwrap();
    let store = LocalFileStore::new(project.path());

    store.write("alias/ok.txt", "ok").await.unwrap();
    assert!(project.path().join("real/ok.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_snapshot_does_not_follow_symlinks() {
    let project = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
    std::os::unix::fs::symlink(outside.path(), project.path().join("link")).unwrap();
    let store = LocalFileStore::new(project.path());
    store.write("index.html", "hi").await.unwrap();

    let files = store.snapshot().await.unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["index.html"]);
}
