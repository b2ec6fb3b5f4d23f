use super::*;
use tempfile::TempDir;

#[test]
fn resolves_existing_directory() {
    let dir = TempDir::new().unwrap();
    let resolver = FilesystemProjectResolver;
    let ws = resolver.resolve(dir.path().to_str().unwrap()).unwrap();
    assert_eq!(ws.root, dir.path().to_str().unwrap());
}

#[test]
fn rejects_missing_path() {
    let resolver = FilesystemProjectResolver;
    let err = resolver.resolve("/does/not/exist/anywhere").unwrap_err();
    assert!(matches!(err, ProjectError::NotFound(_)));
}
