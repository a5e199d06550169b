//! Integration tests for the script catalog

use mapscript_storage::ScriptCatalog;

const CATALOG: &str = "\
door.int        ; generic door        # local_vars=2
; retired slot
Guard.int ; town guard # local_vars=12
";

#[test]
fn every_line_takes_an_index() {
    let catalog = ScriptCatalog::parse(CATALOG);
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.file_name(0).as_deref(), Some("door.int"));
    assert_eq!(catalog.file_name(1), None);
    assert_eq!(catalog.file_name(2).as_deref(), Some("Guard.int"));
}

#[test]
fn local_var_counts() {
    let catalog = ScriptCatalog::parse(CATALOG);
    assert_eq!(catalog.local_vars(0), 2);
    assert_eq!(catalog.local_vars(1), 0);
    assert_eq!(catalog.local_vars(2), 12);
    assert_eq!(catalog.local_vars(-1), 0);
    assert_eq!(catalog.local_vars(99), 0);
}

#[test]
fn load_reads_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scripts.lst");
    std::fs::write(&path, CATALOG).unwrap();
    assert_eq!(ScriptCatalog::load(&path).unwrap(), ScriptCatalog::parse(CATALOG));
    assert!(ScriptCatalog::load(dir.path().join("missing.lst")).is_err());
}

#[test]
fn push_appends_indices() {
    let mut catalog = ScriptCatalog::new();
    assert_eq!(catalog.push("door", 2), 0);
    assert_eq!(catalog.push("guard", 0), 1);
    assert_eq!(catalog.file_name(1).as_deref(), Some("guard.int"));
}
