//! Whole-lifecycle scenarios and directory loading.

#[macro_use]
mod helpers;

use std::path::Path;

use dynhost_unit::discovery::library_file_name;
use dynhost_unit::linker::MockLinker;
use dynhost_unit::prelude::*;

use helpers::*;

fake_module_library!(lib_a, "A");
fake_module_library!(lib_dir_one, "one");
fake_module_library!(lib_dir_two, "two");

#[test]
fn test_load_reload_unload_then_fail() {
    let manager = module_manager(MockLinker::new().with_library("libA", lib_a::library()));

    let first = manager.load("libA").unwrap();
    assert_eq!(first.get().unwrap().name(), Some("A"));
    assert_eq!(manager.loaded_names(), vec!["libA"]);

    let again = manager.load("libA").unwrap();
    assert!(UnitRef::ptr_eq(&first, &again));
    drop(again);

    let mut unit = Some(first);
    assert_eq!(
        manager.unload(&mut unit),
        UnloadOutcome::Unloaded { destroyed: true }
    );
    assert!(unit.is_none());
    assert!(manager.loaded_names().is_empty());
    assert!(manager.handle_names().is_empty());

    assert!(manager.load("libZ").is_err());
    assert!(!manager.is_loaded());

    let registry = manager.interface();
    assert_eq!(registry.get_names(), vec!["A"]);
    let errors = registry.get_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("could not load"));
    assert!(errors[0].contains("libZ"));
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_load_dir_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let one = dir.path().join(library_file_name("one"));
    let two = dir.path().join(library_file_name("two"));
    let broken = dir.path().join(library_file_name("broken"));
    for path in [&one, &two, &broken] {
        std::fs::write(path, b"").unwrap();
    }
    std::fs::write(dir.path().join("README.md"), b"").unwrap();

    let manager = module_manager(
        MockLinker::new()
            .with_library(key(&one), lib_dir_one::library())
            .with_library(key(&two), lib_dir_two::library()),
    );

    let report = manager.load_dir(dir.path());

    assert_eq!(report.loaded, vec![key(&one), key(&two)]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, broken);
    assert!(matches!(report.failed[0].error, UnitError::LibraryOpen { .. }));
    assert_eq!(manager.len(), 2);
    assert_maps_agree(&manager);
    assert_eq!(manager.interface().get_names(), vec!["one", "two"]);
}

#[test]
fn test_load_dir_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let manager = module_manager(MockLinker::new());

    let report = manager.load_dir(&dir.path().join("nowhere"));
    assert!(report.loaded.is_empty());
    assert!(report.failed.is_empty());
    assert!(manager.interface().get_errors().is_empty());
}
