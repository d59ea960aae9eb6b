//! Unloading: symmetry, stale handles and teardown handling.

#[macro_use]
mod helpers;

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use dynhost_unit::linker::MockLinker;
use dynhost_unit::prelude::*;

use helpers::*;

fake_module_library!(lib_sym, "sym");
fake_module_library!(lib_stale, "stale");
fake_module_library!(lib_other, "other");
fake_module_library!(lib_nodestroy, "nodestroy");
fake_module_library!(lib_drop, "drop");
fake_module_library!(lib_all_a, "all-a");
fake_module_library!(lib_all_b, "all-b");
fake_module_library!(lib_reload, "reload");
fake_module_library!(lib_shared, "shared");
fake_module_library!(lib_guarded, "guarded");

#[test]
fn test_unload_is_symmetric() {
    let manager = module_manager(MockLinker::new().with_library("libsym", lib_sym::library()));

    let mut unit = Some(manager.load("libsym").unwrap());
    let observer = unit.clone().unwrap();

    assert_eq!(
        manager.unload(&mut unit),
        UnloadOutcome::Unloaded { destroyed: true }
    );
    assert!(unit.is_none());
    assert!(!observer.is_live());
    assert!(manager.is_empty());
    assert!(manager.handle_names().is_empty());
    assert_eq!(manager.linker().close_count("libsym"), 1);
    assert_eq!(lib_sym::destroys(), 1);
    assert!(!lib_sym::is_live());
    assert!(manager.interface().get_detail().is_empty());
}

#[test]
fn test_unload_empty_handle_is_skipped() {
    let manager = module_manager(MockLinker::new());
    let mut unit = None;

    assert_eq!(manager.unload(&mut unit), UnloadOutcome::Skipped);
    assert!(manager.interface().get_errors().is_empty());
}

#[test]
fn test_double_unload_is_not_loaded() {
    let manager = module_manager(MockLinker::new().with_library("libstale", lib_stale::library()));

    let mut unit = Some(manager.load("libstale").unwrap());
    let mut stale = unit.clone();

    manager.unload(&mut unit);
    assert_eq!(manager.unload(&mut stale), UnloadOutcome::NotLoaded);
    assert!(stale.is_none());
    assert_eq!(manager.linker().close_count("libstale"), 1);
    assert_eq!(lib_stale::destroys(), 1);
}

#[test]
fn test_unload_handle_from_other_manager() {
    let linker = || MockLinker::new().with_library("libother", lib_other::library());
    let owner = module_manager(linker());
    let bystander = module_manager(linker());

    let unit = owner.load("libother").unwrap();
    let mut foreign = Some(unit.clone());

    assert_eq!(bystander.unload(&mut foreign), UnloadOutcome::NotLoaded);
    assert!(unit.is_live());
    assert!(owner.contains("libother"));
    assert_eq!(bystander.linker().open_count("libother"), 0);
}

#[test]
fn test_missing_teardown_still_closes() {
    let manager = module_manager(
        MockLinker::new().with_library("libnodestroy", lib_nodestroy::library_without_destroy()),
    );

    let mut unit = Some(manager.load("libnodestroy").unwrap());
    assert_eq!(
        manager.unload(&mut unit),
        UnloadOutcome::Unloaded { destroyed: false }
    );

    assert!(manager.is_empty());
    assert_eq!(manager.linker().close_count("libnodestroy"), 1);
    assert_eq!(manager.linker().live_handles(), 0);

    let errors = manager.interface().get_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("DestroyModule"));
}

#[test]
fn test_unload_key() {
    let manager = module_manager(MockLinker::new().with_library("libreload", lib_reload::library()));

    let first = manager.load("libreload").unwrap();
    assert_eq!(
        manager.unload_key("libreload"),
        UnloadOutcome::Unloaded { destroyed: true }
    );
    assert!(!first.is_live());
    assert_eq!(manager.unload_key("libreload"), UnloadOutcome::NotLoaded);

    let second = manager.load("libreload").unwrap();
    assert!(!UnitRef::ptr_eq(&first, &second));
    assert!(second.is_live());
    assert_eq!(manager.linker().open_count("libreload"), 2);
    assert_eq!(lib_reload::creates(), 2);
}

#[test]
fn test_unload_all_keeps_maps_in_step() {
    let manager = module_manager(
        MockLinker::new()
            .with_library("liball_a", lib_all_a::library())
            .with_library("liball_b", lib_all_b::library()),
    );

    let a = manager.load("liball_a").unwrap();
    manager.load("liball_b").unwrap();
    manager.load("libabsent").unwrap_err();
    assert_maps_agree(&manager);
    assert_eq!(manager.loaded_names(), vec!["liball_a", "liball_b"]);
    assert_eq!(manager.interface().get_detail().len(), 2);

    assert_eq!(manager.unload_all(), 2);
    assert_maps_agree(&manager);
    assert!(manager.is_empty());
    assert!(!a.is_live());
    assert_eq!(lib_all_a::destroys(), 1);
    assert_eq!(lib_all_b::destroys(), 1);
    assert_eq!(manager.linker().live_handles(), 0);
}

#[test]
fn test_dropping_manager_unloads() {
    let manager = module_manager(MockLinker::new().with_library("libdrop", lib_drop::library()));
    let unit = manager.load("libdrop").unwrap();

    drop(manager);

    assert!(!unit.is_live());
    assert_eq!(lib_drop::destroys(), 1);
    assert!(matches!(unit.run(), Err(UnitError::Unloaded { .. })));
}

#[test]
fn test_unit_shared_between_managers_is_destroyed_once() {
    let linker = || MockLinker::new().with_library("libshared", lib_shared::library());
    let first = module_manager(linker());
    let second = module_manager(linker());

    let a = first.load("libshared").unwrap();
    let b = second.load("libshared").unwrap();
    assert!(UnitRef::ptr_eq(&a, &b));
    assert_eq!(lib_shared::creates(), 2);

    assert_eq!(
        first.unload_key("libshared"),
        UnloadOutcome::Unloaded { destroyed: true }
    );
    assert!(!b.is_live());
    assert!(b.get().is_none());
    assert!(matches!(b.run(), Err(UnitError::Unloaded { .. })));

    assert_eq!(
        second.unload_key("libshared"),
        UnloadOutcome::Unloaded { destroyed: false }
    );
    assert_eq!(lib_shared::destroys(), 1);
    assert_eq!(second.linker().live_handles(), 0);
    assert!(second.interface().get_errors().is_empty());
}

#[test]
fn test_guard_holder_can_use_manager_while_unload_waits() {
    let manager = Arc::new(module_manager(
        MockLinker::new().with_library("libguarded", lib_guarded::library()),
    ));
    let unit = manager.load("libguarded").unwrap();

    let (done, finished) = mpsc::channel();
    let holder = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            let guard = unit.get().unwrap();
            let unloader = {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.unload_key("libguarded"))
            };

            // The key leaves both maps before the unloader waits on the guard.
            while manager.contains("libguarded") {
                thread::yield_now();
            }
            assert!(manager.is_empty());
            assert_eq!(guard.name(), Some("guarded"));
            assert!(lib_guarded::is_live());

            drop(guard);
            done.send(unloader.join().unwrap()).unwrap();
        })
    };

    let outcome = finished
        .recv_timeout(Duration::from_secs(10))
        .expect("unload did not finish after the guard was dropped");
    holder.join().unwrap();

    assert_eq!(outcome, UnloadOutcome::Unloaded { destroyed: true });
    assert!(!lib_guarded::is_live());
    assert_eq!(manager.linker().live_handles(), 0);
}
