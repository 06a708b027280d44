//! End-to-end bootstrap against the real process environment.
//!
//! This is the only test in the binary that touches `PATH_*`, so it cannot
//! race with anything else reading them.

use pretty_assertions::assert_eq;
use trainwire_core::bootstrap::OVERRIDE_FILE;
use trainwire_core::{Bootstrap, ResolvedPaths};

#[test]
fn test_run_loads_overrides_then_creates_directories() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = tmp.path().join("store");
    let checkpoints = tmp.path().join("ckpt");
    std::fs::write(
        tmp.path().join(OVERRIDE_FILE),
        format!(
            "PATH_DATA=\"{}\"\nPATH_CHECKPOINTS=\"{}\"\n",
            data.display(),
            checkpoints.display()
        ),
    )
    .unwrap();

    // SAFETY: only this test touches PATH_* in this binary.
    unsafe {
        std::env::set_var("PATH_CHECKPOINTS", "/should/be/overridden");
        std::env::remove_var("PATH_SUMMARY");
    }

    let boot = Bootstrap::new(tmp.path());
    let paths = boot.run().unwrap();

    assert_eq!(
        paths,
        ResolvedPaths {
            root: tmp.path().to_path_buf(),
            data: data.clone(),
            summary: data.join("summary"),
            checkpoints: checkpoints.clone(),
        }
    );
    assert!(paths.summary.is_dir());
    assert!(paths.checkpoints.is_dir());

    // Second run is a no-op on the filesystem.
    let again = boot.run().unwrap();
    assert_eq!(again, paths);
}
