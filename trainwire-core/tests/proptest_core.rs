//! Property-based tests for lazy variables and directory setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use trainwire_core::{Bootstrap, BootstrapError, LazyEnv, ResolvedPaths};

// --- Default resolution ---

proptest! {
    #[test]
    fn unset_integer_resolves_to_default(default in any::<i64>()) {
        let var = LazyEnv::<i64>::new("TW_PROP_INT").default_value(default.to_string());
        let env: HashMap<String, String> = HashMap::new();
        prop_assert_eq!(var.eval(&env).unwrap(), default);
    }

    #[test]
    fn unset_string_resolves_to_default(default in ".*") {
        let var = LazyEnv::<String>::new("TW_PROP_STR").default_value(default.clone());
        let env: HashMap<String, String> = HashMap::new();
        prop_assert_eq!(var.eval(&env).unwrap(), default);
    }

    #[test]
    fn set_value_always_wins(default in any::<u32>(), set in any::<u32>()) {
        let var = LazyEnv::<u32>::new("TW_PROP_SET").default_value(default.to_string());
        let env = HashMap::from([("TW_PROP_SET".to_string(), set.to_string())]);
        prop_assert_eq!(var.eval(&env).unwrap(), set);
    }

    #[test]
    fn non_numeric_never_converts(raw in "[a-zA-Z_]{1,12}") {
        let var = LazyEnv::<u64>::new("TW_PROP_BAD").default_value("1");
        let env = HashMap::from([("TW_PROP_BAD".to_string(), raw)]);
        prop_assert!(var.eval(&env).is_err());
    }
}

// --- Directory setup ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ensure_directories_is_idempotent(
        summary in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        checkpoints in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
    ) {
        let tmp = tempfile::TempDir::new().unwrap();
        let env = HashMap::from([
            ("PATH_SUMMARY".to_string(), tmp.path().join("s").join(&summary).display().to_string()),
            ("PATH_CHECKPOINTS".to_string(), tmp.path().join("c").join(&checkpoints).display().to_string()),
        ]);
        let paths = Bootstrap::new(tmp.path()).resolve_paths(&env).unwrap();
        paths.ensure_directories().unwrap();
        paths.ensure_directories().unwrap();
        prop_assert!(paths.summary.is_dir());
        prop_assert!(paths.checkpoints.is_dir());
        prop_assert_eq!(paths.data, PathBuf::from(tmp.path()).join("data"));
    }
}

// --- Fail-fast startup ---

/// Startup as a training script runs it: typed settings first, then the
/// path roots, then directory creation.
fn startup(
    root: &Path,
    env: &HashMap<String, String>,
) -> Result<(u32, ResolvedPaths), BootstrapError> {
    let epochs = LazyEnv::<u32>::new("TW_PROP_EPOCHS")
        .default_value("10")
        .eval(env)?;
    let paths = Bootstrap::new(root).resolve_paths(env)?;
    paths.ensure_directories()?;
    Ok((epochs, paths))
}

#[test]
fn non_numeric_epochs_fail_before_any_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let env = HashMap::from([("TW_PROP_EPOCHS".to_string(), "ten".to_string())]);

    let err = startup(tmp.path(), &env).unwrap_err();
    assert!(matches!(err, BootstrapError::Conversion { ref name, .. } if name == "TW_PROP_EPOCHS"));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn numeric_epochs_reach_directory_setup() {
    let tmp = tempfile::TempDir::new().unwrap();
    let env = HashMap::from([("TW_PROP_EPOCHS".to_string(), "25".to_string())]);

    let (epochs, paths) = startup(tmp.path(), &env).unwrap();
    assert_eq!(epochs, 25);
    assert!(paths.summary.is_dir());
    assert!(paths.checkpoints.is_dir());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn malformed_integer_never_creates_directories(raw in "[a-zA-Z_.-]{1,10}") {
        let tmp = tempfile::TempDir::new().unwrap();
        let env = HashMap::from([("TW_PROP_EPOCHS".to_string(), raw)]);

        let is_conversion = matches!(startup(tmp.path(), &env), Err(BootstrapError::Conversion { .. }));
        prop_assert!(is_conversion);
        prop_assert!(!tmp.path().join("data").exists());
    }
}
