//! Lazily evaluated environment variables.
//!
//! A [`LazyEnv`] is a declaration: name, raw default, converter and an
//! optional after-eval hook. Building one never touches the environment.
//! Every call to [`LazyEnv::eval`] reads the source at that moment, so
//! declarations may be made before an override file has been loaded.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BootstrapError;

/// Somewhere to read variables from.
pub trait EnvSource {
    /// Look up `name`. `Ok(None)` means unset.
    fn var(&self, name: &str) -> Result<Option<String>, BootstrapError>;
}

/// The live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Result<Option<String>, BootstrapError> {
        match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(raw)) => Err(BootstrapError::Conversion {
                name: name.to_string(),
                value: raw.to_string_lossy().into_owned(),
                reason: "value is not valid unicode".to_string(),
            }),
        }
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Result<Option<String>, BootstrapError> {
        Ok(self.get(name).cloned())
    }
}

type Converter<T> = Box<dyn Fn(&str) -> Result<T, String> + Send + Sync>;
type Hook<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// A deferred environment variable lookup.
pub struct LazyEnv<T> {
    name: String,
    default: Option<String>,
    convert: Converter<T>,
    after_eval: Option<Hook<T>>,
}

impl<T> LazyEnv<T> {
    /// Declare a variable with a custom converter.
    pub fn with_converter<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            default: None,
            convert: Box::new(convert),
            after_eval: None,
        }
    }

    /// Raw value used when the variable is unset. It goes through the
    /// converter like any other value.
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    /// Hook invoked with every successfully converted value.
    ///
    /// A hook error is logged and otherwise ignored; `eval` still returns
    /// the converted value.
    pub fn after_eval<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.after_eval = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_raw(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Read, convert, and run the hook.
    pub fn eval(&self, env: &dyn EnvSource) -> Result<T, BootstrapError> {
        let raw = match env.var(&self.name)? {
            Some(value) => value,
            None => self
                .default
                .clone()
                .ok_or_else(|| BootstrapError::MissingVariable(self.name.clone()))?,
        };

        let value = (self.convert)(&raw).map_err(|reason| BootstrapError::Conversion {
            name: self.name.clone(),
            value: raw.clone(),
            reason,
        })?;

        if let Some(hook) = &self.after_eval {
            if let Err(e) = hook(&value) {
                tracing::warn!(variable = %self.name, error = %e, "after-eval hook failed");
            }
        }

        tracing::debug!(variable = %self.name, value = %raw, "Resolved environment variable");
        Ok(value)
    }
}

impl<T> LazyEnv<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    /// Declare a variable converted with `FromStr`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_converter(name, |raw| raw.parse::<T>().map_err(|e| e.to_string()))
    }
}

impl LazyEnv<PathBuf> {
    /// Declare a filesystem path variable. Empty values are rejected.
    pub fn path(name: impl Into<String>) -> Self {
        Self::with_converter(name, parse_path)
    }
}

impl<T> fmt::Debug for LazyEnv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEnv")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("after_eval", &self.after_eval.is_some())
            .finish()
    }
}

/// Converter for path variables.
pub fn parse_path(raw: &str) -> Result<PathBuf, String> {
    if raw.trim().is_empty() {
        return Err("path must not be empty".to_string());
    }
    Ok(PathBuf::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unset_uses_default() {
        let var = LazyEnv::<u32>::new("EPOCHS").default_value("10");
        assert_eq!(var.eval(&env(&[])).unwrap(), 10);
    }

    #[test]
    fn test_set_value_wins_over_default() {
        let var = LazyEnv::<u32>::new("EPOCHS").default_value("10");
        assert_eq!(var.eval(&env(&[("EPOCHS", "25")])).unwrap(), 25);
    }

    #[test]
    fn test_missing_without_default() {
        let var = LazyEnv::<String>::new("NOPE");
        let err = var.eval(&env(&[])).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingVariable(ref n) if n == "NOPE"));
    }

    #[test]
    fn test_conversion_error_carries_name_and_value() {
        let var = LazyEnv::<u32>::new("EPOCHS").default_value("10");
        match var.eval(&env(&[("EPOCHS", "ten")])) {
            Err(BootstrapError::Conversion { name, value, .. }) => {
                assert_eq!(name, "EPOCHS");
                assert_eq!(value, "ten");
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_default_fails_conversion() {
        let var = LazyEnv::<f64>::new("LR").default_value("fast");
        assert!(matches!(
            var.eval(&env(&[])),
            Err(BootstrapError::Conversion { .. })
        ));
    }

    #[test]
    fn test_reads_source_on_every_eval() {
        let var = LazyEnv::<String>::new("MODE").default_value("a");
        let mut source = env(&[]);
        assert_eq!(var.eval(&source).unwrap(), "a");
        source.insert("MODE".into(), "b".into());
        assert_eq!(var.eval(&source).unwrap(), "b");
    }

    #[test]
    fn test_hook_runs_with_converted_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let var = LazyEnv::<u32>::new("N")
            .default_value("3")
            .after_eval(move |v| {
                seen.fetch_add(*v as usize, Ordering::SeqCst);
                Ok(())
            });
        var.eval(&env(&[])).unwrap();
        var.eval(&env(&[])).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_failing_hook_does_not_fail_eval() {
        let var = LazyEnv::<u32>::new("N")
            .default_value("7")
            .after_eval(|_| Err("rejected".to_string()));
        assert_eq!(var.eval(&env(&[])).unwrap(), 7);
    }

    #[test]
    fn test_hook_not_called_on_conversion_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let var = LazyEnv::<u32>::new("N").after_eval(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(var.eval(&env(&[("N", "x")])).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_path_rejects_empty() {
        let var = LazyEnv::path("PATH_DATA").default_value("/data");
        assert!(matches!(
            var.eval(&env(&[("PATH_DATA", "  ")])),
            Err(BootstrapError::Conversion { .. })
        ));
        assert_eq!(
            var.eval(&env(&[])).unwrap(),
            PathBuf::from("/data")
        );
    }

    #[test]
    fn test_debug_hides_closures() {
        let var = LazyEnv::<u32>::new("N").default_value("1");
        let rendered = format!("{var:?}");
        assert!(rendered.contains("\"N\""));
        assert!(rendered.contains("after_eval: false"));
    }
}
