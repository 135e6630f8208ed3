//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so bare `$` characters in
/// paths and titles never trigger a lookup.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand an optional string field in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(v) = value.as_deref() {
        *value = Some(expand_env(v, field)?);
    }
    Ok(())
}

struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("CIMDOC_TEST_SIMPLE", "cim16");
        }
        let result = expand_env("models/${CIMDOC_TEST_SIMPLE}.yaml", "paths.model").unwrap();
        assert_eq!(result, "models/cim16.yaml");
        unsafe {
            std::env::remove_var("CIMDOC_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("CIMDOC_TEST_UNSET");
        }
        let result = expand_env("${CIMDOC_TEST_UNSET:-Anonymous}", "metadata.author").unwrap();
        assert_eq!(result, "Anonymous");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("CIMDOC_TEST_MISSING");
        }
        let err = expand_env("${CIMDOC_TEST_MISSING}", "paths.output").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("CIMDOC_TEST_MISSING"));
        assert!(err.to_string().contains("paths.output"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("costs in $", "metadata.title").unwrap();
        assert_eq!(result, "costs in $");
    }

    #[test]
    fn test_expand_opt_none() {
        let mut value = None;
        expand_opt(&mut value, "metadata.subject").unwrap();
        assert_eq!(value, None);
    }
}
