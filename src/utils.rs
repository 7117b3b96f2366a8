use std::env::var;

/// Get the value of an ENV var
///
/// Only when:
/// - It is set
/// - It is not empty after trimming
pub fn env_var(var_name: &'static str) -> Option<String> {
    var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Is the given string empty once surrounding whitespace is gone?
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
