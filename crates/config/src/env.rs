//! Environment variable substitution
//!
//! `$NAME` tokens in the raw config text are replaced by the value of the
//! environment variable before TOML parsing. Values are escaped so they
//! stay valid inside basic TOML strings. Unset variables are left as-is.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\w+)").unwrap_or_else(|err| panic!("invalid env var pattern: {err}"))
});

/// Substitute environment variables using the process environment
pub fn substitute(text: &str) -> Cow<'_, str> {
    substitute_with(text, |name| std::env::var(name).ok())
}

/// Substitute environment variables using `lookup`
pub fn substitute_with<F>(text: &str, lookup: F) -> Cow<'_, str>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR.replace_all(text, |caps: &Captures<'_>| match lookup(&caps[1]) {
        Some(value) => escape(&value),
        None => caps[0].to_string(),
    })
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
