use std::env::VarError;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Expand `{{ env.VAR }}` placeholders in raw configuration text
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when the
/// variable is unset. Comment lines are left untouched so commented-out
/// settings never require their variables to exist.
pub fn expand_env(input: &str) -> Result<String, String> {
    let lines = input.split('\n').map(expand_line).collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Group 1: scoped key, group 2: optional default("...") value
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

fn expand_line(line: &str) -> Result<String, String> {
    if line.trim_start().starts_with('#') {
        return Ok(line.to_owned());
    }

    let mut failure = None;
    let expanded = placeholder().replace_all(line, |captures: &Captures<'_>| {
        resolve(&captures[1], captures.get(2).map(|m| m.as_str())).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            String::new()
        })
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.is_empty() && !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => default
            .map(str::to_owned)
            .ok_or_else(|| format!("environment variable not found: `{name}`")),
        Err(VarError::NotUnicode(_)) => Err(format!("environment variable is not valid unicode: `{name}`")),
    }
}
