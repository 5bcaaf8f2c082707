//! Expansion of path-valued settings (`images.imagedir`, `images.destdir`).

use crate::ConfigError;

/// Expand a leading `~` and `${VAR}` / `${VAR:-default}` references in a
/// path setting.
///
/// Values that neither start with `~` nor contain `${` are returned as is, so
/// a literal `$` in a directory name survives.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.starts_with('~') && !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::full_with_context(value, home_dir, |var| {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok().filter(|home| !home.is_empty())
}

struct UnsetVar(String);
