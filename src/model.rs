//! Model name resolution.

/// Model used when neither the CLI nor the config file names one.
pub const DEFAULT_MODEL: &str = "imagen-3.0-generate-002";

/// Short name aliases for Imagen models.
const ALIASES: &[(&str, &str)] = &[
    ("imagen-3", "imagen-3.0-generate-002"),
    ("imagen-4", "imagen-4.0-generate-001"),
    ("imagen-4-fast", "imagen-4.0-fast-generate-001"),
    ("imagen-4-ultra", "imagen-4.0-ultra-generate-001"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map_or_else(|| name.to_string(), |&(_, full)| full.to_string())
}

/// Check that a resolved model is served by the `:predict` endpoint.
///
/// # Errors
///
/// Returns an error if the model name is not an Imagen model.
pub fn validate_model(model: &str) -> Result<(), String> {
    if model.starts_with("imagen-") {
        Ok(())
    } else {
        Err(format!("Unsupported model '{model}'. Expected 'imagen-*'."))
    }
}
