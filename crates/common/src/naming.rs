// Analysis method name normalization.
//
// Internally methods use snake_case (`image_embedding`); URLs and API payloads
// use the hyphenated form (`image-embedding`).

/// Convert an internal method name to the form exposed over HTTP.
pub fn external_name(internal: &str) -> String {
    internal.replace('_', "-")
}

/// Convert a name received over HTTP back to the internal form used for lookups.
pub fn internal_name(external: &str) -> String {
    external.replace('-', "_")
}
