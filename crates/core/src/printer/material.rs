//! Material capability matching.

/// Normalize a requested material: trimmed, empty means "no constraint".
pub fn normalize_material(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

/// Whether a printer with the given capability list can print `requested`.
///
/// Matching is case-insensitive. An empty request matches every printer and
/// a printer without a declared capability list accepts anything. Otherwise
/// the request must equal one of the comma separated entries or appear as a
/// substring of the list (so `PETG` satisfies a request for `PET`).
pub fn material_supported(capabilities: Option<&str>, requested: &str) -> bool {
    let requested = requested.trim().to_uppercase();
    if requested.is_empty() {
        return true;
    }

    let capabilities = match capabilities.map(str::trim) {
        Some(list) if !list.is_empty() => list.to_uppercase(),
        _ => return true,
    };

    capabilities
        .split(',')
        .any(|part| part.trim() == requested)
        || capabilities.contains(&requested)
}
