use crate::language::{self, keywords};

/// Message and procedure names become Rust type and variant names.
pub fn validate_type_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("type name must be non-empty".to_string());
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('_');
    if !first.is_ascii_alphabetic() {
        return Err(format!("invalid type name start (must be [A-Za-z]): {name:?}"));
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "invalid type name char (allowed [A-Za-z0-9_]): {name:?}"
            ));
        }
    }
    if keywords::BUILTIN_TYPES.contains(&name) {
        return Err(format!("builtin type {name:?} cannot name a declaration"));
    }
    if language::RESERVED_TYPE_NAMES.contains(&name) || language::is_rust_keyword(name) {
        return Err(format!("type name is reserved: {name:?}"));
    }
    Ok(())
}

/// Field names become struct fields; Rust keywords are emitted as raw identifiers.
pub fn validate_field_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("field name must be non-empty".to_string());
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('0');
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(format!("invalid field name start (must be [A-Za-z_]): {name:?}"));
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "invalid field name char (allowed [A-Za-z0-9_]): {name:?}"
            ));
        }
    }
    if name == "_" || language::is_non_raw_keyword(name) {
        return Err(format!("field name is reserved: {name:?}"));
    }
    Ok(())
}

/// A Rust path such as `super::messages` or `crate::proto::messages`.
pub fn validate_module_path(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("module path must be non-empty".to_string());
    }
    for (idx, seg) in path.split("::").enumerate() {
        let leading_ok = idx == 0 && matches!(seg, "crate" | "self");
        if leading_ok || seg == "super" {
            continue;
        }
        validate_rust_ident(seg).map_err(|e| format!("invalid module path {path:?}: {e}"))?;
    }
    Ok(())
}

pub fn validate_crate_name(name: &str) -> Result<(), String> {
    validate_rust_ident(name).map_err(|e| format!("invalid runtime crate name: {e}"))
}

fn validate_rust_ident(seg: &str) -> Result<(), String> {
    let mut chars = seg.chars();
    let first = chars.next().ok_or_else(|| "empty segment".to_string())?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(format!("segment must start with [A-Za-z_]: {seg:?}"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("segment chars must be [A-Za-z0-9_]: {seg:?}"));
    }
    if seg == "_" || language::is_rust_keyword(seg) {
        return Err(format!("segment is a keyword: {seg:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert!(validate_type_name("GameMetadata").is_ok());
        assert!(validate_type_name("v2_Reply").is_ok());
        assert!(validate_type_name("2Fast").is_err());
        assert!(validate_type_name("_Hidden").is_err());
        assert!(validate_type_name("Bad-Name").is_err());
        assert!(validate_type_name("string").is_err());
        assert!(validate_type_name("Vec").is_err());
        assert!(validate_type_name("RpcClient").is_err());
        assert!(validate_type_name("match").is_err());
    }

    #[test]
    fn names_used_by_generated_code_are_reserved() {
        for name in ["T", "H", "I", "Sized", "IntoIterator", "u8", "usize", "str"] {
            let err = validate_type_name(name).expect_err(name);
            assert!(err.contains("reserved"), "{name}: {err}");
        }
        assert!(validate_type_name("Tx").is_ok());
        assert!(validate_type_name("U8").is_ok());
    }

    #[test]
    fn field_names() {
        assert!(validate_field_name("player_name").is_ok());
        assert!(validate_field_name("type").is_ok());
        assert!(validate_field_name("_reserved").is_ok());
        assert!(validate_field_name("self").is_err());
        assert!(validate_field_name("crate").is_err());
        assert!(validate_field_name("_").is_err());
        assert!(validate_field_name("9lives").is_err());
    }

    #[test]
    fn module_paths() {
        assert!(validate_module_path("super::messages").is_ok());
        assert!(validate_module_path("crate::proto::messages").is_ok());
        assert!(validate_module_path("super::super::wire").is_ok());
        assert!(validate_module_path("messages").is_ok());
        assert!(validate_module_path("").is_err());
        assert!(validate_module_path("proto::crate").is_err());
        assert!(validate_module_path("proto::").is_err());
        assert!(validate_crate_name("wirec_runtime").is_ok());
        assert!(validate_crate_name("wirec-runtime").is_err());
    }
}
