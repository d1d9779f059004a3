//! Canonical hashing of plans and normalized models.
//!
//! A hash is computed as:
//! ```text
//! hash = hex(BLAKE3(JCS(json)))
//! ```
//!
//! where JCS is the JSON Canonicalization Scheme (RFC 8785): sorted keys,
//! no whitespace, minimal number and string forms. Two plans with the same
//! operations in the same order hash identically, whatever revision token
//! they were computed against.

use crate::error::DocumentError;
use crate::model::NormalizedModel;
use crate::plan::Plan;

/// Computes the canonical BLAKE3 hash of a plan's operation list.
///
/// # Example
/// ```
/// use blockrig_spec::{normalize, plan, ModelSpec, PlanMode};
/// use blockrig_spec::hash::plan_hash;
///
/// let model = normalize(&ModelSpec::default(), 16).unwrap();
/// let plan = plan(&model, &[], &[], PlanMode::Merge, false).unwrap();
/// let hash = plan_hash(&plan).unwrap();
/// assert_eq!(hash.len(), 64);
/// ```
pub fn plan_hash(plan: &Plan) -> Result<String, DocumentError> {
    let value = serde_json::to_value(&plan.ops)?;
    canonical_value_hash(&value)
}

/// Computes the canonical BLAKE3 hash of a normalized model.
pub fn model_hash(model: &NormalizedModel) -> Result<String, DocumentError> {
    let value = serde_json::to_value(model)?;
    canonical_value_hash(&value)
}

/// Computes the canonical BLAKE3 hash of a JSON value.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn canonical_value_hash(value: &serde_json::Value) -> Result<String, DocumentError> {
    let canonical = canonicalize_json(value)?;
    let hash = blake3::hash(canonical.as_bytes());
    Ok(hash.to_hex().to_string())
}

/// Canonicalizes a JSON value according to RFC 8785 (JCS).
pub fn canonicalize_json(value: &serde_json::Value) -> Result<String, DocumentError> {
    let mut out = String::new();
    write_canonical(value, &mut out);
    Ok(out)
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => out.push_str(&format_jcs_number(n)),
        serde_json::Value::String(s) => write_jcs_string(s, out),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        serde_json::Value::Object(obj) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = obj.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_jcs_string(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

/// Formats a number according to JCS rules.
fn format_jcs_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            if f == 0.0 {
                // also folds -0.0
                return "0".to_string();
            }
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
            let s = format!("{}", f);
            if s.contains('.') && !s.contains('e') {
                return s.trim_end_matches('0').trim_end_matches('.').to_string();
            }
            s
        }
        _ => "null".to_string(),
    }
}

fn write_jcs_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
