//! Canonical JSON serialization.
//!
//! Every hash and checksum in the system is computed over canonical JSON:
//! object keys sorted lexicographically at every depth, array order preserved,
//! compact output with no extraneous whitespace. Structurally-equal values
//! produce byte-identical output regardless of key insertion order, which
//! makes [`canonical_stringify`] the single source of truth for what counts
//! as "the same data".

use serde_json::Value;

/// Serialize a JSON value deterministically.
///
/// Keys are sorted at every nesting level; arrays keep their element order.
/// Scalars render through serde_json's standard formatting, so numbers and
/// string escapes are stable across calls and processes.
pub fn canonical_stringify(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Structural equality under canonical serialization.
///
/// `{"a":1,"b":2}` equals `{"b":2,"a":1}`; `[1,2]` does not equal `[2,1]`.
pub fn canonical_equals(a: &Value, b: &Value) -> bool {
    canonical_stringify(a) == canonical_stringify(b)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // serde_json's Display for Number is already canonical (shortest
        // round-trip for floats, plain decimal for integers)
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json handles escaping; a bare string cannot fail
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}
