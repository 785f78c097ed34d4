//! Field renaming between model keys and wire keys: explicit per-field renames, then an
//! optional case strategy. Applied to top-level keys of records (and of each record in a list).

use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameStrategy {
    /// snake_case model keys <-> camelCase wire keys.
    Camel,
}

#[derive(Clone, Debug, Default)]
pub struct DtoConfig {
    /// model field name -> wire name. Takes precedence over the strategy.
    pub rename_fields: BTreeMap<String, String>,
    pub rename_strategy: Option<RenameStrategy>,
}

impl DtoConfig {
    pub fn rename(mut self, field: impl Into<String>, wire: impl Into<String>) -> Self {
        self.rename_fields.insert(field.into(), wire.into());
        self
    }

    pub fn strategy(mut self, strategy: RenameStrategy) -> Self {
        self.rename_strategy = Some(strategy);
        self
    }

    pub fn is_identity(&self) -> bool {
        self.rename_fields.is_empty() && self.rename_strategy.is_none()
    }

    /// Wire name for a model field.
    pub fn wire_name(&self, field: &str) -> String {
        if let Some(w) = self.rename_fields.get(field) {
            return w.clone();
        }
        match self.rename_strategy {
            Some(RenameStrategy::Camel) => to_camel_case(field),
            None => field.to_string(),
        }
    }

    /// Model field name for a wire key.
    pub fn field_name(&self, wire: &str) -> String {
        if let Some((field, _)) = self.rename_fields.iter().find(|(_, w)| w.as_str() == wire) {
            return field.clone();
        }
        match self.rename_strategy {
            Some(RenameStrategy::Camel) => to_snake_case(wire),
            None => wire.to_string(),
        }
    }

    /// Rename a serialized record (or list of records) for the response.
    pub fn outbound(&self, value: Value) -> Value {
        if self.is_identity() {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(rename_keys(map, |k| self.wire_name(k))),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.outbound(v)).collect()),
            other => other,
        }
    }

    /// Rename a request body object back to model keys.
    pub fn inbound(&self, map: Map<String, Value>) -> Map<String, Value> {
        if self.is_identity() {
            return map;
        }
        rename_keys(map, |k| self.field_name(k))
    }
}

fn rename_keys<F: Fn(&str) -> String>(map: Map<String, Value>, f: F) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (f(&k), v)).collect()
}

/// "user_id" -> "userId", "created_at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// "userId" -> "user_id", "createdAt" -> "created_at". A run of capitals is one word:
/// "userID" -> "user_id", "HTTPServer" -> "http_server".
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn case_conversion() {
        assert_eq!(to_camel_case("created_at"), "createdAt");
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("parseURLNow"), "parse_url_now");
        assert_eq!(to_snake_case("address2Line"), "address2_line");
    }

    #[test]
    fn acronym_wire_keys_map_to_model_fields() {
        let dto = DtoConfig::default().strategy(RenameStrategy::Camel);
        let body = json!({"userID": 3, "firstName": "a"}).as_object().cloned().unwrap();
        assert_eq!(Value::Object(dto.inbound(body)), json!({"user_id": 3, "first_name": "a"}));
        // outbound uses the plain camelCase spelling
        assert_eq!(dto.outbound(json!({"user_id": 3})), json!({"userId": 3}));
    }

    #[test]
    fn explicit_rename_both_ways() {
        let dto = DtoConfig::default().rename("id", "ouid");
        let out = dto.outbound(json!([{"id": 1, "name": "a"}]));
        assert_eq!(out, json!([{"ouid": 1, "name": "a"}]));

        let body = json!({"ouid": 7, "name": "b"}).as_object().cloned().unwrap();
        assert_eq!(Value::Object(dto.inbound(body)), json!({"id": 7, "name": "b"}));
    }

    #[test]
    fn explicit_rename_wins_over_strategy() {
        let dto = DtoConfig::default()
            .strategy(RenameStrategy::Camel)
            .rename("first_name", "given");
        let out = dto.outbound(json!({"first_name": "x", "last_name": "y"}));
        assert_eq!(out, json!({"given": "x", "lastName": "y"}));
        assert_eq!(dto.field_name("lastName"), "last_name");
        assert_eq!(dto.field_name("given"), "first_name");
    }

    #[test]
    fn identity_leaves_scalars_and_keys() {
        let dto = DtoConfig::default();
        assert_eq!(dto.outbound(json!({"a_b": 1})), json!({"a_b": 1}));
        assert_eq!(DtoConfig::default().rename("a", "b").outbound(json!(3)), json!(3));
    }
}
