//! Request parsing for handler parameters: query string and path parameters merged into one
//! typed struct, and request headers decoded the same way.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::RawPathParamsRejection, FromRequestParts, Query, RawPathParams},
    http::{request::Parts, HeaderMap, Uri},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A query key seen once keeps its string; a repeated key collects every value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(first) => {
                let first = std::mem::take(first);
                *self = ParamValue::Many(vec![first, value]);
            }
            ParamValue::Many(values) => values.push(value),
        }
    }
}

pub type QueryParams = BTreeMap<String, ParamValue>;

/// Decode the query string of `uri`. Values of repeated keys keep arrival order.
pub fn parse_query_params(uri: &Uri) -> Result<QueryParams, AppError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut params = QueryParams::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                params.insert(key, ParamValue::Single(value));
            }
        }
    }
    Ok(params)
}

/// Best-effort typing of a raw parameter: integer, float, boolean, else string.
fn coerce(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn to_value(param: &ParamValue, typed: bool) -> Value {
    let one = |s: &str| if typed { coerce(s) } else { Value::String(s.to_string()) };
    match param {
        ParamValue::Single(s) => one(s),
        ParamValue::Many(values) => Value::Array(values.iter().map(|s| one(s)).collect()),
    }
}

fn merged(query: &QueryParams, path: &[(String, String)], typed: bool) -> Value {
    let mut map = Map::new();
    for (k, v) in query {
        map.insert(k.clone(), to_value(v, typed));
    }
    for (k, v) in path {
        map.insert(k.clone(), to_value(&ParamValue::Single(v.clone()), typed));
    }
    Value::Object(map)
}

/// Deserialize `P` from query and path parameters; path parameters win on name clashes.
/// Values are tried typed first, then as plain strings.
pub fn handler_params<P: DeserializeOwned>(query: &QueryParams, path: &[(String, String)]) -> Result<P, AppError> {
    match serde_json::from_value(merged(query, path, true)) {
        Ok(p) => Ok(p),
        Err(typed_err) => serde_json::from_value(merged(query, path, false))
            .map_err(|_| AppError::BadRequest(format!("invalid parameters: {}", typed_err))),
    }
}

/// Extractor form of [`handler_params`].
#[derive(Clone, Debug)]
pub struct HandlerParams<P>(pub P);

#[async_trait]
impl<S, P> FromRequestParts<S> for HandlerParams<P>
where
    S: Send + Sync,
    P: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = parse_query_params(&parts.uri)?;
        let path: Vec<(String, String)> = match RawPathParams::from_request_parts(parts, state).await {
            Ok(raw) => raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            Err(RawPathParamsRejection::MissingPathParams(_)) => Vec::new(),
            Err(e) => return Err(AppError::BadRequest(e.body_text())),
        };
        handler_params(&query, &path).map(HandlerParams)
    }
}

/// Request headers keyed by lowercase name. Repeated headers collect every value.
/// Values that are not visible ASCII are a 400.
pub fn parse_headers(headers: &HeaderMap) -> Result<QueryParams, AppError> {
    let mut params = QueryParams::new();
    for (name, value) in headers {
        let value = value
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("header '{}' is not valid text", name)))?
            .to_string();
        match params.get_mut(name.as_str()) {
            Some(existing) => existing.push(value),
            None => {
                params.insert(name.as_str().to_string(), ParamValue::Single(value));
            }
        }
    }
    Ok(params)
}

/// Request headers deserialized into `H`, typed first and then as plain strings. Use a map
/// type (`BTreeMap<String, String>`, `serde_json::Value`) for the raw header set.
#[derive(Clone, Debug)]
pub struct HandlerHeaders<H>(pub H);

#[async_trait]
impl<S, H> FromRequestParts<S> for HandlerHeaders<H>
where
    S: Send + Sync,
    H: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = parse_headers(&parts.headers)?;
        handler_params(&headers, &[]).map(HandlerHeaders)
    }
}
