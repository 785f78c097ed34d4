//! Shared fixtures for router tests.

#![allow(dead_code)]

use architect_crud::InMemoryStore;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Person {
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pet {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

pub fn person(first: &str, last: &str, age: u32) -> Person {
    Person {
        id: None,
        first_name: first.into(),
        last_name: last.into(),
        age: Some(age),
    }
}

pub async fn people_store() -> InMemoryStore<Person> {
    InMemoryStore::with_records([
        person("Ada", "Lovelace", 36),
        person("Alan", "Turing", 41),
        person("Grace", "Hopper", 85),
    ])
    .await
    .expect("seed store")
}

/// Send one request through `app`; an empty response body reads as `Value::Null`.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&v).expect("encode body"))
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
