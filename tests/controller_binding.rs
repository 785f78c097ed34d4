//! Binding a model type to a controller: validation, namespace contents, rebinding in derived
//! declarations, and schema generation from the namespace.

mod support;

use architect_crud::{
    common_routes, openapi_routes, ConfigError, ControllerConfig, GenericController, GenericCrudController,
    InMemoryRepository, InMemoryStore, TypeBinding, MODEL_PARAM, REPOSITORY_PARAM,
};
use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;
use std::any::TypeId;
use support::{people_store, send, Person, Pet};

#[test]
fn missing_model_type_fails_at_build() {
    let err = GenericController::<Person>::new(ControllerConfig::new("/people")).err();
    assert!(matches!(err, Some(ConfigError::MissingModelType { controller }) if controller == "/people"));

    let store = InMemoryStore::<Person>::new();
    let err = GenericCrudController::<Person, _>::new(ControllerConfig::new("/people"), store).err();
    assert!(matches!(err, Some(ConfigError::MissingModelType { .. })));
}

#[test]
fn declared_model_type_resolves_in_namespace() {
    let controller = GenericController::<Person>::new(ControllerConfig::new("/people").model_type::<Person>())
        .expect("controller");
    let model = controller.namespace().resolve(MODEL_PARAM).expect("T bound");
    assert_eq!(model.type_id, TypeId::of::<Person>());
    assert_eq!(model.schema_name, "Person");
    assert!(model.schema.is_some());
    assert!(controller.namespace().get(REPOSITORY_PARAM).is_none());
}

#[test]
fn crud_controller_records_repository_type() {
    let controller = GenericCrudController::<Person, _>::new(
        ControllerConfig::new("/people").model_type::<Person>(),
        InMemoryStore::<Person>::new(),
    )
    .expect("controller");
    let namespace = controller.controller().namespace();
    assert_eq!(namespace.len(), 2);
    let repository = namespace.resolve(REPOSITORY_PARAM).expect("R bound");
    assert_eq!(repository.type_id, TypeId::of::<InMemoryRepository<Person>>());
    assert_eq!(repository.schema_name, "InMemoryRepository");
}

#[test]
fn mismatched_model_type_is_rejected() {
    let err = GenericController::<Person>::new(ControllerConfig::new("/people").model_type::<Pet>()).err();
    assert!(matches!(err, Some(ConfigError::ModelTypeMismatch { .. })));
}

#[test]
fn invalid_path_is_rejected() {
    let err = GenericController::<Person>::new(ControllerConfig::new("people/:id").model_type::<Person>()).err();
    assert!(matches!(err, Some(ConfigError::InvalidPath(_))));
}

#[test]
fn placeholder_builds_but_cannot_route() {
    let base = ControllerConfig::new("/people").generic_model("T");
    let controller =
        GenericCrudController::<Person, _>::new(base, InMemoryStore::<Person>::new()).expect("intermediate builds");
    assert!(matches!(
        controller.controller().namespace().get(MODEL_PARAM),
        Some(TypeBinding::Placeholder(p)) if p == "T"
    ));
    assert!(matches!(controller.openapi(), Err(ConfigError::UnresolvedModelType { .. })));
    let err = controller.router().err();
    assert!(matches!(err, Some(ConfigError::UnresolvedModelType { param }) if param == MODEL_PARAM));
}

#[tokio::test]
async fn derived_declarations_rebind_without_new_handlers() {
    let base = ControllerConfig::new("/").generic_model("T");

    let people = GenericCrudController::<Person, _>::new(
        base.clone().path("/people").model_type::<Person>(),
        people_store().await,
    )
    .unwrap()
    .router()
    .unwrap();
    let pets_store = InMemoryStore::<Pet>::new();
    let pets = GenericCrudController::<Pet, _>::new(base.path("/pets").model_type::<Pet>(), pets_store.clone())
        .unwrap()
        .router()
        .unwrap();
    let app = Router::new().merge(people).merge(pets);

    let (status, body) = send(&app, "POST", "/pets", Some(json!({"name": "Rex"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "name": "Rex"}));
    assert_eq!(pets_store.len().unwrap(), 1);

    let (status, body) = send(&app, "GET", "/people/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Grace");

    let (status, body) = send(&app, "PUT", "/pets/1", Some(json!({"name": "Max"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Max");
}

#[tokio::test]
async fn openapi_document_uses_bound_model() {
    let controller = GenericCrudController::<Person, _>::new(
        ControllerConfig::new("/people").model_type::<Person>(),
        InMemoryStore::<Person>::new(),
    )
    .unwrap();
    let doc = controller.openapi().expect("document");
    let app = Router::new().merge(openapi_routes(doc)).merge(common_routes());

    let (status, doc) = send(&app, "GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["paths"]["/people"]["get"]["operationId"], "list_person");
    assert_eq!(doc["paths"]["/people"]["post"]["operationId"], "create_person");
    assert_eq!(
        doc["paths"]["/people/{id}"]["get"]["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/Person"
    );
    assert!(doc["paths"]["/people/{id}"]["delete"]["responses"]["204"].is_object());
    assert!(doc["components"]["schemas"]["Person"]["properties"]["first_name"].is_object());

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[test]
fn openapi_responses_follow_configured_status() {
    let config = ControllerConfig::new("/people")
        .model_type::<Person>()
        .status_code(Method::POST, StatusCode::ACCEPTED);
    let controller = GenericCrudController::<Person, _>::new(config, InMemoryStore::<Person>::new()).unwrap();
    let doc = serde_json::to_value(controller.openapi().expect("document")).unwrap();
    let responses = &doc["paths"]["/people"]["post"]["responses"];
    assert!(responses["202"].is_object());
    assert!(responses["201"].is_null());
    assert!(doc["paths"]["/people/{id}"]["delete"]["responses"]["204"].is_object());
}
