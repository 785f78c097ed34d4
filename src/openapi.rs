//! OpenAPI documents for generic CRUD controllers, with the model schema taken from the
//! controller's type-resolution namespace.

use crate::config::MODEL_PARAM;
use crate::controller::GenericController;
use crate::error::ConfigError;
use crate::response::status_for;
use crate::service::Model;
use axum::http::Method;
use utoipa::openapi::path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{Array, KnownFormat, ObjectBuilder, SchemaFormat, Type};
use utoipa::openapi::{
    ComponentsBuilder, Content, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref, Required,
    ResponseBuilder,
};

const JSON: &str = "application/json";

fn json_content(schema: impl Into<utoipa::openapi::RefOr<utoipa::openapi::Schema>>) -> Content {
    ContentBuilder::new().schema(Some(schema)).build()
}

fn id_parameter() -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name("id")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .schema(Some(
            ObjectBuilder::new()
                .schema_type(Type::Integer)
                .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
                .build(),
        ))
        .build()
}

pub fn crud_openapi<T: Model>(controller: &GenericController<T>) -> Result<OpenApi, ConfigError> {
    let model = controller.model_type()?;
    let name = model.schema_name.clone();
    let schema = model.schema.clone().ok_or_else(|| ConfigError::UnresolvedModelType {
        param: MODEL_PARAM.to_string(),
    })?;
    let op_suffix = name.to_lowercase();
    let base = controller.path();
    let collection = if base.is_empty() { "/".to_string() } else { base.clone() };
    let detail = format!("{}/{{id}}", base);
    let record = || Ref::from_schema_name(name.clone());
    let status = |method: Method| {
        status_for(&method, controller.config().status_override(&method))
            .as_u16()
            .to_string()
    };

    let list = OperationBuilder::new()
        .operation_id(Some(format!("list_{}", op_suffix)))
        .summary(Some(format!("List {}", name)))
        .tag(name.clone())
        .response(
            status(Method::GET),
            ResponseBuilder::new()
                .description("All records")
                .content(JSON, json_content(Array::new(record()))),
        );
    let create = OperationBuilder::new()
        .operation_id(Some(format!("create_{}", op_suffix)))
        .summary(Some(format!("Create {}", name)))
        .tag(name.clone())
        .request_body(Some(
            RequestBodyBuilder::new()
                .content(JSON, json_content(record()))
                .required(Some(Required::True))
                .build(),
        ))
        .response(
            status(Method::POST),
            ResponseBuilder::new()
                .description("Created record")
                .content(JSON, json_content(record())),
        );
    let get = OperationBuilder::new()
        .operation_id(Some(format!("get_{}", op_suffix)))
        .summary(Some(format!("Get {} by id", name)))
        .tag(name.clone())
        .parameter(id_parameter())
        .response(
            status(Method::GET),
            ResponseBuilder::new()
                .description("Record")
                .content(JSON, json_content(record())),
        )
        .response("404", ResponseBuilder::new().description("Not found"));
    let update = OperationBuilder::new()
        .operation_id(Some(format!("update_{}", op_suffix)))
        .summary(Some(format!("Update {}; the path id wins over a body id", name)))
        .tag(name.clone())
        .parameter(id_parameter())
        .request_body(Some(
            RequestBodyBuilder::new()
                .content(JSON, json_content(record()))
                .required(Some(Required::True))
                .build(),
        ))
        .response(
            status(Method::PUT),
            ResponseBuilder::new()
                .description("Updated record")
                .content(JSON, json_content(record())),
        )
        .response("404", ResponseBuilder::new().description("Not found"));
    let delete = OperationBuilder::new()
        .operation_id(Some(format!("delete_{}", op_suffix)))
        .summary(Some(format!("Delete {}", name)))
        .tag(name.clone())
        .parameter(id_parameter())
        .response(status(Method::DELETE), ResponseBuilder::new().description("No content"))
        .response("404", ResponseBuilder::new().description("Not found"));

    let paths = PathsBuilder::new()
        .path(
            collection,
            PathItemBuilder::new()
                .operation(HttpMethod::Get, list)
                .operation(HttpMethod::Post, create)
                .build(),
        )
        .path(
            detail,
            PathItemBuilder::new()
                .operation(HttpMethod::Get, get)
                .operation(HttpMethod::Put, update)
                .operation(HttpMethod::Delete, delete)
                .build(),
        )
        .build();

    Ok(OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths)
        .components(Some(ComponentsBuilder::new().schema(name, schema).build()))
        .build())
}
