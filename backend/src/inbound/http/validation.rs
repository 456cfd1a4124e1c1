//! Shared validation helpers for inbound HTTP adapters.

use actix_web::HttpRequest;
use actix_web::error::{JsonPayloadError, PathError};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, FieldViolation};

/// Parse a path segment as a UUID, reporting the segment name on failure.
pub(crate) fn path_uuid(field: &'static str, raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        let violation = FieldViolation {
            field: field.to_owned(),
            code: "invalid_uuid".to_owned(),
            message: format!("{field} must be a valid UUID"),
        };
        Error::invalid_request("request validation failed")
            .with_details(json!({ "fields": [violation] }))
    })
}

/// Turn malformed JSON bodies into `invalid_request` payloads.
pub(crate) fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let (code, message) = match &err {
        JsonPayloadError::ContentType => ("unsupported_content_type", "expected application/json"),
        JsonPayloadError::Deserialize(_) => ("malformed_body", "request body is not valid JSON"),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ("body_too_large", "request body is too large")
        }
        _ => ("malformed_body", "request body could not be read"),
    };
    Error::invalid_request(message)
        .with_details(json!({ "code": code, "reason": err.to_string() }))
        .into()
}

/// Turn undecodable path segments into `invalid_request` payloads.
pub(crate) fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request("path parameters are invalid")
        .with_details(json!({ "code": "invalid_path", "reason": err.to_string() }))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, post, test as actix_test, web};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    fn valid_uuids_parse() {
        let id = Uuid::new_v4();
        assert_eq!(path_uuid("id", &id.to_string()).expect("uuid"), id);
    }

    #[rstest]
    fn invalid_uuids_name_the_field() {
        let err = path_uuid("projectId", "nope").expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let field = err
            .details()
            .and_then(|d| d.pointer("/fields/0/field"))
            .and_then(Value::as_str);
        assert_eq!(field, Some("projectId"));
    }

    #[post("/echo")]
    async fn echo(body: web::Json<Value>) -> HttpResponse {
        HttpResponse::Ok().json(body.into_inner())
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .service(echo),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/echo")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body.get("code").and_then(Value::as_str), Some("invalid_request"));
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some("malformed_body")
        );
    }
}
