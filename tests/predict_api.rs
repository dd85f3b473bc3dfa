//! Drives the real handlers against the shipped artifact.

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use attrition_predictor::inference::AttritionArtifact;
use attrition_predictor::models::{MSG_LIKELY_LEAVE, MSG_LIKELY_STAY, MSG_MISSING_FIELDS};
use attrition_predictor::routes;

fn shipped_artifact() -> Arc<AttritionArtifact> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/model/attrition_detection.json");
    Arc::new(AttritionArtifact::load(path).expect("shipped artifact must load"))
}

fn complete_record() -> Value {
    json!({
        "Age": 30,
        "NumCompaniesWorked": 2,
        "YearsAtCompany": 5,
        "BusinessTravel": "Travel_Rarely",
        "Department": "Sales",
        "EducationField": "Life Sciences",
        "JobRole": "Sales Executive",
        "MaritalStatus": "Single",
        "OverTime": "Yes"
    })
}

macro_rules! service {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(shipped_artifact()))
                .configure(routes::configure),
        )
        .await
    };
}

macro_rules! predict {
    ($app:expr, $record:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json($record)
            .to_request();
        let resp = test::call_service($app, req).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn all_fields_unset_yields_missing_fields_error() {
    let app = service!();
    let (status, body) = predict!(&app, &json!({}));
    assert_eq!(status, 400);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!(MSG_MISSING_FIELDS));
    assert_eq!(body["data"], Value::Null);
}

#[actix_web::test]
async fn complete_record_yields_exactly_one_prediction_outcome() {
    let app = service!();
    let (status, body) = predict!(&app, &complete_record());
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["error"], Value::Null);

    let attrition = body["data"]["attrition"].as_str().unwrap();
    let message = body["data"]["message"].as_str().unwrap();
    match attrition {
        "Yes" => assert_eq!(message, MSG_LIKELY_LEAVE),
        "No" => assert_eq!(message, MSG_LIKELY_STAY),
        other => panic!("unexpected attrition label {other}"),
    }
}

#[actix_web::test]
async fn resetting_one_categorical_field_is_rejected() {
    let app = service!();
    let mut record = complete_record();
    record["OverTime"] = json!("");
    let (status, body) = predict!(&app, &record);
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!(MSG_MISSING_FIELDS));
}

#[actix_web::test]
async fn repeated_trigger_is_idempotent() {
    let app = service!();
    let record = complete_record();
    let (_, first) = predict!(&app, &record);
    for _ in 0..2 {
        let (status, body) = predict!(&app, &record);
        assert_eq!(status, 200);
        assert_eq!(body["data"]["attrition"], first["data"]["attrition"]);
        assert_eq!(body["data"]["message"], first["data"]["message"]);
        assert_eq!(body["data"]["probability"], first["data"]["probability"]);
    }
}

#[actix_web::test]
async fn zero_numeric_fields_are_valid() {
    let app = service!();
    let mut record = complete_record();
    record["Age"] = json!(0);
    record["NumCompaniesWorked"] = json!(0);
    record["YearsAtCompany"] = json!(0);
    let (status, body) = predict!(&app, &record);
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = service!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn model_info_reports_artifact_metadata() {
    let app = service!();
    let req = test::TestRequest::get().uri("/api/model-info").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let info = &body["data"];
    assert_eq!(info["feature_names"].as_array().unwrap().len(), 29);
    assert_eq!(info["categorical_cols"].as_array().unwrap().len(), 6);
    assert_eq!(info["threshold"], json!(0.5));
}
