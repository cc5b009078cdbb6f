//! Full runs through the data directory, the SOAP login and the async API.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use sf_writer::{run_data_dir, ErrorKind};
use sf_writer_pipeline::AUTHENTICATION_FAILED;

use super::common::{data_dir, parameters, read, settings, MockOrg, JOB_ID};

const CONTACTS: &str = "Id,Name\n003xx0000000001,Ada\n003xx0000000002,Grace\n003xx0000000003,Edsger\n";

const ROW_TWO_FAILS: &str = "\"Id\",\"Success\",\"Created\",\"Error\"\n\
\"003xx0000000001\",\"true\",\"false\",\"\"\n\
\"\",\"false\",\"false\",\"ENTITY_IS_DELETED:entity is deleted:--\"\n\
\"003xx0000000003\",\"true\",\"false\",\"\"\n";

#[tokio::test]
async fn test_update_writes_unsuccessful_rows() {
    let org = MockOrg::start().await;
    org.accept_login(1).await;
    org.serve_jobs(1, ROW_TWO_FAILS).await;

    let (tmp, dir) = data_dir(parameters(&org, json!({})), "contacts.csv", CONTACTS);

    let report = run_data_dir(&dir, &settings()).await.unwrap();

    assert_eq!(report.summary.success_count, 2);
    assert_eq!(report.summary.error_count, 1);

    let table = tmp.path().join("out/tables/Contact_update_unsuccessful.csv");
    assert_eq!(report.unsuccessful_table.as_deref(), Some(table.as_path()));
    assert_eq!(
        read(&table),
        "Id,Name,error\n003xx0000000002,Grace,ENTITY_IS_DELETED:entity is deleted:--\n"
    );
    assert_eq!(
        read(tmp.path().join("out/tables/Contact_update_unsuccessful.csv.manifest")),
        r#"{"columns":["Id","Name","error"]}"#
    );
}

#[tokio::test]
async fn test_fail_on_error_exits_with_user_error() {
    let org = MockOrg::start().await;
    org.accept_login(1).await;
    org.serve_jobs(1, ROW_TWO_FAILS).await;

    let (tmp, dir) = data_dir(
        parameters(&org, json!({ "fail_on_error": true })),
        "contacts.csv",
        CONTACTS,
    );

    let err = run_data_dir(&dir, &settings()).await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::RowFailures { count: 1 }));
    assert_eq!(err.exit_code(), 1);
    assert!(!tmp.path().join("out/tables").exists());
}

#[tokio::test]
async fn test_all_rows_succeed_without_report() {
    let org = MockOrg::start().await;
    org.accept_login(1).await;
    org.serve_jobs(
        1,
        "\"Id\",\"Success\",\"Created\",\"Error\"\n\
         \"003xx0000000001\",\"true\",\"false\",\"\"\n\
         \"003xx0000000002\",\"true\",\"false\",\"\"\n\
         \"003xx0000000003\",\"true\",\"false\",\"\"\n",
    )
    .await;

    let (tmp, dir) = data_dir(parameters(&org, json!({})), "contacts.csv", CONTACTS);

    let report = run_data_dir(&dir, &settings()).await.unwrap();

    assert_eq!(report.summary.success_count, 3);
    assert!(report.unsuccessful_table.is_none());
    assert!(!tmp.path().join("out/tables").exists());
}

#[tokio::test]
async fn test_delete_with_two_columns_never_logs_in() {
    let org = MockOrg::start().await;
    org.accept_login(0).await;
    org.forbid_jobs().await;

    let (_tmp, dir) = data_dir(
        parameters(&org, json!({ "operation": "Delete" })),
        "contacts.csv",
        CONTACTS,
    );

    let err = run_data_dir(&dir, &settings()).await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Configuration(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_rejected_login_is_tried_three_times() {
    let org = MockOrg::start().await;
    org.reject_login(3).await;
    org.forbid_jobs().await;

    let (_tmp, dir) = data_dir(parameters(&org, json!({})), "contacts.csv", CONTACTS);

    let err = run_data_dir(&dir, &settings()).await.unwrap_err();

    assert_eq!(err.to_string(), AUTHENTICATION_FAILED);
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_rejected_job_is_retried_with_a_new_job() {
    let org = MockOrg::start().await;
    org.accept_login(1).await;

    // First creation is refused, later ones fall through to the lifecycle mocks
    Mock::given(method("POST"))
        .and(path("/services/async/62.0/job"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "exceptionCode": "InvalidJob",
            "exceptionMessage": "Unable to create job"
        })))
        .up_to_n_times(1)
        .expect(1)
        .with_priority(1)
        .mount(&org.server)
        .await;
    org.serve_jobs(
        1,
        "\"Id\",\"Success\",\"Created\",\"Error\"\n\
         \"003xx0000000001\",\"true\",\"false\",\"\"\n\
         \"003xx0000000002\",\"true\",\"false\",\"\"\n\
         \"003xx0000000003\",\"true\",\"false\",\"\"\n",
    )
    .await;

    let (_tmp, dir) = data_dir(parameters(&org, json!({})), "contacts.csv", CONTACTS);

    let report = run_data_dir(&dir, &settings()).await.unwrap();
    assert_eq!(report.summary.success_count, 3);
}

#[tokio::test]
async fn test_result_count_mismatch_fails_the_run() {
    let org = MockOrg::start().await;
    org.accept_login(1).await;
    org.serve_jobs(
        4,
        "\"Id\",\"Success\",\"Created\",\"Error\"\n\"003xx0000000001\",\"true\",\"false\",\"\"\n",
    )
    .await;

    let (tmp, dir) = data_dir(parameters(&org, json!({})), "contacts.csv", CONTACTS);

    let err = run_data_dir(&dir, &settings()).await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::BulkSubmission(_)));
    assert!(err.to_string().contains(JOB_ID));
    assert!(!tmp.path().join("out/tables").exists());
}

#[tokio::test]
async fn test_missing_parameters_are_reported_together() {
    let org = MockOrg::start().await;
    let (_tmp, dir) = data_dir(
        json!({ "username": "loader@example.com", "login_url": org.uri() }),
        "contacts.csv",
        CONTACTS,
    );

    let err = run_data_dir(&dir, &settings()).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("#password"));
    assert!(message.contains("sf_object"));
    assert!(message.contains("operation"));
    assert_eq!(err.exit_code(), 1);
}
