//! End-to-end tests for the Table API and Attachment API adapters.
//!
//! A wiremock server stands in for the instance. Requests that no mock matches
//! get a 404, which the client reports as an API error, so every call the
//! profile builder makes has to be mocked explicitly.

use roleaudit_client::{InstanceConfig, TableApiClient};
use roleaudit_profile::{Filter, PackageRef, ProfileBuilder, RecordStore, StoreError};
use roleaudit_report::{deliver, DeliveryError, ReportFile};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture with a mock instance and a client pointed at it.
struct TestFixture {
    server: MockServer,
    client: TableApiClient,
}

impl TestFixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let mut config = InstanceConfig::new(server.uri()).with_credentials("auditor", "s3cret");
        config.timeout_secs = 5;
        config.page_limit = 500;
        let client = TableApiClient::new(config).unwrap();

        Self { server, client }
    }

    /// Mock `GET /api/now/table/<table>?sysparm_query=<query>` answering `result`.
    async fn table(&self, table: &str, query: &str, result: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/now/table/{}", table)))
            .and(query_param("sysparm_query", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.server)
            .await;
    }

    /// Mock `GET /api/now/table/<table>/<id>` answering `result`.
    async fn record(&self, table: &str, id: &str, result: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/now/table/{}/{}", table, id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_query_sends_encoded_query_and_credentials() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_role"))
        .and(query_param("sysparm_query", "name=itil"))
        .and(query_param("sysparm_exclude_reference_link", "true"))
        .and(query_param("sysparm_limit", "500"))
        .and(query_param("sysparm_offset", "0"))
        .and(basic_auth("auditor", "s3cret"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"sys_id": "r1", "name": "itil", "description": "", "sys_package": {"value": "pkg1"}}
            ]
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let records = fixture
        .client
        .query("sys_user_role", &[Filter::eq("name", "itil")])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), Some("r1"));
    assert_eq!(records[0].field("description"), None);
    assert_eq!(records[0].field("sys_package"), Some("pkg1"));
}

#[tokio::test]
async fn test_in_filter_encoding() {
    let fixture = TestFixture::new().await;
    fixture
        .table(
            "sys_security_acl",
            "sys_idINacl1,acl2",
            json!([{"sys_id": "acl1"}, {"sys_id": "acl2"}]),
        )
        .await;

    let records = fixture
        .client
        .query("sys_security_acl", &[Filter::one_of("sys_id", ["acl1", "acl2"])])
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_get_missing_record_is_none() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_package/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No Record found"},
            "status": "failure"
        })))
        .mount(&fixture.server)
        .await;

    let record = fixture.client.get("sys_package", "nope").await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_get_other_errors_propagate() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_package/pkg1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("node unavailable"))
        .mount(&fixture.server)
        .await;

    let err = fixture.client.get("sys_package", "pkg1").await.unwrap_err();
    assert_eq!(err, StoreError::Request("API error (500): node unavailable".into()));
}

#[tokio::test]
async fn test_query_follows_pages_until_short_page() {
    let server = MockServer::start().await;
    let mut config = InstanceConfig::new(server.uri()).with_credentials("auditor", "s3cret");
    config.page_limit = 2;
    let client = TableApiClient::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_security_acl_role"))
        .and(query_param("sysparm_query", "sys_user_role=r1"))
        .and(query_param("sysparm_limit", "2"))
        .and(query_param("sysparm_offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"sys_security_acl": "acl1"}, {"sys_security_acl": "acl2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_security_acl_role"))
        .and(query_param("sysparm_offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"sys_security_acl": "acl3"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .query("sys_security_acl_role", &[Filter::eq("sys_user_role", "r1")])
        .await
        .unwrap();

    let acls: Vec<&str> = records.iter().filter_map(|r| r.field("sys_security_acl")).collect();
    assert_eq!(acls, vec!["acl1", "acl2", "acl3"]);
}

#[tokio::test]
async fn test_caret_in_value_is_escaped_on_the_wire() {
    let fixture = TestFixture::new().await;
    fixture.table("sys_user_role", "name=x^^ORname=admin", json!([])).await;

    let records = fixture
        .client
        .query("sys_user_role", &[Filter::eq("name", "x^ORname=admin")])
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_forbidden_table_maps_to_access_denied() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_script"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .query("sys_script", &[Filter::eq("sys_id", "x")])
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::AccessDenied("sys_script".into()));
    assert!(err.is_table_scoped());
}

#[tokio::test]
async fn test_invalid_table_maps_to_unknown_table() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/x_custom_table"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid table x_custom_table", "detail": null},
            "status": "failure"
        })))
        .mount(&fixture.server)
        .await;

    let err = fixture.client.query("x_custom_table", &[]).await.unwrap_err();
    assert_eq!(err, StoreError::UnknownTable("x_custom_table".into()));
}

#[tokio::test]
async fn test_unauthorized_is_a_request_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_role"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fixture.server)
        .await;

    let err = fixture.client.query("sys_user_role", &[]).await.unwrap_err();
    assert_eq!(err, StoreError::Request("Authentication failed".into()));
    assert!(!err.is_table_scoped());
}

#[tokio::test]
async fn test_build_profile_against_instance() {
    let fixture = TestFixture::new().await;

    fixture
        .table(
            "sys_user_role",
            "name=itil",
            json!([{"sys_id": "r_itil", "name": "itil", "description": "Fulfiller"}]),
        )
        .await;
    fixture
        .record(
            "sys_user_role",
            "r_itil",
            json!({"sys_id": "r_itil", "name": "itil", "description": "Fulfiller"}),
        )
        .await;
    fixture
        .table(
            "sys_user_role_contains",
            "role=r_itil",
            json!([{"role": "r_itil", "contains": "r_approver"}]),
        )
        .await;
    fixture.table("sys_user_role_contains", "role=r_approver", json!([])).await;
    fixture
        .record(
            "sys_user_role",
            "r_approver",
            json!({"sys_id": "r_approver", "name": "approver_user", "sys_package": "pkg_itsm"}),
        )
        .await;
    fixture
        .table(
            "sys_security_acl_role",
            "sys_user_role=r_itil",
            json!([{"sys_user_role": "r_itil", "sys_security_acl": "acl1"}]),
        )
        .await;
    fixture.table("sys_security_acl_role", "sys_user_role=r_approver", json!([])).await;
    fixture
        .table(
            "sys_security_acl",
            "sys_idINacl1",
            json!([{"sys_id": "acl1", "name": "incident.state", "operation": "write", "type": "record"}]),
        )
        .await;
    fixture
        .table(
            "sys_db_object",
            "name=incident",
            json!([{"name": "incident", "sys_package": "pkg_itsm"}]),
        )
        .await;
    fixture
        .record("sys_package", "pkg_itsm", json!({"sys_id": "pkg_itsm", "name": "ITSM"}))
        .await;

    let profile = ProfileBuilder::new(&fixture.client).build("itil").await.unwrap();
    let complete = profile.complete().unwrap();

    let names: Vec<&str> = complete.all_roles.iter().map(|r| r.role.name.as_str()).collect();
    assert_eq!(names, vec!["itil", "approver_user"]);
    assert!(complete.all_roles[0].role.is_direct);
    assert_eq!(complete.all_roles[1].role.package, PackageRef::new("ITSM", "pkg_itsm"));

    let rule = &complete.all_roles[0].rules[0];
    assert_eq!(rule.table, "incident.state");
    assert_eq!(rule.operation_display, "write");
    assert_eq!(rule.table_package.name, "ITSM");
    assert_eq!(complete.applications.len(), 1);
    assert_eq!(complete.applications[0].roles, vec!["itil".to_string()]);
}

#[tokio::test]
async fn test_deliver_uploads_attachment_to_current_user() {
    let fixture = TestFixture::new().await;

    fixture
        .table("sys_user", "user_name=auditor", json!([{"sys_id": "u42", "user_name": "auditor"}]))
        .await;

    Mock::given(method("POST"))
        .and(path("/api/now/attachment/file"))
        .and(query_param("table_name", "sys_user"))
        .and(query_param("table_sys_id", "u42"))
        .and(query_param("file_name", "role_access_report_itil_1.csv"))
        .and(header("Content-Type", "text/csv"))
        .and(basic_auth("auditor", "s3cret"))
        .and(body_string("\"Error\",\"Role not found: itil\"\n"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": {"sys_id": "att9", "file_name": "role_access_report_itil_1.csv"}
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let file = ReportFile {
        file_name: "role_access_report_itil_1.csv".into(),
        content_type: "text/csv".into(),
        content: "\"Error\",\"Role not found: itil\"\n".into(),
    };
    let receipt = deliver(&fixture.client, &fixture.client, &file).await.unwrap();

    assert_eq!(receipt.attachment_id, "att9");
    assert_eq!(receipt.user_name, "auditor");
    assert_eq!(
        receipt.direct_link(&fixture.server.uri()),
        format!("{}/sys_attachment.do?sys_id=att9", fixture.server.uri())
    );
}

#[tokio::test]
async fn test_deliver_without_user_record() {
    let fixture = TestFixture::new().await;
    fixture.table("sys_user", "user_name=auditor", json!([])).await;

    let file = ReportFile {
        file_name: "r.html".into(),
        content_type: "text/html".into(),
        content: "<html></html>".into(),
    };
    let err = deliver(&fixture.client, &fixture.client, &file).await.unwrap_err();
    assert_eq!(err, DeliveryError::OwnerNotFound);
}

#[tokio::test]
async fn test_attachment_failure_is_write_failed() {
    let fixture = TestFixture::new().await;
    fixture
        .table("sys_user", "user_name=auditor", json!([{"sys_id": "u42"}]))
        .await;

    Mock::given(method("POST"))
        .and(path("/api/now/attachment/file"))
        .respond_with(ResponseTemplate::new(500).set_body_string("attachment store unavailable"))
        .mount(&fixture.server)
        .await;

    let file = ReportFile {
        file_name: "r.html".into(),
        content_type: "text/html".into(),
        content: "<html></html>".into(),
    };
    let err = deliver(&fixture.client, &fixture.client, &file).await.unwrap_err();
    assert_eq!(
        err,
        DeliveryError::WriteFailed("API error (500): attachment store unavailable".into())
    );
}
