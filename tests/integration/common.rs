use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sf_writer::{DataDir, RunSettings};

pub const JOB_ID: &str = "750xx0000000001";
pub const BATCH_ID: &str = "751xx0000000001";

const INVALID_LOGIN_FAULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:sf="urn:fault.partner.soap.sforce.com">
<soapenv:Body><soapenv:Fault>
<faultcode>sf:INVALID_LOGIN</faultcode>
<faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

/// Settings with production attempt counts and no waiting.
pub fn settings() -> RunSettings {
    RunSettings::default().without_delays()
}

/// A mocked org serving both the SOAP login and the async API.
pub struct MockOrg {
    pub server: MockServer,
}

impl MockOrg {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn accept_login(&self, times: u64) {
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<serverUrl>{}/services/Soap/u/62.0/00Dxx0000001gEF</serverUrl>
<sessionId>00Dxx0000001gEF!session</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#,
            self.uri()
        );
        Mock::given(method("POST"))
            .and(path("/services/Soap/u/62.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn reject_login(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/services/Soap/u/62.0"))
            .respond_with(ResponseTemplate::new(500).set_body_string(INVALID_LOGIN_FAULT))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Serve the job lifecycle: create, batch, poll, close, results.
    pub async fn serve_jobs(&self, jobs: u64, results_csv: &str) {
        let job = json!({
            "id": JOB_ID,
            "object": "Contact",
            "operation": "update",
            "state": "Open",
            "apiVersion": 62.0
        });
        let mut closed = job.clone();
        closed["state"] = json!("Closed");

        Mock::given(method("POST"))
            .and(path("/services/async/62.0/job"))
            .respond_with(ResponseTemplate::new(201).set_body_json(job))
            .expect(jobs)
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/services/async/62.0/job/{JOB_ID}/batch")))
            .respond_with(ResponseTemplate::new(201).set_body_string(batch_xml("Queued")))
            .expect(jobs)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/services/async/62.0/job/{JOB_ID}/batch/{BATCH_ID}"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_string(batch_xml("Completed")))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/services/async/62.0/job/{JOB_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(closed))
            .expect(jobs)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/services/async/62.0/job/{JOB_ID}/batch/{BATCH_ID}/result"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_csv.to_string()))
            .expect(jobs)
            .mount(&self.server)
            .await;
    }

    /// Fail if any async API call is made.
    pub async fn forbid_jobs(&self) {
        Mock::given(path_regex("^/services/async/.*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

fn batch_xml(state: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <batchInfo xmlns=\"http://www.force.com/2009/06/asyncapi/dataload\">\
         <id>{BATCH_ID}</id><jobId>{JOB_ID}</jobId><state>{state}</state>\
         <numberRecordsProcessed>3</numberRecordsProcessed>\
         <numberRecordsFailed>0</numberRecordsFailed></batchInfo>"
    )
}

/// A data directory with `config.json` and a single input table.
pub fn data_dir(parameters: Value, table_name: &str, table: &str) -> (TempDir, DataDir) {
    let tmp = TempDir::new().expect("temp dir");
    let tables = tmp.path().join("in/tables");
    fs::create_dir_all(&tables).expect("tables dir");
    fs::write(tables.join(table_name), table).expect("input table");
    fs::write(
        tmp.path().join("config.json"),
        json!({ "parameters": parameters }).to_string(),
    )
    .expect("config.json");

    let dir = DataDir::new(tmp.path());
    (tmp, dir)
}

/// Writer parameters pointing the login at the mocked org.
pub fn parameters(org: &MockOrg, overrides: Value) -> Value {
    let mut params = json!({
        "username": "loader@example.com",
        "#password": "hunter2",
        "#security_token": "tok3n",
        "sf_object": "Contact",
        "operation": "update",
        "login_url": org.uri()
    });
    if let (Some(params), Some(overrides)) = (params.as_object_mut(), overrides.as_object()) {
        params.extend(overrides.clone());
    }
    params
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).expect("readable file")
}
