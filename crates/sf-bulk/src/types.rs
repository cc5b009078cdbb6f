//! Types for the Bulk API (async `/services/async` endpoints).

use serde::{Deserialize, Deserializer, Serialize};
use sf_writer_client::security::xml;

use crate::error::{Error, ErrorKind, Result};

/// Deserialize API version that can be either a float (59.0) or string ("59.0").
pub(crate) fn deserialize_api_version<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    /// Insert new records
    Insert,
    /// Update existing records by Id
    Update,
    /// Upsert based on an external id field
    Upsert,
    /// Delete records by Id (soft delete)
    Delete,
}

impl BulkOperation {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
        }
    }

    /// Parse an operation name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "insert" => Some(BulkOperation::Insert),
            "update" => Some(BulkOperation::Update),
            "upsert" => Some(BulkOperation::Upsert),
            "delete" => Some(BulkOperation::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

/// How Salesforce processes the batches of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConcurrencyMode {
    /// Batches may run in parallel (the Salesforce default)
    #[default]
    Parallel,
    /// Batches run one at a time, avoiding record lock contention
    Serial,
}

impl ConcurrencyMode {
    /// Get the API string for this mode.
    pub fn api_name(&self) -> &'static str {
        match self {
            ConcurrencyMode::Parallel => "Parallel",
            ConcurrencyMode::Serial => "Serial",
        }
    }
}

/// Content type for batch data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

/// Request to create a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub object: String,
    pub operation: BulkOperation,
    pub content_type: ContentType,
    pub concurrency_mode: ConcurrencyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_rule_id: Option<String>,
}

impl CreateJobRequest {
    /// Create a new CSV job request.
    pub fn new(object: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: object.into(),
            operation,
            content_type: ContentType::Csv,
            concurrency_mode: ConcurrencyMode::default(),
            external_id_field_name: None,
            assignment_rule_id: None,
        }
    }

    /// Set the external id field (required for upsert).
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    /// Set the assignment rule applied to inserted or updated records.
    pub fn with_assignment_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.assignment_rule_id = Some(rule_id.into());
        self
    }

    /// Set the concurrency mode.
    pub fn with_concurrency_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }
}

/// Job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job accepts new batches
    Open,
    /// No more batches accepted; queued batches still run
    Closed,
    /// Job was aborted
    Aborted,
    /// Job failed
    Failed,
}

/// Request body that moves a job to a new state.
#[derive(Debug, Clone, Serialize)]
pub struct JobStateRequest {
    pub state: JobState,
}

impl JobStateRequest {
    /// Close the job.
    pub fn closed() -> Self {
        Self {
            state: JobState::Closed,
        }
    }
}

/// Job information returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: String,
    pub object: String,
    pub operation: BulkOperation,
    pub state: JobState,
    #[serde(default)]
    pub concurrency_mode: Option<ConcurrencyMode>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub assignment_rule_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub number_batches_total: u64,
    #[serde(default)]
    pub number_batches_completed: u64,
    #[serde(default)]
    pub number_batches_failed: u64,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
}

/// Batch states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Queued,
    InProgress,
    Completed,
    Failed,
    #[serde(rename = "Not Processed")]
    NotProcessed,
}

impl BatchState {
    /// Check if the batch is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Failed | BatchState::NotProcessed
        )
    }

    /// Check if the batch was processed.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchState::Completed)
    }

    fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "Queued" => Some(BatchState::Queued),
            "InProgress" => Some(BatchState::InProgress),
            "Completed" => Some(BatchState::Completed),
            "Failed" => Some(BatchState::Failed),
            "Not Processed" => Some(BatchState::NotProcessed),
            _ => None,
        }
    }
}

/// Batch information returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub id: String,
    pub job_id: String,
    pub state: BatchState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
}

impl BatchInfo {
    /// Parse a batch info body.
    ///
    /// CSV jobs answer batch calls in XML even when the job was created with
    /// JSON, so both encodings are accepted.
    pub fn parse(body: &str) -> Result<Self> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') {
            return Ok(serde_json::from_str(trimmed)?);
        }
        Self::from_xml(trimmed)
    }

    fn from_xml(body: &str) -> Result<Self> {
        let field = |tag: &str| {
            xml::extract_element(body, tag).ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(format!(
                    "batchInfo is missing <{tag}>"
                )))
            })
        };

        let state_name = field("state")?;
        let state = BatchState::from_api_name(&state_name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(format!(
                "unknown batch state: {state_name}"
            )))
        })?;

        Ok(Self {
            id: field("id")?,
            job_id: field("jobId")?,
            state,
            state_message: xml::extract_element(body, "stateMessage"),
            number_records_processed: count(body, "numberRecordsProcessed"),
            number_records_failed: count(body, "numberRecordsFailed"),
        })
    }

    /// Turn a terminal batch that was not processed into an error carrying
    /// Salesforce's state message.
    pub fn into_processed(self) -> Result<Self> {
        if self.state.is_success() {
            return Ok(self);
        }
        Err(Error::new(ErrorKind::BatchFailed {
            batch_id: self.id,
            state: self.state,
            message: self
                .state_message
                .unwrap_or_else(|| "no state message".to_string()),
        }))
    }
}

fn count(body: &str, tag: &str) -> u64 {
    xml::extract_element(body, tag)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Per-record outcome from a batch result file.
///
/// `success` and `created` keep Salesforce's string values ("true"/"false").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchRecordResult {
    #[serde(rename = "Id")]
    pub id: Option<String>,
    #[serde(rename = "Success")]
    pub success: String,
    #[serde(rename = "Created", default)]
    pub created: String,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Parse a batch result CSV (`"Id","Success","Created","Error"`).
pub fn parse_batch_results(csv_data: &str) -> Result<Vec<BatchRecordResult>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let mut results = Vec::new();
    for record in reader.deserialize() {
        let record: BatchRecordResult = record?;
        results.push(record);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(BulkOperation::from_name("Upsert"), Some(BulkOperation::Upsert));
        assert_eq!(BulkOperation::from_name(" DELETE "), Some(BulkOperation::Delete));
        assert_eq!(BulkOperation::from_name("hardDelete"), None);
        assert_eq!(BulkOperation::Insert.to_string(), "insert");
    }

    #[test]
    fn test_create_job_request_serialization() {
        let request = CreateJobRequest::new("Account", BulkOperation::Upsert)
            .with_external_id_field("Ext_Id__c")
            .with_assignment_rule_id("01Q5e000000XyZ1")
            .with_concurrency_mode(ConcurrencyMode::Serial);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "object": "Account",
                "operation": "upsert",
                "contentType": "CSV",
                "concurrencyMode": "Serial",
                "externalIdFieldName": "Ext_Id__c",
                "assignmentRuleId": "01Q5e000000XyZ1"
            })
        );
    }

    #[test]
    fn test_create_job_request_omits_unset_fields() {
        let json =
            serde_json::to_value(CreateJobRequest::new("Contact", BulkOperation::Insert)).unwrap();
        assert!(json.get("externalIdFieldName").is_none());
        assert!(json.get("assignmentRuleId").is_none());
        assert_eq!(json["concurrencyMode"], "Parallel");
    }

    #[test]
    fn test_job_info_deserialization() {
        let json = r#"{
            "apiVersion": 62.0,
            "concurrencyMode": "Parallel",
            "contentType": "CSV",
            "id": "750xx000000001",
            "object": "Account",
            "operation": "insert",
            "state": "Open",
            "numberBatchesTotal": 0
        }"#;
        let job: JobInfo = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "750xx000000001");
        assert_eq!(job.state, JobState::Open);
        assert_eq!(job.api_version.as_deref(), Some("62.0"));
        assert_eq!(job.concurrency_mode, Some(ConcurrencyMode::Parallel));
    }

    #[test]
    fn test_batch_info_from_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<batchInfo xmlns="http://www.force.com/2009/06/asyncapi/dataload">
  <id>751xx000000001</id>
  <jobId>750xx000000001</jobId>
  <state>Not Processed</state>
  <stateMessage>Job aborted</stateMessage>
  <numberRecordsProcessed>0</numberRecordsProcessed>
  <numberRecordsFailed>0</numberRecordsFailed>
</batchInfo>"#;
        let info = BatchInfo::parse(body).unwrap();
        assert_eq!(info.id, "751xx000000001");
        assert_eq!(info.job_id, "750xx000000001");
        assert_eq!(info.state, BatchState::NotProcessed);
        assert!(info.state.is_terminal());
        assert_eq!(info.state_message.as_deref(), Some("Job aborted"));
    }

    #[test]
    fn test_batch_info_from_json() {
        let body = r#"{"id":"751x","jobId":"750x","state":"InProgress","numberRecordsProcessed":10}"#;
        let info = BatchInfo::parse(body).unwrap();
        assert_eq!(info.state, BatchState::InProgress);
        assert!(!info.state.is_terminal());
        assert_eq!(info.number_records_processed, 10);
    }

    #[test]
    fn test_batch_info_unknown_state() {
        let body = "<batchInfo><id>1</id><jobId>2</jobId><state>Exploded</state></batchInfo>";
        let err = BatchInfo::parse(body).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidResponse(_)));
    }

    #[test]
    fn test_failed_batch_into_error() {
        let info = BatchInfo {
            id: "751x".into(),
            job_id: "750x".into(),
            state: BatchState::Failed,
            state_message: Some("InvalidBatch : Field name not found : Foo__c".into()),
            number_records_processed: 0,
            number_records_failed: 0,
        };
        let err = info.into_processed().unwrap_err();
        assert!(err.to_string().contains("Field name not found"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_batch_results() {
        let csv = "\"Id\",\"Success\",\"Created\",\"Error\"\n\
                   \"001xx0000001\",\"true\",\"true\",\"\"\n\
                   \"\",\"false\",\"false\",\"REQUIRED_FIELD_MISSING:Required fields are missing: [Name]:Name --\"\n";
        let results = parse_batch_results(csv).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id.as_deref(), Some("001xx0000001"));
        assert_eq!(results[0].success, "true");
        assert_eq!(results[0].error, None);
        assert_eq!(results[1].id, None);
        assert_eq!(results[1].success, "false");
        assert!(results[1]
            .error
            .as_deref()
            .unwrap()
            .starts_with("REQUIRED_FIELD_MISSING"));
    }

    #[test]
    fn test_parse_batch_results_empty() {
        let results = parse_batch_results("\"Id\",\"Success\",\"Created\",\"Error\"\n").unwrap();
        assert!(results.is_empty());
    }
}
