//! Writer parameters.
//!
//! [`WriterConfig::resolve`] turns the raw `parameters` object of the job
//! configuration into a validated, normalized [`WriterConfig`].

use serde_json::{Map, Value};

use sf_writer_bulk::{BulkOperation, ConcurrencyMode};
use sf_writer_client::security::names;
use sf_writer_client::DEFAULT_API_VERSION;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::session::{JobSpec, LoginCredentials};

pub const KEY_USERNAME: &str = "username";
pub const KEY_PASSWORD: &str = "#password";
pub const KEY_SECURITY_TOKEN: &str = "#security_token";
pub const KEY_SANDBOX: &str = "sandbox";
pub const KEY_OBJECT: &str = "sf_object";
pub const KEY_OPERATION: &str = "operation";
pub const KEY_REPLACE_STRING: &str = "replace_string";
pub const KEY_UPSERT_FIELD_NAME: &str = "upsert_field_name";
pub const KEY_ASSIGNMENT_ID: &str = "assignment_id";
pub const KEY_SERIAL_MODE: &str = "serial_mode";
pub const KEY_FAIL_ON_ERROR: &str = "fail_on_error";
pub const KEY_API_VERSION: &str = "api_version";
pub const KEY_LOGIN_URL: &str = "login_url";
pub const KEY_BATCH_SIZE: &str = "batch_size";

/// Largest batch the Bulk API accepts.
pub const MAX_BATCH_SIZE: usize = 10_000;

// Encrypted keys are prefixed with '#', plain ones are accepted as well
const PASSWORD_KEYS: [&str; 2] = [KEY_PASSWORD, "password"];
const SECURITY_TOKEN_KEYS: [&str; 2] = [KEY_SECURITY_TOKEN, "security_token"];

/// Resolved writer configuration.
#[derive(Clone)]
pub struct WriterConfig {
    pub credentials: LoginCredentials,
    pub sf_object: String,
    pub operation: BulkOperation,
    pub replace_string: Option<String>,
    pub upsert_field_name: Option<String>,
    pub assignment_id: Option<String>,
    pub concurrency_mode: ConcurrencyMode,
    pub fail_on_error: bool,
    pub batch_size: usize,
}

impl std::fmt::Debug for WriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterConfig")
            .field("username", &self.credentials.username)
            .field("sf_object", &self.sf_object)
            .field("operation", &self.operation)
            .field("replace_string", &self.replace_string)
            .field("upsert_field_name", &self.upsert_field_name)
            .field("assignment_id", &self.assignment_id)
            .field("concurrency_mode", &self.concurrency_mode)
            .field("fail_on_error", &self.fail_on_error)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl WriterConfig {
    /// Validate and normalize the raw `parameters` object.
    ///
    /// All missing required keys are reported together.
    pub fn resolve(params: &Value) -> Result<Self> {
        let params = params
            .as_object()
            .ok_or_else(|| Error::configuration("Configuration parameters must be a JSON object"))?;

        let mut missing = Vec::new();
        let username = required_param(params, &[KEY_USERNAME], &mut missing);
        let sf_object = required_param(params, &[KEY_OBJECT], &mut missing);
        let password = required_param(params, &PASSWORD_KEYS, &mut missing);
        let security_token = required_param(params, &SECURITY_TOKEN_KEYS, &mut missing);
        let operation = required_param(params, &[KEY_OPERATION], &mut missing);

        let (Some(username), Some(sf_object), Some(password), Some(security_token), Some(operation)) =
            (username, sf_object, password, security_token, operation)
        else {
            return Err(Error::configuration(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        };

        let sf_object = sf_object.trim().to_string();
        if !names::is_safe_name(&sf_object) {
            return Err(Error::configuration(format!(
                "Invalid Salesforce object name: '{sf_object}'"
            )));
        }

        let operation = operation.trim().to_lowercase();
        let operation = BulkOperation::from_name(&operation).ok_or_else(|| {
            Error::configuration(format!(
                "Unsupported operation '{operation}': expected insert, update, upsert or delete"
            ))
        })?;

        let upsert_field_name = trimmed_param(params, KEY_UPSERT_FIELD_NAME);
        if operation == BulkOperation::Upsert && upsert_field_name.is_none() {
            return Err(Error::configuration(
                "Upsert operation requires an upsert_field_name",
            ));
        }

        let assignment_id = trimmed_param(params, KEY_ASSIGNMENT_ID);
        if let Some(id) = &assignment_id {
            if !names::is_valid_salesforce_id(id) {
                return Err(Error::configuration(format!(
                    "Invalid assignment rule id: '{id}'"
                )));
            }
        }

        let concurrency_mode = if flag_param(params, KEY_SERIAL_MODE)? {
            ConcurrencyMode::Serial
        } else {
            ConcurrencyMode::Parallel
        };

        let sandbox = flag_param(params, KEY_SANDBOX)?;
        let login_url = trimmed_param(params, KEY_LOGIN_URL)
            .unwrap_or_else(|| sf_writer_auth::login_url(sandbox).to_string());
        let api_version = trimmed_param(params, KEY_API_VERSION)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            credentials: LoginCredentials {
                username,
                password,
                security_token,
                login_url,
                api_version,
            },
            sf_object,
            operation,
            // Not trimmed: whitespace may be the intended separator
            replace_string: string_param(params, KEY_REPLACE_STRING).filter(|s| !s.is_empty()),
            upsert_field_name,
            assignment_id,
            concurrency_mode,
            fail_on_error: flag_param(params, KEY_FAIL_ON_ERROR)?,
            batch_size: batch_size_param(params)?,
        })
    }

    /// Job creation parameters for every chunk of this run.
    pub fn job_spec(&self) -> JobSpec {
        JobSpec {
            object: self.sf_object.clone(),
            operation: self.operation,
            external_id_field: self.upsert_field_name.clone(),
            assignment_rule_id: self.assignment_id.clone(),
            concurrency_mode: self.concurrency_mode,
        }
    }

    /// Name of the unsuccessful-rows table, e.g. `Contact_update_unsuccessful.csv`.
    pub fn unsuccessful_table_name(&self) -> String {
        format!("{}_{}_unsuccessful.csv", self.sf_object, self.operation)
    }
}

fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First present key wins; the first key is reported when none is present.
fn required_param(
    params: &Map<String, Value>,
    keys: &[&str],
    missing: &mut Vec<String>,
) -> Option<String> {
    let found = keys.iter().find_map(|key| string_param(params, key));
    if found.is_none() {
        missing.push(keys[0].to_string());
    }
    found
}

fn trimmed_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    string_param(params, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Booleans may arrive as JSON booleans, 0/1 or "true"/"false".
fn flag_param(params: &Map<String, Value>, key: &str) -> Result<bool> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => Ok(n.as_i64().unwrap_or(0) != 0),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "" | "false" | "0" | "no" => Ok(false),
            "true" | "1" | "yes" => Ok(true),
            other => Err(Error::configuration(format!(
                "Parameter '{key}' must be a boolean, got '{other}'"
            ))),
        },
        Some(other) => Err(Error::configuration(format!(
            "Parameter '{key}' must be a boolean, got {other}"
        ))),
    }
}

fn batch_size_param(params: &Map<String, Value>) -> Result<usize> {
    let Some(raw) = trimmed_param(params, KEY_BATCH_SIZE) else {
        return Ok(DEFAULT_BATCH_SIZE);
    };
    match raw.parse::<usize>() {
        Ok(size) if (1..=MAX_BATCH_SIZE).contains(&size) => Ok(size),
        _ => Err(Error::configuration(format!(
            "Parameter '{KEY_BATCH_SIZE}' must be between 1 and {MAX_BATCH_SIZE}, got '{raw}'"
        ))),
    }
}
