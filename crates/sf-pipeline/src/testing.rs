//! In-memory session fakes for pipeline tests.

use std::sync::{Arc, Mutex};

use crate::error::{Error, ErrorKind, Result};
use crate::session::{BulkSession, JobSpec, LoginCredentials, RowResult, SessionFactory};
use crate::source::InputRow;

pub fn credentials() -> LoginCredentials {
    LoginCredentials {
        username: "loader@example.com".into(),
        password: "hunter2".into(),
        security_token: "tok3n".into(),
        login_url: "https://login.salesforce.com".into(),
        api_version: "62.0".into(),
    }
}

/// Build rows sharing one header list.
pub fn rows(headers: &[&str], values: &[&[&str]]) -> Vec<InputRow> {
    let headers = Arc::new(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    values
        .iter()
        .map(|row| InputRow::new(Arc::clone(&headers), row.iter().map(|v| v.to_string()).collect()))
        .collect()
}

#[derive(Default)]
struct Script {
    failing_logins: usize,
    failing_jobs: usize,
    transient_submits: usize,
    failing_batches: usize,
    short_results: usize,
    /// Rows containing this value are rejected with the given error.
    reject: Option<(String, String)>,
}

#[derive(Default)]
struct Calls {
    logins: usize,
    jobs: Vec<JobSpec>,
    batches: Vec<String>,
    waits: usize,
    closed: usize,
    fetches: usize,
}

/// Scripted [`SessionFactory`] recording every call its sessions make.
#[derive(Clone, Default)]
pub struct FakeFactory {
    script: Arc<Script>,
    calls: Arc<Mutex<Calls>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(mut self, edit: impl FnOnce(&mut Script)) -> Self {
        if let Some(script) = Arc::get_mut(&mut self.script) {
            edit(script);
        }
        self
    }

    pub fn failing_logins(self, n: usize) -> Self {
        self.script(|s| s.failing_logins = n)
    }

    pub fn failing_jobs(self, n: usize) -> Self {
        self.script(|s| s.failing_jobs = n)
    }

    pub fn transient_submits(self, n: usize) -> Self {
        self.script(|s| s.transient_submits = n)
    }

    pub fn failing_batches(self, n: usize) -> Self {
        self.script(|s| s.failing_batches = n)
    }

    pub fn short_results(self, n: usize) -> Self {
        self.script(|s| s.short_results = n)
    }

    pub fn rejecting(self, value: &str, error: &str) -> Self {
        let reject = Some((value.to_string(), error.to_string()));
        self.script(|s| s.reject = reject)
    }

    pub fn login_attempts(&self) -> usize {
        self.calls.lock().unwrap().logins
    }

    pub fn jobs_created(&self) -> usize {
        self.calls.lock().unwrap().jobs.len()
    }

    pub fn jobs(&self) -> Vec<JobSpec> {
        self.calls.lock().unwrap().jobs.clone()
    }

    pub fn batches(&self) -> Vec<String> {
        self.calls.lock().unwrap().batches.clone()
    }

    pub fn closed_jobs(&self) -> usize {
        self.calls.lock().unwrap().closed
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn authenticate(&self, _credentials: &LoginCredentials) -> Result<FakeSession> {
        let mut calls = self.calls.lock().unwrap();
        calls.logins += 1;
        if calls.logins <= self.script.failing_logins {
            return Err(Error::new(ErrorKind::Authentication(
                "INVALID_LOGIN: Invalid username, password, security token; or user locked out."
                    .into(),
            )));
        }
        Ok(FakeSession {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
        })
    }
}

pub struct FakeSession {
    script: Arc<Script>,
    calls: Arc<Mutex<Calls>>,
}

impl BulkSession for FakeSession {
    async fn create_job(&self, spec: &JobSpec) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.jobs.push(spec.clone());
        if calls.jobs.len() <= self.script.failing_jobs {
            return Err(Error::new(ErrorKind::BulkSubmission(
                "InvalidJob: rejected".into(),
            )));
        }
        Ok(format!("750{:012}", calls.jobs.len()))
    }

    async fn submit_batch(&self, _job_id: &str, csv_data: String) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.batches.push(csv_data);
        if calls.batches.len() <= self.script.transient_submits {
            return Err(Error::new(ErrorKind::TransientNetwork(
                "connection reset".into(),
            )));
        }
        Ok(format!("751{:012}", calls.batches.len()))
    }

    async fn wait_for_batch(&self, _job_id: &str, batch_id: &str) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.waits += 1;
        if calls.waits <= self.script.failing_batches {
            return Err(Error::new(ErrorKind::BulkSubmission(format!(
                "Batch {batch_id} Failed: InvalidBatch"
            ))));
        }
        Ok(())
    }

    async fn close_job(&self, _job_id: &str) -> Result<()> {
        self.calls.lock().unwrap().closed += 1;
        Ok(())
    }

    async fn batch_results(&self, _job_id: &str, batch_id: &str) -> Result<Vec<RowResult>> {
        let mut calls = self.calls.lock().unwrap();
        calls.fetches += 1;
        let short = calls.fetches <= self.script.short_results;
        let csv_data = calls.batches.last().cloned().unwrap_or_default();
        drop(calls);

        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let mut results = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let rejected = self
                .script
                .reject
                .as_ref()
                .filter(|(value, _)| record.iter().any(|v| v == value));
            results.push(match rejected {
                Some((_, error)) => RowResult {
                    id: None,
                    success: "false".into(),
                    created: "false".into(),
                    error: Some(error.clone()),
                },
                None => RowResult {
                    id: Some(format!("{}{i:03}", &batch_id[..12])),
                    success: "true".into(),
                    created: "true".into(),
                    error: None,
                },
            });
        }
        if short {
            results.pop();
        }
        Ok(results)
    }
}
