//! Incoming responses and error body mapping.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};
use crate::security::xml;

/// Longest error message kept from a response body.
const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// `Retry-After`, which Salesforce sends in seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    pub async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Pass 2xx responses through and turn anything else into an error built
    /// from its body.
    pub async fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status();
        let retry_after = self.retry_after();
        let body = self.text().await.unwrap_or_default();
        Err(error_from_body(status, retry_after, &body))
    }
}

/// Map a failed response to an error kind.
///
/// The async API reports failures as
/// `<error><exceptionCode/><exceptionMessage/></error>`, or the same fields
/// as JSON when the job uses JSON.
fn error_from_body(status: u16, retry_after: Option<Duration>, body: &str) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after });
    }

    let exception = xml::extract_element(body, "exceptionCode")
        .map(|code| {
            let message = xml::extract_element(body, "exceptionMessage").unwrap_or_default();
            (code, message)
        })
        .or_else(|| {
            serde_json::from_str::<AsyncApiError>(body)
                .ok()
                .map(|err| (err.exception_code, err.exception_message))
        });

    let kind = match exception {
        Some((code, message)) if code == "InvalidSessionId" => {
            ErrorKind::Authentication(redact(&message))
        }
        Some((exception_code, message)) => ErrorKind::AsyncApi {
            exception_code,
            message: redact(&message),
        },
        None if status == 401 => ErrorKind::Authentication(redact(body)),
        None => ErrorKind::Http {
            status,
            message: redact(body),
        },
    };
    Error::new(kind)
}

/// Strip session ids from a message and cut it to a loggable length.
fn redact(message: &str) -> String {
    // "<15 or 18 char org id>!<token>" and "sid=<token>"
    const PATTERNS: [(&str, &str); 2] = [
        (r"00[A-Za-z0-9]{13,16}![A-Za-z0-9_.]+", "[REDACTED]"),
        (r"sid=[A-Za-z0-9!_.]{20,}", "sid=[REDACTED]"),
    ];

    let mut redacted = message.trim().to_string();
    for (pattern, replacement) in PATTERNS {
        if let Ok(re) = regex_lite::Regex::new(pattern) {
            redacted = re.replace_all(&redacted, replacement).into_owned();
        }
    }

    if redacted.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !redacted.is_char_boundary(cut) {
            cut -= 1;
        }
        redacted.truncate(cut);
        redacted.push_str("...");
    }
    redacted
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AsyncApiError {
    exception_code: String,
    #[serde(default)]
    exception_message: String,
}
