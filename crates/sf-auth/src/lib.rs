//! # sf-writer-auth
//!
//! Username/password login for the Bulk API.
//!
//! [`PasswordLogin`] calls the SOAP partner `login` operation and returns a
//! [`LoginSession`]. Passwords, security tokens and session ids never show up
//! in `Debug` output, tracing spans or error messages.
//!
//! ```rust,ignore
//! use sf_writer_auth::{login_url, PasswordLogin};
//!
//! let session = PasswordLogin::new("user@example.com", "password", "token")?
//!     .with_login_url(login_url(true))
//!     .authenticate()
//!     .await?;
//! println!("logged in to {}", session.instance_url());
//! ```

mod error;
mod login;
mod session;

pub use error::{Error, ErrorKind, Result};
pub use login::PasswordLogin;
pub use session::LoginSession;

pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// Login endpoint for a sandbox or a production org.
pub fn login_url(sandbox: bool) -> &'static str {
    if sandbox {
        SANDBOX_LOGIN_URL
    } else {
        PRODUCTION_LOGIN_URL
    }
}
