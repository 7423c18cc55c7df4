//! External collaborators used by the auth and registration flows.
//!
//! Providers are interfaces; the application picks the implementation at
//! startup:
//!
//! - [`SmtpEmailProvider`]: real delivery through an SMTP relay
//! - [`ConsoleEmailProvider`]: development, logs the message
//! - `MockEmailProvider` (in `mocks`): tests, records messages

pub mod console_email;
pub mod email;
pub mod smtp_email;

pub use console_email::ConsoleEmailProvider;
pub use email::{EmailFuture, EmailProvider};
pub use smtp_email::SmtpEmailProvider;
