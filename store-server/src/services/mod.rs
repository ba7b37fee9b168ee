//! Infrastructure services

pub mod mailer;
pub mod provision;

pub use mailer::{Mailer, MailerError, MemoryMailer, OutgoingEmail, SesMailer};
pub use provision::{Provisioner, UuidProvisioner};
