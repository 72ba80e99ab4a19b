pub mod handler;
pub mod mailer;

pub use mailer::ContactMailer;
