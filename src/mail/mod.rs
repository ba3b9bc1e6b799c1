pub mod brevo;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::MailConfig;
use crate::error::AppResult;

pub use brevo::BrevoMailer;

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> AppResult<()>;
}

pub type SharedMailer = Arc<dyn Mailer>;

/// Development mailer: writes the message to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        tracing::info!(to = %email.to, subject = %email.subject, body = %email.html, "Email (not sent, no provider configured)");
        Ok(())
    }
}

pub fn create_mailer(config: &MailConfig) -> SharedMailer {
    match &config.brevo_api_key {
        Some(key) => Arc::new(BrevoMailer::new(
            key.clone(),
            config.sender_email.clone(),
            config.sender_name.clone(),
        )),
        None => Arc::new(LogMailer),
    }
}

pub fn verification_link(website_domain: &str, email: &str, token: &str) -> String {
    let mut url = match url::Url::parse(website_domain) {
        Ok(url) => url,
        Err(_) => {
            return format!(
                "{}/account/verification?email={}&token={}",
                website_domain.trim_end_matches('/'),
                email,
                token
            )
        }
    };
    url.set_path("/account/verification");
    url.query_pairs_mut()
        .append_pair("email", email)
        .append_pair("token", token);
    url.to_string()
}

pub fn verification_email(website_domain: &str, email: &str, token: &str) -> Email {
    let link = verification_link(website_domain, email, token);
    Email {
        to: email.to_string(),
        subject: "Please verify your email before using our services".to_string(),
        html: format!(
            "<h3>Here is your verification link:</h3><p><a href=\"{link}\">{link}</a></p><p>Sincerely,<br/>Task Board</p>"
        ),
    }
}
