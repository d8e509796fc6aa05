//! Contact form intake and mail composition.

use crate::error::RelayError;
use lazy_static::lazy_static;
use mail_client::{MailMessage, Mailbox};
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Closing line of every relayed submission.
pub const MAIL_FOOTER: &str = "This email was sent from JP Group Services contact form";

/// Contact form submission as received over HTTP.
///
/// Every field defaults to empty so a missing field surfaces as a
/// validation failure rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub company: Option<String>,
}

/// A submission that passed validation, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: String,
    pub company: Option<String>,
}

impl ContactForm {
    /// Check required fields and the email format.
    ///
    /// All offending fields are reported together.
    pub fn validate(self) -> Result<ValidatedContact, RelayError> {
        let contact = ValidatedContact {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            service: self.service.trim().to_string(),
            message: self.message.trim().to_string(),
            company: self
                .company
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };

        let mut invalid = Vec::new();
        for (field, value) in [
            ("name", &contact.name),
            ("email", &contact.email),
            ("phone", &contact.phone),
            ("service", &contact.service),
            ("message", &contact.message),
        ] {
            if value.is_empty() {
                invalid.push(field.to_string());
            }
        }

        if !contact.email.is_empty() && !is_valid_email(&contact.email) {
            invalid.push("email".to_string());
        }

        if invalid.is_empty() {
            Ok(contact)
        } else {
            Err(RelayError::Validation(invalid))
        }
    }
}

impl ValidatedContact {
    /// Compose the notification mail for this submission.
    ///
    /// Replies go straight back to the submitter.
    pub fn to_mail(&self, from: &Mailbox, inbox: &Mailbox) -> MailMessage {
        MailMessage {
            from: from.clone(),
            to: inbox.clone(),
            reply_to: Some(Mailbox::named(self.name.clone(), self.email.clone())),
            subject: format!("New Contact Form Submission from {}", self.name),
            text: self.text_body(),
            html: self.html_body(),
        }
    }

    fn text_body(&self) -> String {
        let mut body = format!(
            "Name: {}\nEmail: {}\nPhone: {}\n",
            self.name, self.email, self.phone
        );
        if let Some(company) = &self.company {
            body.push_str(&format!("Company: {}\n", company));
        }
        body.push_str(&format!(
            "Service: {}\nMessage: {}\n",
            self.service, self.message
        ));
        body
    }

    fn html_body(&self) -> String {
        let company = self
            .company
            .as_deref()
            .map(|c| format!("<p><strong>Company:</strong> {}</p>\n", escape_html(c)))
            .unwrap_or_default();

        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px;">New Contact Form Submission</h2>
  <div style="background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
    <p><strong>Phone:</strong> {phone}</p>
    {company}<p><strong>Service:</strong> {service}</p>
    <p><strong>Message:</strong></p>
    <div style="background: white; padding: 15px; border-radius: 5px; border-left: 4px solid #007bff;">{message}</div>
  </div>
  <p style="color: #666; font-size: 12px; text-align: center;">{footer}</p>
</div>
"#,
            name = escape_html(&self.name),
            email = escape_html(&self.email),
            phone = escape_html(&self.phone),
            company = company,
            service = escape_html(&self.service),
            message = escape_html(&self.message).replace('\n', "<br>"),
            footer = MAIL_FOOTER,
        )
    }
}

/// Check an address against a standard `local@domain.tld` pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
