use crate::models::{CareerApplication, ContactSubmission};
use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::StreamExt;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

/// `(field name, label)` pairs that must be non-blank.
pub const CONTACT_REQUIRED: [(&str, &str); 5] = [
    ("firstName", "First name"),
    ("lastName", "Last name"),
    ("email", "Email address"),
    ("subject", "Subject"),
    ("message", "Message"),
];

pub const CAREER_REQUIRED: [(&str, &str); 4] = [
    ("firstName", "First name"),
    ("lastName", "Last name"),
    ("email", "Email address"),
    ("phone", "Phone number"),
];

pub const RESUME_REQUIRED_MESSAGE: &str = "Please upload your resume to continue.";

const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Upload could not be read: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Resume is too large. Maximum size is {} KB.", .max_bytes / 1024)]
    ResumeTooLarge { max_bytes: usize },
    #[error("Field '{0}' is too long.")]
    FieldTooLong(String),
    #[error("Invalid UTF-8 in form field '{0}'.")]
    InvalidUtf8(String),
}

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> &'a str {
    fields.get(name).map(|s| s.trim()).unwrap_or_default()
}

/// Presence-only validation: one message per blank required field.
pub fn missing_required(fields: &HashMap<String, String>, required: &[(&str, &str)]) -> Vec<String> {
    required
        .iter()
        .filter(|(name, _)| field(fields, name).is_empty())
        .map(|(_, label)| format!("{} is required.", label))
        .collect()
}

pub fn contact_from_fields(fields: &HashMap<String, String>) -> ContactSubmission {
    ContactSubmission {
        first_name: field(fields, "firstName").to_string(),
        last_name: field(fields, "lastName").to_string(),
        email: field(fields, "email").to_string(),
        phone: field(fields, "phone").to_string(),
        company: field(fields, "company").to_string(),
        subject: field(fields, "subject").to_string(),
        message: field(fields, "message").to_string(),
    }
}

/// Base64 (standard alphabet, no data-URL prefix).
pub fn encode_attachment(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything posted with a career application.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    pub fields: HashMap<String, String>,
    pub resume: Option<ResumeUpload>,
}

impl ApplicationForm {
    pub fn value(&self, name: &str) -> &str {
        field(&self.fields, name)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = missing_required(&self.fields, &CAREER_REQUIRED);
        if self.resume.is_none() {
            errors.push(RESUME_REQUIRED_MESSAGE.to_string());
        }
        errors
    }

    /// Builds the outgoing payload; `None` while no resume is attached.
    pub fn to_application(&self, position: &str) -> Option<CareerApplication> {
        let resume = self.resume.as_ref()?;
        Some(CareerApplication {
            first_name: self.value("firstName").to_string(),
            last_name: self.value("lastName").to_string(),
            email: self.value("email").to_string(),
            phone: self.value("phone").to_string(),
            position: position.to_string(),
            base64: encode_attachment(&resume.bytes),
            filename: resume.filename.clone(),
            mime_type: resume.content_type.clone(),
        })
    }
}

/// An upload that could not be read, with the text fields parsed before it failed.
#[derive(Debug)]
pub struct RejectedUpload {
    pub error: FormError,
    pub fields: HashMap<String, String>,
}

/// Reads the multipart career form. The `resume` part is kept in memory up
/// to `max_resume_bytes`; an empty file input counts as no resume.
pub async fn read_application_form(payload: Multipart, max_resume_bytes: usize) -> Result<ApplicationForm, RejectedUpload> {
    let mut form = ApplicationForm::default();
    match read_parts(payload, max_resume_bytes, &mut form).await {
        Ok(()) => Ok(form),
        Err(error) => Err(RejectedUpload {
            error,
            fields: form.fields,
        }),
    }
}

async fn read_parts(mut payload: Multipart, max_resume_bytes: usize, form: &mut ApplicationForm) -> Result<(), FormError> {
    while let Some(item) = payload.next().await {
        let mut part = item?;
        let name = part.content_disposition().get_name().unwrap_or_default().to_string();

        if name == "resume" {
            let filename = part.content_disposition().get_filename().unwrap_or_default().to_string();
            let content_type = part
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = part.next().await {
                let data = chunk?;
                if bytes.len() + data.len() > max_resume_bytes {
                    return Err(FormError::ResumeTooLarge { max_bytes: max_resume_bytes });
                }
                bytes.extend_from_slice(&data);
            }

            if !bytes.is_empty() {
                form.resume = Some(ResumeUpload {
                    filename: if filename.is_empty() { "resume".to_string() } else { filename },
                    content_type,
                    bytes,
                });
            }
        } else {
            let mut data = Vec::new();
            while let Some(chunk) = part.next().await {
                let chunk = chunk?;
                if data.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(FormError::FieldTooLong(name));
                }
                data.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(data).map_err(|_| FormError::InvalidUtf8(name.clone()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(())
}
