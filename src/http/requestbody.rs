//! Request body for POST/PUT operations.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::mime::MimeResolve;
use crate::http::multipart::{raw_url_encode, Form, Part};
use crate::http::requestspec::RequestSpec;
use bytes::Bytes;
use http::Method;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Request body for one URL, with the content type it must be sent under.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` data.
    Form(Bytes),
    /// `multipart/form-data` payload.
    Multipart { content_type: String, body: Bytes },
}

impl RequestBody {
    /// Build the body `spec` sends to `url`.
    ///
    /// Files are only attached to POST requests; every other method sends
    /// the url-encoded data registered for `url`, if there is any.
    pub async fn for_target(
        spec: &RequestSpec,
        url: &str,
        mime: &dyn MimeResolve,
    ) -> Result<Self, NetError> {
        let data = spec.body_for(url);

        if spec.method == Method::POST && spec.has_files() {
            let mut form = Form::new();
            if let Some(data) = data {
                for (key, value) in data.fields() {
                    form = form.text(raw_url_encode(&key), value);
                }
            }
            for (field, path) in &spec.files {
                let display = path.display().to_string();
                let bytes = tokio::fs::read(path).await.file_context(&display)?;
                let file_name = path
                    .file_name()
                    .map(|n| raw_url_encode(&n.to_string_lossy()))
                    .unwrap_or_default();
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .content_type(mime.resolve(path));
                form = form.part(field.clone(), part);
            }
            return Ok(RequestBody::Multipart {
                content_type: form.content_type(),
                body: form.into_body(),
            });
        }

        match data {
            Some(data) if !data.is_empty() => Ok(RequestBody::Form(Bytes::from(data.encode()))),
            _ => Ok(RequestBody::Empty),
        }
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Get the length of the body in bytes.
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Form(b) => b.len(),
            RequestBody::Multipart { body, .. } => body.len(),
        }
    }

    /// `Content-Type` to send, if there is a body.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Form(_) => Some(FORM_URLENCODED),
            RequestBody::Multipart { content_type, .. } => Some(content_type),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Form(b) => b,
            RequestBody::Multipart { body, .. } => body,
        }
    }
}
