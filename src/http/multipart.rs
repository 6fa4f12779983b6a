//! Multipart form data support.
//!
//! Provides `multipart/form-data` encoding for file uploads. Text fields
//! carry url-encoded values; file parts carry the raw file bytes and the
//! content type resolved from the file name.
//!
//! # Example
//! ```ignore
//! use fetchnet::http::multipart::{Form, Part};
//!
//! let form = Form::new()
//!     .text("username", "user123")
//!     .part("file", Part::bytes(b"file content".as_slice()).file_name("doc.txt"));
//!
//! // Use form.into_body() to get the request body
//! ```

use bytes::Bytes;
use rand::Rng;
use std::borrow::Cow;
use url::form_urlencoded;

/// Random characters following the `----` boundary prefix.
const BOUNDARY_TOKEN_LEN: usize = 12;

/// A multipart form for file uploads.
#[derive(Debug)]
pub struct Form {
    boundary: String,
    fields: Vec<(Cow<'static, str>, Part)>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form.
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
            fields: Vec::new(),
        }
    }

    /// Add a text field. The value is url-encoded.
    pub fn text<N, V>(self, name: N, value: V) -> Self
    where
        N: Into<Cow<'static, str>>,
        V: AsRef<str>,
    {
        self.part(name, Part::text(value.as_ref()))
    }

    /// Add a custom part.
    pub fn part<N>(mut self, name: N, part: Part) -> Self
    where
        N: Into<Cow<'static, str>>,
    {
        self.fields.push((name.into(), part));
        self
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact size of the encoded body.
    fn content_length(&self) -> usize {
        if self.fields.is_empty() {
            return 0;
        }

        let mut length = 0usize;

        for (name, part) in &self.fields {
            // --boundary\r\n
            length += 2 + self.boundary.len() + 2;
            length += part.format_headers(name).len();
            // \r\n\r\n
            length += 4;
            length += part.data.len();
            // \r\n
            length += 2;
        }

        // Final boundary: --boundary--\r\n
        length += 2 + self.boundary.len() + 4;

        length
    }

    /// Convert the form into a body bytes.
    pub fn into_body(self) -> Bytes {
        if self.fields.is_empty() {
            return Bytes::new();
        }

        let mut output = Vec::with_capacity(self.content_length());

        for (name, part) in self.fields {
            output.extend_from_slice(b"--");
            output.extend_from_slice(self.boundary.as_bytes());
            output.extend_from_slice(b"\r\n");

            output.extend_from_slice(part.format_headers(&name).as_bytes());
            output.extend_from_slice(b"\r\n\r\n");

            output.extend_from_slice(&part.data);
            output.extend_from_slice(b"\r\n");
        }

        output.extend_from_slice(b"--");
        output.extend_from_slice(self.boundary.as_bytes());
        output.extend_from_slice(b"--\r\n");

        Bytes::from(output)
    }
}

/// A part of a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<Cow<'static, str>>,
}

impl Part {
    /// Create a text part holding the url-encoded `value`.
    pub fn text(value: &str) -> Self {
        Self {
            data: Bytes::from(raw_url_encode(value)),
            content_type: Some("application/x-www-form-urlencoded".to_string()),
            file_name: None,
        }
    }

    /// Create a part from bytes.
    pub fn bytes<B>(data: B) -> Self
    where
        B: Into<Bytes>,
    {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    /// Set the content type.
    pub fn content_type<S: Into<String>>(mut self, mime: S) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// Set the file name.
    pub fn file_name<S>(mut self, name: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.file_name = Some(name.into());
        self
    }

    fn format_headers(&self, name: &str) -> String {
        let mut header = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        );

        if let Some(ref filename) = self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }

        if let Some(ref mime) = self.content_type {
            header.push_str(&format!("\r\nContent-Type: {}", mime));
        }

        header
    }
}

/// Percent-encode with `%20` for spaces.
pub fn raw_url_encode(s: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every '+' left is a space
    form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Escape quotes and backslashes in a string.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains('\\') || s.contains('\r') || s.contains('\n') {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// `----` followed by random alphanumeric characters.
fn generate_boundary() -> String {
    let token: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(BOUNDARY_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("----{}", token)
}
