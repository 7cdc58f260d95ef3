//! Multipart form container.
//!
//! `MultipartForm` keeps its parts in attachment order. Hosts with a native
//! form type (a browser `FormData`) map the parts over directly. Hosts
//! without one call `encode` with a boundary of their choosing and send the
//! bytes with the matching `content_type`.

/// Content type used for file parts when the caller does not supply one.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The value of a single form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// A named part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn append_file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                content_type: OCTET_STREAM.to_string(),
                bytes: bytes.into(),
            },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Part names in attachment order.
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// `Content-Type` header value for a body encoded with `boundary`.
    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }

    /// A boundary that will not collide with realistic payloads.
    pub fn random_boundary() -> String {
        format!("----requestx-{}", uuid::Uuid::new_v4().simple())
    }

    /// Encode as a `multipart/form-data` body (RFC 7578).
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            let name = escape_quoted(&part.name);
            match &part.value {
                FormValue::Text(text) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let file_name = escape_quoted(file_name);
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }
}

/// Percent-encode the characters that would break a quoted parameter,
/// the way browsers do for `FormData` names.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
