//! Multipart forms for the avatar and product image uploads.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use crate::api::Upload;
use crate::error::AppError;

/// Text fields plus at most one uploaded file.
///
/// Other file parts are drained; only their names are kept.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    file_names: Vec<(String, String)>,
    pub file: Option<Upload>,
}

impl MultipartForm {
    /// Drain `multipart`. The part named `file_field` becomes [`Self::file`]
    /// unless the browser sent it empty (no file chosen).
    ///
    /// At most `max_file_bytes` of the upload are kept in memory. A larger
    /// upload is still drained so [`Upload::size`] reports what was sent, but
    /// its bytes are dropped and size validation is expected to reject it.
    /// Other file parts are drained chunk by chunk without being buffered.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the body is not valid multipart.
    pub async fn read(
        mut multipart: Multipart,
        file_field: &str,
        max_file_bytes: u64,
    ) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await.map_err(bad_request)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let mut bytes = Vec::new();
                let mut size: u64 = 0;
                while let Some(chunk) = field.chunk().await.map_err(bad_request)? {
                    size = size.saturating_add(chunk.len() as u64);
                    if size <= max_file_bytes {
                        bytes.extend_from_slice(&chunk);
                    } else if !bytes.is_empty() {
                        bytes = Vec::new();
                    }
                }
                if !file_name.is_empty() && size > 0 {
                    form.file = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                        size,
                    });
                }
            } else if let Some(file_name) = field.file_name().map(str::to_string) {
                while field.chunk().await.map_err(bad_request)?.is_some() {}
                if !file_name.is_empty() {
                    form.file_names.push((name, file_name));
                }
            } else {
                let value = field.text().await.map_err(bad_request)?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    /// First value of a text field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value of a text field, or `""`.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Name of a file sent in a part other than the upload.
    #[must_use]
    pub fn file_name(&self, name: &str) -> Option<&str> {
        self.file_names
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a repeated field (checkbox groups).
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            file_names: Vec::new(),
            file: None,
        }
    }
}

fn bad_request(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
