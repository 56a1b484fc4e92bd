//! The uploaded document as it travels with each question.
//!
//! The server never parses the PDF; it only carries it along. What it does
//! check is that a file handed to the CLI really is a PDF, mirroring the
//! upload widget's MIME check in the browser.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// A PDF encoded as a base64 data URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPayload(String);

impl DocumentPayload {
    /// Wrap a payload received from a client without inspecting it.
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    /// Encode raw file bytes, rejecting anything without a PDF header.
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(Error::InvalidRequest(
                "file is not a PDF (missing %PDF- header)".into(),
            ));
        }
        Ok(Self(format!(
            "{PDF_DATA_URL_PREFIX}{}",
            STANDARD.encode(bytes)
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the encoded payload in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_pdf_data_url(&self) -> bool {
        self.0.starts_with(PDF_DATA_URL_PREFIX)
    }
}
