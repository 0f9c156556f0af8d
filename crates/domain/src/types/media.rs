//! Media item types and censoring options

use serde::{Deserialize, Serialize};

use crate::constants::DOWNLOAD_FILE_PREFIX;
use crate::errors::{PrivacyGuardError, Result};

/// Media item metadata (`MediaResponse` on the backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub user_id: i64,
    pub original_url: String,
    pub processed_url: Option<String>,
    pub processed: bool,
    pub description: Option<String>,
}

/// What the server should detect and blur in an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensorOptions {
    pub faces: bool,
    pub plates: bool,
}

impl Default for CensorOptions {
    fn default() -> Self {
        Self { faces: true, plates: true }
    }
}

impl CensorOptions {
    /// At least one target must be selected.
    pub fn validate(&self) -> Result<()> {
        if self.faces || self.plates {
            Ok(())
        } else {
            Err(PrivacyGuardError::InvalidInput(
                "select at least one of faces or license plates to blur".into(),
            ))
        }
    }

    /// Human-readable list of selected targets.
    pub fn describe(&self) -> &'static str {
        match (self.faces, self.plates) {
            (true, true) => "faces and license plates",
            (true, false) => "faces",
            (false, true) => "license plates",
            (false, false) => "nothing",
        }
    }

    /// Description attached to an upload.
    pub fn upload_description(&self) -> String {
        format!("Processed with {}", self.describe())
    }
}

/// Local file name used when saving processed bytes.
pub fn censored_file_name(original: &str) -> String {
    format!("{DOWNLOAD_FILE_PREFIX}{original}")
}
