//! Request and response types of the Nextcloud proxy endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public link to an uploaded or shared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShareUrlResponse {
    pub url: String,
}

/// Copy the donation image into one or more service folders.
///
/// Target folders come from `target_dir`, else `folder_names`, else
/// `parent_start_dates` (each `YYYY-MM-DD` becomes `MM_DD`).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CopyAndShareRequest {
    pub parent_start_dates: Option<Vec<String>>,
    pub folder_names: Option<Vec<String>>,
    /// Full source path; overrides `source_dir` and `filename`
    pub source_path: Option<String>,
    /// Full target folder such as `/Gottesdienst/12_24`
    pub target_dir: Option<String>,
    pub target_filename: Option<String>,
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

impl Default for CopyAndShareRequest {
    fn default() -> Self {
        Self {
            parent_start_dates: None,
            folder_names: None,
            source_path: None,
            target_dir: None,
            target_filename: None,
            source_dir: default_source_dir(),
            filename: default_filename(),
            base_dir: default_base_dir(),
        }
    }
}

/// Result for one copied file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CopiedFile {
    pub folder_name: String,
    pub path: String,
    pub url: String,
}

/// A single copy is returned flat, several as `items`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CopyAndShareResponse {
    Single(CopiedFile),
    Many { items: Vec<CopiedFile> },
}

impl From<Vec<CopiedFile>> for CopyAndShareResponse {
    fn from(mut files: Vec<CopiedFile>) -> Self {
        if files.len() == 1 {
            CopyAndShareResponse::Single(files.remove(0))
        } else {
            CopyAndShareResponse::Many { items: files }
        }
    }
}

/// Create (or reuse) a service folder with an editable public link
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ServiceFolderRequest {
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Folder name such as `12_24`
    pub folder_name: String,
}

fn default_source_dir() -> String {
    "/Gottesdienst/00_Orga".to_string()
}

fn default_filename() -> String {
    "Bauspende.png".to_string()
}

fn default_base_dir() -> String {
    "/Gottesdienst".to_string()
}
