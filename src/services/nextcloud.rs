//! Nextcloud proxy: WebDAV file operations and OCS public link shares.
//!
//! Every operation reads its credentials from [`NextcloudConfig`] at call time
//! so a server without a cloud backend still starts; the endpoints then report
//! the missing configuration.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

use crate::{
    config::NextcloudConfig,
    error::{AppError, AppResult},
    models::nextcloud::{CopiedFile, CopyAndShareRequest, ServiceFolderRequest},
};

/// Folder receiving sermon series attachments
const SERMON_SERIES_DIR: &str = "/Gottesdienst/00_Orga/Predigtreihen";

/// OCS share type of a public link
const PUBLIC_LINK: &str = "3";
const READ_ONLY: i64 = 1;
/// read + update + create + delete
const EDITABLE: i64 = 15;

/// Resolved connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    dav_base: String,
    ocs_base: String,
    username: String,
    password: String,
}

impl Endpoint {
    fn from_config(config: &NextcloudConfig) -> AppResult<Self> {
        let (Some(base_url), Some(username), Some(password)) = (
            config.base_url.as_deref().filter(|v| !v.is_empty()),
            config.username.as_deref().filter(|v| !v.is_empty()),
            config.password.as_deref().filter(|v| !v.is_empty()),
        ) else {
            return Err(AppError::Configuration(
                "Nextcloud configuration is missing on the server".to_string(),
            ));
        };

        let dav_base = base_url.trim_end_matches('/').to_string();
        if !dav_base.starts_with("http") {
            return Err(AppError::Configuration(
                "NEXTCLOUD_BASE_URL is invalid on the server".to_string(),
            ));
        }
        let ocs_base = dav_base
            .split("/remote.php")
            .next()
            .unwrap_or(&dav_base)
            .to_string();

        Ok(Self {
            dav_base,
            ocs_base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn dav_url(&self, path: &str) -> String {
        format!("{}{}", self.dav_base, path)
    }

    fn shares_url(&self) -> String {
        format!("{}/ocs/v2.php/apps/files_sharing/api/v1/shares", self.ocs_base)
    }
}

/// One share as reported by the OCS API
#[derive(Debug, Clone, PartialEq, Eq)]
struct Share {
    id: Option<i64>,
    permissions: Option<i64>,
    url: Option<String>,
}

/// What to copy where
#[derive(Debug, Clone, PartialEq, Eq)]
struct CopyPlan {
    source_path: String,
    filename: String,
    base_dir: String,
    folder_names: Vec<String>,
}

#[derive(Clone)]
pub struct NextcloudService {
    client: Client,
    config: NextcloudConfig,
}

impl NextcloudService {
    pub fn new(config: NextcloudConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Upload a sermon series attachment and return a read-only public link
    pub async fn upload_sermon_series_attachment(&self, original_name: Option<&str>, content: Vec<u8>) -> AppResult<String> {
        let endpoint = Endpoint::from_config(&self.config)?;

        let name = basename(original_name.unwrap_or_default());
        let name = if name.is_empty() { "attachment" } else { name };
        let remote_path = join_remote(SERMON_SERIES_DIR, name);

        let resp = self
            .client
            .put(endpoint.dav_url(&remote_path))
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .body(content)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Nextcloud for upload: {}", e)))?;
        if !matches!(resp.status().as_u16(), 200 | 201 | 204) {
            return Err(AppError::Upstream(format!(
                "Nextcloud upload failed with status {}",
                resp.status().as_u16()
            )));
        }
        tracing::info!(path = %remote_path, "Uploaded file to Nextcloud");

        let resp = self
            .create_share(&endpoint, &remote_path, READ_ONLY, false)
            .await?;
        if !matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) {
            return Err(AppError::Upstream(format!(
                "Nextcloud share failed with status {}",
                resp.status().as_u16()
            )));
        }
        let payload: Value = resp
            .json()
            .await
            .map_err(|_| AppError::Upstream("Could not parse Nextcloud share response".to_string()))?;

        let shares = parse_shares(&payload, &endpoint.ocs_base, &["100", "200"])
            .map_err(|message| AppError::Upstream(format!("Nextcloud share failed: {}", message)))?;
        shares
            .into_iter()
            .next()
            .and_then(|s| s.url)
            .ok_or_else(|| AppError::Upstream("Nextcloud did not return a public URL".to_string()))
    }

    /// Copy a file into one or more service folders and share each copy
    pub async fn copy_and_share(&self, request: &CopyAndShareRequest) -> AppResult<Vec<CopiedFile>> {
        let endpoint = Endpoint::from_config(&self.config)?;
        let plan = plan_copy(request)?;

        let mut results = Vec::with_capacity(plan.folder_names.len());
        for folder_name in &plan.folder_names {
            let folder_path = join_remote(&plan.base_dir, folder_name);
            self.ensure_folder(&endpoint, &folder_path).await?;

            let target_path = join_remote(&folder_path, &plan.filename);
            self.copy_file(&endpoint, &plan.source_path, &target_path).await?;

            let url = self.share_with_retries(&endpoint, &target_path).await?;
            tracing::info!(path = %target_path, "Copied and shared file");
            results.push(CopiedFile {
                folder_name: folder_name.clone(),
                path: target_path,
                url,
            });
        }
        Ok(results)
    }

    /// Create (or reuse) a service folder and return an editable public link
    pub async fn service_folder(&self, request: &ServiceFolderRequest) -> AppResult<String> {
        let endpoint = Endpoint::from_config(&self.config)?;

        let base_dir = normalise_remote_path(&request.base_dir);
        let folder_name = request.folder_name.trim().trim_matches('/');
        if folder_name.is_empty() {
            return Err(AppError::Validation("folder_name is required".to_string()));
        }
        let folder_path = join_remote(&base_dir, folder_name);

        self.ensure_folder(&endpoint, &folder_path).await?;

        let resp = self.create_share(&endpoint, &folder_path, EDITABLE, true).await?;
        if matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) {
            let shares = match resp.json::<Value>().await {
                Ok(payload) => parse_shares(&payload, &endpoint.ocs_base, &["100", "200"]).unwrap_or_default(),
                Err(_) => Vec::new(),
            };
            if let Some(share) = shares.into_iter().next() {
                if let Some(url) = share.url.clone() {
                    self.upgrade_if_needed(&endpoint, &share).await;
                    return Ok(url);
                }
            }
        }

        let mut shares = self
            .existing_shares(&endpoint, &folder_path)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Nextcloud for existing shares: {}", e)))?;
        shares.sort_by_key(|s| std::cmp::Reverse(s.permissions.unwrap_or(-1)));

        match shares.into_iter().next() {
            Some(share) => {
                let url = share
                    .url
                    .clone()
                    .ok_or_else(|| AppError::Upstream("Nextcloud did not return a public URL".to_string()))?;
                self.upgrade_if_needed(&endpoint, &share).await;
                Ok(url)
            }
            None => Err(AppError::Upstream("Nextcloud did not return a public URL".to_string())),
        }
    }

    async fn ensure_folder(&self, endpoint: &Endpoint, path: &str) -> AppResult<()> {
        let resp = self
            .client
            .request(webdav_method(b"MKCOL")?, endpoint.dav_url(path))
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Nextcloud for folder creation: {}", e)))?;

        // 405: already exists
        match resp.status().as_u16() {
            201 | 204 | 405 => Ok(()),
            status => Err(AppError::Upstream(format!(
                "Nextcloud folder creation failed with status {}",
                status
            ))),
        }
    }

    async fn copy_file(&self, endpoint: &Endpoint, source: &str, target: &str) -> AppResult<()> {
        let destination = encoded_url(&endpoint.dav_url(target));
        let resp = self
            .client
            .request(webdav_method(b"COPY")?, endpoint.dav_url(source))
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .header("Destination", destination)
            .header("Overwrite", "T")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Nextcloud for copy: {}", e)))?;

        match resp.status().as_u16() {
            201 | 204 => Ok(()),
            status => Err(AppError::Upstream(format!("Nextcloud copy failed with status {}", status))),
        }
    }

    /// A fresh copy is not always shareable right away
    async fn share_with_retries(&self, endpoint: &Endpoint, path: &str) -> AppResult<String> {
        let attempts = self.config.share_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.readonly_share(endpoint, path).await {
                Ok(url) => return Ok(url),
                Err(e) => {
                    tracing::debug!(path = %path, attempt, error = %e, "Share not available yet");
                    last_error = Some(e.to_string());
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(self.config.share_retry_delay_ms)).await;
                    }
                }
            }
        }

        Err(AppError::Upstream(format!(
            "Copied but could not create/reuse public share link: {}",
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        )))
    }

    /// Create a read-only public link, or reuse an existing one
    async fn readonly_share(&self, endpoint: &Endpoint, path: &str) -> AppResult<String> {
        let resp = self.create_share(endpoint, path, READ_ONLY, false).await?;
        if matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) {
            let payload = resp.json::<Value>().await.unwrap_or(Value::Null);
            // 102: already shared
            let url = parse_shares(&payload, &endpoint.ocs_base, &["100", "200", "102"])
                .ok()
                .and_then(|shares| shares.into_iter().next())
                .and_then(|s| s.url);
            if let Some(url) = url {
                return Ok(url);
            }
        }

        let existing = self.existing_shares(endpoint, path).await.unwrap_or_default();
        existing
            .into_iter()
            .find_map(|s| s.url)
            .ok_or_else(|| AppError::Upstream("Nextcloud did not return a public URL".to_string()))
    }

    async fn create_share(
        &self,
        endpoint: &Endpoint,
        path: &str,
        permissions: i64,
        public_upload: bool,
    ) -> AppResult<reqwest::Response> {
        let permissions = permissions.to_string();
        let mut form = vec![
            ("path", path),
            ("shareType", PUBLIC_LINK),
            ("permissions", permissions.as_str()),
        ];
        if public_upload {
            form.push(("publicUpload", "true"));
        }

        self.client
            .post(endpoint.shares_url())
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .header("OCS-APIREQUEST", "true")
            .query(&[("format", "json")])
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Nextcloud for sharing: {}", e)))
    }

    /// Shares already defined on `path`; empty when Nextcloud rejects the query
    async fn existing_shares(&self, endpoint: &Endpoint, path: &str) -> Result<Vec<Share>, reqwest::Error> {
        let resp = self
            .client
            .get(endpoint.shares_url())
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .header("OCS-APIREQUEST", "true")
            .query(&[("format", "json"), ("path", path), ("reshares", "true")])
            .send()
            .await?;

        if !matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) {
            return Ok(Vec::new());
        }
        Ok(match resp.json::<Value>().await {
            Ok(payload) => parse_shares(&payload, &endpoint.ocs_base, &["100", "200"]).unwrap_or_default(),
            Err(_) => Vec::new(),
        })
    }

    /// Best effort: raise a public link to editable permissions
    async fn upgrade_if_needed(&self, endpoint: &Endpoint, share: &Share) {
        let (Some(id), Some(permissions)) = (share.id, share.permissions) else {
            return;
        };
        if permissions >= EDITABLE {
            return;
        }

        let result = self
            .client
            .put(format!("{}/{}", endpoint.shares_url(), id))
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .header("OCS-APIREQUEST", "true")
            .query(&[("format", "json")])
            .form(&[("permissions", EDITABLE.to_string().as_str()), ("publicUpload", "true")])
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(share_id = id, error = %e, "Could not upgrade share permissions");
        }
    }
}

fn webdav_method(name: &[u8]) -> AppResult<Method> {
    Method::from_bytes(name).map_err(|e| AppError::Internal(format!("Invalid WebDAV method: {}", e)))
}

/// Percent-encoded form of a URL, as expected in the `Destination` header
fn encoded_url(raw: &str) -> String {
    Url::parse(raw).map(String::from).unwrap_or_else(|_| raw.to_string())
}

/// Shares contained in an OCS response.
///
/// `Err` carries the OCS message when the status code is not accepted.
fn parse_shares(payload: &Value, ocs_base: &str, accepted: &[&str]) -> Result<Vec<Share>, String> {
    let ocs = &payload["ocs"];
    let meta = &ocs["meta"];

    let status = match &meta["statuscode"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    if !accepted.contains(&status.as_str()) {
        return Err(meta["message"]
            .as_str()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown Nextcloud error")
            .to_string());
    }

    let items: Vec<&Value> = match &ocs["data"] {
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        item @ Value::Object(_) => vec![item],
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|item| Share {
            id: lenient_int(&item["id"]),
            permissions: lenient_int(&item["permissions"]),
            url: share_url(item, ocs_base),
        })
        .collect())
}

/// `url`, else `link`, else a link built from the share token
fn share_url(item: &Value, ocs_base: &str) -> Option<String> {
    let non_empty = |key: &str| item[key].as_str().filter(|s| !s.is_empty()).map(str::to_string);
    non_empty("url")
        .or_else(|| non_empty("link"))
        .or_else(|| non_empty("token").map(|token| format!("{}/index.php/s/{}", ocs_base, token)))
}

/// OCS returns numbers as JSON numbers or strings depending on the server
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn plan_copy(request: &CopyAndShareRequest) -> AppResult<CopyPlan> {
    let mut base_dir = normalise_remote_path(&request.base_dir);
    let mut source_dir = normalise_remote_path(&request.source_dir);
    let mut filename = basename(&request.filename).to_string();

    if let Some(source_path) = request.source_path.as_deref().filter(|s| !s.is_empty()) {
        let source_path = normalise_remote_path(source_path);
        source_dir = normalise_remote_path(non_empty_or(dirname(&source_path), "/"));
        filename = non_empty_or(basename(&source_path), &filename).to_string();
    }
    if let Some(target_filename) = request.target_filename.as_deref().filter(|s| !s.is_empty()) {
        filename = non_empty_or(basename(target_filename), &filename).to_string();
    }

    let folder_names = if let Some(target_dir) = request.target_dir.as_deref().filter(|s| !s.is_empty()) {
        let target_dir = normalise_remote_path(target_dir);
        base_dir = normalise_remote_path(non_empty_or(dirname(&target_dir), &base_dir));
        let folder = basename(&target_dir).trim();
        if folder.is_empty() {
            return Err(AppError::Validation(
                "target_dir must include a folder name like /Gottesdienst/MM_DD".to_string(),
            ));
        }
        vec![folder.to_string()]
    } else if let Some(names) = request.folder_names.as_ref().filter(|n| !n.is_empty()) {
        names
            .iter()
            .map(|n| n.trim().trim_matches('/').to_string())
            .filter(|n| !n.is_empty())
            .collect()
    } else if let Some(dates) = request.parent_start_dates.as_ref().filter(|d| !d.is_empty()) {
        dates
            .iter()
            .map(|d| folder_for_date(d))
            .collect::<AppResult<Vec<_>>>()?
    } else {
        return Err(AppError::Validation(
            "Either target_dir, folder_names or parent_start_dates must be provided".to_string(),
        ));
    };

    Ok(CopyPlan {
        source_path: join_remote(&source_dir, &filename),
        filename,
        base_dir,
        folder_names,
    })
}

/// `YYYY-MM-DD` to the `MM_DD` service folder name
fn folder_for_date(value: &str) -> AppResult<String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%m_%d").to_string())
        .map_err(|_| AppError::Validation(format!("Invalid date format: {} (expected YYYY-MM-DD)", value)))
}

/// Leading slash, no trailing slash (except for the root)
fn normalise_remote_path(path: &str) -> String {
    let path = path.trim();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/').to_string()
    }
}

fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Parent of a slash separated path; `/` for top level entries
fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OCS: &str = "https://cloud.example.org";

    fn config(base_url: Option<&str>) -> NextcloudConfig {
        NextcloudConfig {
            base_url: base_url.map(str::to_string),
            username: Some("planner".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_derives_ocs_base() {
        let endpoint =
            Endpoint::from_config(&config(Some("https://cloud.example.org/remote.php/dav/files/planner/"))).unwrap();
        assert_eq!(endpoint.dav_base, "https://cloud.example.org/remote.php/dav/files/planner");
        assert_eq!(endpoint.ocs_base, OCS);
        assert_eq!(
            endpoint.shares_url(),
            "https://cloud.example.org/ocs/v2.php/apps/files_sharing/api/v1/shares"
        );
    }

    #[test]
    fn test_endpoint_configuration_errors() {
        assert!(matches!(Endpoint::from_config(&config(None)), Err(AppError::Configuration(_))));
        assert!(matches!(
            Endpoint::from_config(&config(Some("cloud.example.org"))),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_share_url_preference() {
        let payload = json!({"ocs": {"meta": {"statuscode": 200}, "data": [
            {"id": "7", "permissions": 1, "token": "abc"},
            {"id": 8, "link": "https://cloud.example.org/s/link"},
            {"id": 9, "url": "https://cloud.example.org/s/url", "link": "ignored"}
        ]}});
        let shares = parse_shares(&payload, OCS, &["100", "200"]).unwrap();

        assert_eq!(shares[0].url.as_deref(), Some("https://cloud.example.org/index.php/s/abc"));
        assert_eq!(shares[0].id, Some(7));
        assert_eq!(shares[1].url.as_deref(), Some("https://cloud.example.org/s/link"));
        assert_eq!(shares[2].url.as_deref(), Some("https://cloud.example.org/s/url"));
    }

    #[test]
    fn test_single_object_data_and_string_status() {
        let payload = json!({"ocs": {"meta": {"statuscode": "100"}, "data": {"id": 3, "permissions": "15", "url": "u"}}});
        let shares = parse_shares(&payload, OCS, &["100"]).unwrap();
        assert_eq!(
            shares,
            vec![Share { id: Some(3), permissions: Some(15), url: Some("u".to_string()) }]
        );
    }

    #[test]
    fn test_rejected_status_returns_message() {
        let payload = json!({"ocs": {"meta": {"statuscode": 404, "message": "Wrong path"}, "data": []}});
        assert_eq!(parse_shares(&payload, OCS, &["100", "200"]), Err("Wrong path".to_string()));
        assert_eq!(
            parse_shares(&json!({}), OCS, &["100"]),
            Err("Unknown Nextcloud error".to_string())
        );
    }

    #[test]
    fn test_plan_from_dates() {
        let request = CopyAndShareRequest {
            parent_start_dates: Some(vec!["2024-12-24".to_string(), " 2025-01-05 ".to_string()]),
            ..Default::default()
        };
        let plan = plan_copy(&request).unwrap();
        assert_eq!(plan.folder_names, vec!["12_24", "01_05"]);
        assert_eq!(plan.source_path, "/Gottesdienst/00_Orga/Bauspende.png");
        assert_eq!(plan.base_dir, "/Gottesdienst");
    }

    #[test]
    fn test_plan_from_target_dir_and_source_path() {
        let request = CopyAndShareRequest {
            source_path: Some("Orga/Spende.jpg".to_string()),
            target_dir: Some("/Archiv/2024/12_24/".to_string()),
            folder_names: Some(vec!["ignored".to_string()]),
            ..Default::default()
        };
        let plan = plan_copy(&request).unwrap();
        assert_eq!(plan.source_path, "/Orga/Spende.jpg");
        assert_eq!(plan.filename, "Spende.jpg");
        assert_eq!(plan.base_dir, "/Archiv/2024");
        assert_eq!(plan.folder_names, vec!["12_24"]);
    }

    #[test]
    fn test_plan_target_filename_and_folder_names() {
        let request = CopyAndShareRequest {
            folder_names: Some(vec![" /12_24/ ".to_string(), "  ".to_string()]),
            target_filename: Some("sub/Neu.png".to_string()),
            ..Default::default()
        };
        let plan = plan_copy(&request).unwrap();
        assert_eq!(plan.folder_names, vec!["12_24"]);
        assert_eq!(plan.filename, "Neu.png");
        assert_eq!(plan.source_path, "/Gottesdienst/00_Orga/Neu.png");
    }

    #[test]
    fn test_plan_errors() {
        assert!(matches!(plan_copy(&CopyAndShareRequest::default()), Err(AppError::Validation(_))));

        let bad_date = CopyAndShareRequest {
            parent_start_dates: Some(vec!["24.12.2024".to_string()]),
            ..Default::default()
        };
        assert!(matches!(plan_copy(&bad_date), Err(AppError::Validation(m)) if m.contains("24.12.2024")));

        let root_target = CopyAndShareRequest {
            target_dir: Some("/".to_string()),
            ..Default::default()
        };
        assert!(plan_copy(&root_target).is_err());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(normalise_remote_path(" Gottesdienst/ "), "/Gottesdienst");
        assert_eq!(normalise_remote_path("/"), "/");
        assert_eq!(dirname("/a/b"), "/a");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("a"), "");
        assert_eq!(basename("C:\\Users\\x\\Plan.pdf"), "Plan.pdf");
        assert_eq!(join_remote("/", "x.png"), "/x.png");
    }

    #[tokio::test]
    async fn test_missing_configuration_is_reported_before_any_request() {
        let service = NextcloudService::new(NextcloudConfig::default());
        let err = service
            .service_folder(&ServiceFolderRequest {
                base_dir: "/Gottesdienst".to_string(),
                folder_name: "12_24".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
