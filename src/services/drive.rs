//! Google Drive uploader
//!
//! Best-effort offsite replication of backup artifacts via a service
//! account. The uploader never fails a backup run: it skips silently when
//! credentials are absent or the artifact is not locally readable, and it
//! classifies failures so the log carries remediation guidance.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::DriveConfig;

const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URI: &str = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Typed upload failures
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Malformed private key or rejected service-account assertion
    #[error("Drive credentials rejected: {0}")]
    Credential(String),

    /// The configured backup folder does not exist or is not shared with
    /// the service account
    #[error("Drive backup folder '{0}' was not found")]
    FolderNotFound(String),

    /// Service accounts have no storage of their own beyond shared drives
    #[error("Drive storage quota exceeded for the service account")]
    QuotaExceeded,

    /// Any other transport or API failure
    #[error("Drive upload failed: {0}")]
    Upload(String),
}

impl DriveError {
    /// Operator guidance logged alongside the error
    pub fn remediation(&self) -> &'static str {
        match self {
            DriveError::Credential(_) => {
                "Check GOOGLE_DRIVE_CLIENT_EMAIL and GOOGLE_DRIVE_PRIVATE_KEY: the key must \
                 be the service account's PEM private key with its line breaks intact."
            }
            DriveError::FolderNotFound(_) => {
                "Check GOOGLE_DRIVE_BACKUP_FOLDER_ID and share the folder with the service \
                 account email as an editor."
            }
            DriveError::QuotaExceeded => {
                "Service accounts cannot own files on personal storage; move the backup \
                 folder to a shared drive or free up space."
            }
            DriveError::Upload(_) => "Transient failure; the next scheduled backup will retry.",
        }
    }
}

/// An uploaded Drive file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveFile {
    /// Drive file id
    pub id: String,
    /// File name in the backup folder
    pub name: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Drive uploader over a service-account credential
pub struct DriveUploader {
    config: DriveConfig,
    client: reqwest::Client,
}

impl DriveUploader {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Upload a backup artifact into the configured folder.
    ///
    /// Returns `Ok(None)` when the upload is skipped: credentials absent,
    /// or the artifact is not readable from this host (it may exist only
    /// on a remote database host).
    pub async fn upload_backup(&self, path: &Path) -> Result<Option<DriveFile>, DriveError> {
        if !self.config.is_configured() {
            tracing::debug!("Drive credentials not configured; skipping upload");
            return Ok(None);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::info!(
                    "Backup artifact '{}' is not locally readable ({}); skipping upload",
                    path.display(),
                    e
                );
                return Ok(None);
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "backup.bak".to_string());

        let token = self.access_token().await?;
        let file = self.multipart_upload(&token, &name, bytes).await?;

        tracing::info!("Backup uploaded to Drive as '{}' (id {})", file.name, file.id);
        Ok(Some(file))
    }

    /// Exchange an RS256-signed assertion for an access token.
    async fn access_token(&self) -> Result<String, DriveError> {
        let client_email = self.config.client_email.as_deref().unwrap_or_default();
        let private_key = self.config.private_key.as_deref().unwrap_or_default();

        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| DriveError::Credential(format!("private key is not valid PEM: {}", e)))?;

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: client_email,
            scope: DRIVE_SCOPE,
            aud: TOKEN_URI,
            iat: now,
            exp: now + 3600,
        };

        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DriveError::Credential(format!("failed to sign assertion: {}", e)))?;

        let response = self
            .client
            .post(TOKEN_URI)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| DriveError::Upload(format!("token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Credential(format!(
                "token exchange rejected: {}",
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DriveError::Upload(format!("invalid token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// multipart/related upload: JSON metadata part + raw file part.
    async fn multipart_upload(
        &self,
        token: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<DriveFile, DriveError> {
        let folder_id = self.config.backup_folder_id.as_deref().unwrap_or_default();

        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });

        let boundary = "assetra_backup_boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
                 --{b}\r\nContent-Type: application/octet-stream\r\n\r\n",
                b = boundary,
                meta = metadata
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let response = self
            .client
            .post(UPLOAD_URI)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| DriveError::Upload(format!("upload request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<DriveFile>()
                .await
                .map_err(|e| DriveError::Upload(format!("invalid upload response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body, folder_id))
    }
}

/// Map an upload failure response to its typed category.
fn classify_failure(status: u16, body: &str, folder_id: &str) -> DriveError {
    match status {
        404 => DriveError::FolderNotFound(folder_id.to_string()),
        403 if body.contains("storageQuotaExceeded") => DriveError::QuotaExceeded,
        401 => DriveError::Credential(format!("access token rejected: {}", body)),
        _ => DriveError::Upload(format!("status {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn configured(private_key: &str) -> DriveConfig {
        DriveConfig {
            client_email: Some("svc@project.iam.example.com".to_string()),
            private_key: Some(private_key.to_string()),
            backup_folder_id: Some("folder123".to_string()),
        }
    }

    #[tokio::test]
    async fn test_upload_skipped_without_credentials() {
        let uploader = DriveUploader::new(DriveConfig::default());
        let result = uploader
            .upload_backup(Path::new("/nonexistent/backup.bak"))
            .await
            .expect("skip is not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upload_skipped_when_artifact_unreadable() {
        // Credentials present, but the artifact exists only on the
        // database host: skipped, not an error.
        let uploader = DriveUploader::new(configured("irrelevant"));
        let result = uploader
            .upload_backup(Path::new("/nonexistent/backup.bak"))
            .await
            .expect("skip is not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_private_key_is_credential_error() {
        let mut artifact = tempfile::NamedTempFile::new().expect("temp file");
        artifact.write_all(b"fake backup bytes").expect("write");

        let uploader = DriveUploader::new(configured("not a pem key"));
        let result = uploader.upload_backup(artifact.path()).await;

        assert!(matches!(result, Err(DriveError::Credential(_))));
    }

    #[test]
    fn test_classify_folder_not_found() {
        let err = classify_failure(404, "File not found", "folder123");
        assert!(matches!(err, DriveError::FolderNotFound(ref id) if id == "folder123"));
    }

    #[test]
    fn test_classify_quota_exceeded() {
        let err = classify_failure(403, r#"{"reason":"storageQuotaExceeded"}"#, "folder123");
        assert!(matches!(err, DriveError::QuotaExceeded));
    }

    #[test]
    fn test_classify_other_403_is_upload_error() {
        let err = classify_failure(403, r#"{"reason":"rateLimitExceeded"}"#, "folder123");
        assert!(matches!(err, DriveError::Upload(_)));
    }

    #[test]
    fn test_remediation_guidance_present() {
        for err in [
            DriveError::Credential("bad".to_string()),
            DriveError::FolderNotFound("folder123".to_string()),
            DriveError::QuotaExceeded,
            DriveError::Upload("boom".to_string()),
        ] {
            assert!(!err.remediation().is_empty());
        }
    }
}
