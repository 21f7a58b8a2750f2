//! Admin authentication
//!
//! Two-step login: password verification issues an emailed OTP challenge;
//! verifying the OTP within its expiry (and attempt budget) yields a
//! Bearer JWT for the protected API.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::AdminRepository;
use crate::models::{Admin, OtpChallenge};
use crate::services::password::verify_password;

/// Token lifetime
const TOKEN_EXPIRY_HOURS: i64 = 24;

/// Authentication failures the API maps to distinct status codes
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password, unknown admin, or OTP mismatch; the
    /// message never reveals which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No pending OTP challenge for this admin
    #[error("No pending login challenge; start over")]
    NoChallenge,

    /// The OTP challenge expired before verification
    #[error("The verification code has expired; start over")]
    OtpExpired,

    /// Attempt budget exhausted
    #[error("Too many failed verification attempts; start over")]
    TooManyAttempts,

    /// Missing, malformed, or expired Bearer token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Storage or crypto failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id
    pub sub: i64,
    /// Admin email
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Admin authentication service
pub struct AuthService {
    admins: Arc<dyn AdminRepository>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(admins: Arc<dyn AdminRepository>, config: AuthConfig) -> Self {
        Self { admins, config }
    }

    /// Verify the password and open an OTP challenge. The caller emails
    /// the code; it is never returned over the API.
    pub async fn start_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Admin, OtpChallenge), AuthError> {
        let admin = self
            .admins
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &admin.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let code = generate_otp_code();
        let expires_at = Utc::now() + Duration::minutes(self.config.otp_expiry_minutes);
        let challenge = self
            .admins
            .replace_challenge(admin.id, &code, expires_at)
            .await?;

        Ok((admin, challenge))
    }

    /// Verify an OTP code and issue a Bearer token.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let admin = self
            .admins
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let challenge = self
            .admins
            .get_challenge(admin.id)
            .await?
            .ok_or(AuthError::NoChallenge)?;

        if challenge.is_expired(Utc::now()) {
            self.admins.delete_challenge(challenge.id).await?;
            return Err(AuthError::OtpExpired);
        }

        if challenge.attempts >= self.config.max_otp_attempts {
            return Err(AuthError::TooManyAttempts);
        }

        if challenge.code != code {
            let attempts = self.admins.record_failed_attempt(challenge.id).await?;
            if attempts >= self.config.max_otp_attempts {
                return Err(AuthError::TooManyAttempts);
            }
            return Err(AuthError::InvalidCredentials);
        }

        self.admins.delete_challenge(challenge.id).await?;
        self.issue_token(&admin)
    }

    /// Issue a signed Bearer token for an admin.
    pub fn issue_token(&self, admin: &Admin) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin.id,
            email: admin.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    /// Validate a Bearer token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}

/// Generate a 6-digit OTP code
pub fn generate_otp_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAdminRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup(config: AuthConfig) -> (AuthService, Arc<dyn AdminRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let admins: Arc<dyn AdminRepository> = Arc::new(SqlxAdminRepository::new(pool));
        let hash = hash_password("hunter2!").expect("Failed to hash password");
        admins
            .create("ops@example.com", "Ops Admin", &hash)
            .await
            .expect("Failed to create admin");

        (AuthService::new(admins.clone(), config), admins)
    }

    #[test]
    fn test_generate_otp_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_start_login_wrong_password() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let result = auth.start_login("ops@example.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_start_login_unknown_email() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let result = auth.start_login("nobody@example.com", "hunter2!").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_full_login_flow_issues_valid_token() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let (admin, challenge) = auth
            .start_login("ops@example.com", "hunter2!")
            .await
            .expect("Login should start");
        assert_eq!(challenge.admin_id, admin.id);

        let token = auth
            .verify_otp("ops@example.com", &challenge.code)
            .await
            .expect("OTP should verify");

        let claims = auth.verify_token(&token).expect("Token should be valid");
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, "ops@example.com");
    }

    #[tokio::test]
    async fn test_otp_is_single_use() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let (_, challenge) = auth
            .start_login("ops@example.com", "hunter2!")
            .await
            .expect("Login should start");

        auth.verify_otp("ops@example.com", &challenge.code)
            .await
            .expect("First verification should succeed");

        let second = auth.verify_otp("ops@example.com", &challenge.code).await;
        assert!(matches!(second, Err(AuthError::NoChallenge)));
    }

    #[tokio::test]
    async fn test_expired_otp_rejected() {
        let config = AuthConfig {
            otp_expiry_minutes: -1, // already expired when issued
            ..AuthConfig::default()
        };
        let (auth, _) = setup(config).await;

        let (_, challenge) = auth
            .start_login("ops@example.com", "hunter2!")
            .await
            .expect("Login should start");

        let result = auth.verify_otp("ops@example.com", &challenge.code).await;
        assert!(matches!(result, Err(AuthError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_attempt_budget_enforced() {
        let config = AuthConfig {
            max_otp_attempts: 2,
            ..AuthConfig::default()
        };
        let (auth, _) = setup(config).await;

        auth.start_login("ops@example.com", "hunter2!")
            .await
            .expect("Login should start");

        let first = auth.verify_otp("ops@example.com", "000000").await;
        assert!(matches!(first, Err(AuthError::InvalidCredentials)));

        // Second failure exhausts the budget of 2
        let second = auth.verify_otp("ops@example.com", "000000").await;
        assert!(matches!(second, Err(AuthError::TooManyAttempts)));

        // Even the right code is refused now
        let challenge_locked = auth.verify_otp("ops@example.com", "999999").await;
        assert!(matches!(challenge_locked, Err(AuthError::TooManyAttempts)));
    }

    #[tokio::test]
    async fn test_verify_token_rejects_tampering() {
        let (auth, _) = setup(AuthConfig::default()).await;
        let (admin, _) = auth
            .start_login("ops@example.com", "hunter2!")
            .await
            .expect("Login should start");

        let token = auth.issue_token(&admin).expect("Token should be issued");
        let mut tampered = token.clone();
        tampered.push('x');

        assert!(auth.verify_token(&token).is_ok());
        assert!(matches!(
            auth.verify_token(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_verify_token_rejects_other_secret() {
        let (auth, admins) = setup(AuthConfig::default()).await;
        let admin = admins
            .get_by_email("ops@example.com")
            .await
            .expect("Failed to get admin")
            .expect("Admin not found");

        let other = AuthService::new(
            admins.clone(),
            AuthConfig {
                jwt_secret: "different-secret".to_string(),
                ..AuthConfig::default()
            },
        );
        let token = other.issue_token(&admin).expect("Token should be issued");

        assert!(matches!(
            auth.verify_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
