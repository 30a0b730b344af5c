//! Registration and email-verification workflow
//!
//! Per registration attempt, keyed by email:
//!
//! 1. `start` caches `token:<token> -> email` and mails a confirmation link.
//! 2. `verify` consumes that token (single use) and caches
//!    `<email> -> registry_token`.
//! 3. `check_registry_token` gates final account creation;
//!    `consume_registry_token` clears the entry once the user row exists.
//!
//! Both cache entries expire after ten minutes; an abandoned attempt needs
//! no cleanup. Single use is guaranteed by the cache's atomic read-and-delete:
//! of two racing `verify` calls, exactly one observes the token.

use common::cache::RedisPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    mail::{Mailer, verification_email},
};

/// Lifetime of both verification cache entries
pub const TOKEN_TTL_SECONDS: u64 = 600;

fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

/// Generate an opaque verification token
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Registration workflow over the cache and the mailer
#[derive(Clone)]
pub struct RegistrationService {
    cache: RedisPool,
    mailer: Mailer,
    confirm_base_url: String,
}

impl RegistrationService {
    /// Create a new registration service
    pub fn new(cache: RedisPool, mailer: Mailer, confirm_base_url: String) -> Self {
        Self {
            cache,
            mailer,
            confirm_base_url,
        }
    }

    /// Begin a registration attempt: cache a fresh token for the email and
    /// send the confirmation mail. Returns the token; the only copy a real
    /// caller ever sees is the one in the mail.
    ///
    /// The caller must already have checked that the email is not a
    /// registered user. A mail failure surfaces here; the cached token is
    /// left to expire.
    pub async fn start(&self, email: &str) -> ApiResult<String> {
        let token = generate_token();
        self.cache
            .set(&token_key(&token), email, Some(TOKEN_TTL_SECONDS))
            .await?;

        let html = verification_email(&token, &self.confirm_base_url, TOKEN_TTL_SECONDS / 60);
        self.mailer
            .send(
                email,
                "Please, verify your email to activate your account",
                &html,
            )
            .await
            .map_err(|e| ApiError::Storage(format!("mail send failed: {}", e)))?;

        info!("Verification mail queued for {}", email);
        Ok(token)
    }

    /// Consume a verification token and issue the registry token.
    ///
    /// `Forbidden` covers every failure mode (unknown token, expired
    /// token, email mismatch) so callers cannot probe which emails have
    /// registrations in flight.
    pub async fn verify(&self, email: &str, token: &str) -> ApiResult<String> {
        let cached_email = self.cache.get_del(&token_key(token)).await?;

        match cached_email {
            Some(cached) if cached == email => {}
            _ => {
                return Err(ApiError::Forbidden(
                    "Invalid or expired verification".to_string(),
                ));
            }
        }

        let registry_token = generate_token();
        self.cache
            .set(email, &registry_token, Some(TOKEN_TTL_SECONDS))
            .await?;

        info!("Email {} verified", email);
        Ok(registry_token)
    }

    /// Check that a registry token matches the cached value for the email
    pub async fn check_registry_token(&self, email: &str, token: &str) -> ApiResult<()> {
        let cached = self.cache.get(email).await?;
        match cached {
            Some(cached) if cached == token => Ok(()),
            _ => Err(ApiError::Forbidden(
                "Registering process was broken: token is expired or invalid".to_string(),
            )),
        }
    }

    /// Drop the registry token once the account exists. Best-effort; an
    /// entry left behind simply expires.
    pub async fn consume_registry_token(&self, email: &str) {
        if let Err(e) = self.cache.delete(email).await {
            tracing::warn!("Failed to drop registry token for {}: {}", email, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MailerConfig;
    use common::cache::RedisConfig;

    #[test]
    fn tokens_are_opaque_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_keys_are_namespaced() {
        assert_eq!(token_key("abc"), "token:abc");
    }

    async fn test_service() -> RegistrationService {
        let cache = RedisPool::new(&RedisConfig {
            url: "redis://localhost:6379".to_string(),
            max_connections: 10,
        })
        .await
        .expect("Redis must be reachable");

        let mailer = Mailer::new(MailerConfig {
            api_url: "http://127.0.0.1:1/unused".to_string(),
            api_key: String::new(),
            sender_email: "no-reply@clipstream.dev".to_string(),
            sender_name: "Clipstream".to_string(),
            suppress_send: true,
        });

        RegistrationService::new(cache, mailer, "http://localhost:3000".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn verification_round_trip() {
        let service = test_service().await;
        let email = format!("{}@example.com", generate_token());

        let token = service.start(&email).await.unwrap();

        // Wrong token first: the real one must survive the failed attempt
        let err = service.verify(&email, "bogus").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let registry = service.verify(&email, &token).await.unwrap();

        // Single use: the consumed token no longer verifies
        let err = service.verify(&email, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        service.check_registry_token(&email, &registry).await.unwrap();
        let err = service
            .check_registry_token(&email, "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        service.consume_registry_token(&email).await;
        let err = service
            .check_registry_token(&email, &registry)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn concurrent_verify_has_exactly_one_winner() {
        let service = test_service().await;
        let email = format!("{}@example.com", generate_token());

        let token = service.start(&email).await.unwrap();

        let (a, b) = tokio::join!(
            service.verify(&email, &token),
            service.verify(&email, &token)
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one verify call may win");
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(err, ApiError::Forbidden(_)));
            }
        }
    }
}
