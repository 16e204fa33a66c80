use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;

use super::claims::Claims;
use super::errors::JwtError;
use super::handler::JwtHandler;

/// Explicit configuration for a [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: Vec<u8>,
    pub ttl: Duration,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Clock skew tolerated when comparing `exp`
    pub leeway: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// A signed access token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub claims: Claims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates time-bounded access tokens.
///
/// Both operations take the current instant as an argument, so issuance and
/// validation are pure functions of payload, key and clock.
pub struct TokenIssuer {
    handler: JwtHandler,
    ttl: Duration,
    leeway_seconds: i64,
}

impl TokenIssuer {
    /// Build an issuer from explicit settings.
    ///
    /// # Errors
    /// * `Configuration` - Empty secret, non-positive TTL or negative leeway
    pub fn new(settings: TokenSettings) -> Result<Self, JwtError> {
        if settings.ttl <= Duration::zero() {
            return Err(JwtError::Configuration(
                "token ttl must be positive".to_string(),
            ));
        }
        if settings.leeway < Duration::zero() {
            return Err(JwtError::Configuration(
                "token leeway must not be negative".to_string(),
            ));
        }

        let handler = JwtHandler::new(&settings.secret)?
            .with_issuer(settings.issuer)
            .with_audience(settings.audience);

        Ok(Self {
            handler,
            ttl: settings.ttl,
            leeway_seconds: settings.leeway.num_seconds(),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for `subject` valid from `now` for the configured TTL.
    ///
    /// `issued_at` and `expires_at` are whole seconds, as in the claims.
    ///
    /// # Errors
    /// * `Configuration` - The TTL pushes the expiry out of range
    /// * `EncodingFailed` - Signing failed
    pub fn issue(
        &self,
        subject: impl ToString,
        roles: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, JwtError> {
        let claims = Claims::for_subject(subject, roles, now, self.ttl)?
            .with_issuer(self.handler.issuer().map(str::to_string))
            .with_audience(self.handler.audience().map(str::to_string));

        let token = self.handler.encode(&claims)?;
        let issued_at = from_timestamp(claims.iat)?;
        let expires_at = from_timestamp(claims.exp)?;

        Ok(AccessToken {
            token,
            claims,
            issued_at,
            expires_at,
        })
    }

    /// Validate a token at instant `now`.
    ///
    /// # Errors
    /// * `BadSignature` - Signature check failed
    /// * `Malformed` - Token is structurally invalid
    /// * `InvalidClaim` - Issuer or audience mismatch
    /// * `Expired` - `now` is at or past `exp` plus leeway
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims: Claims = self.handler.decode(token)?;

        if claims.is_expired(now.timestamp(), self.leeway_seconds) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

fn from_timestamp(seconds: i64) -> Result<DateTime<Utc>, JwtError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| JwtError::EncodingFailed("timestamp out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::SubsecRound;

    use super::*;

    fn settings() -> TokenSettings {
        TokenSettings {
            secret: b"issuer_test_secret_at_least_32_bytes!".to_vec(),
            ttl: Duration::minutes(15),
            issuer: Some("auth-service".to_string()),
            audience: Some("bank-clients".to_string()),
            leeway: Duration::seconds(5),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_new_requires_secret() {
        let mut settings = settings();
        settings.secret.clear();
        assert!(matches!(
            TokenIssuer::new(settings),
            Err(JwtError::Configuration(_))
        ));
    }

    #[test]
    fn test_new_requires_positive_ttl() {
        let mut settings = settings();
        settings.ttl = Duration::zero();
        assert!(matches!(
            TokenIssuer::new(settings),
            Err(JwtError::Configuration(_))
        ));
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = TokenIssuer::new(settings()).unwrap();

        let access = issuer
            .issue("user-1", vec!["USER_ROLE".to_string()], now())
            .expect("Failed to issue token");

        assert_eq!(access.issued_at, now());
        assert_eq!(access.expires_at, now() + Duration::minutes(15));
        assert!(access.expires_at > access.issued_at);

        let claims = issuer
            .validate(&access.token, now() + Duration::minutes(1))
            .expect("Token should be valid");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.roles, vec!["USER_ROLE".to_string()]);
        assert_eq!(claims.iss.as_deref(), Some("auth-service"));
        assert_eq!(claims.aud.as_deref(), Some("bank-clients"));
    }

    #[test]
    fn test_validate_expired_respects_leeway() {
        let issuer = TokenIssuer::new(settings()).unwrap();
        let access = issuer.issue("user-1", vec![], now()).unwrap();

        let within_leeway = access.expires_at + Duration::seconds(4);
        assert!(issuer.validate(&access.token, within_leeway).is_ok());

        let past_leeway = access.expires_at + Duration::seconds(5);
        assert_eq!(
            issuer.validate(&access.token, past_leeway),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_validate_foreign_key() {
        let issuer = TokenIssuer::new(settings()).unwrap();
        let mut other = settings();
        other.secret = b"a_completely_different_secret_value!!".to_vec();
        let foreign = TokenIssuer::new(other).unwrap();

        let access = foreign.issue("user-1", vec![], now()).unwrap();
        assert_eq!(
            issuer.validate(&access.token, now()),
            Err(JwtError::BadSignature)
        );
    }

    #[test]
    fn test_validate_wrong_audience() {
        let issuer = TokenIssuer::new(settings()).unwrap();
        let mut other = settings();
        other.audience = Some("someone-else".to_string());
        let foreign = TokenIssuer::new(other).unwrap();

        let access = foreign.issue("user-1", vec![], now()).unwrap();
        assert_eq!(
            issuer.validate(&access.token, now()),
            Err(JwtError::InvalidClaim("aud".to_string()))
        );
    }

    #[test]
    fn test_validate_garbage() {
        let issuer = TokenIssuer::new(settings()).unwrap();
        assert!(matches!(
            issuer.validate("not-a-jwt", now()),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_issue_truncates_to_whole_seconds() {
        let issuer = TokenIssuer::new(settings()).unwrap();
        let now = now() + Duration::milliseconds(750);

        let access = issuer.issue("user-1", vec![], now).unwrap();

        assert_eq!(access.issued_at, now.trunc_subsecs(0));
        assert_eq!(access.expires_at - access.issued_at, Duration::minutes(15));
        assert_eq!(access.issued_at.timestamp(), access.claims.iat);
    }

    #[test]
    fn test_issue_rejects_overflowing_ttl() {
        let mut settings = settings();
        settings.ttl = Duration::days(100_000_000_000);
        let issuer = TokenIssuer::new(settings).unwrap();

        assert!(matches!(
            issuer.issue("user-1", vec![], now()),
            Err(JwtError::Configuration(_))
        ));
    }
}
