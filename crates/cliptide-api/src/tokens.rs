use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use cliptide_types::api::{AccessClaims, RefreshClaims};

use crate::state::AuthConfig;

pub fn mint_access(
    auth: &AuthConfig,
    user_id: Uuid,
    username: &str,
    email: &str,
) -> anyhow::Result<String> {
    let claims = AccessClaims {
        sub: user_id,
        username: username.to_string(),
        email: email.to_string(),
        exp: (Utc::now() + Duration::seconds(auth.access_ttl_secs)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.access_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn mint_refresh(auth: &AuthConfig, user_id: Uuid) -> anyhow::Result<String> {
    let claims = RefreshClaims {
        sub: user_id,
        exp: (Utc::now() + Duration::seconds(auth.refresh_ttl_secs)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.refresh_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_access(auth: &AuthConfig, token: &str) -> Option<AccessClaims> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(auth.access_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn decode_refresh(auth: &AuthConfig, token: &str) -> Option<RefreshClaims> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(auth.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 864_000,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let auth = config();
        let user_id = Uuid::new_v4();
        let token = mint_access(&auth, user_id, "alice", "alice@example.com").unwrap();

        let claims = decode_access(&auth, &token).expect("valid token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = config();
        let token = mint_access(&auth, Uuid::new_v4(), "alice", "a@example.com").unwrap();

        let other = AuthConfig {
            access_secret: "different".into(),
            ..config()
        };
        assert!(decode_access(&other, &token).is_none());
    }

    #[test]
    fn token_kinds_do_not_cross_over() {
        let auth = config();
        let user_id = Uuid::new_v4();
        let refresh = mint_refresh(&auth, user_id).unwrap();

        // signed with the refresh secret, never valid as an access token
        assert!(decode_access(&auth, &refresh).is_none());
        let claims = decode_refresh(&auth, &refresh).expect("valid refresh");
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthConfig {
            access_ttl_secs: -3600,
            ..config()
        };
        let token = mint_access(&auth, Uuid::new_v4(), "alice", "a@example.com").unwrap();
        assert!(decode_access(&auth, &token).is_none());
    }
}
