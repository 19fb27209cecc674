//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - bcrypt tag normalization between server and local conventions
//! - Offline token payload encoding
//! - The pure fallback arbitration between the two login paths
//! - The offline login path against a seeded cache

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::super::password::{normalize_bcrypt_tag, verify_cached_password};
    use super::super::service::resolve_fallback;
    use crate::common::error::AuthError;
    use crate::remote::RosterApi;
    use crate::store::models::CachedUser;
    use crate::store::service::LocalStore;
    use crate::store::{META_CURRENT_USER_ID, META_OFFLINE_MODE};
    use std::sync::Arc;
    use std::time::Duration;

    const TEST_COST: u32 = 4;

    fn hash_2a(password: &str) -> String {
        bcrypt::hash_with_salt(password, TEST_COST, [7u8; 16])
            .expect("hash")
            .format_for_version(bcrypt::Version::TwoA)
    }

    fn cached_user(id: i64, email: &str, hash: Option<String>, offline_enabled: i64) -> CachedUser {
        CachedUser {
            id,
            username: format!("user{id}"),
            email: email.to_string(),
            organization: None,
            password_hash: hash,
            offline_enabled,
            created_at: None,
            updated_at: None,
            last_login_at: None,
            last_sync_at: None,
        }
    }

    /// Store + auth service whose remote endpoint is a closed local port,
    /// so every online attempt fails fast with a connection error.
    fn unreachable_service() -> (Arc<LocalStore>, AuthService) {
        let store = Arc::new(LocalStore::new("sqlite::memory:"));
        let api = Arc::new(RosterApi::new(
            "http://127.0.0.1:9",
            Duration::from_millis(250),
        ));
        let auth = AuthService::new(Arc::clone(&store), api, 3600);
        (store, auth)
    }

    #[test]
    fn server_tagged_hash_verifies_like_local_tag() {
        let tag_2a = hash_2a("correct horse");
        let tag_2y = tag_2a.replacen("$2a$", "$2y$", 1);

        assert_eq!(normalize_bcrypt_tag(&tag_2y), tag_2a);
        // untagged-for-rewrite hashes pass through unchanged
        assert_eq!(normalize_bcrypt_tag(&tag_2a), tag_2a);

        assert!(verify_cached_password("correct horse", &tag_2a));
        assert!(verify_cached_password("correct horse", &tag_2y));
        assert!(!verify_cached_password("battery staple", &tag_2y));
    }

    #[test]
    fn garbage_hash_fails_verification_instead_of_erroring() {
        assert!(!verify_cached_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn offline_token_payload_roundtrips() {
        let user = cached_user(42, "roundtrip@example.com", None, 1);
        let token = OfflineTokenPayload::issue(&user).encode();

        assert!(token.starts_with(models::OFFLINE_TOKEN_PREFIX));

        let payload = OfflineTokenPayload::decode(&token).expect("decodable");
        assert_eq!(payload.user_id, 42);
        assert_eq!(payload.email, "roundtrip@example.com");
        assert_eq!(payload.mode, "offline");

        assert!(OfflineTokenPayload::decode("bearer-from-server").is_none());
    }

    #[test]
    fn fallback_success_wins_over_online_error() {
        let online_error = AuthError::NetworkUnavailable {
            reason: "connection refused".to_string(),
        };
        let success = LoginSuccess {
            user: cached_user(1, "a@example.com", None, 1),
            token: "tok".to_string(),
            mode: LoginMode::Offline,
        };

        let resolved = resolve_fallback(online_error, Ok(success)).expect("fallback wins");
        assert_eq!(resolved.mode, LoginMode::Offline);
    }

    #[test]
    fn double_failure_surfaces_the_online_error() {
        let online_error = AuthError::Rejected {
            status: 422,
            message: "these credentials do not match our records".to_string(),
        };

        let resolved = resolve_fallback(online_error, Err(AuthError::OfflineDisabled));
        match resolved {
            Err(AuthError::Rejected { status, .. }) => assert_eq!(status, 422),
            other => panic!("expected the online rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_path_rejects_disabled_accounts_regardless_of_password() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(
                1,
                "locked@example.com",
                Some(hash_2a("right-password")),
                0,
            )])
            .await
            .unwrap();

        // even the correct password cannot open a disabled account
        let result = auth.offline_login("locked@example.com", "right-password").await;
        assert!(matches!(result, Err(AuthError::OfflineDisabled)));

        // the full login surfaces the online error, per the priority rule
        let result = auth.login("locked@example.com", "right-password").await;
        assert!(matches!(result, Err(AuthError::NetworkUnavailable { .. })));
    }

    #[tokio::test]
    async fn offline_path_distinguishes_unknown_account_from_bad_password() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(
                1,
                "known@example.com",
                Some(hash_2a("right-password")),
                1,
            )])
            .await
            .unwrap();

        let result = auth.offline_login("stranger@example.com", "whatever").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));

        let result = auth.offline_login("known@example.com", "wrong-password").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn account_without_cached_hash_never_verifies() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(1, "hashless@example.com", None, 1)])
            .await
            .unwrap();

        let result = auth.offline_login("hashless@example.com", "anything").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn offline_login_establishes_an_offline_session() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(
                9,
                "field@example.com",
                Some(hash_2a("s3cret")),
                1,
            )])
            .await
            .unwrap();

        let success = auth.login("field@example.com", "s3cret").await.expect("login");
        assert_eq!(success.mode, LoginMode::Offline);

        let payload = OfflineTokenPayload::decode(&success.token).expect("offline token");
        assert_eq!(payload.mode, "offline");
        assert_eq!(payload.user_id, 9);

        assert!(auth.is_authenticated().await.unwrap());
        assert!(auth.is_offline_mode().await.unwrap());
        assert_eq!(
            store.metadata(META_CURRENT_USER_ID).await.unwrap().as_deref(),
            Some("9")
        );

        let header = auth.auth_header().await.unwrap().expect("header");
        assert!(header.starts_with("Bearer offline_"));

        // last login stamped on the offline path too
        let user = store.user_by_id(9).await.unwrap().unwrap();
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn authentication_expires_lazily_on_query() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(3, "gone@example.com", None, 1)])
            .await
            .unwrap();
        store.set_metadata(META_CURRENT_USER_ID, "3").await.unwrap();
        store.save_token(3, "stale", "bearer", -1).await.unwrap();

        assert!(!auth.is_authenticated().await.unwrap());
        assert!(auth.auth_header().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_session_and_metadata() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(
                5,
                "bye@example.com",
                Some(hash_2a("pw")),
                1,
            )])
            .await
            .unwrap();
        auth.login("bye@example.com", "pw").await.expect("login");
        assert!(auth.is_authenticated().await.unwrap());

        auth.logout().await.expect("logout");

        assert!(!auth.is_authenticated().await.unwrap());
        assert!(auth.current_user().await.unwrap().is_none());
        assert_eq!(
            store.metadata(META_CURRENT_USER_ID).await.unwrap().as_deref(),
            Some("")
        );
        assert_eq!(
            store.metadata(META_OFFLINE_MODE).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn current_user_survives_a_session_cache_wipe() {
        let (store, auth) = unreachable_service();
        store
            .save_roster(&[cached_user(
                6,
                "resume@example.com",
                Some(hash_2a("pw")),
                1,
            )])
            .await
            .unwrap();
        auth.login("resume@example.com", "pw").await.expect("login");

        // a fresh service over the same store simulates a process restart
        let api = Arc::new(RosterApi::new(
            "http://127.0.0.1:9",
            Duration::from_millis(250),
        ));
        let restarted = AuthService::new(Arc::clone(&store), api, 3600);

        assert!(restarted.is_authenticated().await.unwrap());
        let user = restarted.current_user().await.unwrap().expect("cached user");
        assert_eq!(user.email, "resume@example.com");
    }
}
