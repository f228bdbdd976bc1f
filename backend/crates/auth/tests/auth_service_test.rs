//! Integration tests for the auth service against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use auth::application::session::SessionManager;
use auth::config::AuthConfig;
use auth::domain::repository::CredentialStore;
use auth::models::{AccessClaims, RefreshClaims, SessionState, UserId, UserRecord};
use auth::{AuthError, AuthService, InMemoryCredentialStore};
use chrono::Utc;
use platform::password::{ClearTextPassword, HashedPassword, HashingParams};
use platform::token::{RefreshTokenDigest, TokenCodec, TokenSecret};
use tokio::sync::Notify;

const PASSWORD: &str = "Secret123!";

fn test_config() -> AuthConfig {
    AuthConfig {
        hashing: HashingParams::low_cost(),
        ..AuthConfig::development()
    }
}

/// Service over a fresh store seeded with alice.
async fn setup() -> (
    AuthService<InMemoryCredentialStore>,
    Arc<InMemoryCredentialStore>,
    UserId,
) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let svc = AuthService::new(Arc::clone(&store), test_config()).unwrap();

    let password = ClearTextPassword::new(PASSWORD.into()).unwrap();
    let user = UserRecord::new(
        "alice",
        "alice@example.com",
        "Alice Liddell",
        svc.hasher().hash(&password).unwrap(),
    );
    let user_id = user.user_id;
    store.insert(user).await.unwrap();

    (svc, store, user_id)
}

async fn login(svc: &AuthService<InMemoryCredentialStore>) -> (String, String) {
    let out = svc.login("alice".into(), PASSWORD.into()).await.unwrap();
    (out.tokens.access_token, out.tokens.refresh_token)
}

// ---------------------------------------------------------------------------
// login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_tokens_carry_user_id() {
    let (svc, _store, user_id) = setup().await;

    let out = svc.login("alice".into(), PASSWORD.into()).await.unwrap();

    let access: AccessClaims =
        TokenCodec::verify(&out.tokens.access_token, &svc.config().access_token_secret).unwrap();
    assert_eq!(access.id, user_id);
    assert_eq!(access.username, "alice");
    assert_eq!(access.email, "alice@example.com");
    assert_eq!(access.fullname, "Alice Liddell");

    let refresh: RefreshClaims =
        TokenCodec::verify(&out.tokens.refresh_token, &svc.config().refresh_token_secret)
            .unwrap();
    assert_eq!(refresh.id, user_id);

    assert_eq!(out.user.id, user_id);
    assert_eq!(out.user.username, "alice");
    assert_eq!(svc.session_state(&user_id).await.unwrap(), SessionState::Authenticated);
}

#[tokio::test]
async fn login_by_email_is_case_insensitive() {
    let (svc, _store, user_id) = setup().await;

    let out = svc
        .login("  ALICE@Example.com ".into(), PASSWORD.into())
        .await
        .unwrap();
    assert_eq!(out.user.id, user_id);
}

#[tokio::test]
async fn login_stores_digest_not_token() {
    let (svc, store, user_id) = setup().await;
    let (_, refresh) = login(&svc).await;

    let stored = store.get(&user_id).await.unwrap();
    let digest = stored.refresh_token_digest.unwrap();
    assert_eq!(digest, RefreshTokenDigest::of(&refresh));
    assert_ne!(digest.as_str(), refresh);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user_alike() {
    let (svc, _store, _) = setup().await;

    let wrong = svc.login("alice".into(), "Secret123?".into()).await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    let unknown = svc.login("mallory".into(), PASSWORD.into()).await;
    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let (svc, _store, _) = setup().await;

    let result = svc.login("  ".into(), PASSWORD.into()).await;
    assert!(matches!(result, Err(AuthError::Validation(_))));

    let result = svc.login("alice".into(), String::new()).await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn second_login_supersedes_first_session() {
    let (svc, _store, _) = setup().await;
    let (_, first) = login(&svc).await;
    let (_, second) = login(&svc).await;

    assert!(matches!(svc.refresh(&first).await, Err(AuthError::TokenReused)));
    assert!(svc.refresh(&second).await.is_ok());
}

#[tokio::test]
async fn malformed_stored_hash_is_a_mismatch() {
    let (svc, store, _) = setup().await;
    let user = UserRecord::new(
        "bob",
        "bob@example.com",
        "Bob",
        HashedPassword::from_stored("garbage"),
    );
    store.insert(user).await.unwrap();

    let result = svc.login("bob".into(), "garbage".into()).await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let (svc, _store, user_id) = setup().await;
    let (_, original) = login(&svc).await;

    let rotated = svc.refresh(&original).await.unwrap();
    assert_ne!(rotated.refresh_token, original);

    let claims: RefreshClaims =
        TokenCodec::verify(&rotated.refresh_token, &svc.config().refresh_token_secret).unwrap();
    assert_eq!(claims.id, user_id);

    let replay = svc.refresh(&original).await;
    assert!(matches!(replay, Err(AuthError::TokenReused)));

    // The rotated token is still the active one
    assert!(svc.refresh(&rotated.refresh_token).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refresh_has_exactly_one_winner() {
    let (svc, store, user_id) = setup().await;

    let spawn_refresh = |token: String| {
        let svc = svc.clone();
        tokio::spawn(async move { svc.refresh(&token).await })
    };

    for _ in 0..20 {
        let (_, token) = login(&svc).await;
        let (a, b) = tokio::join!(spawn_refresh(token.clone()), spawn_refresh(token));
        let results = [a.unwrap(), b.unwrap()];

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "exactly one refresh must succeed");
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AuthError::TokenReused))),
            "the loser must see TokenReused"
        );

        // The winner's token is the one on record
        let stored = store.get(&user_id).await.unwrap().refresh_token_digest;
        assert_eq!(stored, Some(RefreshTokenDigest::of(&winners[0].refresh_token)));
    }
}

#[tokio::test]
async fn rotation_with_superseded_token_is_token_reused() {
    let (_svc, store, user_id) = setup().await;
    let sessions = SessionManager::new(Arc::clone(&store), Arc::new(test_config()));

    // Snapshot taken before rotation, as a reader racing the winner would see it
    let user = store.get(&user_id).await.unwrap();
    let first = sessions.start_session(&user).await.unwrap();
    let second = sessions
        .rotate_session(&user, &first.refresh_token)
        .await
        .unwrap();

    let replay = sessions.rotate_session(&user, &first.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::TokenReused)));

    let stored = store.get(&user_id).await.unwrap().refresh_token_digest;
    assert_eq!(stored, Some(RefreshTokenDigest::of(&second.refresh_token)));
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let (svc, _store, _) = setup().await;
    let (access, _) = login(&svc).await;

    assert!(matches!(svc.refresh(&access).await, Err(AuthError::TokenInvalid)));
}

#[tokio::test]
async fn refresh_rejects_expired_token() {
    let (svc, _store, user_id) = setup().await;
    login(&svc).await;

    let stale = TokenCodec::issue_at(
        &RefreshClaims { id: user_id },
        &svc.config().refresh_token_secret,
        Duration::from_secs(60),
        Utc::now() - chrono::Duration::hours(1),
    )
    .unwrap();

    assert!(matches!(svc.refresh(&stale).await, Err(AuthError::TokenExpired)));
}

#[tokio::test]
async fn refresh_rejects_garbage_and_empty_input() {
    let (svc, _store, _) = setup().await;

    assert!(matches!(
        svc.refresh("not.a.token").await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(matches!(svc.refresh("").await, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn refresh_for_deleted_user_is_invalid_credentials() {
    let (svc, store, user_id) = setup().await;
    let (_, refresh) = login(&svc).await;

    store.remove(&user_id).await.unwrap();

    assert!(matches!(
        svc.refresh(&refresh).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn refresh_signed_with_foreign_secret_is_invalid() {
    let (svc, _store, user_id) = setup().await;
    login(&svc).await;

    let forged = TokenCodec::issue(
        &RefreshClaims { id: user_id },
        &TokenSecret::generate(),
        Duration::from_secs(60),
    )
    .unwrap();

    assert!(matches!(svc.refresh(&forged).await, Err(AuthError::TokenInvalid)));
}

// ---------------------------------------------------------------------------
// logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_then_refresh_fails() {
    let (svc, _store, user_id) = setup().await;
    let (_, refresh) = login(&svc).await;

    svc.logout(&user_id).await.unwrap();
    assert_eq!(svc.session_state(&user_id).await.unwrap(), SessionState::Anonymous);

    let result = svc.refresh(&refresh).await;
    assert!(matches!(
        result,
        Err(AuthError::TokenReused | AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let (svc, _store, user_id) = setup().await;
    login(&svc).await;

    svc.logout(&user_id).await.unwrap();
    svc.logout(&user_id).await.unwrap();
    svc.logout(&UserId::new()).await.unwrap();
}

// ---------------------------------------------------------------------------
// change password
// ---------------------------------------------------------------------------

#[tokio::test]
async fn change_password_revokes_session_and_swaps_credentials() {
    let (svc, _store, user_id) = setup().await;
    let (_, refresh) = login(&svc).await;

    svc.change_password(user_id, PASSWORD.into(), "N3w-Passphrase!".into())
        .await
        .unwrap();

    assert!(matches!(svc.refresh(&refresh).await, Err(AuthError::TokenReused)));
    assert_eq!(svc.session_state(&user_id).await.unwrap(), SessionState::Anonymous);

    let old = svc.login("alice".into(), PASSWORD.into()).await;
    assert!(matches!(old, Err(AuthError::InvalidCredentials)));

    let new = svc.login("alice".into(), "N3w-Passphrase!".into()).await;
    assert!(new.is_ok());

    // Pre-change token stays dead after the new login
    assert!(matches!(svc.refresh(&refresh).await, Err(AuthError::TokenReused)));
}

#[tokio::test]
async fn change_password_requires_correct_old_password() {
    let (svc, _store, user_id) = setup().await;

    let result = svc
        .change_password(user_id, "Wrong123!".into(), "N3w-Passphrase!".into())
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));

    // Old password still works
    assert!(svc.login("alice".into(), PASSWORD.into()).await.is_ok());
}

#[tokio::test]
async fn change_password_validates_input() {
    let (svc, _store, user_id) = setup().await;

    let empty = svc
        .change_password(user_id, PASSWORD.into(), String::new())
        .await;
    assert!(matches!(empty, Err(AuthError::Validation(_))));

    let weak = svc
        .change_password(user_id, PASSWORD.into(), "password123".into())
        .await;
    assert!(matches!(weak, Err(AuthError::Validation(_))));

    let unknown = svc
        .change_password(UserId::new(), PASSWORD.into(), "N3w-Passphrase!".into())
        .await;
    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
}

// ---------------------------------------------------------------------------
// alice scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alice_login_refresh_replay() {
    let (svc, _store, user_id) = setup().await;

    let out = svc.login("alice".into(), "Secret123!".into()).await.unwrap();
    let access: AccessClaims =
        TokenCodec::verify(&out.tokens.access_token, &svc.config().access_token_secret).unwrap();
    assert_eq!((access.id, access.username.as_str()), (user_id, "alice"));

    let first = out.tokens.refresh_token;
    let second = svc.refresh(&first).await.unwrap().refresh_token;
    assert_ne!(first, second);

    assert!(matches!(svc.refresh(&first).await, Err(AuthError::TokenReused)));
}

// ---------------------------------------------------------------------------
// access tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authenticate_accepts_only_access_tokens() {
    let (svc, _store, user_id) = setup().await;
    let (access, refresh) = login(&svc).await;

    assert_eq!(svc.authenticate(&access).unwrap().id, user_id);
    assert!(matches!(svc.authenticate(&refresh), Err(AuthError::TokenInvalid)));
    assert!(matches!(svc.authenticate(""), Err(AuthError::TokenInvalid)));
}

// ---------------------------------------------------------------------------
// configuration and timeouts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_rejects_shared_secrets() {
    let secret = TokenSecret::generate();
    let config = AuthConfig {
        hashing: HashingParams::low_cost(),
        ..AuthConfig::new(secret.clone(), secret)
    };

    let result = AuthService::new(Arc::new(InMemoryCredentialStore::new()), config);
    assert!(matches!(result, Err(AuthError::Internal(_))));
}

/// Delegates to the in-memory store after a fixed delay.
struct SlowStore {
    inner: InMemoryCredentialStore,
    delay: Duration,
}

impl CredentialStore for SlowStore {
    async fn find_by_identifier(
        &self,
        identifier: &auth::models::Identifier,
    ) -> auth::AuthResult<Option<UserRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_identifier(identifier).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> auth::AuthResult<Option<UserRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(user_id).await
    }

    async fn cas_update_refresh_token(
        &self,
        user_id: &UserId,
        expected: &RefreshTokenDigest,
        new: &RefreshTokenDigest,
    ) -> auth::AuthResult<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.cas_update_refresh_token(user_id, expected, new).await
    }

    async fn set_refresh_token_if_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        digest: &RefreshTokenDigest,
    ) -> auth::AuthResult<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner
            .set_refresh_token_if_hash(user_id, expected, digest)
            .await
    }

    async fn set_refresh_token(
        &self,
        user_id: &UserId,
        digest: Option<&RefreshTokenDigest>,
    ) -> auth::AuthResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_refresh_token(user_id, digest).await
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        new: &HashedPassword,
    ) -> auth::AuthResult<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_password_hash(user_id, expected, new).await
    }
}

#[tokio::test]
async fn slow_store_times_out() {
    let store = Arc::new(SlowStore {
        inner: InMemoryCredentialStore::new(),
        delay: Duration::from_secs(2),
    });
    let config = AuthConfig {
        store_timeout: Duration::from_millis(50),
        ..test_config()
    };
    let svc = AuthService::new(store, config).unwrap();

    let login = svc.login("alice".into(), PASSWORD.into()).await;
    assert!(matches!(login, Err(AuthError::StoreTimeout(_))));

    let logout = svc.logout(&UserId::new()).await;
    assert!(matches!(logout, Err(AuthError::StoreTimeout(_))));
}

/// Holds the session-start write until released, so a password change can
/// commit between a login's verification and its write.
struct GatedStore {
    inner: InMemoryCredentialStore,
    reached: Notify,
    release: Notify,
}

impl CredentialStore for GatedStore {
    async fn find_by_identifier(
        &self,
        identifier: &auth::models::Identifier,
    ) -> auth::AuthResult<Option<UserRecord>> {
        self.inner.find_by_identifier(identifier).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> auth::AuthResult<Option<UserRecord>> {
        self.inner.find_by_id(user_id).await
    }

    async fn cas_update_refresh_token(
        &self,
        user_id: &UserId,
        expected: &RefreshTokenDigest,
        new: &RefreshTokenDigest,
    ) -> auth::AuthResult<bool> {
        self.inner.cas_update_refresh_token(user_id, expected, new).await
    }

    async fn set_refresh_token_if_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        digest: &RefreshTokenDigest,
    ) -> auth::AuthResult<bool> {
        self.reached.notify_one();
        self.release.notified().await;
        self.inner
            .set_refresh_token_if_hash(user_id, expected, digest)
            .await
    }

    async fn set_refresh_token(
        &self,
        user_id: &UserId,
        digest: Option<&RefreshTokenDigest>,
    ) -> auth::AuthResult<()> {
        self.inner.set_refresh_token(user_id, digest).await
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        expected: &HashedPassword,
        new: &HashedPassword,
    ) -> auth::AuthResult<bool> {
        self.inner.set_password_hash(user_id, expected, new).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_racing_password_change_does_not_survive_it() {
    let store = Arc::new(GatedStore {
        inner: InMemoryCredentialStore::new(),
        reached: Notify::new(),
        release: Notify::new(),
    });
    let svc = AuthService::new(Arc::clone(&store), test_config()).unwrap();

    let password = ClearTextPassword::new(PASSWORD.into()).unwrap();
    let user = UserRecord::new(
        "alice",
        "alice@example.com",
        "Alice Liddell",
        svc.hasher().hash(&password).unwrap(),
    );
    let user_id = user.user_id;
    store.inner.insert(user).await.unwrap();

    let login = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.login("alice".into(), PASSWORD.into()).await })
    };

    // Login has verified the old password and is about to write its session
    store.reached.notified().await;
    svc.change_password(user_id, PASSWORD.into(), "N3w-Passphrase!".into())
        .await
        .unwrap();
    store.release.notify_one();

    let login = login.await.unwrap();
    assert!(matches!(login, Err(AuthError::InvalidCredentials)));

    let stored = store.inner.get(&user_id).await.unwrap();
    assert!(stored.refresh_token_digest.is_none());
    assert_eq!(svc.session_state(&user_id).await.unwrap(), SessionState::Anonymous);
}
