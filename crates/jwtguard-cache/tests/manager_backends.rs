//! Integration tests running the token manager against the cache backends.
//!
//! - `TaggedCacheStorage`: blacklist records live under their own tag
//! - `CacheStorage`: blacklist records share the cache with everything else

use std::sync::{Arc, Once};
use std::time::Duration;

use jwtguard::prelude::*;
use jwtguard_cache::{
    BLACKLIST_TAG, Cache, CacheStorage, MemoryCache, TaggableCache, TaggedCacheStorage,
    register_backends,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn config() -> JwtConfig {
    JwtConfig::from_toml_str(
        r#"
        secret = "integration-secret"
        algo = "HS384"
        blacklist_ttl = "1h"
        persistent_claims = ["tenant"]
        "#,
    )
    .unwrap()
}

fn claims() -> ClaimSet {
    ClaimSet::new()
        .with("sub", "user-42")
        .with("iat", 1_700_000_000)
        .with("tenant", "acme")
        .with("scope", "read write")
}

#[tokio::test]
async fn test_tagged_backend_lifecycle() {
    init_tracing();
    let cache = MemoryCache::new();
    let storage = Arc::new(TaggedCacheStorage::new(&cache));
    let manager = JwtManager::from_config(&config(), storage).unwrap();

    let token = manager.encode(claims()).unwrap();
    let decoded = manager.decode(&token).await.unwrap();
    assert_eq!(decoded.subject(), Some("user-42"));
    assert_eq!(decoded.get("scope").and_then(ClaimValue::as_str), Some("read write"));

    let refreshed = manager.refresh(&token, false).await.unwrap();
    assert!(matches!(
        manager.decode(&token).await,
        Err(JwtError::TokenRevoked)
    ));

    let renewed = manager.decode(&refreshed).await.unwrap();
    assert_eq!(renewed.subject(), Some("user-42"));
    assert_eq!(renewed.issued_at(), Some(1_700_000_000));
    assert_eq!(renewed.get("tenant").and_then(ClaimValue::as_str), Some("acme"));
    assert!(!renewed.contains("scope"));

    assert!(manager.invalidate(&refreshed, true).await.unwrap());
    assert!(matches!(
        manager.decode(&refreshed).await,
        Err(JwtError::TokenRevoked)
    ));

    // Both revocations sit under the blacklist tag.
    let view = cache.tagged(BLACKLIST_TAG);
    let jti = decoded.jwt_id().unwrap();
    assert!(view.get(jti).await.unwrap().is_some());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_tagged_flush_leaves_unrelated_entries() {
    init_tracing();
    let cache = MemoryCache::new();
    cache
        .put("session:1", "alice", Duration::from_secs(600))
        .await
        .unwrap();
    cache.tagged("profiles").forever("1", "alice").await.unwrap();

    let storage = Arc::new(TaggedCacheStorage::new(&cache));
    let manager = JwtManager::from_config(&config(), storage).unwrap();

    let token = manager.encode(claims()).unwrap();
    manager.invalidate(&token, false).await.unwrap();
    assert_eq!(cache.len(), 3);

    manager.blacklist().clear().await.unwrap();

    assert!(manager.decode(&token).await.is_ok());
    assert_eq!(
        cache.get("session:1").await.unwrap().as_deref(),
        Some("alice")
    );
    assert_eq!(
        cache.tagged("profiles").get("1").await.unwrap().as_deref(),
        Some("alice")
    );
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_plain_flush_clears_everything() {
    init_tracing();
    let cache = MemoryCache::new();
    cache
        .put("session:1", "alice", Duration::from_secs(600))
        .await
        .unwrap();

    let storage = Arc::new(CacheStorage::new(Arc::new(cache.clone())));
    let manager = JwtManager::from_config(&config(), storage).unwrap();

    let token = manager.encode(claims()).unwrap();
    manager.invalidate(&token, false).await.unwrap();
    assert!(matches!(
        manager.decode(&token).await,
        Err(JwtError::TokenRevoked)
    ));

    manager.blacklist().clear().await.unwrap();

    assert!(manager.decode(&token).await.is_ok());
    assert!(cache.get("session:1").await.unwrap().is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_blacklist_disabled_touches_no_cache() {
    init_tracing();
    let cache = MemoryCache::new();
    let mut config = config();
    config.blacklist_enabled = false;

    let storage = Arc::new(TaggedCacheStorage::new(&cache));
    let manager = JwtManager::from_config(&config, storage).unwrap();

    let token = manager.encode(claims()).unwrap();
    assert!(matches!(
        manager.invalidate(&token, false).await,
        Err(JwtError::RevocationDisabled)
    ));
    manager.refresh(&token, false).await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_backends_resolved_by_name() {
    init_tracing();
    let cache = MemoryCache::new();
    let mut registries = Registries::default();
    register_backends(&mut registries.storage, cache.clone());

    for (backend, tagged) in [("tagged", true), ("cache", false)] {
        let mut config = config();
        config.storage = backend.to_string();
        let manager = JwtManager::from_registries(&config, &registries).unwrap();

        let token = manager.encode(claims()).unwrap();
        manager.invalidate(&token, false).await.unwrap();

        let jti = manager
            .decode_with(&token, DecodeOptions::UNCHECKED)
            .await
            .unwrap()
            .jwt_id()
            .unwrap()
            .to_string();
        let untagged = cache.get(&jti).await.unwrap();
        assert_eq!(untagged.is_none(), tagged, "backend {backend}");
    }
}

#[tokio::test]
async fn test_concurrent_invalidation() {
    init_tracing();
    let cache = MemoryCache::new();
    let storage = Arc::new(TaggedCacheStorage::new(&cache));
    let manager = Arc::new(JwtManager::from_config(&config(), storage).unwrap());

    let tokens: Vec<String> = (0..16)
        .map(|i| {
            manager
                .encode(ClaimSet::new().with("sub", format!("user-{i}")))
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|token| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.invalidate(&token, false).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    for token in &tokens {
        assert!(matches!(
            manager.decode(token).await,
            Err(JwtError::TokenRevoked)
        ));
    }
    assert_eq!(cache.len(), 16);
}
