//! services/api/tests/domain_registration.rs
//!
//! Registering an embed domain must take effect on the live CORS origin set
//! immediately, not on the next restart.

mod common;

use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use api_lib::web::domains::{add_domain_handler, my_domains_handler, AddDomainRequest};

use common::{test_state, user_claims, InMemoryDb};

#[tokio::test]
async fn registered_origin_joins_the_live_cors_set() {
    let state = test_state(InMemoryDb::default());
    let user_id = Uuid::new_v4();

    assert!(!state
        .allowed_origins
        .read()
        .unwrap()
        .contains("https://shop.example.com"));

    let (status, Json(domain)) = add_domain_handler(
        axum::extract::State(state.clone()),
        Extension(user_claims(user_id)),
        Json(AddDomainRequest {
            origin: "https://shop.example.com".to_string(),
            description: Some("storefront".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(domain.origin, "https://shop.example.com");

    // No restart needed: the handler and the CORS predicate share the set.
    assert!(state
        .allowed_origins
        .read()
        .unwrap()
        .contains("https://shop.example.com"));

    let Json(domains) = my_domains_handler(
        axum::extract::State(state.clone()),
        Extension(user_claims(user_id)),
    )
    .await
    .unwrap();
    assert_eq!(domains.len(), 1);
}

#[tokio::test]
async fn duplicate_origin_conflicts_without_touching_the_set() {
    let state = test_state(InMemoryDb::default());
    let user_id = Uuid::new_v4();

    add_domain_handler(
        axum::extract::State(state.clone()),
        Extension(user_claims(user_id)),
        Json(AddDomainRequest {
            origin: "https://shop.example.com".to_string(),
            description: None,
        }),
    )
    .await
    .unwrap();

    let err = add_domain_handler(
        axum::extract::State(state.clone()),
        Extension(user_claims(Uuid::new_v4())),
        Json(AddDomainRequest {
            origin: "https://shop.example.com".to_string(),
            description: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(state.allowed_origins.read().unwrap().len(), 1);
}
