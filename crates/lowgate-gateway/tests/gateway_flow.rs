//! End-to-end gateway flows through the public API only.
//!
//! These tests exercise the full login → dispatch → query lifecycle the
//! way an embedding transport would, with the built-in auth backends
//! and the echo execution backend.

use lowgate_auth::OpPattern;
use lowgate_gateway::{
    AuthResolver, AutoAuth, DispatchGateway, DispatchRequest, EchoExecutor, GatewayConfig,
    GatewayError, JobFilter, JobStatus, StaticAuth, TokenStore,
};
use lowgate_types::{AuthSource, ClientKind, Credentials, LowStateCommand};
use std::sync::Arc;

fn dev_grants() -> Vec<OpPattern> {
    vec![
        OpPattern::new(ClientKind::Local, "test.*"),
        OpPattern::new(ClientKind::Runner, "jobs.*"),
    ]
}

fn build_gateway(config: GatewayConfig) -> DispatchGateway {
    let store = Arc::new(TokenStore::new());
    let resolver = AuthResolver::new(store, config.token_ttl(), config.auth_timeout())
        .with_backend("auto", Arc::new(AutoAuth::new(dev_grants())))
        .with_backend(
            "static",
            Arc::new(
                StaticAuth::new().with_user("alice", "hunter2", dev_grants()),
            ),
        );
    DispatchGateway::new(
        config,
        resolver,
        Arc::new(EchoExecutor::with_minions(["minion-a", "minion-b"])),
    )
}

fn dev_creds() -> Credentials {
    Credentials::new("saltdev", "saltdev", "auto")
}

fn ping(token: &lowgate_types::Token) -> LowStateCommand {
    LowStateCommand::new(ClientKind::Local, "test.ping")
        .with_target("*")
        .with_token(token.clone())
}

// ---------------------------------------------------------------------
// Login lifecycle
// ---------------------------------------------------------------------

#[tokio::test]
async fn login_returns_token_and_perms() {
    let gw = build_gateway(GatewayConfig::default());

    let login = gw.login(&dev_creds()).await.unwrap();
    assert!(!login.token.is_empty());
    assert_eq!(login.token.as_str().len(), 64);
    assert!(!login.perms.is_empty());
    assert!(login.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let gw = build_gateway(GatewayConfig::default());

    let err = gw
        .login(&Credentials::new("alice", "wrong", "static"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

#[tokio::test]
async fn unknown_backend_is_unauthorized() {
    let gw = build_gateway(GatewayConfig::default());

    let err = gw
        .login(&Credentials::new("saltdev", "saltdev", "ldap"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

#[tokio::test]
async fn repeated_logins_do_not_grow_perms() {
    let gw = build_gateway(GatewayConfig::default());

    let first = gw.login(&dev_creds()).await.unwrap();
    let mut last = first.perms.clone();
    for _ in 0..5 {
        let next = gw.login(&dev_creds()).await.unwrap();
        assert_eq!(next.perms, last, "grant set must not accumulate");
        last = next.perms;
    }
    assert_eq!(last, first.perms);
}

#[tokio::test]
async fn each_login_mints_a_distinct_token() {
    let gw = build_gateway(GatewayConfig::default());

    let a = gw.login(&dev_creds()).await.unwrap().token;
    let b = gw.login(&dev_creds()).await.unwrap().token;
    assert_ne!(a, b);
}

#[tokio::test]
async fn logout_is_not_idempotent() {
    let gw = build_gateway(GatewayConfig::default());

    let token = gw.login(&dev_creds()).await.unwrap().token;
    gw.logout(&token).unwrap();
    assert_eq!(gw.logout(&token).unwrap_err(), GatewayError::Unauthorized);
}

// ---------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------

#[tokio::test]
async fn ping_dispatch_echoes_per_minion() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    let response = gw
        .dispatch(DispatchRequest::new("run", ping(&token)))
        .await
        .unwrap();

    assert_eq!(
        response.result,
        Some(serde_json::json!({"minion-a": true, "minion-b": true}))
    );
}

#[tokio::test]
async fn arg_dispatch_echoes_inputs() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    let cmd = LowStateCommand::new(ClientKind::Local, "test.arg")
        .with_target("minion-a")
        .with_arg(serde_json::json!("one"))
        .with_arg(serde_json::json!(2))
        .with_kwarg("key", serde_json::json!("value"))
        .with_token(token);
    let response = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap();

    let result = response.result.unwrap();
    let echoed = &result["minion-a"];
    assert_eq!(echoed["args"], serde_json::json!(["one", 2]));
    assert_eq!(echoed["kwargs"]["key"], serde_json::json!("value"));
}

#[tokio::test]
async fn credentials_inline_dispatch_works() {
    // One-shot: credentials carried on the command itself, no prior login.
    let gw = build_gateway(GatewayConfig::default());

    let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
        .with_target("*")
        .with_credentials(Credentials::new("alice", "hunter2", "static"));
    let response = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap();
    assert!(response.result.is_some());

    let jobs = gw.jobs().list(None);
    assert_eq!(jobs[0].submitted_by.user(), "alice");
}

#[tokio::test]
async fn unpermitted_function_is_unauthorized() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    let cmd = LowStateCommand::new(ClientKind::Wheel, "key.accept").with_token(token);
    let err = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
    // Denied requests never reach the job cache.
    assert!(gw.jobs().is_empty());
}

#[tokio::test]
async fn empty_token_never_authenticates() {
    let gw = build_gateway(GatewayConfig::default());

    let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
        .with_target("*")
        .with_token("");
    let err = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

#[tokio::test]
async fn pathname_shaped_token_is_just_unknown() {
    let gw = build_gateway(GatewayConfig::default());

    let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
        .with_target("*")
        .with_token("/etc/passwd");
    let err = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

#[tokio::test]
async fn revoked_token_cannot_dispatch() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    gw.logout(&token).unwrap();
    let err = gw
        .dispatch(DispatchRequest::new("run", ping(&token)))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

// ---------------------------------------------------------------------
// Category bypass
// ---------------------------------------------------------------------

#[tokio::test]
async fn open_category_accepts_anonymous_requests() {
    let gw = build_gateway(GatewayConfig::default().with_open_category("webhook"));

    let cmd = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("*");
    let response = gw
        .dispatch(DispatchRequest::new("webhook", cmd))
        .await
        .unwrap();
    assert!(response.result.is_some());

    let job = gw.jobs().get(&response.job_id).unwrap();
    assert_eq!(job.submitted_by.user(), "anonymous");
    assert_eq!(job.submitted_by.backend(), "bypass");
}

#[tokio::test]
async fn bypass_does_not_leak_into_other_categories() {
    let gw = build_gateway(GatewayConfig::default().with_open_category("webhook"));

    let cmd = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("*");
    let err = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Unauthorized);
}

// ---------------------------------------------------------------------
// Job records
// ---------------------------------------------------------------------

#[tokio::test]
async fn job_listing_reflects_dispatch_history() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    gw.dispatch(DispatchRequest::new("run", ping(&token)))
        .await
        .unwrap();
    let cmd = LowStateCommand::new(ClientKind::Local, "test.arg")
        .with_target("*")
        .with_arg(serde_json::json!(1))
        .with_token(token.clone());
    gw.dispatch(DispatchRequest::new("run", cmd)).await.unwrap();

    let auth = AuthSource::Token(token);
    let all = gw.list_jobs(&auth, None).await.unwrap();
    assert_eq!(all.len(), 2);
    // Oldest first.
    assert_eq!(all[0].command.function, "test.ping");
    assert_eq!(all[1].command.function, "test.arg");
    assert!(all.iter().all(|job| job.status == JobStatus::Complete));

    let filter = JobFilter {
        function_contains: Some("ping".to_string()),
        ..JobFilter::default()
    };
    let pinged = gw.list_jobs(&auth, Some(&filter)).await.unwrap();
    assert_eq!(pinged.len(), 1);
    assert_eq!(pinged[0].command.function, "test.ping");
}

#[tokio::test]
async fn cached_jobs_carry_no_auth_material() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    let response = gw
        .dispatch(DispatchRequest::new("run", ping(&token)))
        .await
        .unwrap();

    let job = gw
        .get_job(&AuthSource::Token(token), &response.job_id)
        .await
        .unwrap();
    assert!(job.command.auth.is_none(), "stored command must be redacted");
}

#[tokio::test]
async fn async_dispatch_result_lands_in_cache() {
    let gw = build_gateway(GatewayConfig::default());
    let token = gw.login(&dev_creds()).await.unwrap().token;

    let cmd = LowStateCommand::new(ClientKind::LocalAsync, "test.ping")
        .with_target("*")
        .with_token(token.clone());
    let response = gw
        .dispatch(DispatchRequest::new("run", cmd))
        .await
        .unwrap();
    assert!(response.result.is_none());

    let auth = AuthSource::Token(token);
    let mut job = gw.get_job(&auth, &response.job_id).await.unwrap();
    for _ in 0..100 {
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        job = gw.get_job(&auth, &response.job_id).await.unwrap();
    }
    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(
        job.result,
        Some(serde_json::json!({"minion-a": true, "minion-b": true}))
    );
}
