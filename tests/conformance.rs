//! End-to-end apply/destroy run against the stub control plane.

use std::sync::Arc;
use std::time::Duration;

use hemmer_provider_lookup::appsync::{AppSyncApi, DataSourceByApiIdAndName, DataSourceType};
use hemmer_provider_lookup::memorydb::{MemoryDbApi, SubnetGroupByName, UserByName};
use hemmer_provider_lookup::testing::{StubControlPlane, StubReply};
use hemmer_provider_lookup::{
    CancellationToken, Finder, IdentityState, LifecycleStep, LookupContext, LookupError,
    LookupKey, RemoteError, StateSnapshot, Verifier, VerifierConfig, VerifyError,
};
use serde_json::json;

const STATE: &str = r#"{
    "resources": {
        "aws_appsync_datasource.test": {
            "type": "aws_appsync_datasource",
            "id": "api123#mySource"
        },
        "aws_appsync_graphql_api.test": {
            "type": "aws_appsync_graphql_api",
            "id": "api123"
        }
    }
}"#;

#[tokio::test]
async fn test_data_source_lifecycle() {
    let stub = Arc::new(StubControlPlane::new().with_items(
        "api123#mySource",
        vec![json!({"name": "mySource", "type": "AWS_LAMBDA"})],
    ));
    let client: Arc<dyn AppSyncApi> = stub.clone();
    let config = VerifierConfig::from_value(json!({
        "timeout_secs": 5,
        "concurrency": 2,
        "absence": "strict"
    }))
    .unwrap();
    let verifier = Verifier::with_config(client, config);
    let state = StateSnapshot::from_json(STATE).unwrap();
    let ctx = LookupContext::new();
    let kind = DataSourceByApiIdAndName;

    let ds = verifier
        .check_exists(&kind, &state, "aws_appsync_datasource.test", &ctx)
        .await
        .unwrap();
    assert_eq!(ds.data_source_type, DataSourceType::AwsLambda);

    let mut identity = IdentityState::default();
    identity = verifier
        .observe(&kind, "api123#mySource", identity, LifecycleStep::Apply, &ctx)
        .await
        .unwrap();
    assert_eq!(identity, IdentityState::Present);

    let err = verifier.check_destroyed(&kind, &state, &ctx).await.unwrap_err();
    assert!(matches!(err, VerifyError::StillExists { .. }));

    stub.set_reply(
        "api123#mySource",
        StubReply::Error(RemoteError::new("NotFoundException", "No data source found")),
    );
    verifier.check_destroyed(&kind, &state, &ctx).await.unwrap();
    identity = verifier
        .observe(&kind, "api123#mySource", identity, LifecycleStep::Destroy, &ctx)
        .await
        .unwrap();
    assert_eq!(identity, IdentityState::Absent);

    // Only the data source was looked up; the GraphQL API entry was skipped.
    assert_eq!(stub.calls(), 5);
}

#[tokio::test]
async fn test_memorydb_finder_errors_carry_context() {
    let stub = StubControlPlane::new()
        .with_items("dup", vec![json!({"Name": "dup"}), json!({"Name": "dup"})])
        .with_error("alice", RemoteError::new("UserNotFoundFault", "User alice not found"));
    let client: Arc<dyn MemoryDbApi> = Arc::new(stub);
    let finder = Finder::new(client);
    let ctx = LookupContext::new();

    let err = finder
        .find(&SubnetGroupByName, &LookupKey::name("dup").unwrap(), &ctx)
        .await
        .unwrap_err();
    match &err {
        LookupError::TooManyResults { count, request, .. } => {
            assert_eq!(*count, 2);
            assert!(request.contains("dup"), "{}", request);
        },
        other => panic!("expected too many results, got {:?}", other),
    }
    assert!(!err.is_retryable());

    let err = finder
        .find(&UserByName, &LookupKey::name("alice").unwrap(), &ctx)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(tonic::Status::from(err).code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn test_cancelled_destroy_check_is_not_absence() {
    let stub = StubControlPlane::new().with_hang("api123#mySource");
    let client: Arc<dyn AppSyncApi> = Arc::new(stub);
    let verifier = Verifier::new(client);
    let state = StateSnapshot::from_json(STATE).unwrap();

    let token = CancellationToken::new();
    let ctx = LookupContext::new()
        .with_cancellation(token.clone())
        .with_timeout(Duration::from_secs(30));
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let err = verifier
        .check_destroyed(&DataSourceByApiIdAndName, &state, &ctx)
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("cancelled"), "{}", err);
    canceller.await.unwrap();
}
