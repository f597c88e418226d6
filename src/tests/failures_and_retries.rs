// Failure scenarios: retry exhaustion, fatal parse errors without retries,
// signer failures and cancellation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::Stage;
use crate::config::service::Environment;
use crate::error::AuthError;
use crate::tests::common::*;

#[tokio::test]
async fn seed_stage_gives_up_after_ten_unavailable_answers() {
    let transport = ScriptedTransport::new();
    transport.push_n(CERT_SEED, Reply::Body("503 Service Unavailable".into()), 12);
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    match err {
        AuthError::ServiceUnavailable { stage, attempts, source } => {
            assert_eq!(stage, Stage::Seed);
            assert_eq!(attempts, 10);
            assert_eq!(source.to_string(), "503 Service Unavailable");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(transport.calls_to(CERT_SEED), 10);
    assert_eq!(transport.calls_to(CERT_TOKEN), 0);
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn token_stage_gives_up_after_ten_failures() {
    let transport = ScriptedTransport::new();
    transport
        .push(CERT_SEED, Reply::Body(seed_response(SEED)))
        .push_n(CERT_TOKEN, Reply::Fail("connection refused".into()), 5)
        .push_n(CERT_TOKEN, Reply::Body("<h1>503</h1>".into()), 5)
        .push(CERT_TOKEN, Reply::Body(token_response(TOKEN)));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ServiceUnavailable { stage: Stage::Token, attempts: 10, .. }));
    assert_eq!(transport.calls_to(CERT_TOKEN), 10);
}

#[tokio::test]
async fn transport_errors_alone_exhaust_retries() {
    let transport = ScriptedTransport::new();
    transport.push_n(CERT_SEED, Reply::Fail("dns error".into()), 10);
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert_eq!(err.reason(), "service_unavailable");
    assert!(err.to_string().contains("dns error"));
}

#[tokio::test]
async fn malformed_seed_envelope_is_not_retried() {
    let transport = ScriptedTransport::new();
    let truncated = seed_response(SEED);
    transport
        .push(CERT_SEED, Reply::Body(truncated[..truncated.len() - 40].to_owned()))
        .push(CERT_SEED, Reply::Body(seed_response(SEED)));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::EnvelopeParse { stage: Stage::Seed, .. }), "{err:?}");
    assert_eq!(transport.calls_to(CERT_SEED), 1);
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn malformed_token_envelope_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport
        .push(CERT_SEED, Reply::Body(seed_response(SEED)))
        .push(CERT_TOKEN, Reply::Body("<soapenv:Envelope><soapenv:Body>".into()))
        .push(CERT_TOKEN, Reply::Body(token_response(TOKEN)));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::EnvelopeParse { stage: Stage::Token, .. }));
    assert_eq!(transport.calls_to(CERT_TOKEN), 1);
}

#[tokio::test]
async fn missing_seed_element_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport
        .push(
            CERT_SEED,
            Reply::Body(envelope("getSeedResponse", "getSeedReturn", "<RESPUESTA><ESTADO>-1</ESTADO></RESPUESTA>")),
        )
        .push(CERT_SEED, Reply::Body(seed_response(SEED)));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ElementNotFound { stage: Stage::Seed, element: "SEMILLA" }));
    assert_eq!(transport.calls_to(CERT_SEED), 1);
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn missing_token_element_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport
        .push(CERT_SEED, Reply::Body(seed_response(SEED)))
        .push(CERT_TOKEN, Reply::Body(token_response_without_token()))
        .push(CERT_TOKEN, Reply::Body(token_response(TOKEN)));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ElementNotFound { stage: Stage::Token, element: "TOKEN" }));
    assert_eq!(transport.calls_to(CERT_TOKEN), 1);
}

#[tokio::test]
async fn empty_seed_never_reaches_the_signer() {
    let transport = ScriptedTransport::new();
    transport.push(CERT_SEED, Reply::Body(seed_response("")));
    let signer = CapturingSigner::new();

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::EmptyValue { stage: Stage::Seed, .. }));
    assert!(signer.calls().is_empty());
}

#[tokio::test]
async fn signer_error_is_propagated_verbatim() {
    let transport = ScriptedTransport::new();
    transport.push(CERT_SEED, Reply::Body(seed_response(SEED)));
    let signer = CapturingSigner::failing("pkcs12: decryption password incorrect");

    let err = authenticator(&transport, &signer)
        .authenticate(&credential(), Environment::Certification)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Signing(_)));
    assert_eq!(err.to_string(), "pkcs12: decryption password incorrect");
    assert_eq!(transport.calls_to(CERT_TOKEN), 0);
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let transport = ScriptedTransport::new();
    transport.push(CERT_SEED, Reply::Body(seed_response(SEED)));
    let signer = CapturingSigner::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = authenticator(&transport, &signer)
        .authenticate_with_cancel(&credential(), Environment::Certification, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Cancelled { stage: Stage::Seed }));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_hanging_token_call() {
    let transport = ScriptedTransport::new();
    transport
        .push(CERT_SEED, Reply::Body(seed_response(SEED)))
        .push(CERT_TOKEN, Reply::Hang);
    let signer = CapturingSigner::new();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        authenticator(&transport, &signer).authenticate_with_cancel(&credential(), Environment::Certification, &cancel),
    )
    .await
    .expect("cancellation should abort promptly")
    .unwrap_err();

    assert!(matches!(err, AuthError::Cancelled { stage: Stage::Token }));
    assert_eq!(transport.calls_to(CERT_TOKEN), 1);
}

#[tokio::test]
async fn cancellation_interrupts_a_stuck_signer() {
    let transport = ScriptedTransport::new();
    transport
        .push(CERT_SEED, Reply::Body(seed_response(SEED)))
        .push(CERT_TOKEN, Reply::Body(token_response(TOKEN)));
    let signer = CapturingSigner::hanging();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        authenticator(&transport, &signer).authenticate_with_cancel(&credential(), Environment::Certification, &cancel),
    )
    .await
    .expect("cancellation should abort the signer promptly")
    .unwrap_err();

    assert!(matches!(err, AuthError::Cancelled { stage: Stage::Seed }), "{err:?}");
    assert_eq!(signer.calls().len(), 1);
    assert_eq!(transport.calls_to(CERT_TOKEN), 0);
}
