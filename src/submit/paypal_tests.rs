use super::*;
use crate::error::ErrorKind;
use crate::test_support::{closed_base_url, serve};
use serde_json::json;

fn config_for(base_url: &str, secrets: Secrets) -> Config {
    Config {
        paypal_base_url: base_url.to_string(),
        secrets,
        ..Config::default()
    }
}

fn client_credentials() -> Secrets {
    Secrets {
        paypal_client_id: Some(Secret::new("client")),
        paypal_client_secret: Some(Secret::new("secret")),
        ..Secrets::default()
    }
}

fn visa() -> Value {
    json!({"payment_source": {"card": {
        "number": "4111111111111111",
        "expiry": "2025-12",
        "security_code": "123"
    }}})
}

#[test]
fn missing_credentials_is_configuration_error() {
    let submitter = RemoteSubmitter::new(&config_for(
        "https://api-m.sandbox.paypal.com",
        Secrets {
            paypal_client_id: Some(Secret::new("client")),
            ..Secrets::default()
        },
    ));
    let err = submitter.submit(&visa()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.detail().contains("PAYPAL_CLIENT_SECRET"), "{}", err.detail());
    assert!(!err.detail().contains("PAYPAL_CLIENT_ID,"), "{}", err.detail());
}

#[test]
fn exchanges_client_credentials_then_posts_payload() {
    let (base_url, server) = serve(vec![
        (
            200,
            json!({"access_token": "A21AAF", "token_type": "Bearer"}).to_string(),
        ),
        (
            201,
            json!({"id": "8kk8451t", "customer": {"id": "cust_1"}}).to_string(),
        ),
    ]);
    let submitter = RemoteSubmitter::new(&config_for(&base_url, client_credentials()));

    let outcome = submitter.submit(&visa()).unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted {
            status: 201,
            body: json!({"id": "8kk8451t", "customer": {"id": "cust_1"}}),
        }
    );

    let requests = server.join().expect("server thread");
    assert_eq!(requests.len(), 2);

    let token = &requests[0];
    assert_eq!(token.method, "POST");
    assert_eq!(token.path, TOKEN_PATH);
    let expected_basic = format!("Basic {}", STANDARD.encode("client:secret"));
    assert_eq!(token.header("authorization"), Some(expected_basic.as_str()));
    assert_eq!(token.body, "grant_type=client_credentials");

    let vault = &requests[1];
    assert_eq!(vault.path, VAULT_PATH);
    assert_eq!(vault.header("authorization"), Some("Bearer A21AAF"));
    let sent: Value = serde_json::from_str(&vault.body).unwrap();
    assert_eq!(sent, visa());
}

#[test]
fn pre_issued_token_skips_exchange() {
    let (base_url, server) = serve(vec![(200, json!({"id": "tok_1"}).to_string())]);
    let secrets = Secrets {
        paypal_access_token: Some(Secret::new("preissued")),
        ..Secrets::default()
    };
    let submitter = RemoteSubmitter::new(&config_for(&base_url, secrets));

    let outcome = submitter.submit(&visa()).unwrap();
    assert!(outcome.is_accepted());

    let requests = server.join().expect("server thread");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, VAULT_PATH);
    assert_eq!(requests[0].header("authorization"), Some("Bearer preissued"));
}

#[test]
fn rejected_token_exchange_is_auth_error() {
    let (base_url, server) = serve(vec![(
        401,
        json!({"error": "invalid_client", "error_description": "Client Authentication failed"})
            .to_string(),
    )]);
    let submitter = RemoteSubmitter::new(&config_for(&base_url, client_credentials()));

    let err = submitter.submit(&visa()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.detail().starts_with("token endpoint returned 401"), "{}", err.detail());
    assert!(err.detail().contains("invalid_client"));
    assert_eq!(server.join().expect("server thread").len(), 1);
}

#[test]
fn token_response_without_access_token_is_auth_error() {
    let (base_url, server) = serve(vec![(200, json!({"scope": "openid"}).to_string())]);
    let submitter = RemoteSubmitter::new(&config_for(&base_url, client_credentials()));

    let err = submitter.submit(&visa()).unwrap_err();
    assert_eq!(err.detail(), "token response missing access_token");
    server.join().expect("server thread");
}

#[test]
fn remote_error_is_passed_through_as_rejection() {
    let error_body = json!({
        "name": "UNPROCESSABLE_ENTITY",
        "message": "The requested action could not be performed.",
        "details": [{
            "field": "/payment_source/card/expiry",
            "issue": "INVALID_PARAMETER_VALUE",
            "description": "The value of a field is invalid."
        }]
    });
    let secrets = Secrets {
        paypal_access_token: Some(Secret::new("preissued")),
        ..Secrets::default()
    };
    let (base_url, server) = serve(vec![(422, error_body.to_string())]);
    let submitter = RemoteSubmitter::new(&config_for(&base_url, secrets));

    let outcome = submitter.submit(&visa()).unwrap();
    match outcome {
        SubmissionOutcome::Rejected {
            category,
            message,
            status,
            body,
        } => {
            assert_eq!(category, "UNPROCESSABLE_ENTITY");
            assert_eq!(
                message,
                "The requested action could not be performed. (INVALID_PARAMETER_VALUE at \
                 /payment_source/card/expiry: The value of a field is invalid.)"
            );
            assert_eq!(status, Some(422));
            assert_eq!(body, Some(error_body));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    server.join().expect("server thread");
}

#[test]
fn unreachable_endpoint_is_submission_error() {
    let secrets = Secrets {
        paypal_access_token: Some(Secret::new("preissued")),
        ..Secrets::default()
    };
    let submitter = RemoteSubmitter::new(&config_for(&closed_base_url(), secrets));
    let err = submitter.submit(&visa()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
}

#[test]
fn unreachable_token_endpoint_is_submission_error() {
    let submitter = RemoteSubmitter::new(&config_for(&closed_base_url(), client_credentials()));
    let err = submitter.submit(&visa()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    assert!(err.detail().starts_with("token request failed"), "{}", err.detail());
}

#[test]
fn error_helpers_fall_back_to_status() {
    let body = parse_body("<html>bad gateway</html>");
    assert_eq!(body, Value::String("<html>bad gateway</html>".to_string()));
    assert_eq!(error_category(&body, 502), "http_502");
    assert_eq!(
        error_message(&body, "<html>bad gateway</html>", 502),
        "<html>bad gateway</html>"
    );
    assert_eq!(error_message(&Value::Null, "", 500), "HTTP 500");
}
