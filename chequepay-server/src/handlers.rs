//! Axum route handlers for the adaptor.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{Method, Uri};
use chequepay::Adaptor;
use chequepay::AdaptorConfig;
use chequepay::lightning::PaymentResult;
use chequepay::pay::PayRequest;
use chequepay::quote::Quote;
use chequepay_lnd::LndClient;

use crate::error::ApiError;

/// Shared application state.
pub type AdaptorState = Arc<Adaptor<LndClient>>;

/// `GET /health` - Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /info` - The adaptor's fee and timeout parameters.
pub async fn get_info(State(adaptor): State<AdaptorState>) -> Json<AdaptorConfig> {
    Json(adaptor.config().clone())
}

/// `GET /quote/{payload}` - Prices a BOLT11 payment request.
///
/// # Errors
///
/// See [`crate::error::status_for`] for the status of each failure.
pub async fn get_quote(
    State(adaptor): State<AdaptorState>,
    payload: Result<Path<String>, PathRejection>,
) -> Result<Json<Quote>, ApiError> {
    let Path(payload) = payload?;
    Ok(Json(adaptor.quote(&payload).await?))
}

/// `POST /pay` - Redeems a signed cheque.
///
/// # Errors
///
/// See [`crate::error::status_for`] for the status of each failure.
pub async fn post_pay(
    State(adaptor): State<AdaptorState>,
    body: Result<Json<PayRequest>, JsonRejection>,
) -> Result<Json<PaymentResult>, ApiError> {
    let Json(request) = body?;
    Ok(Json(adaptor.pay(&request).await?))
}

/// Fallback for paths no route matches.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method: method.to_string(),
        path: uri.path().to_owned(),
    }
}

/// Fallback for known paths requested with another method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_owned(),
    }
}

/// Creates an Axum [`axum::Router`] with all adaptor endpoints.
///
/// Endpoints:
/// - `GET /health` - liveness
/// - `GET /info` - adaptor parameters
/// - `GET /quote/{payload}` - quote an invoice
/// - `POST /pay` - redeem a cheque
///
/// Anything else gets the same JSON error body as a failed pipeline.
pub fn adaptor_router(state: AdaptorState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(health))
        .route("/info", axum::routing::get(get_info))
        .route("/quote/{payload}", axum::routing::get(get_quote))
        .route("/pay", axum::routing::post(post_pay))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use chequepay::cheque::{ChequeBody, ChequeFrame};
    use chequepay::types::Lock;
    use chequepay_lnd::{Macaroon, TlsTrust, normalize_base_url};
    use http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const DESTINATION: &str = "02abababababababababababababababababababababababababababababababab";

    fn router(server: &MockServer) -> axum::Router {
        let url = normalize_base_url(&server.uri()).unwrap();
        let macaroon = Macaroon::from_hex("0201").unwrap();
        let client = LndClient::try_new(url, &macaroon, &TlsTrust::System).unwrap();
        adaptor_router(Arc::new(Adaptor::new(client, AdaptorConfig::default())))
    }

    async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn mount_quote_backend(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/payreq/lnbc1test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "destination": DESTINATION,
                "payment_hash": "cd".repeat(32),
                "num_msat": "100000",
                "timestamp": "1700000000",
                "expiry": "3600"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/getinfo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "block_height": 800_000 })),
            )
            .mount(server)
            .await;
    }

    fn signed_pay_request(index: u64) -> serde_json::Value {
        use ed25519_dalek::{Signer, SigningKey};

        let signer = SigningKey::from_bytes(&[9; 32]);
        let body = ChequeBody {
            index,
            amount: 100_000,
            timeout_ms: u64::MAX,
            lock: Lock::new([0x11; 32]),
        }
        .to_cbor();
        let tag = [0xab, 0xcd];
        let mut message = tag.to_vec();
        message.extend_from_slice(&body);
        let frame = ChequeFrame::assemble(&body, &signer.sign(&message).to_bytes());
        serde_json::json!({
            "tag": "abcd",
            "verificationKey": format!("{}", chequepay::types::VerificationKey::new(signer.verifying_key().to_bytes())),
            "paymentAddr": "22".repeat(32),
            "cheque": frame.to_hex(),
            "dest": DESTINATION,
            "msat": 100_000
        })
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let (status, body) = send(router(&server), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_info_reports_fees() {
        let server = MockServer::start().await;
        let (status, body) = send(router(&server), get("/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adaptor_fee_msat"], 42);
        assert_eq!(body["final_cltv_delta"], 100);
    }

    #[tokio::test]
    async fn test_quote() {
        let server = MockServer::start().await;
        mount_quote_backend(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/graph/routes/{DESTINATION}/0")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "routes": [{ "total_fees_msat": "1008", "total_time_lock": 800_144 }]
            })))
            .mount(&server)
            .await;

        let (status, body) = send(router(&server), get("/quote/lnbc1test")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], 100_000);
        assert_eq!(body["recipient"], DESTINATION);
        assert_eq!(body["routing_fee"], 1050);
        assert_eq!(body["expiry"], "2023-11-14T23:13:20.000Z");
    }

    #[tokio::test]
    async fn test_quote_without_route_is_400() {
        let server = MockServer::start().await;
        mount_quote_backend(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/graph/routes/{DESTINATION}/0")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "routes": [] })))
            .mount(&server)
            .await;

        let (status, body) = send(router(&server), get("/quote/lnbc1test")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "no_route_available");
    }

    #[tokio::test]
    async fn test_unable_to_find_path_is_400() {
        let server = MockServer::start().await;
        mount_quote_backend(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/graph/routes/{DESTINATION}/0")))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": 2,
                "message": "unable to find a path to destination"
            })))
            .mount(&server)
            .await;

        let (status, body) = send(router(&server), get("/quote/lnbc1test")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "no_route_available");
    }

    #[tokio::test]
    async fn test_non_utf8_payload_is_json_400() {
        let server = MockServer::start().await;
        let response = router(&server).oneshot(get("/quote/%FF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "invalid_request");
        assert!(body["error"].as_str().unwrap().starts_with("invalid request path"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let server = MockServer::start().await;
        let (status, body) = send(router(&server), get("/quotes")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["error"], "no such endpoint: GET /quotes");
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let server = MockServer::start().await;
        let (status, body) = send(router(&server), get("/pay")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["kind"], "method_not_allowed");
    }

    #[tokio::test]
    async fn test_undecodable_invoice_is_502_without_backend_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payreq/garbage"))
            .respond_with(ResponseTemplate::new(500).set_body_string("secret backend detail"))
            .mount(&server)
            .await;

        let (status, body) = send(router(&server), get("/quote/garbage")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "invoice_decode_failed");
        assert_eq!(body["error"], "failed to decode payment request");
    }

    #[tokio::test]
    async fn test_pay_then_replay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/channels/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "payment_error": "",
                "payment_preimage": "MzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzMzM="
            })))
            .expect(1)
            .mount(&server)
            .await;
        let router = router(&server);

        let request = signed_pay_request(1);
        let (status, body) = send(router.clone(), post_json("/pay", &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payment_error"], "");

        let (status, body) = send(router, post_json("/pay", &request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "cheque_replayed");
    }

    #[tokio::test]
    async fn test_pay_with_bad_signature_is_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut request = signed_pay_request(1);
        request["tag"] = serde_json::json!("abce");
        let (status, body) = send(router(&server), post_json("/pay", &request)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_pay_with_invalid_json_is_400() {
        let server = MockServer::start().await;
        let (status, body) = send(
            router(&server),
            post_json("/pay", &serde_json::json!({ "tag": "00" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn test_payment_error_is_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/channels/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "payment_error": "insufficient local balance"
            })))
            .mount(&server)
            .await;

        let (status, body) = send(router(&server), post_json("/pay", &signed_pay_request(1))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "payment_failed");
        assert_eq!(body["error"], "failed to send payment");
    }
}
