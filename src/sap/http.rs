//! RFC over an HTTP/JSON gateway
//!
//! Each function call is `POST {base_url}/rfc/{FUNCTION}` with the import and
//! table parameters as a JSON object. Logon data travels as basic auth plus
//! `sap-*` headers; the gateway performs the actual RFC logon per call.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::error::RfcError;
use super::functions;
use super::transport::{ConnectionParams, RfcConnection, RfcParams, RfcTransport};

pub struct HttpRfcTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRfcTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RfcTransport for HttpRfcTransport {
    fn name(&self) -> &'static str {
        "http-gateway"
    }

    /// No network traffic; the logon happens with the first call
    async fn open(&self, params: &ConnectionParams) -> Result<Box<dyn RfcConnection>, RfcError> {
        if params.user.trim().is_empty() {
            return Err(RfcError::LogonRejected("user name is empty".to_string()));
        }
        Ok(Box::new(HttpRfcConnection {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            params: params.clone(),
        }))
    }
}

/// Error body the gateway sends for ABAP exceptions
#[derive(Debug, Deserialize)]
struct ExceptionEnvelope {
    exception: ExceptionBody,
}

#[derive(Debug, Deserialize)]
struct ExceptionBody {
    key: String,
    #[serde(default)]
    message: String,
}

struct HttpRfcConnection {
    client: reqwest::Client,
    base_url: String,
    params: ConnectionParams,
}

#[async_trait]
impl RfcConnection for HttpRfcConnection {
    async fn ping(&self) -> Result<(), RfcError> {
        self.invoke(functions::RFC_PING, RfcParams::new())
            .await
            .map(|_| ())
    }

    async fn invoke(&self, function: &str, params: RfcParams) -> Result<RfcParams, RfcError> {
        let url = format!("{}/rfc/{}", self.base_url, function);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.params.user, Some(self.params.passwd.as_str()))
            .header("sap-client", &self.params.client)
            .header("sap-sysnr", &self.params.sysnr)
            .header("sap-language", &self.params.lang)
            .header("sap-ashost", &self.params.ashost)
            .json(&serde_json::Value::Object(params))
            .send()
            .await
            .map_err(|e| RfcError::Communication(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| RfcError::Protocol(format!("invalid JSON from gateway: {}", e)))?;
            return match body {
                serde_json::Value::Object(map) => Ok(map),
                serde_json::Value::Null => Ok(RfcParams::new()),
                other => Err(RfcError::Protocol(format!(
                    "expected JSON object from {}, got {}",
                    function, other
                ))),
            };
        }

        let text = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let reason = if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            };
            return Err(RfcError::LogonRejected(reason));
        }

        match serde_json::from_str::<ExceptionEnvelope>(&text) {
            Ok(envelope) => Err(RfcError::AbapException {
                key: envelope.exception.key,
                message: envelope.exception.message,
            }),
            Err(_) => Err(RfcError::Protocol(format!("HTTP {}: {}", status, text))),
        }
    }

    async fn close(&self) {
        tracing::trace!(user = %self.params.user, "HTTP RFC connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use zeroize::Zeroizing;

    fn params() -> ConnectionParams {
        ConnectionParams {
            ashost: "192.168.254.154".into(),
            sysnr: "01".into(),
            client: "300".into(),
            lang: "EN".into(),
            user: "alice".into(),
            passwd: Zeroizing::new("goodpass".into()),
        }
    }

    fn object(value: serde_json::Value) -> RfcParams {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rfc/ZRFC_GET_HU_DATA")
            .match_header("sap-client", "300")
            .match_header("sap-sysnr", "01")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body(Matcher::Json(json!({"I_BARCODE": "HU1"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"E_HU_DATA": {"HU_NUMBER": "HU1", "MAKTX": "Coil", "LGORT": "1000"}}"#)
            .create_async()
            .await;

        let transport = HttpRfcTransport::new(format!("{}/", server.url()));
        let conn = transport.open(&params()).await.unwrap();
        let out = conn
            .invoke("ZRFC_GET_HU_DATA", object(json!({"I_BARCODE": "HU1"})))
            .await
            .unwrap();

        assert_eq!(out["E_HU_DATA"]["HU_NUMBER"], "HU1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_logon_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rfc/RFC_PING")
            .with_status(401)
            .with_body("Name or password is incorrect")
            .create_async()
            .await;

        let transport = HttpRfcTransport::new(server.url());
        let conn = transport.open(&params()).await.unwrap();
        let err = conn.ping().await.unwrap_err();
        assert_eq!(
            err,
            RfcError::LogonRejected("Name or password is incorrect".into())
        );
    }

    #[tokio::test]
    async fn test_abap_exception_is_extracted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rfc/ZRFC_GET_HU_DATA")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"exception": {"key": "NOT_FOUND", "message": "HU404 unknown"}}"#)
            .create_async()
            .await;

        let transport = HttpRfcTransport::new(server.url());
        let conn = transport.open(&params()).await.unwrap();
        let err = conn
            .invoke("ZRFC_GET_HU_DATA", object(json!({"I_BARCODE": "HU404"})))
            .await
            .unwrap_err();
        assert!(err.is_exception("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_unstructured_failure_is_protocol_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rfc/ZRFC_GET_SLOC_LIST")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let transport = HttpRfcTransport::new(server.url());
        let conn = transport.open(&params()).await.unwrap();
        let err = conn
            .invoke("ZRFC_GET_SLOC_LIST", RfcParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RfcError::Protocol(msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_communication_failure() {
        // Port 9 (discard) is not listening on the test host
        let transport = HttpRfcTransport::new("http://127.0.0.1:9");
        let conn = transport.open(&params()).await.unwrap();
        let err = conn.ping().await.unwrap_err();
        assert!(matches!(err, RfcError::Communication(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_blank_user() {
        let mut p = params();
        p.user = "  ".into();
        let transport = HttpRfcTransport::new("http://127.0.0.1:9");
        assert!(matches!(
            transport.open(&p).await.err(),
            Some(RfcError::LogonRejected(_))
        ));
    }
}
