//! Outbound SMS and WhatsApp delivery.

mod client;
mod error;
mod sender;
mod types;

pub use client::{TwilioClient, TwilioOptions, DEFAULT_TWILIO_URL};
pub use error::MessagingError;
pub use sender::MessageSender;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MESSAGES_PATH: &str = "/2010-04-01/Accounts/ACtest/Messages.json";

    fn create_test_client(mock_server: &MockServer) -> TwilioClient {
        TwilioClient::new(TwilioOptions {
            account_sid: "ACtest".into(),
            auth_token: "token".into(),
            sms_from: Some("+15005550006".into()),
            whatsapp_from: Some("whatsapp:+14155238886".into()),
            base_url: mock_server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_channel_address() {
        assert_eq!(Channel::Sms.address("+919876543210"), "+919876543210");
        assert_eq!(
            Channel::Whatsapp.address("+919876543210"),
            "whatsapp:+919876543210"
        );
        assert_eq!(
            Channel::Whatsapp.address("whatsapp:+919876543210"),
            "whatsapp:+919876543210"
        );
    }

    #[test]
    fn test_channel_serialization() {
        assert_eq!(serde_json::to_string(&Channel::Sms).unwrap(), "\"sms\"");
        assert_eq!(
            serde_json::to_string(&Channel::Whatsapp).unwrap(),
            "\"whatsapp\""
        );
        let parsed: Channel = serde_json::from_str("\"WhatsApp\"").unwrap();
        assert_eq!(parsed, Channel::Whatsapp);
    }

    #[tokio::test]
    async fn test_send_sms() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B919876543210"))
            .and(body_string_contains("From=%2B15005550006"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM123",
                "status": "queued"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let receipt = client
            .send_message("+919876543210", Channel::Sms, "Your code is 123456")
            .await
            .unwrap();

        assert_eq!(receipt.message_id, "SM123");
        assert_eq!(receipt.status.as_deref(), Some("queued"));
    }

    #[tokio::test]
    async fn test_send_whatsapp_uses_scheme() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(body_string_contains("To=whatsapp%3A%2B919876543210"))
            .and(body_string_contains("From=whatsapp%3A%2B14155238886"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM456"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let sender: &dyn MessageSender = &client;
        let receipt = sender
            .send("+919876543210", Channel::Whatsapp, "Your code is 123456")
            .await
            .unwrap();

        assert_eq!(receipt.message_id, "SM456");
        assert_eq!(receipt.status, None);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": 20003,
                "message": "Authenticate",
                "status": 401
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .send_message("+919876543210", Channel::Sms, "hi")
            .await
            .unwrap_err();

        assert!(err.is_auth_failure());
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 21211,
                "message": "The 'To' number is not a valid phone number.",
                "status": 400
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client
            .send_message("+919876543210", Channel::Sms, "hi")
            .await
            .unwrap_err();

        match err {
            MessagingError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("not a valid phone number"));
                assert!(message.contains("21211"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_sender() {
        let mock_server = MockServer::start().await;

        let client = TwilioClient::new(TwilioOptions {
            account_sid: "ACtest".into(),
            auth_token: "token".into(),
            sms_from: Some("+15005550006".into()),
            whatsapp_from: Some(String::new()),
            base_url: mock_server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let err = client
            .send_message("+919876543210", Channel::Whatsapp, "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, MessagingError::NoSender(Channel::Whatsapp)));
    }
}
