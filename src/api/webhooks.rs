//! App-level webhook subscriptions
//!
//! These calls authenticate as the app (`client_id|client_secret`), not as a
//! user, so they work without a user token.

use reqwest::Method;
use tracing::info;

use super::Client;
use super::builder::Params;
use super::transport::ApiRequest;
use crate::error::{Error, Result};
use crate::models::{SuccessResponse, WebhookSubscriptionsResponse};

/// Object type subscriptions are registered for
pub const WEBHOOK_OBJECT: &str = "user";

impl Client {
    fn app_access_token(&self) -> Result<String> {
        let config = self.config();
        if config.client_secret.trim().is_empty() {
            return Err(Error::validation(
                "client_secret",
                "webhook management needs the app secret",
            ));
        }
        Ok(format!("{}|{}", config.client_id, config.client_secret))
    }

    fn subscriptions_url(&self) -> String {
        self.graph_url(&format!("{}/subscriptions", self.config().client_id))
    }

    async fn app_call<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        mut query: Params,
        form: Params,
    ) -> Result<T> {
        query.set("access_token", self.app_access_token()?);
        let request = ApiRequest::new(method, self.subscriptions_url())
            .query(query)
            .form(form);
        self.send_json(&request).await
    }

    /// Subscribe `callback_url` to `fields` (`replies`, `mentions`, ...)
    pub async fn subscribe_webhook(
        &self,
        callback_url: &str,
        verify_token: &str,
        fields: &[String],
    ) -> Result<SuccessResponse> {
        super::validation::validate_media_url(callback_url, "callback_url")?;
        if verify_token.trim().is_empty() {
            return Err(Error::validation("verify_token", "verify token is required"));
        }
        let fields: Vec<&str> = fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            return Err(Error::validation("fields", "at least one field is required"));
        }
        self.app_access_token()?;

        let form: Params = [
            ("object", WEBHOOK_OBJECT),
            ("callback_url", callback_url),
            ("verify_token", verify_token),
            ("fields", fields.join(",").as_str()),
        ]
        .into_iter()
        .collect();
        let response: SuccessResponse = self.app_call(Method::POST, Params::new(), form).await?;
        info!(callback_url, "Subscribed webhook");
        Ok(response)
    }

    /// Current subscriptions of the app
    pub async fn list_webhook_subscriptions(&self) -> Result<WebhookSubscriptionsResponse> {
        self.app_call(Method::GET, Params::new(), Params::new())
            .await
    }

    /// Remove the subscription for `object` (the user object when `None`)
    pub async fn delete_webhook_subscription(
        &self,
        object: Option<&str>,
    ) -> Result<SuccessResponse> {
        let mut query = Params::new();
        query.set("object", object.unwrap_or(WEBHOOK_OBJECT));
        self.app_call(Method::DELETE, query, Params::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::scripted_client;

    #[tokio::test]
    async fn test_subscribe_uses_app_token() {
        let (client, transport) = scripted_client(&[r#"{"success":true}"#]);
        client.clear_token();
        let response = client
            .subscribe_webhook(
                "https://example.com/hook",
                "verify-me",
                &["replies".into(), " mentions ".into()],
            )
            .await
            .unwrap();
        assert!(response.success);

        let sent = &transport.recorded()[0];
        assert!(sent.url.ends_with("/v1.0/test-id/subscriptions"));
        assert_eq!(sent.query.get("access_token"), Some("test-id|test-secret"));
        assert_eq!(sent.form.get("fields"), Some("replies,mentions"));
        assert!(sent.bearer.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_validation() {
        let (client, transport) = scripted_client(&[]);
        let err = client
            .subscribe_webhook("ftp://example.com", "v", &["replies".into()])
            .await
            .unwrap_err();
        assert_eq!(err.validation_field(), Some("callback_url"));

        let err = client
            .subscribe_webhook("https://example.com/hook", "v", &[])
            .await
            .unwrap_err();
        assert_eq!(err.validation_field(), Some("fields"));
        assert!(transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (client, transport) = scripted_client(&[
            r#"{"data":[{"object":"user","callback_url":"https://example.com/hook","active":true,"fields":[{"name":"replies","version":"v1.0"}]}]}"#,
            r#"{"success":true}"#,
        ]);
        let subs = client.list_webhook_subscriptions().await.unwrap();
        assert_eq!(subs.data[0].fields[0].name, "replies");

        client.delete_webhook_subscription(None).await.unwrap();
        let sent = transport.recorded();
        assert_eq!(sent[1].method, Method::DELETE);
        assert_eq!(sent[1].query.get("object"), Some("user"));
    }
}
