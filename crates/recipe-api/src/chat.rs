//! Cooking assistant chat

use auth_client::MultipartForm;
use tracing::debug;

use crate::models::{ChatQuery, ChatReply};
use crate::{AuthenticatedClient, Error, Result};

pub const CHAT: &str = "api/chat/";
pub const IMAGE_CHAT: &str = "api/chat/image/";

const DEFAULT_IMAGE_QUERY: &str = "What's in this recipe image?";

pub async fn ask(client: &AuthenticatedClient, query: &ChatQuery) -> Result<ChatReply> {
    if query.user_query.trim().is_empty() {
        return Err(Error::InvalidRequest("user_query is required".into()));
    }
    client.post(CHAT, query).await?.json()
}

/// An image to ask about.
#[derive(Debug, Clone)]
pub struct ChatImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Upload an image with an optional question. The body is kept in memory so
/// the request can be replayed after a refresh.
pub async fn ask_about_image(
    client: &AuthenticatedClient,
    image: ChatImage,
    user_query: Option<&str>,
    context: Option<&str>,
) -> Result<ChatReply> {
    debug!(bytes = image.data.len(), content_type = %image.content_type, "uploading chat image");
    let mut form = MultipartForm::new()
        .file("image", image.file_name, image.content_type, image.data)
        .text("user_query", user_query.unwrap_or(DEFAULT_IMAGE_QUERY));
    if let Some(context) = context {
        form = form.text("context", context);
    }
    client.upload(IMAGE_CHAT, form).await?.json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client;
    use auth_client::testing::json_response;
    use auth_client::{PartValue, RequestBody};

    #[tokio::test]
    async fn ask_posts_query() {
        let (client, transport) = client(|_| {
            Ok(json_response(200, serde_json::json!({"response": "Add more salt."})))
        })
        .await;

        let reply = ask(
            &client,
            &ChatQuery {
                user_query: "too bland?".into(),
                recipe_id: Some(7),
                context: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(reply.message.as_deref(), Some("Add more salt."));

        let RequestBody::Json(body) = transport.requests()[0].body().clone() else {
            panic!("expected JSON body")
        };
        assert_eq!(body["recipe_id"], 7);
        assert!(body.get("context").is_none());
    }

    #[tokio::test]
    async fn blank_query_rejected_locally() {
        let (client, transport) = client(|_| unreachable!()).await;
        let query = ChatQuery {
            user_query: "   ".into(),
            recipe_id: None,
            context: None,
        };
        assert!(matches!(ask(&client, &query).await, Err(Error::InvalidRequest(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn image_upload_uses_multipart_with_default_query() {
        let (client, transport) = client(|_| {
            Ok(json_response(
                200,
                serde_json::json!({"message": "Looks like paneer tikka", "type": "image_analysis"}),
            ))
        })
        .await;

        let image = ChatImage {
            file_name: "dish.jpg".into(),
            content_type: "image/jpeg".into(),
            data: vec![0xff, 0xd8, 0xff],
        };
        let reply = ask_about_image(&client, image, None, None).await.unwrap();
        assert_eq!(reply.kind.as_deref(), Some("image_analysis"));

        let sent = transport.requests();
        assert_eq!(sent[0].path(), IMAGE_CHAT);
        let RequestBody::Multipart(form) = sent[0].body() else {
            panic!("expected multipart body")
        };
        let parts = form.parts();
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0].value, PartValue::File { file_name, .. } if file_name == "dish.jpg"));
        assert!(matches!(&parts[1].value, PartValue::Text(q) if q == DEFAULT_IMAGE_QUERY));
    }
}
