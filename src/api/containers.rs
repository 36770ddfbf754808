//! Media container lifecycle
//!
//! Every post starts as a container. Text containers are ready immediately;
//! image and video containers are processed asynchronously and must be polled
//! until they settle before they can be published or used as carousel items.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use super::Client;
use super::builder::{ContainerBuilder, Params};
use super::fields_query;
use crate::error::{ApiError, Error, Result};
use crate::models::{
    CarouselItem, ContainerId, ContainerState, ContainerStatus, MediaType, PostId,
};

/// Fields requested when polling a container
const CONTAINER_STATUS_FIELDS: &str = "id,status,error_message";

/// How often and how long to poll a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between polls
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

/// Where a poll loop stands after one status read
enum Poll {
    Pending(ContainerState),
    Ready(ContainerStatus),
    Failed(Error),
}

fn step(status: ContainerStatus) -> Poll {
    match status.status {
        ContainerState::Finished | ContainerState::Published => Poll::Ready(status),
        ContainerState::Error => Poll::Failed(
            ApiError::new(
                400,
                format!("container {} failed processing", status.id),
                status.error_message.unwrap_or_default(),
                "",
            )
            .into(),
        ),
        ContainerState::Expired => Poll::Failed(
            ApiError::new(
                400,
                format!("container {} expired before publishing", status.id),
                "",
                "",
            )
            .into(),
        ),
        state @ (ContainerState::Created | ContainerState::InProgress | ContainerState::Unknown) => {
            Poll::Pending(state)
        }
    }
}

fn require_container_id(id: &ContainerId) -> Result<()> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(Error::validation("container_id", "container id is required"))
    }
}

impl Client {
    /// Create a container for the authenticated user
    pub async fn create_container(&self, params: Params) -> Result<ContainerId> {
        let path = format!("{}/threads", self.me());
        let created: IdResponse = self.post(&path, params).await?;
        debug!(container_id = %created.id, "Created media container");
        Ok(ContainerId::new(created.id))
    }

    /// Current processing state of a container
    pub async fn get_container_status(&self, id: &ContainerId) -> Result<ContainerStatus> {
        require_container_id(id)?;
        self.get(id.as_str(), fields_query(CONTAINER_STATUS_FIELDS))
            .await
    }

    /// Poll with the client's configured interval and timeout
    pub async fn wait_for_container(&self, id: &ContainerId) -> Result<ContainerStatus> {
        self.wait_for_container_with(id, self.config().poll).await
    }

    /// Poll until the container is ready, fails, or `poll.timeout` elapses
    ///
    /// Cancellation is checked before every status read and every sleep.
    pub async fn wait_for_container_with(
        &self,
        id: &ContainerId,
        poll: PollConfig,
    ) -> Result<ContainerStatus> {
        require_container_id(id)?;
        let deadline = Instant::now() + poll.timeout;

        loop {
            if self.cancel_token().is_cancelled() {
                return Err(Error::Cancelled);
            }

            match step(self.get_container_status(id).await?) {
                Poll::Ready(status) => return Ok(status),
                Poll::Failed(err) => return Err(err),
                Poll::Pending(state) => {
                    debug!(container_id = %id, %state, "Container not ready");
                }
            }

            if Instant::now() + poll.interval > deadline {
                return Err(Error::Timeout(format!(
                    "container {id} not ready after {}s",
                    poll.timeout.as_secs()
                )));
            }
            self.cancel_token().sleep(poll.interval).await?;
        }
    }

    /// Publish a ready container
    pub async fn publish_container(&self, id: &ContainerId) -> Result<PostId> {
        require_container_id(id)?;
        let path = format!("{}/threads_publish", self.me());
        let mut form = Params::new();
        form.set("creation_id", id.as_str());
        let published: IdResponse = self.post(&path, form).await?;
        debug!(post_id = %published.id, "Published container");
        Ok(PostId::new(published.id))
    }

    /// Create one carousel item and wait until it is ready
    pub(crate) async fn create_carousel_item(
        &self,
        item: &CarouselItem,
        alt_text: Option<&str>,
    ) -> Result<ContainerId> {
        let builder = ContainerBuilder::new()
            .media_type(item.media_type)
            .is_carousel_item(true)
            .is_spoiler_media(item.is_spoiler_media)
            .alt_text(alt_text.unwrap_or_default());
        let builder = match item.media_type {
            MediaType::Video => builder.video_url(&item.url),
            _ => builder.image_url(&item.url),
        };

        let id = self.create_container(builder.build()).await?;
        self.wait_for_container(&id).await?;
        Ok(id)
    }
}
