//! Realtime relay: decodes client events, persists the ones that need it and
//! fans them out through the connection registry.

pub mod events;
mod registry;
mod ws;

use std::sync::Arc;

use thiserror::Error;

use crate::store::{NewBlog, Store, StoreError};

use events::{ClientEvent, ErrorReply, ServerEvent};

pub use registry::{ConnectionId, ConnectionRegistry, ConnectionSender};
pub use ws::{relay_ws, Heartbeat};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("rejected: {0}")]
    Rejected(&'static str),
}

#[derive(Clone)]
pub struct Relay {
    registry: ConnectionRegistry,
    store: Arc<dyn Store>,
    heartbeat: Heartbeat,
}

impl Relay {
    pub fn new(registry: ConnectionRegistry, store: Arc<dyn Store>) -> Self {
        Self { registry, store, heartbeat: Heartbeat::default() }
    }

    pub fn with_heartbeat(self, heartbeat: Heartbeat) -> Self {
        Self { heartbeat, ..self }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn heartbeat(&self) -> Heartbeat {
        self.heartbeat
    }

    /// Dispatches `event` and reports any failure back to `origin` only.
    pub async fn handle(&self, origin: ConnectionId, event: ClientEvent) {
        let tag = event.tag();
        if let Err(err) = self.dispatch(origin, event).await {
            tracing::warn!(connection = %origin, tag, error = %err, "relay event dropped");
            self.reply_error(origin, tag, err.to_string());
        }
    }

    pub fn reply_error(&self, origin: ConnectionId, tag: &str, message: String) {
        self.registry.send_to(
            origin,
            Arc::new(ServerEvent::Error(ErrorReply { event: tag.to_owned(), message })),
        );
    }

    /// Nothing is delivered unless the write it depends on succeeded.
    pub async fn dispatch(&self, origin: ConnectionId, event: ClientEvent) -> Result<(), RelayError> {
        match event {
            ClientEvent::RegisterUser(reg) => {
                let username = reg.username.trim();
                if username.is_empty() {
                    return Err(RelayError::Rejected("username must not be empty"));
                }
                if let Some(previous) = self.registry.register(username, origin) {
                    tracing::debug!(
                        username = %username,
                        previous = %previous,
                        current = %origin,
                        "presence moved to a new connection"
                    );
                }
            }

            ClientEvent::PrivateMessage(msg) => {
                self.store
                    .append_private_message(&msg.from, &msg.to, &msg.message)
                    .await?;

                let recipient = self.registry.lookup(&msg.to);
                let event = Arc::new(ServerEvent::PrivateMessage(msg));
                match recipient {
                    Some(target) if target != origin => {
                        self.registry.send_to(target, event.clone());
                    }
                    Some(_) => {}
                    None => tracing::debug!(connection = %origin, "private message recipient offline"),
                }
                self.registry.send_to(origin, event);
            }

            ClientEvent::GroupMessage(msg) => {
                self.store
                    .append_group_message(msg.group_id, &msg.username, &msg.message)
                    .await?;
                self.broadcast(ServerEvent::GroupMessage(msg));
            }

            ClientEvent::ChatMessage(msg) => self.broadcast(ServerEvent::ChatMessage(msg)),

            ClientEvent::CreateBlog(blog) => {
                let post = self
                    .store
                    .create_blog(NewBlog {
                        username: &blog.username,
                        content: &blog.content,
                        image: blog.image.as_deref(),
                    })
                    .await?;
                self.broadcast(ServerEvent::NewBlog(post));
            }

            ClientEvent::BlogLike(like) => {
                let post = self.store.toggle_like(like.blog_id, &like.username).await?;
                self.broadcast(ServerEvent::BlogUpdated(post));
            }

            ClientEvent::BlogComment(comment) => {
                self.store
                    .add_comment(comment.blog_id, &comment.username, &comment.comment)
                    .await?;
                self.broadcast(ServerEvent::BlogComment(comment));
            }

            ClientEvent::CreateGroup(group) => {
                if group.group_name.trim().is_empty() {
                    return Err(RelayError::Rejected("group name must not be empty"));
                }
                let group = self.store.create_group(&group.group_name, &group.created_by).await?;
                self.broadcast(ServerEvent::NewGroup(group));
            }

            ClientEvent::WhiteboardDraw(stroke) => {
                self.registry
                    .broadcast(Arc::new(ServerEvent::WhiteboardDraw(stroke)), Some(origin));
            }

            ClientEvent::ScreenShare(signal) => self.broadcast(ServerEvent::ScreenShare(signal)),

            ClientEvent::MicToggle(signal) => self.broadcast(ServerEvent::MicToggle(signal)),
        }

        Ok(())
    }

    fn broadcast(&self, event: ServerEvent) {
        let delivered = self.registry.broadcast(Arc::new(event), None);
        tracing::trace!(delivered, "broadcast");
    }
}
