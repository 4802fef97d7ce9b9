//! Wire format of the realtime socket: `{"event": <tag>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{BlogPost, Group};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub from: String,
    pub to: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub group_id: i64,
    pub username: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBlog {
    pub username: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogLike {
    pub blog_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComment {
    pub blog_id: i64,
    pub username: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub group_name: String,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Tag of the event that failed, or `unknown` for undecodable frames.
    pub event: String,
    pub message: String,
}

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "register user")]
    RegisterUser(RegisterUser),
    #[serde(rename = "private message")]
    PrivateMessage(PrivateMessage),
    #[serde(rename = "group message")]
    GroupMessage(GroupMessage),
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessage),
    #[serde(rename = "create blog")]
    CreateBlog(CreateBlog),
    #[serde(rename = "blog like")]
    BlogLike(BlogLike),
    #[serde(rename = "blog comment")]
    BlogComment(BlogComment),
    #[serde(rename = "create group")]
    CreateGroup(CreateGroup),
    #[serde(rename = "whiteboard draw")]
    WhiteboardDraw(Value),
    #[serde(rename = "screen share")]
    ScreenShare(Value),
    #[serde(rename = "mic toggle")]
    MicToggle(Value),
}

impl ClientEvent {
    pub fn tag(&self) -> &'static str {
        use ClientEvent::*;
        match self {
            RegisterUser(_) => "register user",
            PrivateMessage(_) => "private message",
            GroupMessage(_) => "group message",
            ChatMessage(_) => "chat message",
            CreateBlog(_) => "create blog",
            BlogLike(_) => "blog like",
            BlogComment(_) => "blog comment",
            CreateGroup(_) => "create group",
            WhiteboardDraw(_) => "whiteboard draw",
            ScreenShare(_) => "screen share",
            MicToggle(_) => "mic toggle",
        }
    }
}

/// Events the server delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "private message")]
    PrivateMessage(PrivateMessage),
    #[serde(rename = "group message")]
    GroupMessage(GroupMessage),
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessage),
    #[serde(rename = "new blog")]
    NewBlog(BlogPost),
    #[serde(rename = "blog updated")]
    BlogUpdated(BlogPost),
    #[serde(rename = "blog comment")]
    BlogComment(BlogComment),
    #[serde(rename = "new group")]
    NewGroup(Group),
    #[serde(rename = "whiteboard draw")]
    WhiteboardDraw(Value),
    #[serde(rename = "screen share")]
    ScreenShare(Value),
    #[serde(rename = "mic toggle")]
    MicToggle(Value),
    #[serde(rename = "error")]
    Error(ErrorReply),
}
