use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub image: Option<String>,
    /// Cached count of like records, rewritten on every toggle.
    pub likes: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub blog_id: i64,
    pub username: String,
    pub comment: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub group_name: String,
    pub created_by: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessageRecord {
    pub id: i64,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    pub recipient: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageRecord {
    pub id: i64,
    pub group_id: i64,
    pub username: String,
    pub message: String,
    pub created_at: i64,
}
