use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{SupportChat, SupportMessage};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatList {
    pub items: Vec<SupportChat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub chat: SupportChat,
    pub items: Vec<SupportMessage>,
}
