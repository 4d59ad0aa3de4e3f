use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Emoji → role id, for one published selection message.
pub type EmojiRoleMap = BTreeMap<String, u64>;

/// Per-guild configuration. One instance per guild id in the config file;
/// nothing in here may be read or written through another guild's entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildConfig {
    #[serde(default)]
    pub log_channel_id: Option<u64>,
    #[serde(default)]
    pub ticket_message_id: Option<u64>,
    #[serde(default)]
    pub ticket_channel_id: Option<u64>,
    #[serde(default)]
    pub ticket_category_id: Option<u64>,
    /// Monotonic ticket counter. Never decremented, even when channel
    /// creation fails after allocation.
    #[serde(default)]
    pub ticket_counter: u64,
    /// Requester user id (stringified) → open ticket channel id.
    #[serde(default)]
    pub open_tickets: HashMap<String, u64>,
    /// Ticket channel id (stringified) → control message id carrying the
    /// close reaction.
    #[serde(default)]
    pub ticket_messages: HashMap<String, u64>,
    #[serde(default)]
    pub reaction_role_channel: Option<u64>,
    /// Message id (stringified) → emoji → role id. Fully replaced on every
    /// publish, never merged.
    #[serde(default)]
    pub reaction_roles: HashMap<String, EmojiRoleMap>,
}

impl GuildConfig {
    /// Reverse lookup of the open-tickets map by channel id.
    pub fn ticket_owner(&self, channel_id: u64) -> Option<u64> {
        self.open_tickets
            .iter()
            .find(|(_, id)| **id == channel_id)
            .and_then(|(user, _)| user.parse().ok())
    }

    /// Drops all bookkeeping for one ticket, keyed by owner and channel.
    pub fn forget_ticket(&mut self, owner_id: u64, channel_id: u64) {
        self.open_tickets.remove(&owner_id.to_string());
        self.ticket_messages.remove(&channel_id.to_string());
    }
}
