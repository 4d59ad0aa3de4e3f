use campus_shared::{guild::EmojiRoleMap, DataStore};
use std::collections::HashMap;

/// In-memory mirror of every guild's persisted reaction-role mapping,
/// consulted on each incoming reaction event.
///
/// The persisted blob is the source of truth: mutation paths write the
/// store first and then swap the matching entries here, so the window in
/// which the two disagree stays bounded to a single command.
#[derive(Debug, Default)]
pub struct ReactionRoleIndex {
    entries: HashMap<u64, IndexEntry>,
}

#[derive(Debug)]
struct IndexEntry {
    guild_id: u64,
    roles: HashMap<String, u64>,
}

impl ReactionRoleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the whole index and repopulates it from every known guild's
    /// persisted blob. Runs at startup and is safe to re-run.
    pub fn rebuild(&mut self, store: &DataStore) {
        self.entries.clear();
        for guild_id in store.guild_ids() {
            let config = store.guild_config(guild_id);
            self.insert_guild(guild_id, &config.reaction_roles);
        }
    }

    /// Replaces a guild's entries with a freshly published mapping. Message
    /// ids from earlier publishes are discarded, never merged.
    pub fn replace_guild(&mut self, guild_id: u64, mapping: &HashMap<String, EmojiRoleMap>) {
        self.clear_guild(guild_id);
        self.insert_guild(guild_id, mapping);
    }

    /// Evicts every message id belonging to the guild.
    pub fn clear_guild(&mut self, guild_id: u64) {
        self.entries.retain(|_, e| e.guild_id != guild_id);
    }

    /// The role a reaction symbol maps to on one message, if any. Unknown
    /// message ids and unmapped symbols both come back as `None`.
    pub fn role_for(&self, message_id: u64, emoji: &str) -> Option<u64> {
        self.entries
            .get(&message_id)
            .and_then(|e| e.roles.get(emoji).copied())
    }

    pub fn message_count(&self) -> usize {
        self.entries.len()
    }

    fn insert_guild(&mut self, guild_id: u64, mapping: &HashMap<String, EmojiRoleMap>) {
        for (message_id, roles) in mapping {
            if let Ok(id) = message_id.parse() {
                self.entries.insert(
                    id,
                    IndexEntry {
                        guild_id,
                        roles: roles.iter().map(|(e, r)| (e.clone(), *r)).collect(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_shared::guild::EmojiRoleMap;

    fn mapping(entries: &[(u64, &[(&str, u64)])]) -> HashMap<String, EmojiRoleMap> {
        entries
            .iter()
            .map(|(message_id, roles)| {
                let roles = roles
                    .iter()
                    .map(|(e, r)| (e.to_string(), *r))
                    .collect::<EmojiRoleMap>();
                (message_id.to_string(), roles)
            })
            .collect()
    }

    #[test]
    fn unknown_message_or_symbol_is_a_miss() {
        let mut index = ReactionRoleIndex::new();
        index.replace_guild(1, &mapping(&[(100, &[("1️⃣", 7)])]));

        assert_eq!(Some(7), index.role_for(100, "1️⃣"));
        assert_eq!(None, index.role_for(100, "2️⃣"));
        assert_eq!(None, index.role_for(999, "1️⃣"));
    }

    #[test]
    fn republish_discards_stale_message_ids() {
        let mut index = ReactionRoleIndex::new();
        index.replace_guild(1, &mapping(&[(100, &[("1️⃣", 7)]), (101, &[("1️⃣", 8)])]));
        index.replace_guild(1, &mapping(&[(200, &[("1️⃣", 7)])]));

        assert_eq!(None, index.role_for(100, "1️⃣"));
        assert_eq!(None, index.role_for(101, "1️⃣"));
        assert_eq!(Some(7), index.role_for(200, "1️⃣"));
        assert_eq!(1, index.message_count());
    }

    #[test]
    fn clearing_one_guild_leaves_others_alone() {
        let mut index = ReactionRoleIndex::new();
        index.replace_guild(1, &mapping(&[(100, &[("1️⃣", 7)])]));
        index.replace_guild(2, &mapping(&[(200, &[("1️⃣", 9)])]));

        index.clear_guild(1);

        assert_eq!(None, index.role_for(100, "1️⃣"));
        assert_eq!(Some(9), index.role_for(200, "1️⃣"));
    }

    #[test]
    fn rebuild_mirrors_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path(), "owner#0001").unwrap();
        store
            .update_guild_config(1, |c| {
                c.reaction_roles = mapping(&[(100, &[("🇦", 5)])]);
            })
            .unwrap();

        let mut index = ReactionRoleIndex::new();
        index.replace_guild(9, &mapping(&[(900, &[("1️⃣", 1)])]));
        index.rebuild(&store);

        // Only what the store knows survives a rebuild.
        assert_eq!(Some(5), index.role_for(100, "🇦"));
        assert_eq!(None, index.role_for(900, "1️⃣"));
    }
}
