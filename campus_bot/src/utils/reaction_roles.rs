use crate::utils::{get_role_index, get_store};
use campus_shared::{guild::EmojiRoleMap, Module};
use serenity::{
    client::Context,
    framework::standard::CommandError,
    model::{
        channel::{ChannelType, Reaction, ReactionType},
        id::{ChannelId, GuildId, RoleId},
    },
    utils::Colour,
    Error as SerenityError,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const SELECTION_CHANNEL: &str = "module-selection";

/// The reaction alphabet. Symbol meaning is message-scoped: position
/// `index % 20` on every page, so pages past the first reuse the symbols.
pub const REACTION_EMOJIS: [&str; 20] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟", "🇦", "🇧", "🇨", "🇩", "🇪", "🇫",
    "🇬", "🇭", "🇮", "🇯",
];

#[derive(Debug, Clone)]
pub struct PageEntry {
    pub emoji: &'static str,
    pub code: String,
    pub name: String,
    pub role_id: u64,
}

/// Partitions the sorted module table into pages of at most 20 entries,
/// one reaction symbol per module.
pub fn build_pages(modules: &BTreeMap<String, Module>) -> Vec<Vec<PageEntry>> {
    let entries: Vec<PageEntry> = modules
        .iter()
        .enumerate()
        .map(|(i, (code, module))| PageEntry {
            emoji: REACTION_EMOJIS[i % REACTION_EMOJIS.len()],
            code: code.clone(),
            name: module.get_name().to_string(),
            role_id: module.get_role_id(),
        })
        .collect();

    entries
        .chunks(REACTION_EMOJIS.len())
        .map(|page| page.to_vec())
        .collect()
}

/// Publishes the guild's module table to the selection channel: purges the
/// prior content, posts one embed per page with one reaction per module,
/// persists the replacement mapping, then swaps the in-memory index.
pub async fn publish(context: &Context, guild: GuildId) -> Result<ChannelId, CommandError> {
    let store = get_store(context).await;
    let channel = find_or_create_selection_channel(context, guild).await?;
    purge_channel(context, channel).await?;

    let pages = build_pages(&store.modules());
    let mut mapping: HashMap<String, EmojiRoleMap> = HashMap::new();

    for (page_index, page) in pages.iter().enumerate() {
        let message = channel
            .send_message(&context.http, |m| {
                m.embed(|e| {
                    if page_index == 0 {
                        e.title("📚 Module Selection").description(
                            "Welcome! React to the modules below to join them and \
                             access their channels.\n\n\
                             **How it works:**\n\
                             ✅ React to join a module\n\
                             ❌ Remove your reaction to leave a module\n\n\
                             **Available Modules:**",
                        );
                    } else {
                        e.title(format!("📚 Module Selection (Part {})", page_index + 1))
                            .description("React to select your modules:");
                    }
                    for entry in page {
                        e.field(format!("{} {}", entry.emoji, entry.code), &entry.name, true);
                    }
                    e.colour(Colour::BLUE)
                        .footer(|f| f.text("React below to join modules • Remove reaction to leave"))
                })
            })
            .await?;

        for entry in page {
            message
                .react(&context.http, ReactionType::Unicode(entry.emoji.to_string()))
                .await?;
        }

        mapping.insert(
            message.id.0.to_string(),
            page.iter()
                .map(|entry| (entry.emoji.to_string(), entry.role_id))
                .collect(),
        );
    }

    // Persisted blob first, cache second.
    store.update_guild_config(guild.0, |c| {
        c.reaction_roles = mapping.clone();
        c.reaction_role_channel = Some(channel.0);
    })?;

    let index_lock = get_role_index(context).await;
    let mut index = index_lock.write().await;
    index.replace_guild(guild.0, &mapping);

    Ok(channel)
}

/// Removes the published selection messages and resets the mapping.
/// Returns false when the guild never had a selection channel configured.
pub async fn clear(context: &Context, guild: GuildId) -> Result<bool, CommandError> {
    let store = get_store(context).await;
    let channel = match store.guild_config(guild.0).reaction_role_channel {
        Some(id) => ChannelId(id),
        None => return Ok(false),
    };

    // The channel may have been deleted out-of-band; that is not an error.
    if let Err(why) = purge_channel(context, channel).await {
        debug!("Purge of selection channel {} skipped: {:?}.", channel, why);
    }

    store.update_guild_config(guild.0, |c| {
        c.reaction_roles.clear();
        c.reaction_role_channel = None;
    })?;

    let index_lock = get_role_index(context).await;
    let mut index = index_lock.write().await;
    index.clear_guild(guild.0);

    Ok(true)
}

pub async fn grant_from_reaction(
    context: &Context,
    reaction: &Reaction,
) -> Result<(), SerenityError> {
    apply_reaction(context, reaction, true).await
}

pub async fn revoke_from_reaction(
    context: &Context,
    reaction: &Reaction,
) -> Result<(), SerenityError> {
    apply_reaction(context, reaction, false).await
}

/// Headless handler for both reaction directions. Unknown messages and
/// unmapped symbols are strict no-ops; the caller logs and discards any
/// error since there is no channel to report back to.
async fn apply_reaction(
    context: &Context,
    reaction: &Reaction,
    joining: bool,
) -> Result<(), SerenityError> {
    let guild = match reaction.guild_id {
        Some(g) => g,
        None => return Ok(()),
    };
    let user_id = match reaction.user_id {
        Some(u) => u,
        None => return Ok(()),
    };
    if user_id == context.cache.current_user().await.id {
        return Ok(());
    }
    let emoji = match &reaction.emoji {
        ReactionType::Unicode(e) => e.clone(),
        _ => return Ok(()),
    };

    let role_id = {
        let index_lock = get_role_index(context).await;
        let index = index_lock.read().await;
        match index.role_for(reaction.message_id.0, &emoji) {
            Some(role_id) => role_id,
            None => return Ok(()),
        }
    };

    let mut member = guild.member(context, user_id).await?;
    if joining {
        member.add_role(&context.http, RoleId(role_id)).await?;
    } else {
        member.remove_role(&context.http, RoleId(role_id)).await?;
    }

    let store = get_store(context).await;
    let module = match store.module_by_role(role_id) {
        Some((code, _)) => code,
        None => return Ok(()),
    };
    if joining {
        store.add_user_module(user_id.0, &module);
    } else {
        store.remove_user_module(user_id.0, &module);
    }

    // Closed inboxes are not an error.
    let text = if joining {
        format!(
            "✅ You've joined **{}**! You can now access its channels.",
            module
        )
    } else {
        format!("❌ You've left **{}**.", module)
    };
    let user = user_id.to_user(context).await?;
    let _ = user.direct_message(context, |m| m.content(text)).await;

    Ok(())
}

/// Purges up to the most recent 100 messages, the bound the selection
/// channel can ever hold between publishes.
pub async fn purge_channel(context: &Context, channel: ChannelId) -> Result<(), SerenityError> {
    let messages = channel
        .messages(&context.http, |retriever| retriever.limit(100))
        .await?;

    match messages.len() {
        0 => Ok(()),
        1 => channel.delete_message(&context.http, messages[0].id).await,
        _ => {
            channel
                .delete_messages(&context.http, messages.iter().map(|m| m.id))
                .await
        }
    }
}

async fn find_or_create_selection_channel(
    context: &Context,
    guild: GuildId,
) -> Result<ChannelId, SerenityError> {
    let channels = guild.channels(&context.http).await?;
    if let Some(channel) = channels
        .values()
        .find(|c| c.kind == ChannelType::Text && c.name == SELECTION_CHANNEL)
    {
        return Ok(channel.id);
    }

    let created = guild
        .create_channel(&context.http, |c| {
            c.name(SELECTION_CHANNEL)
                .kind(ChannelType::Text)
                .topic("React to select your modules and gain access to module channels")
        })
        .await?;
    Ok(created.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(n: usize) -> BTreeMap<String, Module> {
        (0..n)
            .map(|i| {
                let code = format!("COS{:04}", i);
                (
                    code.clone(),
                    Module::new(code, 1000 + i as u64, 2000 + i as u64),
                )
            })
            .collect()
    }

    #[test]
    fn pagination_splits_into_pages_of_twenty() {
        for &(n, pages) in &[(1usize, 1usize), (20, 1), (21, 2), (45, 3)] {
            let built = build_pages(&modules(n));
            assert_eq!(pages, built.len(), "{} modules", n);
            let total: usize = built.iter().map(|p| p.len()).sum();
            assert_eq!(n, total);
            assert!(built.iter().all(|p| p.len() <= REACTION_EMOJIS.len()));
        }
    }

    #[test]
    fn symbols_cycle_positionally_across_pages() {
        let built = build_pages(&modules(45));
        for (page_index, page) in built.iter().enumerate() {
            for (i, entry) in page.iter().enumerate() {
                assert_eq!(REACTION_EMOJIS[i], entry.emoji);
                // Sorted module order is preserved across the page split.
                let position = page_index * REACTION_EMOJIS.len() + i;
                assert_eq!(format!("COS{:04}", position), entry.code);
            }
        }
    }

    #[test]
    fn single_module_lands_on_the_first_symbol() {
        let mut table = BTreeMap::new();
        table.insert(
            "COS1501".to_string(),
            Module::new("Theoretical CS".to_string(), 77, 88),
        );

        let built = build_pages(&table);
        assert_eq!(1, built.len());
        assert_eq!("1️⃣", built[0][0].emoji);
        assert_eq!(77, built[0][0].role_id);
    }

    #[test]
    fn no_modules_means_no_pages() {
        assert!(build_pages(&BTreeMap::new()).is_empty());
    }
}
