use crate::utils::{get_store, messages};
use campus_shared::DataStore;
use serenity::{
    client::Context,
    model::{
        channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType, Reaction, ReactionType},
        id::{ChannelId, GuildId, RoleId, UserId},
        permissions::Permissions,
    },
    utils::Colour,
    Error as SerenityError,
};
use std::time::Duration;
use tracing::warn;

pub const TICKET_EMOJI: &str = "🎫";
pub const CLOSE_EMOJI: &str = "🔒";
pub const TICKET_CHANNEL: &str = "create-ticket";
pub const SUPPORT_CATEGORY: &str = "🎫 SUPPORT";
pub const STAFF_ROLES: [&str; 3] = ["Admin", "Moderator", "Helper"];

/// Grace delay between the closing notice and the channel deletion.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

pub fn ticket_channel_name(number: u64) -> String {
    format!("ticket-{:04}", number)
}

/// Routes ticket-related reactions: the 🎫 control message opens a ticket,
/// a 🔒 on a ticket's own control message closes it. Anything else is a
/// no-op.
pub async fn handle_reaction(context: &Context, reaction: &Reaction) -> Result<(), SerenityError> {
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
        ReactionType::Unicode(e) => e.as_str(),
        _ => return Ok(()),
    };

    let store = get_store(context).await;
    let config = store.guild_config(guild.0);

    if emoji == TICKET_EMOJI && config.ticket_message_id == Some(reaction.message_id.0) {
        // Keep the control message clean for the next requester.
        let _ = reaction.delete(context).await;
        return open_ticket(context, &store, guild, user_id).await;
    }

    if emoji == CLOSE_EMOJI {
        let recorded = config.ticket_messages.get(&reaction.channel_id.0.to_string());
        if recorded == Some(&reaction.message_id.0) {
            return close_ticket(context, &store, guild, reaction.channel_id, user_id).await;
        }
    }

    Ok(())
}

/// Opens a ticket for the requester unless they already have one. The
/// ticket number is persisted before the channel is created and is never
/// reclaimed, so a failed creation leaves a gap in the numbering.
pub async fn open_ticket(
    context: &Context,
    store: &DataStore,
    guild: GuildId,
    user_id: UserId,
) -> Result<(), SerenityError> {
    let config = store.guild_config(guild.0);

    if let Some(&channel_id) = config.open_tickets.get(&user_id.0.to_string()) {
        // The recorded channel may have been deleted out-of-band. Only a
        // channel that still exists blocks a new ticket; a stale entry is
        // dropped and the request falls through.
        let channels = guild.channels(&context.http).await?;
        if channels.contains_key(&ChannelId(channel_id)) {
            let user = user_id.to_user(context).await?;
            let _ = user
                .direct_message(context, |m| {
                    m.content(format!(
                        "❌ You already have an open ticket: <#{}>\n\
                         Please use that channel or close it first before creating a new one.",
                        channel_id
                    ))
                })
                .await;
            return Ok(());
        }
        if let Err(e) =
            store.update_guild_config(guild.0, |c| c.forget_ticket(user_id.0, channel_id))
        {
            warn!("Failed to drop stale ticket for guild {}: {}.", guild, e);
        }
    }

    let number = config.ticket_counter + 1;
    if let Err(e) = store.update_guild_config(guild.0, |c| c.ticket_counter = number) {
        warn!("Failed to persist ticket counter for guild {}: {}.", guild, e);
        return Ok(());
    }

    let staff = staff_role_ids(context, guild).await?;
    let mut permissions = vec![
        PermissionOverwrite {
            allow: Permissions::default(),
            deny: Permissions::READ_MESSAGES,
            kind: PermissionOverwriteType::Role(RoleId(guild.0)),
        },
        PermissionOverwrite {
            allow: Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES,
            deny: Permissions::default(),
            kind: PermissionOverwriteType::Member(user_id),
        },
    ];
    for role in &staff {
        permissions.push(PermissionOverwrite {
            allow: Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES,
            deny: Permissions::default(),
            kind: PermissionOverwriteType::Role(*role),
        });
    }

    let channel = guild
        .create_channel(&context.http, |c| {
            c.name(ticket_channel_name(number))
                .kind(ChannelType::Text)
                .topic("Support ticket")
                .permissions(permissions);
            if let Some(category) = config.ticket_category_id {
                c.category(category);
            }
            c
        })
        .await?;

    let message = channel
        .send_message(&context.http, |m| {
            m.content(format!("<@{}>", user_id)).embed(|e| {
                e.title(format!("{} Ticket #{:04}", TICKET_EMOJI, number))
                    .description(format!(
                        "Welcome <@{}>!\n\n\
                         A staff member will be with you shortly. Please describe \
                         your issue in detail.\n\n\
                         To close this ticket, react with {} or use `!closeticket`",
                        user_id, CLOSE_EMOJI
                    ))
                    .colour(Colour::DARK_GREEN)
            })
        })
        .await?;
    message
        .react(&context.http, ReactionType::Unicode(CLOSE_EMOJI.to_string()))
        .await?;

    if let Err(e) = store.update_guild_config(guild.0, |c| {
        c.open_tickets.insert(user_id.0.to_string(), channel.id.0);
        c.ticket_messages.insert(channel.id.0.to_string(), message.id.0);
    }) {
        warn!("Failed to persist open ticket for guild {}: {}.", guild, e);
    }

    let user = user_id.to_user(context).await?;
    let _ = user
        .direct_message(context, |m| {
            m.content(format!(
                "✅ Your support ticket has been created: <#{}>\n\
                 A staff member will assist you shortly.",
                channel.id
            ))
        })
        .await;

    messages::log_action(
        context,
        guild,
        &format!("{} <@{}> created ticket #{:04}", TICKET_EMOJI, user_id, number),
        Colour::BLUE,
    )
    .await;
    Ok(())
}

/// Posts the closing notice, forgets the requester's open ticket, and
/// deletes the channel after a short grace delay so the notice can be read.
pub async fn close_ticket(
    context: &Context,
    store: &DataStore,
    guild: GuildId,
    channel: ChannelId,
    closer: UserId,
) -> Result<(), SerenityError> {
    let owner = store.guild_config(guild.0).ticket_owner(channel.0);

    channel
        .send_message(&context.http, |m| {
            m.embed(|e| {
                e.title(format!("{} Ticket Closed", CLOSE_EMOJI))
                    .description(format!("This ticket has been closed by <@{}>", closer))
                    .colour(Colour::RED)
            })
        })
        .await?;

    if let Err(e) = store.update_guild_config(guild.0, |c| {
        if let Some(owner_id) = owner {
            c.open_tickets.remove(&owner_id.to_string());
        }
        c.ticket_messages.remove(&channel.0.to_string());
    }) {
        warn!("Failed to persist ticket closure for guild {}: {}.", guild, e);
    }

    let http = context.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(CLOSE_GRACE).await;
        let _ = channel.delete(&http).await;
    });

    if let Some(owner_id) = owner {
        if let Ok(user) = UserId(owner_id).to_user(context).await {
            let _ = user
                .direct_message(context, |m| {
                    m.content(format!(
                        "{} Your support ticket has been closed by <@{}>.\n\
                         If you need further assistance, feel free to create a new ticket.",
                        CLOSE_EMOJI, closer
                    ))
                })
                .await;
        }
    }

    messages::log_action(
        context,
        guild,
        &format!("{} <@{}> closed a ticket", CLOSE_EMOJI, closer),
        Colour::ORANGE,
    )
    .await;
    Ok(())
}

/// Provisions the ticket system: staff roles, the staff-only support
/// category, the public read-only create-ticket channel, and the control
/// message the 🎫 reactions land on.
pub async fn provision(context: &Context, guild: GuildId) -> Result<ChannelId, SerenityError> {
    let store = get_store(context).await;
    let staff = ensure_staff_roles(context, guild).await?;

    let mut category_permissions = vec![PermissionOverwrite {
        allow: Permissions::default(),
        deny: Permissions::READ_MESSAGES,
        kind: PermissionOverwriteType::Role(RoleId(guild.0)),
    }];
    for role in &staff {
        category_permissions.push(PermissionOverwrite {
            allow: Permissions::READ_MESSAGES,
            deny: Permissions::default(),
            kind: PermissionOverwriteType::Role(*role),
        });
    }
    let category = guild
        .create_channel(&context.http, |c| {
            c.name(SUPPORT_CATEGORY)
                .kind(ChannelType::Category)
                .permissions(category_permissions)
        })
        .await?;

    // The entry channel is visible to everyone but accepts no messages,
    // only the 🎫 reaction.
    let mut channel_permissions = vec![PermissionOverwrite {
        allow: Permissions::READ_MESSAGES,
        deny: Permissions::SEND_MESSAGES,
        kind: PermissionOverwriteType::Role(RoleId(guild.0)),
    }];
    for role in &staff {
        channel_permissions.push(PermissionOverwrite {
            allow: Permissions::READ_MESSAGES,
            deny: Permissions::default(),
            kind: PermissionOverwriteType::Role(*role),
        });
    }
    let channel = guild
        .create_channel(&context.http, |c| {
            c.name(TICKET_CHANNEL)
                .kind(ChannelType::Text)
                .topic("React to create a support ticket")
                .category(category.id)
                .permissions(channel_permissions)
        })
        .await?;

    let message = channel
        .send_message(&context.http, |m| {
            m.embed(|e| {
                e.title(format!("{} Support Tickets", TICKET_EMOJI))
                    .description(format!(
                        "Need help from the staff team? Create a support ticket!\n\n\
                         **When to create a ticket:**\n\
                         • Report rule violations or harassment\n\
                         • Request assistance with technical issues\n\
                         • Ask questions about the server\n\
                         • Request module creation\n\n\
                         React with {} below to create a ticket.",
                        TICKET_EMOJI
                    ))
                    .colour(Colour::DARK_GREEN)
                    .footer(|f| f.text("A private channel will be created for you and the staff team"))
            })
        })
        .await?;
    message
        .react(&context.http, ReactionType::Unicode(TICKET_EMOJI.to_string()))
        .await?;

    if let Err(e) = store.update_guild_config(guild.0, |c| {
        c.ticket_message_id = Some(message.id.0);
        c.ticket_channel_id = Some(channel.id.0);
        c.ticket_category_id = Some(category.id.0);
    }) {
        warn!("Failed to persist ticket setup for guild {}: {}.", guild, e);
    }

    Ok(channel.id)
}

async fn staff_role_ids(context: &Context, guild: GuildId) -> Result<Vec<RoleId>, SerenityError> {
    let roles = guild.roles(&context.http).await?;
    Ok(roles
        .values()
        .filter(|r| STAFF_ROLES.contains(&r.name.as_str()))
        .map(|r| r.id)
        .collect())
}

/// Creates the staff roles that do not exist yet and returns all of them.
async fn ensure_staff_roles(context: &Context, guild: GuildId) -> Result<Vec<RoleId>, SerenityError> {
    let existing = guild.roles(&context.http).await?;
    let specs = vec![
        ("Admin", 0xe74c3c, Permissions::ADMINISTRATOR),
        (
            "Moderator",
            0xe67e22,
            Permissions::KICK_MEMBERS
                | Permissions::BAN_MEMBERS
                | Permissions::MANAGE_MESSAGES
                | Permissions::MANAGE_CHANNELS
                | Permissions::MANAGE_ROLES
                | Permissions::READ_MESSAGES
                | Permissions::SEND_MESSAGES,
        ),
        (
            "Helper",
            0x2ecc71,
            Permissions::MANAGE_MESSAGES | Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES,
        ),
    ];

    let mut ids = Vec::new();
    for (name, colour, permissions) in specs {
        if let Some(role) = existing.values().find(|r| r.name == name) {
            ids.push(role.id);
            continue;
        }
        let role = guild
            .create_role(&context.http, |r| {
                r.name(name)
                    .colour(colour)
                    .hoist(true)
                    .mentionable(true)
                    .permissions(permissions)
            })
            .await?;
        ids.push(role.id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_channel_names_are_zero_padded() {
        assert_eq!("ticket-0001", ticket_channel_name(1));
        assert_eq!("ticket-0042", ticket_channel_name(42));
        assert_eq!("ticket-12345", ticket_channel_name(12345));
    }
}
