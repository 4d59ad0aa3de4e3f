use crate::utils::{checks::*, get_store, messages};
use campus_shared::Module;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::{
        channel::{ChannelType, Message, PermissionOverwrite, PermissionOverwriteType},
        id::{ChannelId, GuildId, RoleId},
        misc::Mentionable,
        permissions::Permissions,
    },
    utils::Colour,
    Error as SerenityError,
};
use tracing::warn;

const TEXT_CHANNELS: [(&str, &str); 4] = [
    ("general", "General discussion"),
    ("resources", "Study materials and resources"),
    ("schedule", "Assignment and exam schedules"),
    ("questions", "Ask questions and get help"),
];

const ROLE_COLOURS: [u64; 6] = [0x3498db, 0xe74c3c, 0x2ecc71, 0xe67e22, 0x9b59b6, 0x1abc9c];

fn module_colour(code: &str) -> u64 {
    let sum: u64 = code.bytes().map(u64::from).sum();
    ROLE_COLOURS[(sum % ROLE_COLOURS.len() as u64) as usize]
}

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("addmodule")]
async fn createmod(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };
    let code = match args.single::<String>() {
        Ok(code) => code.to_uppercase(),
        Err(_) => {
            msg.channel_id
                .say(&ctx.http, "Usage: `!createmod <code> [name]`")
                .await?;
            return Ok(());
        }
    };
    let name = {
        let rest = args.rest().trim();
        if rest.is_empty() {
            code.clone()
        } else {
            rest.to_string()
        }
    };

    let store = get_store(ctx).await;
    if store.module_exists(&code) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Module Exists",
            &format!("Module **{}** already exists.", code),
        )
        .await?;
        return Ok(());
    }

    msg.channel_id
        .say(&ctx.http, format!("🔄 Creating module **{}**...", code))
        .await?;

    match create_module_structure(ctx, guild, &code).await {
        Ok((role, category)) => {
            store.add_module(&code, Module::new(name, role.0, category.0));
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::DARK_GREEN,
                "✅ Module Created",
                &format!(
                    "Module **{}** has been created successfully!\n\n\
                     **Role:** <@&{}>\n**Channels:** {} text, 3 voice",
                    code,
                    role,
                    TEXT_CHANNELS.len()
                ),
            )
            .await?;
            messages::log_action(
                ctx,
                guild,
                &format!("📦 {} created module **{}**", msg.author.mention(), code),
                Colour::DARK_GREEN,
            )
            .await;
        }
        Err(why) => {
            warn!("Module creation for {} failed: {:?}.", code, why);
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Creation Failed",
                "I don't have permission to create roles/channels.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Role first, then the private category and its channels. Only the role
/// can see the category.
async fn create_module_structure(
    ctx: &Context,
    guild: GuildId,
    code: &str,
) -> Result<(RoleId, ChannelId), SerenityError> {
    let role = guild
        .create_role(&ctx.http, |r| {
            r.name(code).colour(module_colour(code)).mentionable(true)
        })
        .await?;

    let permissions = vec![
        PermissionOverwrite {
            allow: Permissions::READ_MESSAGES
                | Permissions::SEND_MESSAGES
                | Permissions::READ_MESSAGE_HISTORY,
            deny: Permissions::default(),
            kind: PermissionOverwriteType::Role(role.id),
        },
        PermissionOverwrite {
            allow: Permissions::default(),
            deny: Permissions::READ_MESSAGES,
            kind: PermissionOverwriteType::Role(RoleId(guild.0)),
        },
    ];
    let category = guild
        .create_channel(&ctx.http, |c| {
            c.name(code)
                .kind(ChannelType::Category)
                .permissions(permissions)
        })
        .await?;

    for (channel_name, topic) in &TEXT_CHANNELS {
        guild
            .create_channel(&ctx.http, |c| {
                c.name(*channel_name)
                    .kind(ChannelType::Text)
                    .topic(*topic)
                    .category(category.id)
            })
            .await?;
    }
    for i in 1..=3 {
        guild
            .create_channel(&ctx.http, |c| {
                c.name(format!("study-room{}", i))
                    .kind(ChannelType::Voice)
                    .category(category.id)
            })
            .await?;
    }

    Ok((role.id, category.id))
}

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("removemodule")]
async fn deletemod(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };
    let code = match args.single::<String>() {
        Ok(code) => code.to_uppercase(),
        Err(_) => {
            msg.channel_id
                .say(&ctx.http, "Usage: `!deletemod <code> confirm`")
                .await?;
            return Ok(());
        }
    };

    let store = get_store(ctx).await;
    let module = match store.module(&code) {
        Some(module) => module,
        None => {
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Not Found",
                &format!("Module **{}** does not exist.", code),
            )
            .await?;
            return Ok(());
        }
    };

    if args.single::<String>().ok().as_deref() != Some("confirm") {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Confirmation Required",
            &format!(
                "This will delete **{}** and all its channels.\n\nType: `!deletemod {} confirm`",
                code, code
            ),
        )
        .await?;
        return Ok(());
    }

    msg.channel_id
        .say(&ctx.http, format!("🔄 Deleting module **{}**...", code))
        .await?;

    // Stale platform references are fine: whatever is already gone is
    // simply skipped.
    let category = ChannelId(module.get_category_id());
    if let Ok(channels) = guild.channels(&ctx.http).await {
        for channel in channels.values().filter(|c| c.category_id == Some(category)) {
            let _ = channel.id.delete(&ctx.http).await;
        }
    }
    let _ = category.delete(&ctx.http).await;
    let _ = ctx.http.delete_role(guild.0, module.get_role_id()).await;

    store.remove_module(&code);

    messages::send_embed(
        ctx,
        msg.channel_id,
        Colour::DARK_GREEN,
        "✅ Module Deleted",
        &format!("Module **{}** has been deleted.", code),
    )
    .await?;
    messages::log_action(
        ctx,
        guild,
        &format!("🗑️ {} deleted module **{}**", msg.author.mention(), code),
        Colour::RED,
    )
    .await;
    Ok(())
}

#[command]
#[only_in(guilds)]
async fn modules(ctx: &Context, msg: &Message) -> CommandResult {
    let store = get_store(ctx).await;
    let modules = store.modules();

    if modules.is_empty() {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::BLUE,
            "📚 Modules",
            "No modules have been created yet.",
        )
        .await?;
        return Ok(());
    }

    let total = modules.len();
    msg.channel_id
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title("📚 Available Modules").colour(Colour::BLUE);
                for (code, module) in &modules {
                    let created = module.get_created().get(..10).unwrap_or("unknown");
                    e.field(
                        format!("📖 {}", code),
                        format!(
                            "**Name:** {}\n**Role:** <@&{}>\n**Created:** {}",
                            module.get_name(),
                            module.get_role_id(),
                            created
                        ),
                        true,
                    );
                }
                e.footer(|f| f.text(format!("Total: {} modules", total)))
            })
        })
        .await?;
    Ok(())
}

#[command]
#[only_in(guilds)]
async fn joinmodule(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    membership(ctx, msg, &mut args, true).await
}

#[command]
#[only_in(guilds)]
async fn leavemodule(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    membership(ctx, msg, &mut args, false).await
}

async fn membership(ctx: &Context, msg: &Message, args: &mut Args, joining: bool) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };
    let code = match args.single::<String>() {
        Ok(code) => code.to_uppercase(),
        Err(_) => {
            let verb = if joining { "join" } else { "leave" };
            msg.channel_id
                .say(&ctx.http, format!("Usage: `!{}module <code>`", verb))
                .await?;
            return Ok(());
        }
    };

    let store = get_store(ctx).await;
    let module = match store.module(&code) {
        Some(module) => module,
        None => {
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Not Found",
                &format!("Module **{}** does not exist.", code),
            )
            .await?;
            return Ok(());
        }
    };
    let role = RoleId(module.get_role_id());

    let mut member = guild.member(ctx, msg.author.id).await?;
    let has_role = member.roles.contains(&role);

    if joining && has_role {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Already Joined",
            &format!("You are already in **{}**.", code),
        )
        .await?;
        return Ok(());
    }
    if !joining && !has_role {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Not Joined",
            &format!("You are not in **{}**.", code),
        )
        .await?;
        return Ok(());
    }

    let result = if joining {
        member.add_role(&ctx.http, role).await
    } else {
        member.remove_role(&ctx.http, role).await
    };
    if let Err(why) = result {
        warn!("Role mutation for {} failed: {:?}.", code, why);
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ Permission Error",
            "I don't have permission to manage roles.",
        )
        .await?;
        return Ok(());
    }

    if joining {
        store.add_user_module(msg.author.id.0, &code);
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Module Joined",
            &format!(
                "You have joined **{}**! You can now access the module channels.",
                code
            ),
        )
        .await?;
    } else {
        store.remove_user_module(msg.author.id.0, &code);
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Module Left",
            &format!("You have left **{}**.", code),
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_colours_are_stable() {
        assert_eq!(module_colour("COS1501"), module_colour("COS1501"));
        assert!(ROLE_COLOURS.contains(&module_colour("MAT1512")));
    }
}
