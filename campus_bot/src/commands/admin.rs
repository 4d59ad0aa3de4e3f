use crate::utils::{checks::*, get_store, messages};
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::{channel::Message, misc::Mentionable},
    utils::Colour,
};

#[command]
#[owners_only]
#[only_in(guilds)]
async fn addadmin(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let tag = args.message().trim().to_string();
    if tag.is_empty() {
        msg.channel_id
            .say(&ctx.http, "Usage: `!addadmin username#1234`")
            .await?;
        return Ok(());
    }

    let store = get_store(ctx).await;
    if store.add_admin(&tag) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Admin Added",
            &format!("**{}** is now a bot administrator.", tag),
        )
        .await?;
        if let Some(guild) = msg.guild_id {
            messages::log_action(
                ctx,
                guild,
                &format!("✅ {} added **{}** as admin", msg.author.mention(), tag),
                Colour::DARK_GREEN,
            )
            .await;
        }
    } else {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Already Admin",
            &format!("**{}** is already an administrator.", tag),
        )
        .await?;
    }
    Ok(())
}

#[command]
#[owners_only]
#[only_in(guilds)]
async fn removeadmin(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let tag = args.message().trim().to_string();
    if tag.is_empty() {
        msg.channel_id
            .say(&ctx.http, "Usage: `!removeadmin username#1234`")
            .await?;
        return Ok(());
    }

    let store = get_store(ctx).await;
    if tag == store.owner() {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ Cannot Remove Owner",
            "The bot owner cannot be removed from admins.",
        )
        .await?;
        return Ok(());
    }

    if store.remove_admin(&tag) {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Admin Removed",
            &format!("**{}** is no longer a bot administrator.", tag),
        )
        .await?;
        if let Some(guild) = msg.guild_id {
            messages::log_action(
                ctx,
                guild,
                &format!("❌ {} removed **{}** as admin", msg.author.mention(), tag),
                Colour::ORANGE,
            )
            .await;
        }
    } else {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::ORANGE,
            "⚠️ Not Found",
            &format!("**{}** is not an administrator.", tag),
        )
        .await?;
    }
    Ok(())
}

#[command]
#[checks(Admin)]
#[aliases("admins")]
async fn listadmins(ctx: &Context, msg: &Message) -> CommandResult {
    let store = get_store(ctx).await;
    let admins = store.admins();
    let list = admins
        .iter()
        .map(|a| format!("• {}", a))
        .collect::<Vec<_>>()
        .join("\n");

    messages::send_embed(
        ctx,
        msg.channel_id,
        Colour::BLUE,
        "🛡️ Bot Administrators",
        &list,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::id::UserId;

    #[test]
    fn log_lines_mention_the_actor() {
        let line = format!("✅ {} added **{}** as admin", UserId(7).mention(), "helper#1234");
        assert_eq!("✅ <@7> added **helper#1234** as admin", line);
    }
}
