use crate::utils::{checks::*, get_store, messages, reaction_roles};
use serenity::{
    client::Context,
    framework::standard::{macros::command, CommandResult},
    model::{channel::Message, misc::Mentionable},
    utils::Colour,
};

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("setuprr")]
async fn setupreactionroles(ctx: &Context, msg: &Message) -> CommandResult {
    republish(ctx, msg).await
}

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("syncrr")]
async fn syncreactionroles(ctx: &Context, msg: &Message) -> CommandResult {
    msg.channel_id
        .say(&ctx.http, "🔄 Syncing reaction roles...")
        .await?;
    republish(ctx, msg).await
}

/// A full clear-and-recreate of the selection channel, never a merge.
async fn republish(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };

    let store = get_store(ctx).await;
    if store.modules().is_empty() {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ No Modules",
            "Create some modules first using `!createmod <code>`",
        )
        .await?;
        return Ok(());
    }

    let channel = reaction_roles::publish(ctx, guild).await?;

    messages::send_embed(
        ctx,
        msg.channel_id,
        Colour::DARK_GREEN,
        "✅ Reaction Roles Setup",
        &format!(
            "Module selection is ready in <#{}>!\n\nUsers can now react to join modules.",
            channel
        ),
    )
    .await?;
    messages::log_action(
        ctx,
        guild,
        &format!(
            "✅ {} set up reaction roles in <#{}>",
            msg.author.mention(),
            channel
        ),
        Colour::DARK_GREEN,
    )
    .await;
    Ok(())
}

#[command]
#[checks(Admin)]
#[only_in(guilds)]
#[aliases("clearrr")]
async fn clearreactionroles(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };

    if reaction_roles::clear(ctx, guild).await? {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::DARK_GREEN,
            "✅ Cleared",
            "All reaction role messages have been removed.",
        )
        .await?;
    } else {
        messages::send_embed(
            ctx,
            msg.channel_id,
            Colour::RED,
            "❌ Not Found",
            "No reaction role channel configured.",
        )
        .await?;
    }
    Ok(())
}
