use crate::utils::{get_store, messages, tickets};
use serenity::{
    client::Context,
    framework::standard::{macros::command, CommandResult},
    model::{channel::Message, misc::Mentionable},
    utils::Colour,
};
use tracing::warn;

#[command]
#[owners_only]
#[only_in(guilds)]
async fn setuptickets(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };

    match tickets::provision(ctx, guild).await {
        Ok(channel) => {
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::DARK_GREEN,
                "✅ Ticket System Ready",
                &format!(
                    "Members can now open support tickets by reacting in <#{}>.",
                    channel
                ),
            )
            .await?;
            messages::log_action(
                ctx,
                guild,
                &format!("🎫 {} set up the ticket system", msg.author.mention()),
                Colour::DARK_GREEN,
            )
            .await;
        }
        Err(why) => {
            warn!("Ticket provisioning failed: {:?}.", why);
            messages::send_embed(
                ctx,
                msg.channel_id,
                Colour::RED,
                "❌ Setup Failed",
                "I don't have permission to create the roles/channels I need.",
            )
            .await?;
        }
    }
    Ok(())
}

#[command]
#[only_in(guilds)]
async fn closeticket(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };

    let store = get_store(ctx).await;
    let config = store.guild_config(guild.0);
    let is_ticket_channel = config
        .ticket_messages
        .contains_key(&msg.channel_id.0.to_string())
        || config.ticket_owner(msg.channel_id.0).is_some();
    if !is_ticket_channel {
        msg.channel_id
            .say(
                &ctx.http,
                "❌ This command can only be used in ticket channels.",
            )
            .await?;
        return Ok(());
    }

    tickets::close_ticket(ctx, &store, guild, msg.channel_id, msg.author.id).await?;
    Ok(())
}
