use crate::utils::get_store;
use serenity::{
    client::Context,
    model::{
        channel::{ChannelType, Message},
        id::{ChannelId, GuildId},
    },
    utils::Colour,
    Error as SerenityError,
};
use tracing::warn;

pub const LOG_CHANNEL: &str = "server-logs";

pub async fn send_embed(
    context: &Context,
    channel: ChannelId,
    colour: Colour,
    title: &str,
    description: &str,
) -> Result<Message, SerenityError> {
    channel
        .send_message(&context.http, |m| {
            m.embed(|e| e.title(title).description(description).colour(colour))
        })
        .await
}

/// Best-effort action log. Logging must never fail the operation that
/// triggered it, so errors end up in the trace output only.
pub async fn log_action(context: &Context, guild: GuildId, text: &str, colour: Colour) {
    if let Err(why) = try_log(context, guild, text, colour).await {
        warn!("Failed to log action in guild {}: {:?}.", guild, why);
    }
}

async fn try_log(
    context: &Context,
    guild: GuildId,
    text: &str,
    colour: Colour,
) -> Result<(), SerenityError> {
    let store = get_store(context).await;
    let channel = match store.guild_config(guild.0).log_channel_id {
        Some(id) => ChannelId(id),
        None => {
            let id = find_or_create_log_channel(context, guild).await?;
            if let Err(e) = store.update_guild_config(guild.0, |c| c.log_channel_id = Some(id.0)) {
                warn!("Failed to persist log channel for guild {}: {}.", guild, e);
            }
            id
        }
    };

    channel
        .send_message(&context.http, |m| {
            m.embed(|e| {
                e.description(text)
                    .colour(colour)
                    .timestamp(chrono::Utc::now().to_rfc3339())
            })
        })
        .await?;
    Ok(())
}

async fn find_or_create_log_channel(
    context: &Context,
    guild: GuildId,
) -> Result<ChannelId, SerenityError> {
    let channels = guild.channels(&context.http).await?;
    if let Some(channel) = channels
        .values()
        .find(|c| c.kind == ChannelType::Text && c.name == LOG_CHANNEL)
    {
        return Ok(channel.id);
    }

    let created = guild
        .create_channel(&context.http, |c| {
            c.name(LOG_CHANNEL)
                .kind(ChannelType::Text)
                .topic("Server event logs")
        })
        .await?;
    Ok(created.id)
}
