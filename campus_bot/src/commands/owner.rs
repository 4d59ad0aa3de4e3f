use crate::{ReminderHandle, ShardManagerContainer};
use serenity::{
    client::Context,
    framework::standard::{macros::command, CommandResult},
    model::channel::Message,
};

#[command]
#[owners_only]
async fn quit(ctx: &Context, msg: &Message) -> CommandResult {
    let data = ctx.data.read().await;

    // Stop the reminder loop before the gateway handles go away.
    if let Some(reminder_lock) = data.get::<ReminderHandle>() {
        if let Some(handle) = reminder_lock.lock().await.take() {
            handle.abort();
        }
    }

    if let Some(manager) = data.get::<ShardManagerContainer>() {
        msg.reply(ctx, "Shutting down!").await?;
        manager.lock().await.shutdown_all().await;
    } else {
        msg.reply(ctx, "There was a problem getting the shard manager.")
            .await?;
    }

    Ok(())
}
