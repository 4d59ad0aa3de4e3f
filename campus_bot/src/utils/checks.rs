use crate::utils::get_store;
use serenity::{
    client::Context,
    framework::standard::{macros::check, Args, CommandOptions, Reason},
    model::channel::Message,
};

#[check]
#[name = "Admin"]
async fn admin_check(
    ctx: &Context,
    msg: &Message,
    _: &mut Args,
    _: &CommandOptions,
) -> Result<(), Reason> {
    let store = get_store(ctx).await;
    if store.is_admin(&msg.author.tag()) {
        Ok(())
    } else {
        Err(Reason::User(
            "❌ You must be a bot administrator to use this command.".to_string(),
        ))
    }
}
