mod commands;
mod models;
mod utils;

use crate::models::index::ReactionRoleIndex;
use crate::utils::{reaction_roles, reminders, tickets};
use campus_shared::DataStore;
use serenity::{
    async_trait,
    client::bridge::gateway::ShardManager,
    framework::{
        standard::{
            macros::{group, hook},
            CommandResult, DispatchError, Reason,
        },
        StandardFramework,
    },
    http::Http,
    model::{
        channel::{Message, Reaction},
        event::ResumedEvent,
        gateway::Ready,
    },
    prelude::*,
};
use std::{
    collections::HashSet,
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{admin::*, events::*, modules::*, owner::*, reaction_roles::*, tickets::*};

pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

pub struct StoreContainer;

impl TypeMapKey for StoreContainer {
    type Value = Arc<DataStore>;
}

pub struct RoleIndexStorage;

impl TypeMapKey for RoleIndexStorage {
    type Value = Arc<RwLock<ReactionRoleIndex>>;
}

pub struct ReminderHandle;

impl TypeMapKey for ReminderHandle {
    type Value = Arc<Mutex<Option<JoinHandle<()>>>>;
}

struct Handler {
    reminders_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn reaction_add(&self, context: Context, reaction: Reaction) {
        // Headless path: nothing to report back to, so failures are
        // logged and discarded.
        if let Err(why) = reaction_roles::grant_from_reaction(&context, &reaction).await {
            warn!("Reaction-role grant failed: {:?}.", why);
        }
        if let Err(why) = tickets::handle_reaction(&context, &reaction).await {
            warn!("Ticket reaction handling failed: {:?}.", why);
        }
    }

    async fn reaction_remove(&self, context: Context, reaction: Reaction) {
        if let Err(why) = reaction_roles::revoke_from_reaction(&context, &reaction).await {
            warn!("Reaction-role revoke failed: {:?}.", why);
        }
    }

    async fn ready(&self, context: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);

        {
            let store = utils::get_store(&context).await;
            let index_lock = utils::get_role_index(&context).await;
            let mut index = index_lock.write().await;
            index.rebuild(&store);
            info!("Reaction-role index rebuilt: {} message(s).", index.message_count());
        }

        // The reminder loop must not run before the gateway is ready, and a
        // resumed session must not spawn a second one.
        if !self.reminders_started.swap(true, Ordering::SeqCst) {
            let handle = tokio::spawn(reminders::run(context.clone()));
            let reminder_lock = {
                context
                    .data
                    .read()
                    .await
                    .get::<ReminderHandle>()
                    .expect("Expected ReminderHandle in TypeMap.")
                    .clone()
            };
            *reminder_lock.lock().await = Some(handle);
        }
    }

    async fn resume(&self, _: Context, _: ResumedEvent) {
        info!("Resumed");
    }
}

#[group]
#[commands(quit)]
struct General;

#[group]
#[commands(addadmin, removeadmin, listadmins)]
struct Staff;

#[group]
#[commands(createmod, deletemod, modules, joinmodule, leavemodule)]
struct Modules;

#[group]
#[commands(addevent, events, delevent, upcoming)]
struct Events;

#[group]
#[commands(setupreactionroles, syncreactionroles, clearreactionroles)]
struct ReactionRoles;

#[group]
#[commands(setuptickets, closeticket)]
struct Tickets;

#[hook]
async fn dispatch_error(ctx: &Context, msg: &Message, error: DispatchError) {
    match error {
        DispatchError::CheckFailed(_, Reason::User(reason)) => {
            let _ = msg.channel_id.say(&ctx.http, reason).await;
        }
        DispatchError::OnlyForOwners => {
            let _ = msg
                .channel_id
                .say(&ctx.http, "❌ Only the bot owner can use this command.")
                .await;
        }
        DispatchError::OnlyForGuilds => {
            let _ = msg
                .channel_id
                .say(&ctx.http, "❌ This command must be used in a server.")
                .await;
        }
        _ => {}
    }
}

#[hook]
async fn after(_: &Context, _: &Message, command_name: &str, result: CommandResult) {
    if let Err(why) = result {
        error!("Command '{}' returned an error: {:?}.", command_name, why);
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to start the logger.");

    let token = env::var("DISCORD_TOKEN").expect("Expected a token in the environment.");
    let owner_tag = env::var("OWNER_TAG").expect("Expected an owner tag in the environment.");
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());

    let store = DataStore::new(data_dir, owner_tag).expect("Failed to open the data store.");

    let http = Http::new_with_token(&token);

    // We will fetch your bot's owners and id
    let (owners, _bot_id) = match http.get_current_application_info().await {
        Ok(info) => {
            let mut owners = HashSet::new();
            owners.insert(info.owner.id);

            (owners, info.id)
        }
        Err(why) => panic!("Could not access application info: {:?}.", why),
    };

    // Create the framework
    let framework = StandardFramework::new()
        .configure(|c| c.owners(owners).prefix("!").case_insensitivity(true))
        .on_dispatch_error(dispatch_error)
        .after(after)
        .group(&GENERAL_GROUP)
        .group(&STAFF_GROUP)
        .group(&MODULES_GROUP)
        .group(&EVENTS_GROUP)
        .group(&REACTIONROLES_GROUP)
        .group(&TICKETS_GROUP);

    let mut client = Client::builder(&token)
        .framework(framework)
        .event_handler(Handler {
            reminders_started: AtomicBool::new(false),
        })
        .await
        .expect("Err creating client.");

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
        data.insert::<StoreContainer>(Arc::new(store));
        data.insert::<RoleIndexStorage>(Arc::new(RwLock::new(ReactionRoleIndex::new())));
        data.insert::<ReminderHandle>(Arc::new(Mutex::new(None)));
    }

    let shard_manager = client.shard_manager.clone();
    let data = client.data.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Could not register ctrl+c handler.");

        // Stop the recurring loop before the gateway handles are released.
        let reminder_lock = {
            data.read()
                .await
                .get::<ReminderHandle>()
                .expect("Expected ReminderHandle in TypeMap.")
                .clone()
        };
        if let Some(handle) = reminder_lock.lock().await.take() {
            handle.abort();
        }

        shard_manager.lock().await.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}.", why);
    }
}
