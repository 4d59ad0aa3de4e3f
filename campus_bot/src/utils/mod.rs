pub mod checks;
pub mod messages;
pub mod reaction_roles;
pub mod reminders;
pub mod tickets;

use crate::models::index::ReactionRoleIndex;
use crate::{RoleIndexStorage, StoreContainer};
use campus_shared::DataStore;
use serenity::{client::Context, prelude::RwLock};
use std::sync::Arc;

pub async fn get_store(context: &Context) -> Arc<DataStore> {
    let data_read = context.data.read().await;
    data_read
        .get::<StoreContainer>()
        .expect("Expected DataStore in TypeMap.")
        .clone()
}

pub async fn get_role_index(context: &Context) -> Arc<RwLock<ReactionRoleIndex>> {
    let data_read = context.data.read().await;
    data_read
        .get::<RoleIndexStorage>()
        .expect("Expected RoleIndexStorage in TypeMap.")
        .clone()
}
