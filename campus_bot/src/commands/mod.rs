pub mod admin;
pub mod events;
pub mod modules;
pub mod owner;
pub mod reaction_roles;
pub mod tickets;
