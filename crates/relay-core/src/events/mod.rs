//! Inbound update model

mod update;

pub use update::{
    Chat, ChatKind, Command, IncomingMessage, ReactionKind, ReactionUpdate, Update, UserProfile,
};
