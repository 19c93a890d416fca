//! Command dispatch for the gator CLI
//!
//! This module contains:
//! - The shared [`State`] every command runs against
//! - A registry mapping command names to handlers of a uniform shape
//! - The logged-in gate that resolves the current user before a handler runs

mod feeds;
mod posts;
mod users;

pub use feeds::{
    handler_add_feed, handler_aggregate, handler_follow, handler_following, handler_list_feeds,
    handler_unfollow,
};
pub use posts::{handler_browse, DEFAULT_BROWSE_LIMIT};
pub use users::{handler_list_users, handler_login, handler_register, handler_reset};

use crate::config::Config;
use crate::storage::{lock_storage, SqliteStorage, UserStore};
use crate::{GatorError, Result, User};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Everything a command can touch
pub struct State {
    pub config: Config,
    /// Where `config` is persisted when the current user changes
    pub config_path: PathBuf,
    pub storage: Arc<Mutex<SqliteStorage>>,
}

impl State {
    pub fn new(config: Config, config_path: PathBuf, storage: SqliteStorage) -> Self {
        Self {
            config,
            config_path,
            storage: Arc::new(Mutex::new(storage)),
        }
    }
}

/// Future returned by every command handler
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

/// A handler that runs without a logged-in user
pub type CommandHandler = for<'a> fn(&'a mut State, &'a str, &'a [String]) -> CommandFuture<'a>;

/// A handler that receives the resolved current user
pub type UserCommandHandler =
    for<'a> fn(&'a mut State, &'a str, &'a [String], User) -> CommandFuture<'a>;

/// A registered command and whether it needs a logged-in user
#[derive(Clone, Copy)]
pub enum Handler {
    Public(CommandHandler),
    LoggedIn(UserCommandHandler),
}

/// Maps command names to handlers
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Runs the named command
    ///
    /// Gated commands fail with [`GatorError::NotLoggedIn`] when no user is
    /// configured and [`GatorError::UserNotFound`] when the configured user
    /// has no row.
    pub async fn run(&self, state: &mut State, name: &str, args: &[String]) -> Result<()> {
        let handler = *self
            .handlers
            .get(name)
            .ok_or_else(|| GatorError::UnknownCommand(name.to_string()))?;

        tracing::debug!("Running command {} with {} argument(s)", name, args.len());

        match handler {
            Handler::Public(handler) => handler(state, name, args).await,
            Handler::LoggedIn(handler) => {
                let user = current_user(state)?;
                handler(state, name, args, user).await
            }
        }
    }
}

/// Builds the registry with every gator command
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("login", Handler::Public(handler_login));
    registry.register("register", Handler::Public(handler_register));
    registry.register("reset", Handler::Public(handler_reset));
    registry.register("users", Handler::Public(handler_list_users));
    registry.register("agg", Handler::Public(handler_aggregate));
    registry.register("feeds", Handler::Public(handler_list_feeds));
    registry.register("addfeed", Handler::LoggedIn(handler_add_feed));
    registry.register("follow", Handler::LoggedIn(handler_follow));
    registry.register("following", Handler::LoggedIn(handler_following));
    registry.register("unfollow", Handler::LoggedIn(handler_unfollow));
    registry.register("browse", Handler::LoggedIn(handler_browse));

    registry
}

/// Resolves the logged-in user from the config
pub fn current_user(state: &State) -> Result<User> {
    let name = state
        .config
        .current_user_name
        .as_deref()
        .ok_or(GatorError::NotLoggedIn)?;

    let user = lock_storage(&state.storage)?.get_user_by_name(name)?;
    user.ok_or_else(|| GatorError::UserNotFound(name.to_string()))
}

/// Fails with a usage error unless exactly `expected` arguments were given
pub(crate) fn expect_args(args: &[String], expected: usize, usage: &str) -> Result<()> {
    if args.len() != expected {
        return Err(GatorError::Usage(usage.to_string()));
    }
    Ok(())
}
