//! User commands: register, login, reset, users

use crate::commands::{expect_args, CommandFuture, State};
use crate::config::set_current_user;
use crate::storage::{lock_storage, StorageError, UserStore};
use crate::{GatorError, User};

pub fn handler_register<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 1, &format!("{} <name>", cmd_name))?;
        let name = args[0].as_str();

        let created = lock_storage(&state.storage)?.create_user(name);
        let user = created.map_err(|e| match e {
            StorageError::ConstraintViolation(_) => GatorError::UserExists(name.to_string()),
            other => other.into(),
        })?;

        set_current_user(&state.config_path, &mut state.config, &user.name)?;
        tracing::info!("Registered user {}", user.name);

        println!("User created successfully:");
        print_user(&user);
        Ok(())
    })
}

pub fn handler_login<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 1, &format!("{} <name>", cmd_name))?;
        let name = args[0].as_str();

        let existing = lock_storage(&state.storage)?.get_user_by_name(name)?;
        let user = existing.ok_or_else(|| GatorError::UserNotFound(name.to_string()))?;

        set_current_user(&state.config_path, &mut state.config, &user.name)?;
        println!("User {} has been set", user.name);
        Ok(())
    })
}

pub fn handler_reset<'a>(
    state: &'a mut State,
    _cmd_name: &'a str,
    _args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        let deleted = lock_storage(&state.storage)?.delete_all_users()?;
        tracing::info!("Reset removed {} user(s)", deleted);
        println!("Database reset successfully!");
        Ok(())
    })
}

pub fn handler_list_users<'a>(
    state: &'a mut State,
    _cmd_name: &'a str,
    _args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        let users = lock_storage(&state.storage)?.list_users()?;
        let current = state.config.current_user_name.as_deref();

        for user in &users {
            if Some(user.name.as_str()) == current {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    })
}

fn print_user(user: &User) {
    println!(" * ID:      {}", user.id);
    println!(" * Name:    {}", user.name);
    println!(" * Created: {}", user.created_at);
}
