//! The `browse` command

use crate::commands::{CommandFuture, State};
use crate::storage::{lock_storage, Post, PostStore};
use crate::{GatorError, User};

/// Posts shown by `browse` when no limit is given
pub const DEFAULT_BROWSE_LIMIT: u32 = 2;

pub fn handler_browse<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
    user: User,
) -> CommandFuture<'a> {
    Box::pin(async move {
        let limit = parse_limit(cmd_name, args)?;
        let posts = lock_storage(&state.storage)?.posts_for_user(user.id, limit)?;

        if posts.is_empty() {
            println!("No posts found for {}.", user.name);
            return Ok(());
        }

        println!("Found {} posts for user {}:", posts.len(), user.name);
        for post in &posts {
            print_post(post);
        }
        Ok(())
    })
}

fn parse_limit(cmd_name: &str, args: &[String]) -> crate::Result<u32> {
    let usage = || GatorError::Usage(format!("{} [limit]", cmd_name));
    match args {
        [] => Ok(DEFAULT_BROWSE_LIMIT),
        [raw] => match raw.trim().parse::<u32>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(usage()),
        },
        _ => Err(usage()),
    }
}

fn print_post(post: &Post) {
    match post.published_at {
        Some(at) => println!("{} | {}", at.format("%a %b %d %Y"), post.title),
        None => println!("{}", post.title),
    }
    println!("    {}", post.url);
    if let Some(description) = post.description.as_deref().filter(|d| !d.is_empty()) {
        println!("    {}", description);
    }
    println!("=====================================");
}
