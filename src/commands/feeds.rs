//! Feed commands: agg, addfeed, feeds, follow, following, unfollow

use crate::aggregator::{parse_duration, HttpFetcher, Scheduler};
use crate::commands::{expect_args, CommandFuture, State};
use crate::storage::{lock_storage, Feed, FeedStore, FollowStore};
use crate::{GatorError, User};
use std::sync::Arc;

/// Runs the aggregation loop until Ctrl-C
pub fn handler_aggregate<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 1, &format!("{} <time_between_reqs>", cmd_name))?;
        let period = parse_duration(&args[0])?;

        let fetcher = HttpFetcher::from_config(&state.config.aggregator)?;
        let scheduler = Scheduler::new(state.storage.clone(), Arc::new(fetcher), period)?
            .with_fetch_timeout(state.config.aggregator.fetch_timeout());

        println!("Collecting feeds every {}...", args[0].trim());
        scheduler
            .run_with_abort(interrupt(), async {
                // Only polled after the first Ctrl-C has stopped the loop
                println!("Waiting for running fetches; press Ctrl-C again to abandon them");
                interrupt().await;
            })
            .await;
        Ok(())
    })
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C, stopping: {}", e);
    }
}

pub fn handler_add_feed<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
    user: User,
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 2, &format!("{} <feed_name> <url>", cmd_name))?;
        let (name, url) = (args[0].as_str(), args[1].as_str());

        let feed = {
            let mut store = lock_storage(&state.storage)?;
            let feed = store.create_feed(name, url, user.id)?;
            store.create_feed_follow(user.id, feed.id)?;
            feed
        };

        tracing::info!("User {} added feed {} ({})", user.name, feed.name, feed.url);
        println!("Feed created successfully:");
        print_feed(&feed, &user.name);
        Ok(())
    })
}

pub fn handler_list_feeds<'a>(
    state: &'a mut State,
    _cmd_name: &'a str,
    _args: &'a [String],
) -> CommandFuture<'a> {
    Box::pin(async move {
        let feeds = lock_storage(&state.storage)?.list_feeds_with_owners()?;

        if feeds.is_empty() {
            println!("No feeds found.");
            return Ok(());
        }

        println!("Found {} feeds:\n", feeds.len());
        for entry in &feeds {
            print_feed(&entry.feed, &entry.owner_name);
            println!("=====================================");
        }
        Ok(())
    })
}

pub fn handler_follow<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
    user: User,
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 1, &format!("{} <feed_url>", cmd_name))?;
        let url = args[0].as_str();

        let follow = {
            let mut store = lock_storage(&state.storage)?;
            let feed = store
                .get_feed_by_url(url)?
                .ok_or_else(|| GatorError::FeedNotFound(url.to_string()))?;
            store.create_feed_follow(user.id, feed.id)?
        };

        println!("Feed follow created:");
        println!("* User:          {}", follow.user_name);
        println!("* Feed:          {}", follow.feed_name);
        Ok(())
    })
}

pub fn handler_following<'a>(
    state: &'a mut State,
    _cmd_name: &'a str,
    _args: &'a [String],
    user: User,
) -> CommandFuture<'a> {
    Box::pin(async move {
        let follows = lock_storage(&state.storage)?.feed_follows_for_user(user.id)?;

        if follows.is_empty() {
            println!("No feed follows found for this user.");
            return Ok(());
        }

        println!("Feed follows for user {}:", user.name);
        for follow in &follows {
            println!("* {}", follow.feed_name);
        }
        Ok(())
    })
}

pub fn handler_unfollow<'a>(
    state: &'a mut State,
    cmd_name: &'a str,
    args: &'a [String],
    user: User,
) -> CommandFuture<'a> {
    Box::pin(async move {
        expect_args(args, 1, &format!("{} <feed_url>", cmd_name))?;
        let url = args[0].as_str();

        let feed = {
            let mut store = lock_storage(&state.storage)?;
            let feed = store
                .get_feed_by_url(url)?
                .ok_or_else(|| GatorError::FeedNotFound(url.to_string()))?;
            if !store.delete_feed_follow(user.id, feed.id)? {
                return Err(GatorError::NotFollowing(url.to_string()));
            }
            feed
        };

        println!("{} unfollowed successfully!", feed.name);
        Ok(())
    })
}

fn print_feed(feed: &Feed, owner_name: &str) {
    println!("* ID:            {}", feed.id);
    println!("* Created:       {}", feed.created_at);
    println!("* Updated:       {}", feed.updated_at);
    println!("* Name:          {}", feed.name);
    println!("* URL:           {}", feed.url);
    println!("* User:          {}", owner_name);
    match feed.last_fetched_at {
        Some(at) => println!("* Last fetched:  {}", at),
        None => println!("* Last fetched:  never"),
    }
}
