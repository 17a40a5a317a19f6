use std::rc::Rc;

use comicshelf_client::{CollectionCache, ToggleOutcome};

use crate::cli::{ItemRefArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_collection, toggle_message};

pub(crate) async fn handle_collection_list(
    ctx: &AppContext,
    format: OutputFormat,
) -> CliResult<()> {
    ctx.require_login()?;
    let entries = ctx.api.collections().await?;
    render_collection(&entries, format)
}

pub(crate) async fn handle_collection_add(
    ctx: &AppContext,
    args: &ItemRefArgs,
) -> CliResult<()> {
    ctx.require_login()?;
    let entry = ctx.api.add_to_collection(args.item_id()).await?;
    println!(
        "added {} to your collection (entry {})",
        entry.item.display_title(),
        entry.id
    );
    Ok(())
}

pub(crate) async fn handle_collection_remove(
    ctx: &AppContext,
    args: &ItemRefArgs,
) -> CliResult<()> {
    ctx.require_login()?;
    let cache = CollectionCache::new(Rc::clone(&ctx.api));
    cache.ensure_loaded().await?;
    let entry = cache.collection_id_for(args.item_id()).ok_or_else(|| {
        CliError::validation(format!("item {} is not in your collection", args.item))
    })?;
    ctx.api.remove_from_collection(entry).await?;
    println!("removed item {} from your collection", args.item);
    Ok(())
}

pub(crate) async fn handle_collection_toggle(
    ctx: &AppContext,
    args: &ItemRefArgs,
) -> CliResult<()> {
    let cache = CollectionCache::new(Rc::clone(&ctx.api));
    match cache.toggle(args.item_id()).await? {
        ToggleOutcome::LoginRequired => Err(CliError::validation(toggle_message(
            ToggleOutcome::LoginRequired,
        ))),
        outcome => {
            println!("item {}: {}", args.item, toggle_message(outcome));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::{
        anonymous_context, collection_json, item_json, signed_in_context,
    };

    #[tokio::test]
    async fn add_posts_item_id() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/collections/")
                .header("authorization", "Bearer access-1")
                .json_body(json!({"item_id": 7}));
            then.status(201).json_body(
                json!({"id": 70, "item": item_json(7), "added_at": "2025-03-01T10:00:00Z"}),
            );
        });
        let (ctx, _) = signed_in_context(&server);

        handle_collection_add(&ctx, &ItemRefArgs { item: 7 })
            .await
            .expect("added");
        mock.assert();
    }

    #[tokio::test]
    async fn duplicate_add_surfaces_server_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/collections/");
            then.status(400)
                .json_body(json!({"non_field_errors": ["This item is already in your collection."]}));
        });
        let (ctx, _) = signed_in_context(&server);

        let err = handle_collection_add(&ctx, &ItemRefArgs { item: 7 })
            .await
            .expect_err("duplicate");
        assert!(matches!(err, CliError::Validation(_)));
        assert!(err.display_message().contains("already in your collection"));
    }

    #[tokio::test]
    async fn remove_resolves_entry_id_from_listing() {
        let server = MockServer::start_async().await;
        let listing = server.mock(|when, then| {
            when.method(GET).path("/api/collections/");
            then.status(200).json_body(collection_json(&[(70, 7), (80, 8)]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/80/");
            then.status(204);
        });
        let (ctx, _) = signed_in_context(&server);

        handle_collection_remove(&ctx, &ItemRefArgs { item: 8 })
            .await
            .expect("removed");
        listing.assert();
        delete.assert();

        let err = handle_collection_remove(&ctx, &ItemRefArgs { item: 99 })
            .await
            .expect_err("not collected");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn toggle_requires_login() {
        let server = MockServer::start_async().await;
        let (ctx, _) = anonymous_context(&server);
        let err = handle_collection_toggle(&ctx, &ItemRefArgs { item: 7 })
            .await
            .expect_err("anonymous");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn toggle_adds_missing_item() {
        let server = MockServer::start_async().await;
        let listing = server.mock(|when, then| {
            when.method(GET).path("/api/collections/");
            then.status(200).json_body(collection_json(&[]));
        });
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/api/collections/")
                .json_body(json!({"item_id": 5}));
            then.status(201).json_body(
                json!({"id": 50, "item": item_json(5), "added_at": "2025-03-01T10:00:00Z"}),
            );
        });
        let (ctx, _) = signed_in_context(&server);

        handle_collection_toggle(&ctx, &ItemRefArgs { item: 5 })
            .await
            .expect("toggled");
        add.assert();
        // Initial load plus the refetch after the mutation.
        listing.assert_calls(2);
    }
}
