use comicshelf_api_models::ItemId;
use comicshelf_client::{FilterChange, FilterState, UrlContract};

use crate::cli::{ItemListArgs, ItemShowArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_item_detail, render_item_list};

/// Resolve the listing state: decode the shared query, then apply flags in
/// the order a user would edit them, page last so it survives.
pub(crate) fn resolve_filters(args: &ItemListArgs) -> FilterState {
    let mut state = FilterState::decode(args.query.as_deref().unwrap_or_default());
    if let Some(search) = &args.search {
        state = state.apply(FilterChange::Search(search.trim().to_string()));
    }
    if let Some(status) = args.status {
        state = state.apply(FilterChange::Status(Some(status)));
    }
    if let Some(genre) = &args.genre {
        state = state.apply(FilterChange::Genre(genre.trim().to_string()));
    }
    if let Some(year) = args.year {
        state = state.apply(FilterChange::Year(Some(year)));
    }
    if let Some(ordering) = args.ordering {
        state = state.apply(FilterChange::Sort(ordering));
    }
    if let Some(page) = args.page {
        state = state.apply(FilterChange::Page(page));
    }
    state
}

pub(crate) async fn handle_item_list(
    ctx: &AppContext,
    args: &ItemListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.page_size == 0 {
        return Err(CliError::validation("page size must be at least 1"));
    }
    let state = resolve_filters(args);
    let params = state.to_list_params(args.page_size);
    let page = ctx.api.list_items(&params).await?;
    render_item_list(
        &page,
        state.page,
        args.page_size,
        &state.encode(UrlContract::FULL),
        format,
    )
}

pub(crate) async fn handle_item_show(
    ctx: &AppContext,
    args: &ItemShowArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let item = ctx.api.get_item(ItemId(args.id)).await?;
    render_item_detail(&item, format)
}

#[cfg(test)]
mod tests {
    use comicshelf_api_models::SeriesStatus;
    use comicshelf_client::SortOrder;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::{anonymous_context, item_json, signed_in_context};

    fn list_args() -> ItemListArgs {
        ItemListArgs {
            query: None,
            search: None,
            status: None,
            genre: None,
            year: None,
            ordering: None,
            page: None,
            page_size: 20,
        }
    }

    #[test]
    fn flags_override_shared_query_and_reset_page() {
        let args = ItemListArgs {
            query: Some("?status_jp=hiatus&genre=sports&page=4".to_string()),
            status: Some(SeriesStatus::Completed),
            ..list_args()
        };
        let state = resolve_filters(&args);
        assert_eq!(state.status, Some(SeriesStatus::Completed));
        assert_eq!(state.genre, "sports");
        assert_eq!(state.page, 1);
    }

    #[test]
    fn explicit_page_survives_filter_flags() {
        let args = ItemListArgs {
            search: Some("  slam dunk ".to_string()),
            ordering: Some(SortOrder::TitleJp),
            page: Some(3),
            ..list_args()
        };
        let state = resolve_filters(&args);
        assert_eq!(state.search, "slam dunk");
        assert_eq!(state.page, 3);
        assert_eq!(
            state.encode(UrlContract::FULL),
            "search=slam+dunk&ordering=title_jp&page=3"
        );
    }

    #[tokio::test]
    async fn list_sends_filter_parameters() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/items/")
                .query_param("status_jp", "completed")
                .query_param("year", "2015")
                .query_param("page", "2")
                .query_param("page_size", "20");
            then.status(200).json_body(json!({
                "count": 21,
                "next": null,
                "previous": "http://example.test/api/items/?page=1",
                "results": [item_json(21)]
            }));
        });
        let (ctx, _) = anonymous_context(&server);
        let args = ItemListArgs {
            status: Some(SeriesStatus::Completed),
            year: Some(2015),
            page: Some(2),
            ..list_args()
        };

        handle_item_list(&ctx, &args, OutputFormat::Table)
            .await
            .expect("list succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn list_rejects_zero_page_size() {
        let server = MockServer::start_async().await;
        let (ctx, _) = anonymous_context(&server);
        let args = ItemListArgs {
            page_size: 0,
            ..list_args()
        };
        let err = handle_item_list(&ctx, &args, OutputFormat::Json)
            .await
            .expect_err("zero page size");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn show_carries_bearer_and_reports_missing_items() {
        let server = MockServer::start_async().await;
        let found = server.mock(|when, then| {
            when.method(GET)
                .path("/api/items/9/")
                .header("authorization", "Bearer access-1");
            then.status(200).json_body(item_json(9));
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/api/items/404/");
            then.status(404).json_body(json!({"detail": "Not found."}));
        });
        let (ctx, _) = signed_in_context(&server);

        handle_item_show(&ctx, &ItemShowArgs { id: 9 }, OutputFormat::Table)
            .await
            .expect("item exists");
        let err = handle_item_show(&ctx, &ItemShowArgs { id: 404 }, OutputFormat::Table)
            .await
            .expect_err("item missing");

        found.assert();
        missing.assert();
        assert_eq!(err.exit_code(), 2);
    }
}
