//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use comicshelf_api_models::{CollectionEntry, Item, Page, User, total_pages};
use comicshelf_client::ToggleOutcome;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_item_list(
    page: &Page<Item>,
    current_page: u32,
    page_size: u32,
    share: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(page)?,
        OutputFormat::Table => {
            if page.results.is_empty() {
                println!("no items match these filters");
            } else {
                println!("{:>6} {:<10} {:>5} TITLE", "ID", "STATUS", "YEAR");
                for item in &page.results {
                    println!(
                        "{:>6} {:<10} {:>5} {}",
                        item.id,
                        item.status.label(),
                        item.first_published_year
                            .map_or_else(|| "-".to_string(), |year| year.to_string()),
                        item.display_title()
                    );
                }
            }
            println!(
                "page {current_page} of {} ({} items)",
                total_pages(page.count, page_size).max(1),
                page.count
            );
            if !share.is_empty() {
                println!("query: {share}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_item_detail(item: &Item, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(item)?,
        OutputFormat::Table => {
            for line in item_detail_lines(item) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn item_detail_lines(item: &Item) -> Vec<String> {
    let mut lines = vec![format!("id: {}", item.id)];
    if let Some(title) = item.title_tw.as_deref().filter(|title| !title.is_empty()) {
        lines.push(format!("title: {title}"));
    }
    lines.push(format!("japanese title: {}", item.title_jp));
    if !item.author.is_empty() {
        lines.push(format!("author: {}", item.author));
    }
    lines.push(format!("status: {}", item.status.label()));
    if !item.genres.is_empty() {
        lines.push(format!("genres: {}", item.genres.join(", ")));
    }
    if let Some(year) = item.first_published_year {
        lines.push(format!("first published: {year}"));
    }
    if let Some(latest) = item.latest_volume_jp_number {
        lines.push(format!("latest volume (JP): {latest}"));
    }
    if let Some(latest) = item.latest_volume_tw_number {
        lines.push(format!("latest volume (TW): {latest}"));
    }
    if !item.volumes.is_empty() {
        lines.push(format!("volumes: {}", item.volumes.len()));
    }
    lines
}

pub(crate) fn render_collection(entries: &[CollectionEntry], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("your collection is empty");
                return Ok(());
            }
            println!("{:>6} {:>6} {:<20} TITLE", "ENTRY", "ITEM", "ADDED");
            for entry in entries {
                println!(
                    "{:>6} {:>6} {:<20} {}",
                    entry.id,
                    entry.item.id,
                    entry.added_at.format("%Y-%m-%d %H:%M"),
                    entry.item.display_title()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_user(user: &User, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Table => {
            println!("id: {}", user.id);
            println!("username: {}", user.username);
            if !user.email.is_empty() {
                println!("email: {}", user.email);
            }
            if let Some(joined) = user.date_joined {
                println!("joined: {}", joined.format("%Y-%m-%d"));
            }
        }
    }
    Ok(())
}

pub(crate) const fn toggle_message(outcome: ToggleOutcome) -> &'static str {
    match outcome {
        ToggleOutcome::Added => "added to your collection",
        ToggleOutcome::Removed => "removed from your collection",
        ToggleOutcome::Busy => "another change for this item is still in flight",
        ToggleOutcome::LoginRequired => "not signed in; run `comicshelf login` first",
    }
}

#[cfg(test)]
mod tests {
    use comicshelf_api_models::{ItemId, SeriesStatus};

    use super::*;

    fn sample_item() -> Item {
        Item {
            id: ItemId(9),
            title_tw: Some("葬送的芙莉蓮".to_string()),
            title_jp: "葬送のフリーレン".to_string(),
            author: "山田鐘人".to_string(),
            status: SeriesStatus::Ongoing,
            genres: vec!["fantasy".to_string()],
            first_published_year: Some(2020),
            latest_volume_jp_number: Some(13),
            latest_volume_tw_number: None,
            volumes: Vec::new(),
            cover_image: None,
        }
    }

    #[test]
    fn detail_lines_skip_absent_fields() {
        let lines = item_detail_lines(&sample_item());
        assert_eq!(lines[0], "id: 9");
        assert!(lines.contains(&"title: 葬送的芙莉蓮".to_string()));
        assert!(lines.contains(&"status: Ongoing".to_string()));
        assert!(lines.contains(&"latest volume (JP): 13".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("latest volume (TW)")));
        assert!(!lines.iter().any(|line| line.starts_with("volumes")));
    }

    #[test]
    fn toggle_messages_cover_every_outcome() {
        assert_eq!(toggle_message(ToggleOutcome::Added), "added to your collection");
        assert!(toggle_message(ToggleOutcome::LoginRequired).contains("login"));
    }
}
