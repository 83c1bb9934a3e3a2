//! Read-side and housekeeping commands: `list`, `remove`, `watch`, `note`,
//! `profile` and `curated`.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use teli_core::{
    CURATED_MIN_ITEMS, Candidate, CollectionStore, ItemId, ItemMetadata, ScoredItem,
    SqliteCollectionStore, TOP_GENRE_LIMIT, TasteProfile, confidence, curated_lists,
    project_scores, top_genres,
};

use crate::verdict::{item_label, metadata_label};
use crate::{
    ARG_CLEAR_TAGS, ARG_DB, ARG_GENRE, ARG_ID, ARG_JSON, ARG_NOTES, ARG_TAG, ARG_TITLE, ARG_YEAR,
    CliError, ENV_NOTE_ID, ENV_REMOVE_ID, database_path, open_store, write_json, write_line,
};

/// CLI arguments for the `list` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Show the collection, best first, with derived scores")]
#[ortho_config(prefix = "TELI")]
pub(crate) struct ListArgs {
    /// Print JSON instead of a table.
    #[arg(long = ARG_JSON)]
    #[serde(default)]
    pub(crate) json: bool,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_list(args: ListArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_path(merged.db))?;
    list_with(&store, merged.json, out)
}

pub(crate) fn list_with(
    store: &SqliteCollectionStore,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let scored = project_scores(store.load_all()?);
    if json {
        return write_json(out, &scored);
    }
    if scored.is_empty() {
        return write_line(out, "The collection is empty. Rank something with `teli add`.");
    }
    for (rank, entry) in scored.iter().enumerate() {
        write_line(out, &format_row(rank + 1, entry))?;
    }
    let comparisons = store.comparison_count()?;
    write_line(
        out,
        &format!(
            "{} item(s), {comparisons} comparison(s), confidence {}%",
            scored.len(),
            confidence(comparisons, scored.len())
        ),
    )
}

fn format_row(rank: usize, entry: &ScoredItem) -> String {
    format!(
        "{rank:>3}. {:>4.1}  {:<13} {}  [{}]",
        entry.score,
        entry.class.as_str(),
        item_label(&entry.item),
        entry.item.rating
    )
}

/// CLI arguments for the `remove` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Delete an item from the collection")]
#[ortho_config(prefix = "TELI")]
pub(crate) struct RemoveArgs {
    /// Identifier of the item to delete.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<ItemId>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_remove(args: RemoveArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let id = merged.id.ok_or(CliError::MissingArgument {
        field: ARG_ID,
        env: ENV_REMOVE_ID,
    })?;
    let mut store = open_store(&database_path(merged.db))?;
    remove_with(&mut store, id, out)
}

pub(crate) fn remove_with(
    store: &mut SqliteCollectionStore,
    id: ItemId,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let item = store
        .load_all()?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or(CliError::UnknownItem { id })?;
    store.remove(id)?;
    write_line(out, &format!("Removed {}", item_label(&item)))
}

/// CLI arguments for the `watch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Put an item on the watchlist, or show the watchlist when no \
                 identifier is given. Ranking an item takes it off the \
                 watchlist.",
    about = "Add to or show the watchlist"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct WatchArgs {
    /// Identifier of the item to watch later.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<ItemId>,
    /// Display title, kept for when the item is ranked.
    #[arg(long = ARG_TITLE, value_name = "title")]
    #[serde(default)]
    pub(crate) title: Option<String>,
    /// Release year.
    #[arg(long = ARG_YEAR, value_name = "year")]
    #[serde(default)]
    pub(crate) year: Option<u16>,
    /// Genre label; repeat or separate with commas for several.
    #[arg(long = ARG_GENRE, value_name = "genre", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) genres: Option<Vec<String>>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_watch(args: WatchArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let candidate = merged.id.map(|id| {
        Candidate::new(id).with_metadata(ItemMetadata {
            title: merged.title,
            year: merged.year,
            genres: merged.genres.unwrap_or_default(),
            ..ItemMetadata::default()
        })
    });
    let mut store = open_store(&database_path(merged.db))?;
    watch_with(&mut store, candidate, out)
}

pub(crate) fn watch_with(
    store: &mut SqliteCollectionStore,
    candidate: Option<Candidate>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let Some(candidate) = candidate else {
        let watchlist = store.watchlist()?;
        if watchlist.is_empty() {
            return write_line(out, "The watchlist is empty.");
        }
        for entry in watchlist {
            write_line(out, &metadata_label(entry.id, &entry.metadata))?;
        }
        return Ok(());
    };
    let id = candidate.id;
    if store.load_all()?.iter().any(|item| item.id == id) {
        log::warn!("item {id} is already ranked; adding it to the watchlist anyway");
    }
    let label = metadata_label(id, &candidate.metadata);
    if store.add_to_watchlist(&candidate)? {
        write_line(out, &format!("Added {label} to the watchlist"))
    } else {
        write_line(out, &format!("{label} is already on the watchlist"))
    }
}

/// CLI arguments for the `note` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Set the private notes and tags of a ranked item. Tags \
                 given here replace the existing ones. With no changes the \
                 current notes and tags are shown.",
    about = "Set or show an item's notes and tags"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct NoteArgs {
    /// Identifier of the ranked item.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<ItemId>,
    /// New notes; an empty value clears them.
    #[arg(long = ARG_NOTES, value_name = "text")]
    #[serde(default)]
    pub(crate) notes: Option<String>,
    /// Tag to set; repeat or separate with commas for several.
    #[arg(long = ARG_TAG, value_name = "tag", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
    /// Remove every tag.
    #[arg(long = ARG_CLEAR_TAGS, conflicts_with = "tags")]
    #[serde(default)]
    pub(crate) clear_tags: bool,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

/// Requested changes to an item's notes and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NoteEdit {
    pub(crate) notes: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) clear_tags: bool,
}

impl NoteEdit {
    const fn is_empty(&self) -> bool {
        self.notes.is_none() && self.tags.is_none() && !self.clear_tags
    }
}

pub(super) fn run_note(args: NoteArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let id = merged.id.ok_or(CliError::MissingArgument {
        field: ARG_ID,
        env: ENV_NOTE_ID,
    })?;
    let edit = NoteEdit {
        notes: merged.notes,
        tags: merged.tags,
        clear_tags: merged.clear_tags,
    };
    let mut store = open_store(&database_path(merged.db))?;
    note_with(&mut store, id, edit, out)
}

pub(crate) fn note_with(
    store: &mut SqliteCollectionStore,
    id: ItemId,
    edit: NoteEdit,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let item = store
        .load_all()?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or(CliError::UnknownItem { id })?;
    let label = item_label(&item);
    let metadata = if edit.is_empty() {
        item.metadata
    } else {
        let notes = match edit.notes {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => Some(text),
            None => item.metadata.notes,
        };
        let tags = if edit.clear_tags {
            Vec::new()
        } else {
            edit.tags.unwrap_or(item.metadata.tags)
        };
        let updated = store.update_notes(id, notes, tags)?;
        write_line(out, &format!("Updated notes for {label}"))?;
        updated
    };
    write_line(
        out,
        &format!("Notes: {}", metadata.notes.as_deref().unwrap_or("none")),
    )?;
    let tags = if metadata.tags.is_empty() {
        "none".to_owned()
    } else {
        metadata.tags.join(", ")
    };
    write_line(out, &format!("Tags: {tags}"))
}

/// CLI arguments for the `profile` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Summarise taste from the ranked collection")]
#[ortho_config(prefix = "TELI")]
pub(crate) struct ProfileArgs {
    /// Print JSON instead of a report.
    #[arg(long = ARG_JSON)]
    #[serde(default)]
    pub(crate) json: bool,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_profile(args: ProfileArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_path(merged.db))?;
    profile_with(&store, merged.json, out)
}

pub(crate) fn profile_with(
    store: &SqliteCollectionStore,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let Some(profile) = TasteProfile::from_store(store)? else {
        return write_line(out, "Rank a few items to build a taste profile.");
    };
    if json {
        return write_json(out, &profile);
    }
    write_line(
        out,
        &format!(
            "{} item(s) from {} comparison(s), average score {:.1}",
            profile.total_items, profile.total_comparisons, profile.average_score
        ),
    )?;
    if !profile.favourite_genres.is_empty() {
        write_line(
            out,
            &format!("Favourite genres: {}", profile.favourite_genres.join(", ")),
        )?;
    }
    write_line(out, "Genres:")?;
    for genre in &profile.genre_preferences {
        write_line(
            out,
            &format!(
                "  {:<16} {:>4.1}  ({})",
                genre.genre, genre.average_score, genre.count
            ),
        )?;
    }
    write_line(out, "Decades:")?;
    for decade in &profile.decade_preferences {
        write_line(
            out,
            &format!(
                "  {:<16} {:>4.1}  ({})",
                decade.label(),
                decade.average_score,
                decade.count
            ),
        )?;
    }
    let distribution = &profile.distribution;
    write_line(
        out,
        &format!(
            "Distribution: excellent {}, good {}, average {}, below average {}, poor {}",
            distribution.excellent,
            distribution.good,
            distribution.average,
            distribution.below_average,
            distribution.poor
        ),
    )?;
    write_line(out, "Top rated:")?;
    for entry in &profile.top_rated {
        write_line(out, &format_entry(entry))?;
    }
    write_line(out, "Recently added:")?;
    for entry in &profile.recently_added {
        write_line(out, &format_entry(entry))?;
    }
    let items = store.load_all()?;
    let common = top_genres(&items, TOP_GENRE_LIMIT);
    if !common.is_empty() {
        let summary: Vec<_> = common
            .iter()
            .map(|entry| format!("{} ({})", entry.genre, entry.count))
            .collect();
        write_line(out, &format!("Most ranked genres: {}", summary.join(", ")))?;
    }
    Ok(())
}

fn format_entry(entry: &ScoredItem) -> String {
    format!("  {:>4.1}  {}", entry.score, item_label(&entry.item))
}

/// CLI arguments for the `curated` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Show themed lists drawn from the collection: the overall \
                 best, the best per common genre and decade, recent \
                 additions and tagged items. Themes need at least three \
                 members.",
    about = "Show themed lists drawn from the collection"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct CuratedArgs {
    /// Print JSON instead of a report.
    #[arg(long = ARG_JSON)]
    #[serde(default)]
    pub(crate) json: bool,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

#[derive(Serialize)]
struct CuratedView<'a> {
    slug: String,
    title: String,
    items: &'a [ScoredItem],
}

pub(super) fn run_curated(args: CuratedArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_path(merged.db))?;
    curated_with(&store, merged.json, out)
}

pub(crate) fn curated_with(
    store: &SqliteCollectionStore,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let lists = curated_lists(store.load_all()?);
    if json {
        let views: Vec<_> = lists
            .iter()
            .map(|list| CuratedView {
                slug: list.theme.slug(),
                title: list.theme.title(),
                items: &list.items,
            })
            .collect();
        return write_json(out, &views);
    }
    if lists.is_empty() {
        return write_line(
            out,
            &format!("Rank at least {CURATED_MIN_ITEMS} items to see curated lists."),
        );
    }
    for (position, list) in lists.iter().enumerate() {
        if position > 0 {
            write_line(out, "")?;
        }
        write_line(out, &format!("{}:", list.theme.title()))?;
        for entry in &list.items {
            write_line(out, &format_entry(entry))?;
        }
    }
    Ok(())
}
