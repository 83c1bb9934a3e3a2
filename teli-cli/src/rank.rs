//! `add` and `recompare` commands: interactive ranking sessions.

use std::io::{BufRead, Write};

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use teli_core::{
    Candidate, CollectionStore, CommitReport, ComparisonOutcome, DEFAULT_MAX_COMPARISONS, ItemId,
    ItemMetadata, Preference, RankingSession, SessionConfig, SessionState, SqliteCollectionStore,
    project_scores,
};

use crate::verdict::{
    Matchup, PromptVerdicts, ScriptedVerdicts, VerdictSource, item_label, metadata_label,
    parse_verdict_list,
};
use crate::{
    ARG_DB, ARG_GENRE, ARG_ID, ARG_MAX_COMPARISONS, ARG_PREFERENCE, ARG_TITLE, ARG_VERDICTS,
    ARG_YEAR, CliError, ENV_ADD_ID, ENV_RECOMPARE_ID, database_path, open_store, write_line,
};

/// CLI arguments for the `add` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank a new item. A first impression seeds its rating, then \
                 a handful of items from the collection are offered for \
                 comparison. Answer 1 when the new item is better, = when \
                 they are equal and 2 when the existing item is better.",
    about = "Rank a new item against the collection"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct AddArgs {
    /// Identifier of the item to rank.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<ItemId>,
    /// Display title.
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
    /// First impression: liked, fine or disliked.
    #[arg(long = ARG_PREFERENCE, value_name = "preference")]
    #[serde(default)]
    pub(crate) preference: Option<String>,
    /// Answers to every comparison up front, e.g. "1,=,2".
    #[arg(long = ARG_VERDICTS, value_name = "verdicts")]
    #[serde(default)]
    pub(crate) verdicts: Option<String>,
    /// Upper bound on comparisons per session.
    #[arg(long = ARG_MAX_COMPARISONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_comparisons: Option<usize>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

impl AddArgs {
    fn into_config(self) -> Result<AddConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AddConfig::try_from(merged)
    }
}

/// Resolved `add` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddConfig {
    pub(crate) candidate: Candidate,
    pub(crate) preference: Preference,
    pub(crate) verdicts: Option<Vec<ComparisonOutcome>>,
    pub(crate) session: SessionConfig,
    pub(crate) db: Utf8PathBuf,
}

impl TryFrom<AddArgs> for AddConfig {
    type Error = CliError;

    fn try_from(args: AddArgs) -> Result<Self, Self::Error> {
        let id = args.id.ok_or(CliError::MissingArgument {
            field: ARG_ID,
            env: ENV_ADD_ID,
        })?;
        let metadata = ItemMetadata {
            title: args.title,
            year: args.year,
            genres: args.genres.unwrap_or_default(),
            ..ItemMetadata::default()
        };
        Ok(Self {
            candidate: Candidate::new(id).with_metadata(metadata),
            preference: args
                .preference
                .as_deref()
                .map_or_else(Preference::default, parse_preference),
            verdicts: args.verdicts.as_deref().map(parse_verdict_list).transpose()?,
            session: session_config(args.max_comparisons),
            db: database_path(args.db),
        })
    }
}

/// CLI arguments for the `recompare` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Take an item out of the collection and rank it again, \
                 keeping its metadata and first impression.",
    about = "Rank an existing item again"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct RecompareArgs {
    /// Identifier of the item to re-rank.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<ItemId>,
    /// Answers to every comparison up front, e.g. "1,=,2".
    #[arg(long = ARG_VERDICTS, value_name = "verdicts")]
    #[serde(default)]
    pub(crate) verdicts: Option<String>,
    /// Upper bound on comparisons per session.
    #[arg(long = ARG_MAX_COMPARISONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_comparisons: Option<usize>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

impl RecompareArgs {
    fn into_config(self) -> Result<RecompareConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecompareConfig::try_from(merged)
    }
}

/// Resolved `recompare` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecompareConfig {
    pub(crate) id: ItemId,
    pub(crate) verdicts: Option<Vec<ComparisonOutcome>>,
    pub(crate) session: SessionConfig,
    pub(crate) db: Utf8PathBuf,
}

impl TryFrom<RecompareArgs> for RecompareConfig {
    type Error = CliError;

    fn try_from(args: RecompareArgs) -> Result<Self, Self::Error> {
        let id = args.id.ok_or(CliError::MissingArgument {
            field: ARG_ID,
            env: ENV_RECOMPARE_ID,
        })?;
        Ok(Self {
            id,
            verdicts: args.verdicts.as_deref().map(parse_verdict_list).transpose()?,
            session: session_config(args.max_comparisons),
            db: database_path(args.db),
        })
    }
}

fn session_config(max_comparisons: Option<usize>) -> SessionConfig {
    SessionConfig {
        max_comparisons: max_comparisons.unwrap_or(DEFAULT_MAX_COMPARISONS),
        ..SessionConfig::default()
    }
}

fn parse_preference(raw: &str) -> Preference {
    raw.parse().unwrap_or_else(|err| {
        log::warn!("{err}; ranking as {}", Preference::Fine);
        Preference::Fine
    })
}

pub(super) fn run_add(
    args: AddArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mut store = open_store(&config.db)?;
    add_with(config, &mut store, input, out)
}

/// Rank a new item in `store`, reading verdicts from `input` unless they
/// were supplied up front.
///
/// Metadata not given on the command line is taken from the item's
/// watchlist entry, if it has one.
pub(crate) fn add_with(
    config: AddConfig,
    store: &mut SqliteCollectionStore,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut candidate = config.candidate;
    if let Some(watched) = store.watchlist_entry(candidate.id)? {
        candidate.metadata = candidate.metadata.or_from(watched.metadata);
    }
    let label = metadata_label(candidate.id, &candidate.metadata);
    let mut session =
        RankingSession::begin(&*store, &config.session, candidate, config.preference)?;
    log::debug!(
        "ranking {label} from {} with {} comparison(s)",
        session.seed_rating(),
        session.remaining()
    );
    let report = drive(&mut session, store, &label, config.verdicts, input, out)?;
    report_commit(&report, store, out)
}

pub(super) fn run_recompare(
    args: RecompareArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mut store = open_store(&config.db)?;
    recompare_with(config, &mut store, input, out)
}

/// Re-rank an existing item, putting it back unchanged if the session is
/// abandoned before it commits.
pub(crate) fn recompare_with(
    config: RecompareConfig,
    store: &mut SqliteCollectionStore,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let original = store
        .load_all()?
        .into_iter()
        .find(|item| item.id == config.id)
        .ok_or(CliError::UnknownItem { id: config.id })?;
    let label = item_label(&original);
    let mut session = RankingSession::recompare(store, &config.session, config.id)?;

    match drive(&mut session, store, &label, config.verdicts, input, out) {
        Ok(report) => {
            write_line(out, &format!("Previous rating: {}", original.rating))?;
            report_commit(&report, store, out)
        }
        Err(err) => {
            if session.state() != SessionState::Done {
                log::warn!("re-compare of {label} abandoned; restoring its previous rating");
                store.append(original)?;
            }
            Err(err)
        }
    }
}

fn drive(
    session: &mut RankingSession,
    store: &mut SqliteCollectionStore,
    label: &str,
    verdicts: Option<Vec<ComparisonOutcome>>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<CommitReport, CliError> {
    match verdicts {
        Some(verdicts) => {
            let mut source = ScriptedVerdicts::new(verdicts);
            let report = answer_and_commit(session, store, label, &mut source, out)?;
            let unused = source.unused();
            if unused > 0 {
                log::warn!("ignored {unused} unused verdict(s)");
            }
            Ok(report)
        }
        None => {
            let mut source = PromptVerdicts::new(input);
            answer_and_commit(session, store, label, &mut source, out)
        }
    }
}

fn answer_and_commit(
    session: &mut RankingSession,
    store: &mut SqliteCollectionStore,
    label: &str,
    source: &mut dyn VerdictSource,
    out: &mut dyn Write,
) -> Result<CommitReport, CliError> {
    while let SessionState::Comparing { index, total } = session.state() {
        let Some(opponent) = session.current_opponent() else {
            break;
        };
        let matchup = Matchup {
            newcomer: label,
            opponent,
            index,
            total,
        };
        let verdict = source.next_verdict(matchup, out)?;
        session.submit(store, verdict)?;
    }
    Ok(session.commit(store)?)
}

fn report_commit(
    report: &CommitReport,
    store: &SqliteCollectionStore,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let label = item_label(&report.item);
    write_line(
        out,
        &format!(
            "Ranked {label}: rating {} after {} comparison(s)",
            report.item.rating, report.comparisons
        ),
    )?;
    let scored = project_scores(store.load_all()?);
    if let Some((rank, entry)) = scored
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.item.id == report.item.id)
    {
        write_line(
            out,
            &format!(
                "Score {:.1} ({}), #{} of {}",
                entry.score,
                entry.class,
                rank + 1,
                scored.len()
            ),
        )?;
    }
    if report.removed_from_watchlist {
        write_line(out, &format!("Removed {label} from the watchlist"))?;
    }
    Ok(())
}
