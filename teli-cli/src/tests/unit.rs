//! Focused unit tests covering CLI configuration and command output.

use super::helpers::{TempCollection, output};
use super::*;
use crate::collection::{
    NoteEdit, curated_with, list_with, note_with, profile_with, remove_with, watch_with,
};
use crate::rank::{AddConfig, RecompareConfig, add_with, recompare_with};
use crate::transfer::{export_with, import_with};
use rstest::{fixture, rstest};
use std::io::Cursor;
use teli_core::{
    Candidate, CollectionStore, ComparisonOutcome, ItemMetadata, Preference, Rating,
    SessionConfig,
};

#[fixture]
fn collection() -> TempCollection {
    TempCollection::new()
}

fn add_config(
    collection: &TempCollection,
    id: u64,
    title: &str,
    verdicts: Option<Vec<ComparisonOutcome>>,
) -> AddConfig {
    AddConfig {
        candidate: Candidate::new(id).with_metadata(ItemMetadata::titled(title)),
        preference: Preference::Fine,
        verdicts,
        session: SessionConfig::default(),
        db: collection.db().to_path_buf(),
    }
}

fn recompare_config(
    collection: &TempCollection,
    id: u64,
    verdicts: Option<Vec<ComparisonOutcome>>,
) -> RecompareConfig {
    RecompareConfig {
        id,
        verdicts,
        session: SessionConfig::default(),
        db: collection.db().to_path_buf(),
    }
}

#[rstest]
fn converting_add_without_id_errors() {
    let err = AddConfig::try_from(AddArgs::default()).expect_err("missing id should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ID);
            assert_eq!(env, ENV_ADD_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_recompare_without_id_errors() {
    let err =
        RecompareConfig::try_from(RecompareArgs::default()).expect_err("missing id should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ID);
            assert_eq!(env, ENV_RECOMPARE_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn add_config_collects_metadata_and_verdicts() {
    let args = AddArgs {
        id: Some(5),
        title: Some("Heat".to_owned()),
        year: Some(1995),
        genres: Some(vec!["Crime".to_owned(), "Drama".to_owned()]),
        preference: Some("LIKED".to_owned()),
        verdicts: Some("1,=".to_owned()),
        max_comparisons: Some(3),
        db: None,
    };

    let config = AddConfig::try_from(args).expect("config should build");
    assert_eq!(config.candidate.id, 5);
    assert_eq!(config.candidate.metadata.title.as_deref(), Some("Heat"));
    assert_eq!(config.candidate.metadata.year, Some(1995));
    assert_eq!(config.candidate.metadata.genres, vec!["Crime", "Drama"]);
    assert_eq!(config.preference, Preference::Liked);
    assert_eq!(
        config.verdicts,
        Some(vec![ComparisonOutcome::PreferNew, ComparisonOutcome::Equal])
    );
    assert_eq!(config.session.max_comparisons, 3);
    assert_eq!(config.db, Utf8PathBuf::from(DEFAULT_DATABASE));
}

#[rstest]
fn unknown_preference_ranks_as_fine() {
    let args = AddArgs {
        id: Some(5),
        preference: Some("adored".to_owned()),
        ..AddArgs::default()
    };
    let config = AddConfig::try_from(args).expect("config should build");
    assert_eq!(config.preference, Preference::Fine);
    assert_eq!(config.verdicts, None);
}

#[rstest]
fn invalid_verdicts_are_rejected_up_front() {
    let args = RecompareArgs {
        id: Some(5),
        verdicts: Some("1,x".to_owned()),
        ..RecompareArgs::default()
    };
    let err = RecompareConfig::try_from(args).expect_err("invalid verdict");
    match err {
        CliError::InvalidVerdict { token } => assert_eq!(token, "x"),
        other => panic!("expected InvalidVerdict, found {other:?}"),
    }
}

#[rstest]
fn add_accepts_repeated_and_delimited_genres() {
    let cli = Cli::try_parse_from([
        "teli", "add", "5", "--genre", "Crime,Drama", "--genre", "Thriller",
    ])
    .expect("arguments should parse");
    match cli.command {
        Command::Add(args) => {
            assert_eq!(args.id, Some(5));
            assert_eq!(
                args.genres,
                Some(vec![
                    "Crime".to_owned(),
                    "Drama".to_owned(),
                    "Thriller".to_owned()
                ])
            );
        }
        other => panic!("expected add command, found {other:?}"),
    }
}

#[rstest]
fn first_item_commits_without_prompting(collection: TempCollection) {
    let mut config = add_config(&collection, 1, "Heat", None);
    config.preference = Preference::Liked;
    let mut store = collection.open();
    let mut stdout = Vec::new();

    add_with(config, &mut store, &mut Cursor::new(""), &mut stdout).expect("add succeeds");

    let printed = output(stdout);
    assert!(printed.contains("Ranked Heat: rating 1600 after 0 comparison(s)"));
    assert!(printed.contains("Score 7.5 (good), #1 of 1"));
}

#[rstest]
fn prompted_verdicts_drive_the_session(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let mut store = collection.open();
    let mut stdout = Vec::new();

    add_with(
        add_config(&collection, 2, "Ronin", None),
        &mut store,
        &mut Cursor::new("1\n"),
        &mut stdout,
    )
    .expect("add succeeds");

    let printed = output(stdout);
    assert!(printed.contains("[1/1] Which is better? 1) Ronin  =) same  2) Heat > "));
    assert!(printed.contains("Ranked Ronin: rating 1616 after 1 comparison(s)"));
    assert!(printed.contains("Score 10.0 (excellent), #1 of 2"));
    let heat = store
        .load_all()
        .expect("load")
        .into_iter()
        .find(|item| item.id == 1)
        .expect("Heat stays in the collection");
    assert_eq!(heat.rating, Rating::new(1584));
}

#[rstest]
fn exhausted_verdicts_leave_collection_untouched(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let mut store = collection.open();

    let err = add_with(
        add_config(&collection, 2, "Ronin", Some(Vec::new())),
        &mut store,
        &mut Cursor::new(""),
        &mut Vec::new(),
    )
    .expect_err("verdicts run out");

    assert!(matches!(err, CliError::VerdictsExhausted { supplied: 0 }));
    let ids: Vec<_> = store
        .load_all()
        .expect("load")
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![1]);
}

#[rstest]
fn recompare_reports_previous_rating(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Heat"), (2, 1600, "Ronin")]);
    let mut store = collection.open();
    let mut stdout = Vec::new();

    recompare_with(
        recompare_config(&collection, 1, Some(vec![ComparisonOutcome::PreferNew])),
        &mut store,
        &mut Cursor::new(""),
        &mut stdout,
    )
    .expect("recompare succeeds");

    let printed = output(stdout);
    assert!(printed.contains("[1/1] Heat vs Ronin: prefer-new"));
    assert!(printed.contains("Previous rating: 1400"));
    assert!(printed.contains("Ranked Heat: rating 1616 after 1 comparison(s)"));
}

#[rstest]
fn abandoned_recompare_restores_item(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Heat"), (2, 1600, "Ronin")]);
    let mut store = collection.open();

    let err = recompare_with(
        recompare_config(&collection, 2, Some(Vec::new())),
        &mut store,
        &mut Cursor::new(""),
        &mut Vec::new(),
    )
    .expect_err("verdicts run out");

    assert!(matches!(err, CliError::VerdictsExhausted { .. }));
    let ronin = store
        .load_all()
        .expect("load")
        .into_iter()
        .find(|item| item.id == 2)
        .expect("Ronin restored");
    assert_eq!(ronin.rating, Rating::new(1600));
    assert_eq!(ronin.metadata.title.as_deref(), Some("Ronin"));
}

#[rstest]
fn recompare_unknown_item_errors(collection: TempCollection) {
    let mut store = collection.open();
    let err = recompare_with(
        recompare_config(&collection, 9, None),
        &mut store,
        &mut Cursor::new(""),
        &mut Vec::new(),
    )
    .expect_err("unknown item");
    assert!(matches!(err, CliError::UnknownItem { id: 9 }));
}

#[rstest]
fn remove_deletes_known_items_only(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let mut store = collection.open();
    let mut stdout = Vec::new();

    remove_with(&mut store, 1, &mut stdout).expect("remove succeeds");
    assert_eq!(output(stdout), "Removed Heat\n");
    assert!(store.load_all().expect("load").is_empty());

    let err = remove_with(&mut store, 1, &mut Vec::new()).expect_err("already removed");
    assert!(matches!(err, CliError::UnknownItem { id: 1 }));
}

#[rstest]
fn watch_adds_then_lists(collection: TempCollection) {
    let mut store = collection.open();
    let mut stdout = Vec::new();

    watch_with(&mut store, None, &mut stdout).expect("list empty");
    watch_with(&mut store, Some(Candidate::new(4)), &mut stdout).expect("watch");
    watch_with(&mut store, Some(Candidate::new(4)), &mut stdout).expect("watch again");
    watch_with(&mut store, None, &mut stdout).expect("list");

    assert_eq!(
        output(stdout),
        "The watchlist is empty.\n\
         Added #4 to the watchlist\n\
         #4 is already on the watchlist\n\
         #4\n"
    );
}

#[rstest]
fn watched_metadata_is_used_when_ranking(collection: TempCollection) {
    let mut store = collection.open();
    let watched = Candidate::new(4)
        .with_metadata(ItemMetadata::titled("Alien").with_year(1979).with_genre("Horror"));
    let mut stdout = Vec::new();
    watch_with(&mut store, Some(watched), &mut stdout).expect("watch");
    watch_with(&mut store, None, &mut stdout).expect("list");

    let config = AddConfig {
        candidate: Candidate::new(4),
        ..add_config(&collection, 4, "ignored", None)
    };
    add_with(config, &mut store, &mut Cursor::new(""), &mut stdout).expect("add succeeds");

    let printed = output(stdout);
    assert!(printed.starts_with(
        "Added Alien (1979) to the watchlist\n\
         Alien (1979)\n"
    ));
    assert!(printed.contains("Ranked Alien (1979): rating 1500 after 0 comparison(s)"));
    assert!(printed.contains("Removed Alien (1979) from the watchlist"));
    let stored = store.load_all().expect("load").remove(0);
    assert_eq!(stored.metadata.genres, vec!["Horror".to_owned()]);
}

#[rstest]
fn note_sets_then_shows_notes_and_tags(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let mut store = collection.open();
    let mut stdout = Vec::new();

    let edit = NoteEdit {
        notes: Some("Diner scene".to_owned()),
        tags: Some(vec!["rewatchable".to_owned(), "classic".to_owned()]),
        clear_tags: false,
    };
    note_with(&mut store, 1, edit, &mut stdout).expect("note succeeds");
    note_with(&mut store, 1, NoteEdit::default(), &mut stdout).expect("show succeeds");
    let clear = NoteEdit {
        notes: Some(String::new()),
        clear_tags: true,
        ..NoteEdit::default()
    };
    note_with(&mut store, 1, clear, &mut stdout).expect("clear succeeds");

    assert_eq!(
        output(stdout),
        "Updated notes for Heat\n\
         Notes: Diner scene\n\
         Tags: rewatchable, classic\n\
         Notes: Diner scene\n\
         Tags: rewatchable, classic\n\
         Updated notes for Heat\n\
         Notes: none\n\
         Tags: none\n"
    );
}

#[rstest]
fn note_for_unknown_item_errors(collection: TempCollection) {
    let mut store = collection.open();
    let err = note_with(&mut store, 9, NoteEdit::default(), &mut Vec::new())
        .expect_err("unknown item");
    assert!(matches!(err, CliError::UnknownItem { id: 9 }));
}

#[rstest]
fn curated_lists_need_three_items(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat")]);
    let mut stdout = Vec::new();
    curated_with(&collection.open(), false, &mut stdout).expect("curated succeeds");
    assert_eq!(
        output(stdout),
        "Rank at least 3 items to see curated lists.\n"
    );

    collection.seed(&[(3, 1500, "Alien")]);
    let mut stdout = Vec::new();
    curated_with(&collection.open(), false, &mut stdout).expect("curated succeeds");
    assert_eq!(
        output(stdout),
        "Recently Added:\n\
         \x20 10.0  Heat\n\
         \x20  5.5  Alien\n\
         \x20  1.0  Ronin\n"
    );
}

#[rstest]
fn curated_json_carries_slugs(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat"), (3, 1500, "Alien")]);
    let mut stdout = Vec::new();
    curated_with(&collection.open(), true, &mut stdout).expect("curated succeeds");

    let value: serde_json::Value = serde_json::from_str(&output(stdout)).expect("valid JSON");
    let first = value.get(0).expect("one list");
    assert_eq!(first["slug"], "recently-added");
    assert_eq!(first["items"][0]["item"]["id"], 2);
}

#[rstest]
fn list_prints_scores_best_first(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat")]);
    let store = collection.open();
    let mut stdout = Vec::new();

    list_with(&store, false, &mut stdout).expect("list succeeds");

    let printed = output(stdout);
    let lines: Vec<_> = printed.lines().collect();
    assert_eq!(
        lines,
        vec![
            "  1. 10.0  excellent     Heat  [1600]",
            "  2.  1.0  poor          Ronin  [1400]",
            "2 item(s), 0 comparison(s), confidence 0%",
        ]
    );
}

#[rstest]
fn list_prints_json_on_request(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat")]);
    let store = collection.open();
    let mut stdout = Vec::new();

    list_with(&store, true, &mut stdout).expect("list succeeds");

    let value: serde_json::Value = serde_json::from_str(&output(stdout)).expect("valid JSON");
    let entries = value.as_array().expect("array of entries");
    assert_eq!(entries.len(), 2);
    let first = entries.first().expect("first entry");
    assert_eq!(first["score"], 10.0);
    assert_eq!(first["class"], "excellent");
    assert_eq!(first["item"]["id"], 2);
}

#[rstest]
fn empty_collection_has_no_listing_or_profile(collection: TempCollection) {
    let store = collection.open();
    let mut stdout = Vec::new();

    list_with(&store, false, &mut stdout).expect("list succeeds");
    profile_with(&store, false, &mut stdout).expect("profile succeeds");

    assert_eq!(
        output(stdout),
        "The collection is empty. Rank something with `teli add`.\n\
         Rank a few items to build a taste profile.\n"
    );
}

#[rstest]
fn profile_summarises_collection(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat")]);
    let store = collection.open();
    let mut stdout = Vec::new();

    profile_with(&store, false, &mut stdout).expect("profile succeeds");

    let printed = output(stdout);
    assert!(printed.starts_with("2 item(s) from 0 comparison(s), average score 5.5\n"));
    assert!(printed.contains("Distribution: excellent 1, good 0, average 0, below average 0, poor 1"));
    assert!(printed.contains("  10.0  Heat"));
}

#[rstest]
fn export_then_import_moves_collection(collection: TempCollection) {
    collection.seed(&[(1, 1400, "Ronin"), (2, 1600, "Heat")]);
    let source = collection.open();
    let snapshot = collection.path("snapshots/collection.json");
    let mut stdout = Vec::new();

    export_with(&source, Some(&snapshot), &mut stdout).expect("export succeeds");
    assert_eq!(
        output(stdout),
        format!("Exported 2 item(s) and 0 comparison(s) to {snapshot}\n")
    );

    let fresh = TempCollection::new();
    fresh.seed(&[(7, 1500, "Alien")]);
    let mut target = fresh.open();
    let mut import_out = Vec::new();
    import_with(&mut target, &snapshot, &mut import_out).expect("import succeeds");

    assert_eq!(
        output(import_out),
        "Imported 2 item(s) and 0 comparison(s), replacing 1 item(s)\n"
    );
    assert_eq!(
        target.load_all().expect("load"),
        source.load_all().expect("load")
    );
}

#[rstest]
fn export_without_path_prints_snapshot(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let store = collection.open();
    let mut stdout = Vec::new();

    export_with(&store, None, &mut stdout).expect("export succeeds");

    assert!(output(stdout).contains("\"version\": \"1.0\""));
}

#[rstest]
fn import_reports_missing_and_invalid_snapshots(collection: TempCollection) {
    let mut store = collection.open();
    let missing = collection.path("missing.json");
    let err = import_with(&mut store, &missing, &mut Vec::new()).expect_err("missing file");
    match err {
        CliError::SnapshotNotFound { path } => assert_eq!(path, missing),
        other => panic!("expected SnapshotNotFound, found {other:?}"),
    }

    let future = collection.path("future.json");
    teli_fs::write_string(&future, r#"{"version":"2.0","items":[]}"#).expect("write snapshot");
    let err = import_with(&mut store, &future, &mut Vec::new()).expect_err("unsupported");
    match err {
        CliError::ParseSnapshot { path, .. } => assert_eq!(path, future),
        other => panic!("expected ParseSnapshot, found {other:?}"),
    }
}

#[rstest]
fn importing_twice_keeps_comparison_count(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat")]);
    let mut store = collection.open();
    add_with(
        add_config(&collection, 2, "Ronin", Some(vec![ComparisonOutcome::PreferNew])),
        &mut store,
        &mut Cursor::new(""),
        &mut Vec::new(),
    )
    .expect("add succeeds");
    let snapshot = collection.path("collection.json");
    export_with(&store, Some(&snapshot), &mut Vec::new()).expect("export succeeds");

    import_with(&mut store, &snapshot, &mut Vec::new()).expect("first import");
    import_with(&mut store, &snapshot, &mut Vec::new()).expect("second import");

    assert_eq!(store.comparison_count().expect("count"), 1);
    assert_eq!(store.load_all().expect("load").len(), 2);
}

#[rstest]
fn rejected_import_leaves_collection_intact(collection: TempCollection) {
    collection.seed(&[(1, 1600, "Heat"), (2, 1400, "Ronin")]);
    let mut store = collection.open();
    let repeated = collection.path("repeated.json");
    teli_fs::write_string(
        &repeated,
        r#"{"version":"1.0","items":[{"id":9,"rating":1500},{"id":9,"rating":1400}]}"#,
    )
    .expect("write snapshot");

    let err = import_with(&mut store, &repeated, &mut Vec::new()).expect_err("duplicate id");

    assert!(matches!(
        err,
        CliError::ParseSnapshot {
            source: teli_core::SnapshotError::DuplicateItem { id: 9 },
            ..
        }
    ));
    let ids: Vec<_> = store
        .load_all()
        .expect("load")
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}
