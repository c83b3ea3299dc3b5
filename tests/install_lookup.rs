use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use dingdex::install::{data_path, index_path};
use dingdex::{
    check_for_ding_format, install_from_path, is_installed, remove_install, DingFormatCheck,
    EngineConfig, InstallOutcome, InstallState, Lookup, LookupResult,
};

fn write_ding(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let mut content = String::from("# Version :: 1.9 2026-01-01\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn install(root: &Path, ding: &Path) {
    let outcome = install_from_path(
        root,
        ding,
        &EngineConfig::default(),
        &mut |_state, _progress| {},
        &|| false,
    )
    .unwrap();
    assert_eq!(outcome, InstallOutcome::Installed);
}

fn rendered(results: &[LookupResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| format!("{} :: {}", r.entry.german_text(), r.entry.english_text()))
        .collect()
}

#[test]
fn single_entry_found_by_german_keyword() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(tmp.path(), "de-en.txt", &["Haus :: house"]);
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let results = lookup.search("haus", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Haus :: house".to_string()]);
}

#[test]
fn ascii_spelling_is_recovered_to_the_umlaut_form() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(
        tmp.path(),
        "de-en.txt",
        &["Straße :: street", "Baum :: tree"],
    );
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let results = lookup.search("strasse", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Straße :: street".to_string()]);

    // the native spelling finds the same entry without recovery
    let results = lookup.search("straße", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Straße :: street".to_string()]);
}

#[test]
fn shared_prefix_entries_rank_the_exact_match_first() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(
        tmp.path(),
        "de-en.txt",
        &["Apfelbaum :: apple tree", "Apfel :: apple"],
    );
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();

    let both = lookup.search("apfel", 16).unwrap();
    assert_eq!(
        rendered(&both),
        vec![
            "Apfel :: apple".to_string(),
            "Apfelbaum :: apple tree".to_string()
        ]
    );

    let top = lookup.search("apfel", 1).unwrap();
    assert_eq!(rendered(&top), vec!["Apfel :: apple".to_string()]);
}

#[test]
fn common_words_produce_no_results() {
    let tmp = TempDir::new().unwrap();
    let lines: Vec<String> = (0..10_000)
        .map(|i| format!("Wort{} :: word{}", i, i))
        .collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let ding = write_ding(tmp.path(), "de-en.txt", &line_refs);
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    assert!(lookup.search("der", 16).unwrap().is_empty());
}

#[test]
fn multi_keyword_query_intersects_across_sides() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(
        tmp.path(),
        "de-en.txt",
        &[
            "Apfelbaum :: apple tree",
            "Apfel :: apple",
            "Baum :: tree",
        ],
    );
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let results = lookup.search("apple tree", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Apfelbaum :: apple tree".to_string()]);
}

#[test]
fn prefix_only_candidates_are_filtered_out() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(
        tmp.path(),
        "de-en.txt",
        &["Treffen :: meeting", "Baum :: tree"],
    );
    let root = tmp.path().join("root");
    install(&root, &ding);

    // "Treffen" shares the TRE prefix with "tree" but does not contain the
    // keyword itself, so the candidate must be discarded
    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let results = lookup.search("tree", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Baum :: tree".to_string()]);
}

#[test]
fn lookup_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let lines: Vec<String> = (0..200).map(|i| format!("Apfelwein{} :: cider{}", i, i)).collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let ding = write_ding(tmp.path(), "de-en.txt", &line_refs);
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let first: Vec<(u64, u32)> = lookup
        .search("apfelwein", 50)
        .unwrap()
        .iter()
        .map(|r| (r.ref_offset, r.distance))
        .collect();
    let second: Vec<(u64, u32)> = lookup
        .search("apfelwein", 50)
        .unwrap()
        .iter()
        .map(|r| (r.ref_offset, r.distance))
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 50);
}

#[test]
fn small_candidate_file_is_rejected_before_any_install() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("small.txt");
    fs::write(&path, vec![b'x'; 3 * 1024]).unwrap();
    assert_eq!(check_for_ding_format(&path), DingFormatCheck::TooSmall);

    let root = tmp.path().join("root");
    assert!(!data_path(&root).exists());
    assert!(!index_path(&root).exists());
}

#[test]
fn cancelled_install_leaves_no_files_behind() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(tmp.path(), "de-en.txt", &["Haus :: house"]);
    let root = tmp.path().join("root");

    // first poll passes, second (right after the copy step) cancels
    let polls = Cell::new(0u32);
    let cancel = || {
        polls.set(polls.get() + 1);
        polls.get() >= 2
    };
    let mut states = Vec::new();
    let outcome = install_from_path(
        &root,
        &ding,
        &EngineConfig::default(),
        &mut |state, _progress| states.push(state),
        &cancel,
    )
    .unwrap();

    assert_eq!(outcome, InstallOutcome::Cancelled);
    assert_eq!(states.last(), Some(&InstallState::Idle));
    assert!(!data_path(&root).exists());
    assert!(!index_path(&root).exists());
}

#[test]
fn install_reports_progress_protocol() {
    let tmp = TempDir::new().unwrap();
    let lines: Vec<String> = (0..500).map(|i| format!("Wort{} :: word{}", i, i)).collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let ding = write_ding(tmp.path(), "de-en.txt", &line_refs);
    let root = tmp.path().join("root");

    let mut states = Vec::new();
    install_from_path(
        &root,
        &ding,
        &EngineConfig::default(),
        &mut |state, progress| states.push((state, progress)),
        &|| false,
    )
    .unwrap();

    assert_eq!(states.first().unwrap().0, InstallState::Starting);
    assert_eq!(states.last().unwrap(), &(InstallState::Completed, 1.0));
    let indexing: Vec<f32> = states
        .iter()
        .filter(|(state, _)| *state == InstallState::Indexing)
        .map(|(_, p)| *p)
        .collect();
    assert!(!indexing.is_empty());
    assert!(indexing.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn reinstall_replaces_the_previous_dictionary() {
    let tmp = TempDir::new().unwrap();
    let first = write_ding(tmp.path(), "first.txt", &["Haus :: house"]);
    let second = write_ding(tmp.path(), "second.txt", &["Baum :: tree"]);
    let root = tmp.path().join("root");

    install(&root, &first);
    install(&root, &second);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    assert!(lookup.search("haus", 16).unwrap().is_empty());
    assert_eq!(
        rendered(&lookup.search("baum", 16).unwrap()),
        vec!["Baum :: tree".to_string()]
    );
}

#[test]
fn detection_and_removal() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(tmp.path(), "de-en.txt", &["Haus :: house"]);
    let root = tmp.path().join("root");

    assert!(!is_installed(&root));
    install(&root, &ding);
    assert!(is_installed(&root));

    remove_install(&root).unwrap();
    assert!(!is_installed(&root));
    assert!(!index_path(&root).exists());
}

#[test]
fn lookup_on_missing_install_reports_not_installed() {
    let tmp = TempDir::new().unwrap();
    let err = Lookup::open(&tmp.path().join("root"), EngineConfig::default()).unwrap_err();
    assert!(matches!(err, dingdex::DingdexError::NotInstalled(_)));
}

#[test]
fn comment_lines_are_never_returned() {
    let tmp = TempDir::new().unwrap();
    let ding = write_ding(
        tmp.path(),
        "de-en.txt",
        &["# Kommentar :: comment about Apfel", "Apfel :: apple"],
    );
    let root = tmp.path().join("root");
    install(&root, &ding);

    let mut lookup = Lookup::open(&root, EngineConfig::default()).unwrap();
    let results = lookup.search("apfel", 16).unwrap();
    assert_eq!(rendered(&results), vec!["Apfel :: apple".to_string()]);
}
