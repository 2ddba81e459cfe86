use std::fs;

use bridge_tourney::config::TournamentConfig;
use bridge_tourney::runner::TournamentRunner;
use tempfile::tempdir;

fn load_config(output_dir: &std::path::Path, event_log: bool) -> TournamentConfig {
    let event_log = if event_log {
        format!(
            "  event_log: \"{}\"\n",
            output_dir.join("events.jsonl").display()
        )
    } else {
        String::new()
    };
    let yaml = format!(
        r#"
run_id: "test_smoke"
tournament:
  id: "smoke"
  secret: "4242"
  total_boards: 6
  boards_per_round: 2
pairs:
  - name: "north_stars"
    players: ["ann", "bob"]
  - name: "east_enders"
    players: ["cat", "dan"]
  - name: "south_paws"
    players: ["eve", "fay"]
    style: "passive"
  - name: "west_winds"
    players: ["gus", "hal"]
  - name: "late_entry"
    players: ["ivy", "jon"]
outputs:
  results_jsonl: "{results}"
  standings_md: "{standings}"
{event_log}logging:
  enable_structured: false
"#,
        results = output_dir.join("results.jsonl").display(),
        standings = output_dir.join("standings.md").display(),
    );

    let mut cfg: TournamentConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

#[test]
fn tournament_smoke_test_writes_results_and_standings() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), false);
    let outputs = config.resolved_outputs();

    let runner = TournamentRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("tournament completes");

    // Five pairs: three tables, one hosting the phantom, over three rounds.
    assert_eq!(summary.hands_played, 2 * 3 * 2);
    assert_eq!(summary.standings.len(), 5);

    let jsonl = fs::read_to_string(&summary.results_path).expect("jsonl readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    assert_eq!(rows.len(), summary.rows_written);
    for row in &rows {
        assert_eq!(row["run_id"], "test_smoke");
        let ns = row["ns_score"].as_i64().expect("ns score");
        let ew = row["ew_score"].as_i64().expect("ew score");
        assert!(ns == 0 || ew == 0, "only one side scores: {row}");
    }

    let standings = fs::read_to_string(&summary.standings_path).expect("standings readable");
    assert!(standings.starts_with("# Standings: test_smoke"));
    for pair in ["north_stars", "east_enders", "south_paws", "west_winds", "late_entry"] {
        assert!(standings.contains(pair), "{pair} missing from standings");
    }
}

#[test]
fn same_secret_deals_same_results() {
    let first = tempdir().expect("temp dir");
    let second = tempdir().expect("temp dir");
    let read_scores = |dir: &std::path::Path| {
        let config = load_config(dir, false);
        let outputs = config.resolved_outputs();
        let summary = TournamentRunner::new(config, outputs)
            .expect("runner created")
            .run()
            .expect("tournament completes");
        fs::read_to_string(summary.results_path).expect("jsonl readable")
    };
    assert_eq!(read_scores(first.path()), read_scores(second.path()));
}

#[test]
fn event_log_records_every_action() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), true);
    let outputs = config.resolved_outputs();
    let summary = TournamentRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect("tournament completes");

    let log = fs::read_to_string(dir.path().join("events.jsonl")).expect("event log readable");
    let hands: std::collections::BTreeSet<u64> = log
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("valid line");
            value["hand"].as_u64().expect("hand id")
        })
        .collect();
    assert_eq!(hands.len(), summary.hands_played);
    // Every hand has at least its four opening calls.
    assert!(log.lines().count() >= 4 * summary.hands_played);
}

#[test]
fn rerunning_on_the_same_event_log_restores_instead_of_replaying() {
    let dir = tempdir().expect("temp dir");
    let run = || {
        let config = load_config(dir.path(), true);
        let outputs = config.resolved_outputs();
        let summary = TournamentRunner::new(config, outputs)
            .expect("runner created")
            .run()
            .expect("tournament completes");
        let rows = fs::read_to_string(&summary.results_path).expect("jsonl readable");
        (summary, rows)
    };
    let events = dir.path().join("events.jsonl");

    let (first, first_rows) = run();
    assert_eq!(first.hands_played, 12);
    assert_eq!(first.hands_restored, 0);
    let logged = fs::read_to_string(&events).expect("event log readable");

    let (second, second_rows) = run();
    assert_eq!(second.hands_played, 0);
    assert_eq!(second.hands_restored, 12);
    assert_eq!(second.rows_written, 12);
    assert_eq!(
        fs::read_to_string(&events).expect("event log readable"),
        logged,
        "a restored tournament appends nothing"
    );

    let sorted = |rows: &str| {
        let mut lines: Vec<String> = rows.lines().map(str::to_string).collect();
        lines.sort();
        lines
    };
    assert_eq!(sorted(&first_rows), sorted(&second_rows));
    assert_eq!(
        first.standings.ranked().first().map(|(pair, _)| pair.to_string()),
        second.standings.ranked().first().map(|(pair, _)| pair.to_string())
    );
}

#[test]
fn validating_a_config_creates_no_output_files() {
    let dir = tempdir().expect("temp dir");
    let nested = dir.path().join("not_yet");
    let config = load_config(&nested, true);
    assert!(config.resolved_outputs().event_log.is_some());
    assert!(!nested.exists());
}
