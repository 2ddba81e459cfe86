use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bridge_bot::{HeuristicPolicy, Policy, PolicyContext};
use bridge_core::game::TracingObserver;
use bridge_core::game::hand_state::HandEvent;
use bridge_core::model::ids::{HandId, Pair, PairId, PlayerId};
use bridge_core::scoring::Standings;
use bridge_core::store::{EventStore, MemoryStore, StoreError};
use bridge_core::tournament::{HandAssignment, LifecycleError, Phase, Tournament, TournamentSettings};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, TournamentConfig};
use crate::director::{ActionError, Director};
use crate::jsonl_store::JsonlStore;

/// Plays a configured tournament to completion with bots in every seat.
pub struct TournamentRunner {
    config: TournamentConfig,
    outputs: ResolvedOutputs,
    director: Director,
    policies: HashMap<PlayerId, HeuristicPolicy>,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    /// Hands that needed at least one bot action in this run.
    pub hands_played: usize,
    /// Hands already complete in the event log when the run started.
    pub hands_restored: usize,
    pub rows_written: usize,
    pub results_path: PathBuf,
    pub standings_path: PathBuf,
    pub standings: Standings,
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    run_id: &'a str,
    tournament_id: &'a str,
    hand: HandId,
    round: usize,
    table: usize,
    board: u32,
    ns_pair: &'a PairId,
    ew_pair: &'a PairId,
    contract: Option<String>,
    declarer_tricks: u8,
    ns_score: i32,
    ew_score: i32,
}

enum Step {
    Call(PolicyContext),
    Play(PolicyContext),
}

impl TournamentRunner {
    /// Build a runner from a validated configuration and sign every pair up.
    pub fn new(config: TournamentConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let store: Arc<dyn EventStore> = match outputs.event_log.as_ref() {
            Some(path) => Arc::new(JsonlStore::open(path, &config.tournament.id)?),
            None => Arc::new(MemoryStore::new()),
        };
        let tournament = Tournament::new(
            config.tournament.id.clone(),
            config.tournament.secret.clone(),
            TournamentSettings {
                total_boards: config.tournament.total_boards,
                boards_per_round: config.tournament.boards_per_round,
            },
        );
        let director = Director::new(tournament, store).with_observer(Arc::new(TracingObserver));

        let mut policies = HashMap::new();
        for pair in &config.pairs {
            let [first, second] = pair.players.clone().map(PlayerId::new);
            let style = config.style_for(pair);
            policies.insert(first.clone(), HeuristicPolicy::new(style));
            policies.insert(second.clone(), HeuristicPolicy::new(style));
            director.sign_up(Pair::new(PairId::new(&pair.name), first, second))?;
        }

        Ok(Self {
            config,
            outputs,
            director,
            policies,
        })
    }

    /// Execute the tournament, streaming one JSONL row per finished hand.
    pub fn run(mut self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.results_jsonl.parent())?;
        ensure_parent(self.outputs.standings_md.parent())?;
        let mut writer = BufWriter::new(File::create(&self.outputs.results_jsonl)?);

        let first_round = self.director.close_signup()?;
        event!(
            target: "bridge_tourney::lifecycle",
            Level::INFO,
            run_id = %self.config.run_id,
            pairs = self.config.pairs.len(),
            hands = first_round.len(),
            "tournament started"
        );

        let mut written = HashSet::new();
        let hands_restored = self.write_recorded(&mut writer, &mut written)?;
        if hands_restored > 0 {
            event!(
                target: "bridge_tourney::lifecycle",
                Level::INFO,
                run_id = %self.config.run_id,
                hands = hands_restored,
                "hands restored from the event log"
            );
        }

        let mut hands_played = 0usize;
        while self.director.phase() != Phase::Complete {
            let active = self.director.active_hands();
            for assignment in &active {
                if self.play_hand(assignment)? > 0 {
                    hands_played += 1;
                }
            }
            if self.write_recorded(&mut writer, &mut written)? == 0 {
                return Err(RunnerError::Stalled);
            }
        }
        writer.flush()?;
        let rows_written = written.len();

        let standings = self.director.standings().ok_or(RunnerError::Stalled)?;
        write_standings(&self.outputs.standings_md, &self.config.run_id, &standings)?;
        event!(
            target: "bridge_tourney::lifecycle",
            Level::INFO,
            run_id = %self.config.run_id,
            hands = rows_written,
            "standings written"
        );

        Ok(RunSummary {
            hands_played,
            hands_restored,
            rows_written,
            results_path: self.outputs.results_jsonl.clone(),
            standings_path: self.outputs.standings_md.clone(),
            standings,
        })
    }

    /// Drives `assignment` to completion and returns the number of actions
    /// the bots made.
    fn play_hand(&mut self, assignment: &HandAssignment) -> Result<usize, RunnerError> {
        let hand = assignment.hand;
        let tempo = Duration::from_millis(self.config.tournament.tempo_ms);
        let mut actions = 0usize;
        loop {
            let step = self.director.with_hand(hand, |state| {
                if let Some(seat) = state.allowed_caller() {
                    Some(Step::Call(PolicyContext::observe(state, seat)))
                } else {
                    state
                        .allowed_player()
                        .map(|seat| Step::Play(PolicyContext::observe(state, seat)))
                }
            })?;
            let Some(step) = step else {
                return Ok(actions);
            };

            let ctx = match &step {
                Step::Call(ctx) | Step::Play(ctx) => ctx,
            };
            let player = assignment.player(ctx.actor).clone();
            let policy = self
                .policies
                .get_mut(&player)
                .ok_or_else(|| RunnerError::NoPolicy(player.clone()))?;

            let ack = match &step {
                Step::Call(ctx) => {
                    let call = policy.choose_call(ctx);
                    self.director.apply_call(hand, &player, &call.to_string())?
                }
                Step::Play(ctx) => {
                    let card = policy
                        .choose_play(ctx)
                        .ok_or(RunnerError::NoLegalCard(hand))?;
                    self.director.apply_play(hand, &player, &card.to_string())?
                }
            };
            actions += 1;
            if let Some(HandEvent::HandCompleted { score }) = ack.events.last() {
                let contract = score
                    .contract
                    .map_or_else(|| "passed out".to_string(), |c| c.to_string());
                event!(
                    target: "bridge_tourney::hand",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    hand = %hand,
                    board = assignment.coords.board,
                    round = assignment.coords.round,
                    table = assignment.coords.table,
                    contract = %contract,
                    ns_score = score.ns_score,
                    ew_score = score.ew_score,
                    "hand complete"
                );
            }

            if !tempo.is_zero() {
                thread::sleep(tempo);
            }
        }
    }

    /// Writes a row for every recorded hand not written yet and returns how
    /// many were added.
    fn write_recorded(
        &self,
        writer: &mut BufWriter<File>,
        written: &mut HashSet<HandId>,
    ) -> Result<usize, RunnerError> {
        let mut added = 0usize;
        for assignment in self.director.recorded_hands() {
            if written.insert(assignment.hand) {
                self.write_result_row(writer, &assignment)?;
                added += 1;
            }
        }
        Ok(added)
    }

    fn write_result_row(
        &self,
        writer: &mut BufWriter<File>,
        assignment: &HandAssignment,
    ) -> Result<(), RunnerError> {
        let score = self
            .director
            .final_score(assignment.hand)?
            .ok_or(RunnerError::Unfinished(assignment.hand))?;
        let tournament_id = self.director.tournament_id();
        let row = ResultRow {
            run_id: &self.config.run_id,
            tournament_id: &tournament_id,
            hand: assignment.hand,
            round: assignment.coords.round,
            table: assignment.coords.table,
            board: assignment.coords.board,
            ns_pair: &assignment.ns_pair,
            ew_pair: &assignment.ew_pair,
            contract: score.contract.map(|c| c.to_string()),
            declarer_tricks: score.declarer_tricks,
            ns_score: score.ns_score,
            ew_score: score.ew_score,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_standings(path: &Path, run_id: &str, standings: &Standings) -> Result<(), RunnerError> {
    let rounds = standings
        .iter()
        .flat_map(|(_, tally)| tally.by_round.keys().copied())
        .max()
        .unwrap_or(0);

    let mut rows = String::new();
    rows.push_str(&format!("# Standings: {run_id}\n\n"));
    rows.push_str("| Rank | Pair | Matchpoints | Available | % | Boards |");
    for round in 1..=rounds {
        rows.push_str(&format!(" R{round} |"));
    }
    rows.push_str("\n|------|------|-------------|-----------|---|--------|");
    for _ in 1..=rounds {
        rows.push_str("----|");
    }
    rows.push('\n');

    for (rank, (pair, tally)) in standings.ranked().into_iter().enumerate() {
        let percentage = if tally.percentage.is_nan() {
            "-".to_string()
        } else {
            format!("{:.2}", tally.percentage)
        };
        rows.push_str(&format!(
            "| {rank} | {pair} | {mp} | {available} | {percentage} | {boards} |",
            rank = rank + 1,
            mp = tally.matchpoints,
            available = tally.available,
            boards = tally.boards,
        ));
        for round in 1..=rounds {
            match tally.by_round.get(&round) {
                Some(r) => rows.push_str(&format!(" {}/{} |", r.matchpoints, r.available)),
                None => rows.push_str(" - |"),
            }
        }
        rows.push('\n');
    }

    fs::write(path, rows)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize result row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("event store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("action rejected: {0}")]
    Action(#[from] ActionError),
    #[error("no bot is seated for player {0}")]
    NoPolicy(PlayerId),
    #[error("bot found no legal card at {0}")]
    NoLegalCard(HandId),
    #[error("{0} stopped before it was complete")]
    Unfinished(HandId),
    #[error("a pass over the active hands recorded no result")]
    Stalled,
}
