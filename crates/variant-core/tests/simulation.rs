//! End-to-end simulation tests
//!
//! Small populations run through the full runner, with in-memory sinks or
//! file output in a temporary directory.

use std::fs;

use tempfile::tempdir;

use variant_core::net::{NetworkKind, SelectionPolicy};
use variant_core::output::MemorySink;
use variant_core::{SimConfig, SimError, Simulation};
use variant_events::{RunSummary, StopReason};

fn small_config(seed: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.epochs = 6;
    config.simulation.seed = Some(seed);
    config.simulation.threads = Some(2);
    config.network.kind = NetworkKind::Regular;
    config.network.cols = 4;
    config.network.rows = 4;
    config.population.teachers = 3;
    config.population.lexicon_capacity = 20;
    config.population.initial_lexicon_size = 20;
    config
}

fn run_in_memory(config: SimConfig) -> (RunSummary, MemorySink, MemorySink) {
    let mut sim = Simulation::new(config).unwrap();
    let mut epochs = MemorySink::new();
    let mut agents = MemorySink::new();
    let summary = sim.run(&mut epochs, &mut agents, None).unwrap();
    (summary, epochs, agents)
}

#[test]
fn test_run_records_every_epoch() {
    let (summary, epochs, _) = run_in_memory(small_config(11));

    assert_eq!(epochs.epochs.len() as u64, summary.epochs_run);
    for (i, record) in epochs.epochs.iter().enumerate() {
        assert_eq!(record.epoch, i as u64);
        // Every listener hears teachers * utterance_size tokens.
        assert_eq!(record.productions_a + record.productions_b, 16 * 3 * 5);
    }
    let a: u64 = epochs.epochs.iter().map(|r| r.productions_a).sum();
    assert_eq!(summary.total_productions_a, a);
    assert_eq!(summary.nodes, 16);
    assert_eq!(summary.network_kind, "regular");
}

#[test]
fn test_pure_population_stagnates() {
    let mut config = small_config(5);
    config.simulation.epochs = 50;
    config.simulation.max_wait = 3;
    config.population.initial_ratio_a = 1.0;
    config.output.dump_agents_interval = 0;

    let (summary, epochs, agents) = run_in_memory(config);

    assert_eq!(summary.stop_reason, StopReason::Stagnated);
    assert_eq!(summary.epochs_run, 3);
    assert_eq!(summary.final_ratio_a, Some(1.0));
    assert_eq!(summary.overall_ratio_a, Some(1.0));
    assert!(epochs.epochs.iter().all(|r| r.productions_b == 0));
    // First one-sided epoch plus the epoch the run stopped at.
    assert_eq!(agents.agent_epochs(), vec![0, 2]);
    assert_eq!(agents.agents.len(), 2 * 16);
}

#[test]
fn test_zero_max_wait_never_stops_early() {
    let mut config = small_config(5);
    config.simulation.epochs = 4;
    config.simulation.max_wait = 0;
    config.population.initial_ratio_a = 0.0;

    let (summary, _, _) = run_in_memory(config);
    assert_eq!(summary.stop_reason, StopReason::Completed);
    assert_eq!(summary.epochs_run, 4);
    assert_eq!(summary.final_ratio_a, Some(0.0));
}

#[test]
fn test_agent_snapshot_schedule() {
    let mut config = small_config(3);
    config.simulation.epochs = 7;
    config.simulation.max_wait = 0;
    config.output.dump_agents_interval = 3;

    let (_, _, agents) = run_in_memory(config);
    let epochs = agents.agent_epochs();
    assert!(epochs.contains(&0));
    assert!(epochs.contains(&3));
    assert!(epochs.contains(&6));
    assert!(!epochs.contains(&1));
}

#[test]
fn test_status_policy_runs() {
    let mut config = small_config(8);
    config.population.interaction = SelectionPolicy::ByStatus;
    let (summary, _, _) = run_in_memory(config);
    assert!(summary.epochs_run >= 1);
}

#[test]
fn test_distance_policies_run() {
    for policy in [SelectionPolicy::ByDistance, SelectionPolicy::ByDistanceDet] {
        let mut config = small_config(9);
        config.population.interaction = policy;
        config.network.kind = NetworkKind::SmallWorld;
        let (summary, epochs, _) = run_in_memory(config);
        assert_eq!(epochs.epochs.len() as u64, summary.epochs_run, "{:?}", policy);
    }
}

#[test]
fn test_run_to_dir_writes_outputs() {
    let dir = tempdir().unwrap();
    let mut config = small_config(21);
    config.simulation.max_wait = 0;
    config.output.dir = dir.path().to_path_buf();
    config.output.prefix = "t_".to_string();
    config.output.dump_agents_interval = 0;
    config.output.dump_lexicon_interval = 0;
    config.output.dump_lexicon_last = true;

    let mut sim = Simulation::new(config).unwrap();
    let summary = sim.run_to_dir().unwrap();
    assert_eq!(summary.epochs_run, 6);

    let epochs_csv = fs::read_to_string(dir.path().join("t_epochs.csv")).unwrap();
    let mut lines = epochs_csv.lines();
    assert_eq!(lines.next(), Some("timestamp,epoch,productionsA,productionsB"));
    assert_eq!(lines.count(), 6);

    assert!(dir.path().join("t_agents_000000.csv").exists());
    assert!(dir.path().join("t_agents_000005.csv").exists());
    let lexicons = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("t_lexicon_000005_"))
        .count();
    assert_eq!(lexicons, 16);

    let written = SimConfig::from_file(&dir.path().join("t_config.toml")).unwrap();
    assert_eq!(written.simulation.seed, Some(21));

    let json = fs::read_to_string(dir.path().join("t_summary.json")).unwrap();
    let parsed: RunSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.seed, 21);
    assert_eq!(parsed.epochs_run, summary.epochs_run);
    assert_eq!(parsed.total_productions_a, summary.total_productions_a);
    assert_eq!(parsed.stop_reason, StopReason::Completed);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = small_config(1);
    config.population.teachers = 0;
    assert!(matches!(Simulation::new(config), Err(SimError::Config(_))));
}

#[test]
fn test_two_node_network_repeats_speaker() {
    let mut config = small_config(1);
    config.network.cols = 2;
    config.network.rows = 1;
    config.population.teachers = 3;
    config.population.interaction = SelectionPolicy::ByDistanceDet;
    let mut sim = Simulation::new(config).unwrap();
    let mut epochs = MemorySink::new();
    let mut agents = MemorySink::new();
    // Two nodes: a listener always has exactly one eligible speaker, so the
    // deterministic policy repeats it instead of failing.
    let summary = sim.run(&mut epochs, &mut agents, None).unwrap();
    assert!(summary.epochs_run >= 1);
}
