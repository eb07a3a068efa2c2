use std::time::Duration;

use waypoint_defence_core::{
    ConfigError, EnemyKind, EnemyTemplate, Event, GridConfig, MatchConfig, MatchOutcome,
    PlayMode, Point, TowerKind, TowerTemplate, WaveConfig,
};
use waypoint_defence_system_bootstrap::Session;
use waypoint_defence_system_builder::Input;
use waypoint_defence_world::query;

const FRAME: Duration = Duration::from_millis(100);

fn skirmish(enemy_speed: f32, enemy_count: u32, max_enemies_allowed: u32) -> MatchConfig {
    MatchConfig {
        starting_money: 100,
        low_funds_threshold: 20,
        max_enemies_allowed,
        time_between_waves_secs: 1.0,
        rng_seed: 0x0bad_5eed,
        path: vec![Point::new(0.0, 0.5), Point::new(20.0, 0.5)],
        grid: GridConfig {
            columns: 20,
            rows: 4,
            tile_size: 1.0,
            path_clearance: 0.5,
        },
        enemies: vec![EnemyTemplate {
            name: "scout".to_owned(),
            speed: enemy_speed,
            health: 5,
            damage: 1,
            reward: 10,
        }],
        towers: vec![TowerTemplate {
            name: "lance".to_owned(),
            build_cost: 50,
            range: 5.0,
            fire_rate: 2.0,
            upgrade_cost: 30,
            range_step: 1.0,
            fire_rate_step: 0.5,
            upgrade_cost_step: 30,
            max_upgrade_level: 2,
            projectile_speed: 20.0,
            projectile_damage: 5,
        }],
        waves: vec![WaveConfig {
            enemy_types: vec![EnemyKind::new(0)],
            enemy_count,
            spawn_interval_secs: 1.0,
        }],
    }
}

fn build_inputs() -> Vec<Input> {
    vec![
        Input::SelectTowerKind(TowerKind::new(0)),
        Input::PlaceAt(Point::new(2.5, 2.5)),
    ]
}

fn run_until_over(session: &mut Session, mut inputs: Vec<Input>, max_frames: usize) -> Vec<Event> {
    let mut log = Vec::new();
    for _ in 0..max_frames {
        let frame_inputs = std::mem::take(&mut inputs);
        log.extend(session.tick(FRAME, &frame_inputs).iter().cloned());
        if query::is_over(session.world()) {
            break;
        }
    }
    log
}

fn count(log: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    log.iter().filter(|event| predicate(event)).count()
}

#[test]
fn defended_path_wins_the_match() {
    let mut session = Session::new(skirmish(1.0, 2, 3)).expect("valid config");
    let log = run_until_over(&mut session, build_inputs(), 400);

    assert_eq!(query::outcome(session.world()), Some(MatchOutcome::Victory));
    assert_eq!(count(&log, |event| matches!(event, Event::EnemyDied { .. })), 2);
    assert_eq!(
        count(&log, |event| matches!(event, Event::WaveEnded { wave: 0 })),
        1
    );
    assert_eq!(
        count(&log, |event| matches!(event, Event::MatchEnded { .. })),
        1
    );
    assert_eq!(query::balance(session.world()), 70);
    assert_eq!(session.scheduler().wave_index(), 1);
    assert_eq!(session.builder().armed(), None);
}

#[test]
fn undefended_path_loses_and_stops_spawning() {
    let mut session = Session::new(skirmish(10.0, 6, 2)).expect("valid config");
    let log = run_until_over(&mut session, Vec::new(), 400);

    assert_eq!(query::outcome(session.world()), Some(MatchOutcome::Defeat));
    assert_eq!(query::outcome_tracker(session.world()).goal_reach_count(), 2);
    assert!(session.scheduler().spawn_task().is_none());

    let ended_at = log
        .iter()
        .position(|event| matches!(event, Event::MatchEnded { .. }))
        .expect("match ended");
    assert!(!log[ended_at..]
        .iter()
        .any(|event| matches!(event, Event::EnemySpawned { .. })));

    for _ in 0..50 {
        let frame = session.tick(FRAME, &[]);
        assert!(frame.is_empty(), "finished match must stay silent");
    }
}

#[test]
fn identical_sessions_replay_identically() {
    let play = || {
        let mut session = Session::new(MatchConfig::default()).expect("default config is valid");
        let mut log = Vec::new();
        let script = [
            (0, Input::SelectTowerKind(TowerKind::new(0))),
            (0, Input::PlaceAt(Point::new(5.5, 3.5))),
            (10, Input::SelectTowerKind(TowerKind::new(1))),
            (10, Input::PlaceAt(Point::new(12.5, 6.5))),
            (200, Input::SelectTowerAt(Point::new(5.5, 3.5))),
            (200, Input::UpgradeSelected),
        ];
        for frame in 0..600 {
            let inputs: Vec<Input> = script
                .iter()
                .filter(|(at, _)| *at == frame)
                .map(|(_, input)| *input)
                .collect();
            log.extend(session.tick(FRAME, &inputs).iter().cloned());
        }
        (log, query::balance(session.world()))
    };

    let first = play();
    let second = play();
    assert_eq!(first, second);
    assert!(first
        .0
        .iter()
        .any(|event| matches!(event, Event::WaveStarted { wave: 0, .. })));
}

#[test]
fn pause_freezes_the_simulation() {
    let mut session = Session::new(skirmish(1.0, 2, 3)).expect("valid config");
    let _ = session.tick(FRAME, &[]);
    let countdown = session.scheduler().countdown();

    let frame = session.tick(FRAME, &[Input::TogglePause]).to_vec();
    assert_eq!(
        frame,
        vec![Event::PlayModeChanged {
            mode: PlayMode::Paused,
        }]
    );
    for _ in 0..30 {
        assert!(session.tick(FRAME, &[]).is_empty());
    }
    assert_eq!(session.scheduler().countdown(), countdown);
    assert_eq!(session.builder().play_mode(), PlayMode::Paused);

    let resumed = session.tick(FRAME, &[Input::TogglePause]).to_vec();
    assert_eq!(
        resumed[0],
        Event::PlayModeChanged {
            mode: PlayMode::Running,
        }
    );
    assert!(resumed.contains(&Event::TimeAdvanced { dt: FRAME }));
}

#[test]
fn placement_is_allowed_while_paused() {
    let mut session = Session::new(skirmish(1.0, 2, 3)).expect("valid config");
    let _ = session.tick(FRAME, &[Input::TogglePause]);

    let frame = session.tick(FRAME, &build_inputs()).to_vec();
    assert!(frame
        .iter()
        .any(|event| matches!(event, Event::TowerPlaced { .. })));
    assert_eq!(query::balance(session.world()), 50);
}

#[test]
fn selected_tower_can_be_upgraded_then_sold() {
    let mut session = Session::new(skirmish(1.0, 2, 3)).expect("valid config");
    let _ = session.tick(FRAME, &build_inputs());

    let frame = session
        .tick(
            FRAME,
            &[
                Input::SelectTowerAt(Point::new(2.1, 2.9)),
                Input::UpgradeSelected,
                Input::SellSelected,
            ],
        )
        .to_vec();

    assert!(frame.iter().any(|event| matches!(
        event,
        Event::TowerStateChanged {
            level: 2,
            upgrade_cost: 60,
            can_upgrade: true,
            ..
        }
    )));
    assert!(frame
        .iter()
        .any(|event| matches!(event, Event::TowerSold { refund: 30, .. })));
    assert_eq!(query::balance(session.world()), 50);
    assert_eq!(session.builder().selected(), None);
    assert!(query::tower_view(session.world()).into_vec().is_empty());
}

#[test]
fn reset_restores_initial_match() {
    let mut session = Session::new(skirmish(1.0, 2, 3)).expect("valid config");
    let _ = run_until_over(&mut session, build_inputs(), 400);
    assert!(query::is_over(session.world()));

    let events = session.reset_match().to_vec();
    assert_eq!(events[0], Event::MatchReset);
    assert!(events.contains(&Event::BalanceChanged {
        balance: 100,
        low_funds: false,
    }));
    assert!(!query::is_over(session.world()));
    assert_eq!(session.scheduler().wave_index(), 0);
    assert_eq!(session.scheduler().countdown(), Duration::from_secs(1));
    assert!(query::tower_view(session.world()).into_vec().is_empty());

    let log = run_until_over(&mut session, build_inputs(), 400);
    assert_eq!(query::outcome(session.world()), Some(MatchOutcome::Victory));
    assert_eq!(count(&log, |event| matches!(event, Event::EnemyDied { .. })), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let config = MatchConfig {
        waves: Vec::new(),
        ..MatchConfig::default()
    };
    assert_eq!(Session::new(config).err(), Some(ConfigError::NoWaves));
}
