use anyhow::Result;
use ql::explore::ExplorationPolicy;
use ql::learn::tabular_learner::LearnerParameter;
use ql::log::init_logging;
use qbert::action::QbertAction;
use qbert::agent::{MonolithicAgent, SubsumptionArbiter, SubsumptionVariant};
use qbert::board::{GameEntity, Position};
use qbert::driver::{accepting_input, AgentDriver, DriverParameter, EpisodeLog, GameEnvironment};
use rstest::rstest;

use common::PyramidGame;

mod common;

fn driver_param() -> DriverParameter {
    DriverParameter {
        seed: 7,
        max_frames_per_episode: Some(20_000),
    }
}

#[rstest]
#[case(SubsumptionVariant::V1)]
#[case(SubsumptionVariant::V2)]
#[case(SubsumptionVariant::V3)]
fn test_subsumption_agent_plays(#[case] variant: SubsumptionVariant) -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let agent = SubsumptionArbiter::new(variant, ExplorationPolicy::default(), LearnerParameter::default(), dir.path())?;
    let game = PyramidGame::new(Some((Position::new(4, 2), GameEntity::RedBall)));
    let mut driver = AgentDriver::new(game, agent, driver_param());

    let records = driver.run(3)?;
    assert_eq!(records.iter().map(|r| r.episode).collect::<Vec<_>>(), vec![1, 2, 3]);
    for record in &records {
        assert!(record.score >= 0.0);
        assert_eq!(record.score % 25.0, 0.0);
        assert!((0.0..=1.0).contains(&record.random_fraction));
    }
    assert!(driver.high_score() > 0.0);

    let agent = driver.agent();
    assert!(!agent.puzzle_learner().utilities().is_empty());
    assert!(!agent.hazard_learner().utilities().is_empty());
    assert!(agent.puzzle_learner().table_file().exists());
    assert!(agent.hazard_learner().table_file().exists());
    assert!(dir.path().join(variant.puzzle_learner_name() + ".qtable").exists());
    assert!(dir.path().join(variant.hazard_learner_name() + ".qtable").exists());
    Ok(())
}

#[rstest]
fn test_tables_survive_restart(#[values(7, 11, 2024)] seed: u64, #[values(true, false)] with_discs: bool) -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let game = if with_discs {
        PyramidGame::new(None)
    } else {
        PyramidGame::without_discs(None)
    };
    let param = DriverParameter { seed, ..driver_param() };
    let learned = {
        let agent = MonolithicAgent::new(ExplorationPolicy::default(), LearnerParameter::default(), dir.path())?;
        let mut driver = AgentDriver::new(game, agent, param);
        driver.run_episode()?;
        let learner = driver.agent().learner();
        assert!(!learner.utilities().is_empty());
        let rows = (learner.utilities().sorted_rows(), learner.visits().sorted_rows());
        rows
    };

    let agent = MonolithicAgent::new(ExplorationPolicy::default(), LearnerParameter::default(), dir.path())?;
    assert_eq!(agent.learner().utilities().sorted_rows(), learned.0);
    assert_eq!(agent.learner().visits().sorted_rows(), learned.1);
    Ok(())
}

#[test]
fn test_player_is_shown_on_the_disc_before_the_ride() {
    let mut game = PyramidGame::new(None);
    let disc = QbertAction::Up.target(common::TOP);
    assert!(game.board().is_disc(disc.x, disc.y));

    game.act(QbertAction::Up);
    for _ in 0..common::JUMP_FRAMES {
        game.act(QbertAction::NoOp);
    }
    // shown on the disc while input is accepted
    assert_eq!(game.player(), disc);
    assert_eq!(game.board().player_position(), Some(disc));
    assert!(accepting_input(game.ram()));

    game.act(QbertAction::Down);
    assert_eq!(game.player(), common::TOP);
    assert!(!game.board().is_disc(disc.x, disc.y));
    assert_eq!(game.lives(), common::LIVES);
}

#[test]
fn test_desynchronized_game_teaches_nothing() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let agent = MonolithicAgent::new(ExplorationPolicy::default(), LearnerParameter::default(), dir.path())?;
    let param = DriverParameter {
        max_frames_per_episode: Some(50),
        ..driver_param()
    };
    let mut driver = AgentDriver::new(PyramidGame::desynchronized(), agent, param);

    let record = driver.run_episode()?;
    assert_eq!(record.score, 0.0);
    assert_eq!(record.random_fraction, 0.0);
    let learner = driver.agent().learner();
    assert!(learner.utilities().is_empty());
    assert!(learner.visits().is_empty());
    assert_eq!(learner.trace(), (None, None));
    Ok(())
}

#[test]
fn test_episode_log() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let log_file = dir.path().join("episodes.csv");
    let agent = SubsumptionArbiter::new(SubsumptionVariant::V2, ExplorationPolicy::default(), LearnerParameter::default(), &dir.path().join("tables"))?;
    let mut driver = AgentDriver::new(PyramidGame::new(None), agent, driver_param()).with_episode_log(EpisodeLog::create(&log_file)?);

    let records = driver.run(2)?;
    let content = std::fs::read_to_string(&log_file)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], EpisodeLog::HEADER);
    assert_eq!(lines[1], format!("1,{},{}", records[0].score, records[0].random_fraction));
    assert!(lines[2].starts_with("2,"));
    Ok(())
}
