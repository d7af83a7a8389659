//! 透過 controller 完整進行整局 (逐步與背景 thread)

use std::thread;
use std::time::{Duration, Instant};

use donjara::ai::{CpuPlayer, DiscardPolicy};
use donjara::controller::{EventType, GameController, LoopTiming, Step, shared};
use donjara::game::{DiscardTarget, GameState, HAND_SIZE, NUM_SEATS, TOTAL_TILES};

fn create_controller(seed: u64) -> GameController {
    let game = shared(GameState::new(Some(seed)));
    let cpus = CpuPlayer::create_opponents(DiscardPolicy::Basic, Some(seed));
    GameController::new(game, cpus, None)
}

/// 玩家回合：摸牌後捨掉剛摸到的牌
fn play_human(controller: &GameController) -> bool {
    if !controller.process_human_turn() {
        return false;
    }
    let drawn = match controller.snapshot().human().hand.last() {
        Some(tile) => tile.id,
        None => return false,
    };
    controller.human_discard(DiscardTarget::Tile(drawn))
}

#[test]
fn test_stepped_game_runs_to_exhaustion() {
    let controller = create_controller(2024);
    let mut steps = 0;

    loop {
        match controller.step() {
            Step::GameOver => break,
            Step::HumanWaiting => assert!(play_human(&controller)),
            Step::CpuTurn { drew, discarded, .. } => assert!(drew && discarded),
            Step::Recovered | Step::Skipped => panic!("no turn should fail or be skipped"),
        }
        steps += 1;
        assert!(steps < 1000, "game did not end");

        let snapshot = controller.snapshot();
        let total: usize = snapshot.deck_count
            + snapshot
                .seats
                .iter()
                .map(|s| s.hand.len() + s.discards.len())
                .sum::<usize>();
        assert_eq!(total, TOTAL_TILES);
    }

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.deck_count, 0);
    for seat in &snapshot.seats {
        assert_eq!(seat.hand.len(), HAND_SIZE);
    }

    // 84 張牌山全部被摸走再捨出
    let discarded: usize = snapshot.seats.iter().map(|s| s.discards.len()).sum();
    assert_eq!(discarded, TOTAL_TILES - NUM_SEATS * HAND_SIZE);
    assert_eq!(
        controller
            .journal()
            .get_recent_by_type(1000, EventType::Discard)
            .len(),
        discarded
    );
    assert_eq!(
        controller
            .journal()
            .get_recent_by_type(10, EventType::GameEnd)
            .len(),
        1
    );
}

#[test]
fn test_threaded_game_runs_to_exhaustion() {
    let mut controller = create_controller(99).with_timing(LoopTiming {
        poll_interval: Duration::from_millis(10),
        recovery_pause: Duration::from_millis(10),
        stop_timeout: Duration::from_secs(1),
    });
    controller.set_turn_delay(0.1);
    controller.start();

    let deadline = Instant::now() + Duration::from_secs(60);
    while controller.is_running() && Instant::now() < deadline {
        if controller.is_human_turn() {
            play_human(&controller);
        }
        thread::sleep(Duration::from_millis(5));
    }

    assert!(!controller.is_running(), "loop should end on its own");
    let status = controller.status();
    assert_eq!(status.mountain_count, 0);
    assert!(!status.auto_play_active);

    let snapshot = controller.snapshot();
    for seat in &snapshot.seats {
        assert!(seat.hand.len() == HAND_SIZE || seat.hand.len() == HAND_SIZE + 1);
    }
    assert!(
        controller
            .journal()
            .get_recent_by_type(10, EventType::Error)
            .is_empty()
    );
}
