//! 自動進行控制器
//!
//! 背景 thread 依固定節奏替 CPU 座位摸牌、捨牌並輪到下一位；
//! 玩家本人的回合只由畫面層呼叫 [`GameController::process_human_turn`] 與
//! [`GameController::human_discard`] 推進。
//!
//! 所有 `GameState` 的存取都經過同一把 Mutex，另外雙方在鎖內都會再確認
//! `current_seat` 屬於自己才動作。
//!
//! 每次 `start()` 產生新的執行編號。`stop()` 撤銷編號後，舊 thread 不會再開始
//! 新的回合；已經開始的回合會完整結束 (含輪到下一位)。新的 thread 先 join
//! 舊的 thread 才開始動作，同一時間最多只有一個迴圈在推進牌局。

use super::journal::Journal;
use crate::ai::CpuPlayer;
use crate::config::{AppConfig, clamp_turn_delay};
use crate::error::{ControllerError, GameError};
use crate::game::{
    DiscardTarget, GameState, HAND_SIZE, HUMAN_SEAT, SeatId, TableSnapshot, Tile,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 共享的牌局狀態
pub type SharedGame = Arc<Mutex<GameState>>;

/// 狀態變更通知 (在執行變更的 thread 上呼叫)
pub type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

const NO_SEAT: usize = usize::MAX;

/// 沒有背景迴圈
const NO_RUN: u64 = 0;

/// 背景迴圈的執行編號
type RunId = u64;

/// 包成共享狀態
pub fn shared(game: GameState) -> SharedGame {
    Arc::new(Mutex::new(game))
}

/// 取得牌局鎖；某個回合 panic 造成 poison 時直接沿用內部狀態
///
/// 每個變更都是單一的 push/pop，poison 時狀態仍然一致。
pub fn lock_game(game: &SharedGame) -> MutexGuard<'_, GameState> {
    match game.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("[CONTROLLER] Game state lock poisoned, recovering");
            game.clear_poison();
            poisoned.into_inner()
        }
    }
}

/// 迴圈的時間參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// 玩家回合時的輪詢間隔
    pub poll_interval: Duration,
    /// 回合失敗後的暫停
    pub recovery_pause: Duration,
    /// `stop()` 最多等待的時間
    pub stop_timeout: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            recovery_pause: Duration::from_millis(500),
            stop_timeout: Duration::from_secs(1),
        }
    }
}

/// 單次迴圈的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 牌山已空或牌局已停止，迴圈結束
    GameOver,
    /// 輪到玩家本人，不做任何動作
    HumanWaiting,
    /// CPU 完成一個回合
    CpuTurn {
        seat: SeatId,
        drew: bool,
        discarded: bool,
    },
    /// 沒有動作：輪次已被移走，或這次執行已被停止
    Skipped,
    /// 回合失敗，已強制輪到下一位
    Recovered,
}

/// 牌局狀況 (唯讀)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStatus {
    pub mountain_count: usize,
    pub current_seat: SeatId,
    pub current_player_name: String,
    pub is_human_turn: bool,
    pub game_active: bool,
    pub auto_play_active: bool,
    pub can_human_discard: bool,
}

/// 控制器與背景 thread 共用的部分
struct TurnEngine {
    game: SharedGame,
    cpus: HashMap<SeatId, CpuPlayer>,
    on_update: Option<UpdateCallback>,
    journal: Journal,
    turn_delay_nanos: AtomicU64,
    /// 目前有效的執行編號 (`NO_RUN` = Idle)
    active_run: AtomicU64,
    next_run: AtomicU64,
    /// 上一次迴圈看到的座位，用來偵測換人
    last_seat: AtomicUsize,
    end_reported: AtomicBool,
}

impl TurnEngine {
    fn notify(&self) {
        if let Some(callback) = &self.on_update {
            callback();
        }
    }

    fn turn_delay(&self) -> Duration {
        Duration::from_nanos(self.turn_delay_nanos.load(Ordering::Relaxed))
    }

    /// `None` 為前景直接呼叫，永遠可以動作
    fn may_act(&self, run: Option<RunId>) -> bool {
        match run {
            None => true,
            Some(id) => self.active_run.load(Ordering::SeqCst) == id,
        }
    }

    /// 執行結束時只清掉自己的編號
    fn finish_run(&self, run: RunId) {
        let _ = self
            .active_run
            .compare_exchange(run, NO_RUN, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// 執行一次迴圈；錯誤與 panic 都在這裡攔下並強制輪到下一位
    fn step(&self, run: Option<RunId>) -> Step {
        let seat = lock_game(&self.game).current_seat();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_step(run)));

        let err = match result {
            Ok(Ok(step)) => return step,
            Ok(Err(e)) => e,
            Err(payload) => ControllerError::Panicked(panic_message(payload.as_ref())),
        };

        error!("[CONTROLLER] Turn failed: {}", err);
        self.journal.error(&err.to_string());
        self.advance_from(seat);
        Step::Recovered
    }

    fn try_step(&self, run: Option<RunId>) -> Result<Step, ControllerError> {
        if !self.may_act(run) {
            return Ok(Step::Skipped);
        }

        let (seat, name, is_human) = {
            let game = lock_game(&self.game);
            if game.is_over() {
                let total_discards: usize =
                    game.players().iter().map(|p| p.discard_count()).sum();
                drop(game);
                self.report_game_end(total_discards);
                return Ok(Step::GameOver);
            }
            let player = game.current_player();
            (game.current_seat(), player.name().to_string(), player.is_human())
        };

        let entered = self.last_seat.swap(seat, Ordering::SeqCst) != seat;
        if entered {
            info!("[CONTROLLER] Turn: seat {} ({})", seat, name);
            self.journal.turn(seat, &name);
        }

        if is_human {
            // 換到玩家時通知一次，讓畫面看到輪次已經移過來
            if entered {
                self.notify();
            }
            return Ok(Step::HumanWaiting);
        }

        match self.play_cpu_turn(seat, run)? {
            Some((drew, discarded)) => {
                self.notify();
                self.advance_from(seat);
                Ok(Step::CpuTurn {
                    seat,
                    drew,
                    discarded,
                })
            }
            None => Ok(Step::Skipped),
        }
    }

    /// 輪次仍在 `seat` 時才輪到下一位
    fn advance_from(&self, seat: SeatId) {
        let mut game = lock_game(&self.game);
        if game.current_seat() == seat {
            game.advance_turn();
        } else {
            warn!(
                "[CONTROLLER] Turn already moved from seat {} to {}, not advancing",
                seat,
                game.current_seat()
            );
        }
    }

    /// CPU 一個回合的摸牌 (13 張時) 與捨牌 (超過 13 張時)
    ///
    /// 輪次不在 `seat` 或執行已被停止時不動作，回傳 None。
    fn play_cpu_turn(
        &self,
        seat: SeatId,
        run: Option<RunId>,
    ) -> Result<Option<(bool, bool)>, ControllerError> {
        let cpu = self
            .cpus
            .get(&seat)
            .ok_or(ControllerError::NoCpuForSeat(seat))?;

        let mut game = lock_game(&self.game);
        if game.current_seat() != seat {
            warn!("[CPU] Seat {} no longer on turn, skipping", seat);
            return Ok(None);
        }
        if !self.may_act(run) {
            debug!("[CPU] Seat {} turn skipped, auto-play stopped", seat);
            return Ok(None);
        }

        let player = game.player(seat).ok_or(GameError::InvalidSeat(seat))?;
        let name = player.name().to_string();
        debug!("[CPU] {} starts turn with {} tiles", name, player.hand_count());

        let mut drew = false;
        if cpu.should_draw(player.hand_count(), game.deck_count()) {
            if let Some(tile) = game.draw_for_seat(seat) {
                drew = true;
                self.journal.draw(seat, &name, tile.kind(), game.deck_count());
            }
        }

        let hand = game.player(seat).ok_or(GameError::InvalidSeat(seat))?.hand();
        let hand_len = hand.len();
        if hand_len <= HAND_SIZE {
            return Ok(Some((drew, false)));
        }

        match cpu.choose_discard(hand) {
            Some(index) if index < hand_len => {
                let tile = game.try_discard_for_seat(seat, DiscardTarget::Index(index))?;
                info!("[CPU] {} discards {}", name, tile.kind().label());
                self.journal.discard(seat, &name, tile.kind());
                Ok(Some((drew, true)))
            }
            other => {
                warn!(
                    "[CPU] {} chose invalid discard index {:?} (hand {}), skipping discard",
                    name, other, hand_len
                );
                Ok(Some((drew, false)))
            }
        }
    }

    fn report_game_end(&self, total_discards: usize) {
        if !self.end_reported.swap(true, Ordering::SeqCst) {
            info!("[CONTROLLER] Game over, {} tiles discarded", total_discards);
            self.journal.game_end(total_discards);
            self.notify();
        }
    }
}

/// 自動進行迴圈
///
/// 先等上一個 thread 結束，確保同時只有一個迴圈。
fn run_loop(
    engine: Arc<TurnEngine>,
    timing: LoopTiming,
    run: RunId,
    previous: Option<JoinHandle<()>>,
    stop_rx: mpsc::Receiver<()>,
) {
    if let Some(previous) = previous {
        if previous.join().is_err() {
            warn!("[CONTROLLER] Previous auto-play thread panicked");
        }
    }

    info!("[CONTROLLER] Auto-play loop {} started", run);

    while engine.may_act(Some(run)) {
        let wait = match engine.step(Some(run)) {
            Step::GameOver => break,
            Step::HumanWaiting | Step::Skipped => timing.poll_interval,
            Step::CpuTurn { .. } => engine.turn_delay(),
            Step::Recovered => timing.recovery_pause,
        };

        // 等待期間收到停止訊號就立即結束
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("[CONTROLLER] Stop requested");
                break;
            }
        }
    }

    engine.finish_run(run);
    info!("[CONTROLLER] Auto-play loop {} ended", run);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn wait_for_exit(handle: &JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    handle.is_finished()
}

/// 牌局控制器
///
/// 狀態：Idle (沒有有效的執行編號) / Running (背景迴圈執行中)。
pub struct GameController {
    engine: Arc<TurnEngine>,
    timing: LoopTiming,
    stop_tx: Option<mpsc::Sender<()>>,
    /// 最後一個背景 thread；停止逾時時仍保留，下次 start 交給新 thread join
    worker: Option<JoinHandle<()>>,
}

impl GameController {
    /// 建立控制器 (Idle)
    pub fn new(game: SharedGame, cpus: Vec<CpuPlayer>, on_update: Option<UpdateCallback>) -> Self {
        Self::with_journal(game, cpus, Journal::new(), on_update)
    }

    /// 建立控制器，事件寫入指定的 journal
    pub fn with_journal(
        game: SharedGame,
        cpus: Vec<CpuPlayer>,
        journal: Journal,
        on_update: Option<UpdateCallback>,
    ) -> Self {
        journal.game_start(lock_game(&game).deck_count());

        let cpus = cpus.into_iter().map(|cpu| (cpu.seat(), cpu)).collect();
        let default_delay = AppConfig::default().turn_delay;

        Self {
            engine: Arc::new(TurnEngine {
                game,
                cpus,
                on_update,
                journal,
                turn_delay_nanos: AtomicU64::new(default_delay.as_nanos() as u64),
                active_run: AtomicU64::new(NO_RUN),
                next_run: AtomicU64::new(NO_RUN),
                last_seat: AtomicUsize::new(NO_SEAT),
                end_reported: AtomicBool::new(false),
            }),
            timing: LoopTiming::default(),
            stop_tx: None,
            worker: None,
        }
    }

    /// 依設定建立控制器與三家 CPU
    pub fn from_config(
        game: SharedGame,
        config: &AppConfig,
        journal: Journal,
        on_update: Option<UpdateCallback>,
    ) -> Self {
        let cpus = CpuPlayer::create_opponents(config.difficulty.policy(), config.seed);
        let controller = Self::with_journal(game, cpus, journal, on_update);
        controller.set_turn_delay(config.turn_delay.as_secs_f64());
        controller
    }

    pub fn with_timing(mut self, timing: LoopTiming) -> Self {
        self.timing = timing;
        self
    }

    /// 開始自動進行 (已在執行時不做事)
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let run = self.engine.next_run.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.worker.take();
        let (stop_tx, stop_rx) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let timing = self.timing;

        self.engine.active_run.store(run, Ordering::SeqCst);
        match thread::Builder::new()
            .name("auto-play".to_string())
            .spawn(move || run_loop(engine, timing, run, previous, stop_rx))
        {
            Ok(handle) => {
                self.stop_tx = Some(stop_tx);
                self.worker = Some(handle);
            }
            Err(e) => {
                error!("[CONTROLLER] Failed to spawn auto-play thread: {}", e);
                self.engine.finish_run(run);
            }
        }
    }

    /// 停止自動進行，最多等待 `stop_timeout`
    ///
    /// 逾時時 thread 仍在完成目前的回合，但不會再開始新的回合。
    pub fn stop(&mut self) {
        self.engine.active_run.store(NO_RUN, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.worker.take() {
            if wait_for_exit(&handle, self.timing.stop_timeout) {
                if handle.join().is_err() {
                    warn!("[CONTROLLER] Auto-play thread panicked");
                }
            } else {
                warn!(
                    "[CONTROLLER] Auto-play thread still finishing its turn after {:?}",
                    self.timing.stop_timeout
                );
                self.worker = Some(handle);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine.active_run.load(Ordering::SeqCst) != NO_RUN
    }

    /// 執行一次迴圈內容 (不等待)
    pub fn step(&self) -> Step {
        self.engine.step(None)
    }

    /// 玩家回合：手牌 13 張且牌山有牌時摸一張
    ///
    /// 不會呼叫更新通知 (畫面更新時會呼叫這裡，避免互相觸發)。
    pub fn process_human_turn(&self) -> bool {
        let mut game = lock_game(&self.engine.game);

        if !game.current_player().is_human() {
            debug!(
                "[CONTROLLER] Not the human's turn (current: seat {})",
                game.current_seat()
            );
            return false;
        }

        let hand_count = game.human_player().hand_count();
        if hand_count != HAND_SIZE || !game.can_draw() {
            debug!("[CONTROLLER] Human draw skipped ({} tiles in hand)", hand_count);
            return false;
        }

        match game.draw_for_seat(HUMAN_SEAT) {
            Some(tile) => {
                let name = game.human_player().name().to_string();
                info!("[CONTROLLER] {} draws {}", name, tile.kind().label());
                self.engine
                    .journal
                    .draw(HUMAN_SEAT, &name, tile.kind(), game.deck_count());
                true
            }
            None => false,
        }
    }

    /// 玩家捨牌，成功時輪到下一位並通知畫面
    ///
    /// 只在玩家回合且已摸牌 (手牌超過 13 張) 時有效。
    pub fn human_discard(&self, target: DiscardTarget) -> bool {
        let discarded: Option<Tile> = {
            let mut game = lock_game(&self.engine.game);

            if !game.current_player().is_human() {
                warn!(
                    "[CONTROLLER] Human discard rejected, current seat is {}",
                    game.current_seat()
                );
                return false;
            }
            if !game.human_player().can_discard() {
                warn!("[CONTROLLER] Human discard rejected, draw first");
                return false;
            }

            match game.try_discard_for_seat(HUMAN_SEAT, target) {
                Ok(tile) => {
                    game.advance_turn();
                    Some(tile)
                }
                Err(e) => {
                    warn!("[CONTROLLER] Human discard {:?} failed: {}", target, e);
                    None
                }
            }
        };

        match discarded {
            Some(tile) => {
                let name = lock_game(&self.engine.game).human_player().name().to_string();
                info!("[CONTROLLER] {} discards {}", name, tile.kind().label());
                self.engine.journal.discard(HUMAN_SEAT, &name, tile.kind());
                self.engine.notify();
                true
            }
            None => false,
        }
    }

    pub fn is_human_turn(&self) -> bool {
        lock_game(&self.engine.game).current_player().is_human()
    }

    pub fn can_human_discard(&self) -> bool {
        let game = lock_game(&self.engine.game);
        game.current_player().is_human() && game.human_player().can_discard()
    }

    /// 設定 CPU 思考時間 (秒，限制在 0.1 到 60 之間)
    pub fn set_turn_delay(&self, secs: f64) -> Duration {
        let delay = clamp_turn_delay(secs);
        self.engine
            .turn_delay_nanos
            .store(delay.as_nanos() as u64, Ordering::Relaxed);
        info!("[CONTROLLER] Turn delay set to {:.1}s", delay.as_secs_f64());
        delay
    }

    pub fn turn_delay(&self) -> Duration {
        self.engine.turn_delay()
    }

    /// 牌局狀況
    pub fn status(&self) -> GameStatus {
        let game = lock_game(&self.engine.game);
        let is_human_turn = game.current_player().is_human();

        GameStatus {
            mountain_count: game.deck_count(),
            current_seat: game.current_seat(),
            current_player_name: game.current_player().name().to_string(),
            is_human_turn,
            game_active: game.is_active(),
            auto_play_active: self.is_running(),
            can_human_discard: is_human_turn && game.human_player().can_discard(),
        }
    }

    /// 唯讀快照
    pub fn snapshot(&self) -> TableSnapshot {
        lock_game(&self.engine.game).snapshot()
    }

    /// 重新發牌並重新開始自動進行
    pub fn new_game(&mut self) {
        self.stop();

        let deck_count = {
            let mut game = lock_game(&self.engine.game);
            game.deal_new_game();
            game.deck_count()
        };

        self.engine.last_seat.store(NO_SEAT, Ordering::SeqCst);
        self.engine.end_reported.store(false, Ordering::SeqCst);
        self.engine.journal.game_start(deck_count);
        self.engine.notify();

        self.start();
    }

    pub fn journal(&self) -> &Journal {
        &self.engine.journal
    }

    pub fn game(&self) -> SharedGame {
        Arc::clone(&self.engine.game)
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DiscardPolicy, DiscardStrategy};
    use crate::controller::journal::EventType;
    use crate::game::NUM_SEATS;
    use rand::RngCore;

    struct OutOfRange;

    impl DiscardStrategy for OutOfRange {
        fn choose_discard_index(&self, _hand: &[Tile], _rng: &mut dyn RngCore) -> Option<usize> {
            Some(99)
        }
    }

    struct Panicking;

    impl DiscardStrategy for Panicking {
        fn choose_discard_index(&self, _hand: &[Tile], _rng: &mut dyn RngCore) -> Option<usize> {
            panic!("strategy exploded")
        }
    }

    fn counting_callback() -> (UpdateCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let callback: UpdateCallback = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    fn create_test_controller() -> (GameController, Arc<AtomicUsize>) {
        let game = shared(GameState::new(Some(12345)));
        let cpus = CpuPlayer::create_opponents(DiscardPolicy::Basic, Some(1));
        let (callback, count) = counting_callback();
        (GameController::new(game, cpus, Some(callback)), count)
    }

    fn fast_timing() -> LoopTiming {
        LoopTiming {
            poll_interval: Duration::from_millis(10),
            recovery_pause: Duration::from_millis(10),
            stop_timeout: Duration::from_secs(1),
        }
    }

    /// 玩家摸牌 + 捨第一張
    fn play_human_turn(controller: &GameController) {
        assert!(controller.process_human_turn());
        assert!(controller.human_discard(DiscardTarget::Index(0)));
    }

    fn hand_counts(controller: &GameController) -> Vec<usize> {
        let game = controller.game();
        let game = lock_game(&game);
        (0..NUM_SEATS).map(|s| game.hand_count(s).unwrap()).collect()
    }

    #[test]
    fn test_human_turn_waits() {
        let (controller, updates) = create_test_controller();

        assert_eq!(controller.step(), Step::HumanWaiting);
        assert_eq!(controller.step(), Step::HumanWaiting);

        // 只在換到玩家時通知一次
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
        assert_eq!(controller.status().current_seat, HUMAN_SEAT);
    }

    #[test]
    fn test_process_human_turn_draws_once() {
        let (controller, updates) = create_test_controller();

        assert!(controller.process_human_turn());
        assert!(!controller.process_human_turn()); // 已經 14 張
        assert_eq!(hand_counts(&controller)[0], 14);
        assert_eq!(controller.status().mountain_count, 83);

        // 摸牌不通知
        assert_eq!(updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_human_discard_requires_draw() {
        let (controller, _) = create_test_controller();

        assert!(!controller.can_human_discard());
        assert!(!controller.human_discard(DiscardTarget::Index(0)));
        assert_eq!(hand_counts(&controller)[0], 13);
        assert!(controller.is_human_turn());
    }

    #[test]
    fn test_human_discard_advances_and_notifies() {
        let (controller, updates) = create_test_controller();

        assert!(controller.process_human_turn());
        assert!(controller.can_human_discard());
        let drawn = *controller.snapshot().human().hand.last().unwrap();

        assert!(controller.human_discard(DiscardTarget::Tile(drawn.id)));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.current_seat, 1);
        assert_eq!(snapshot.human().hand.len(), 13);
        assert_eq!(snapshot.human().discards, vec![drawn]);
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert!(!controller.is_human_turn());
    }

    #[test]
    fn test_human_invalid_discard_keeps_turn() {
        let (controller, updates) = create_test_controller();
        assert!(controller.process_human_turn());

        assert!(!controller.human_discard(DiscardTarget::Index(99)));
        assert_eq!(hand_counts(&controller)[0], 14);
        assert!(controller.is_human_turn());
        assert_eq!(updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_human_entry_points_rejected_on_cpu_turn() {
        let (controller, _) = create_test_controller();
        play_human_turn(&controller);

        assert!(!controller.process_human_turn());
        assert!(!controller.human_discard(DiscardTarget::Index(0)));
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
    }

    #[test]
    fn test_cpu_step_draws_and_discards() {
        let (controller, updates) = create_test_controller();
        play_human_turn(&controller);
        let before = updates.load(Ordering::SeqCst);

        assert_eq!(
            controller.step(),
            Step::CpuTurn {
                seat: 1,
                drew: true,
                discarded: true
            }
        );

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.current_seat, 2);
        assert_eq!(snapshot.seats[1].hand.len(), 13);
        assert_eq!(snapshot.seats[1].discards.len(), 1);
        assert_eq!(snapshot.deck_count, 82);
        assert_eq!(updates.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_full_round_returns_to_human() {
        let (controller, _) = create_test_controller();
        play_human_turn(&controller);

        for seat in 1..NUM_SEATS {
            assert!(matches!(controller.step(), Step::CpuTurn { seat: s, .. } if s == seat));
        }
        assert_eq!(controller.step(), Step::HumanWaiting);
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
        assert_eq!(controller.snapshot().deck_count, 84 - 4);

        let journal = controller.journal();
        assert_eq!(journal.get_recent_by_type(10, EventType::Discard).len(), 4);
    }

    #[test]
    fn test_invalid_strategy_index_is_noop() {
        let game = shared(GameState::new(Some(3)));
        let cpus = vec![
            CpuPlayer::with_strategy(1, Box::new(OutOfRange), Some(1)),
            CpuPlayer::new(2, DiscardPolicy::Basic, Some(2)),
            CpuPlayer::new(3, DiscardPolicy::Basic, Some(3)),
        ];
        let controller = GameController::new(game, cpus, None);
        play_human_turn(&controller);

        assert_eq!(
            controller.step(),
            Step::CpuTurn {
                seat: 1,
                drew: true,
                discarded: false
            }
        );
        assert_eq!(hand_counts(&controller)[1], 14);
        assert_eq!(controller.status().current_seat, 2);

        // 下一輪不會再摸牌，手牌不會超過 14
        controller.step();
        controller.step();
        play_human_turn(&controller);
        assert_eq!(
            controller.step(),
            Step::CpuTurn {
                seat: 1,
                drew: false,
                discarded: false
            }
        );
        assert_eq!(hand_counts(&controller)[1], 14);
    }

    #[test]
    fn test_panicking_strategy_recovers() {
        let game = shared(GameState::new(Some(4)));
        let cpus = vec![
            CpuPlayer::with_strategy(1, Box::new(Panicking), Some(1)),
            CpuPlayer::new(2, DiscardPolicy::Basic, Some(2)),
            CpuPlayer::new(3, DiscardPolicy::Basic, Some(3)),
        ];
        let controller = GameController::new(game, cpus, None);
        play_human_turn(&controller);

        assert_eq!(controller.step(), Step::Recovered);
        assert_eq!(controller.status().current_seat, 2);

        let errors = controller.journal().get_recent_by_type(10, EventType::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("strategy exploded"));

        // 鎖仍然可用，下一位照常進行
        assert!(matches!(controller.step(), Step::CpuTurn { seat: 2, .. }));
    }

    #[test]
    fn test_missing_cpu_recovers() {
        let game = shared(GameState::new(Some(5)));
        let cpus = vec![CpuPlayer::new(2, DiscardPolicy::Basic, Some(2))];
        let controller = GameController::new(game, cpus, None);
        play_human_turn(&controller);

        assert_eq!(controller.step(), Step::Recovered);
        assert_eq!(controller.status().current_seat, 2);
        assert!(matches!(controller.step(), Step::CpuTurn { seat: 2, .. }));
    }

    #[test]
    fn test_game_over_step() {
        let (controller, updates) = create_test_controller();
        {
            let game = controller.game();
            let mut game = lock_game(&game);
            while game.draw_for_seat(0).is_some() {}
        }

        assert_eq!(controller.step(), Step::GameOver);
        assert_eq!(controller.step(), Step::GameOver);

        // 結束只記錄、通知一次
        let ends = controller.journal().get_recent_by_type(10, EventType::GameEnd);
        assert_eq!(ends.len(), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_turn_delay_clamped() {
        let (controller, _) = create_test_controller();
        assert_eq!(controller.turn_delay(), Duration::from_millis(1500));

        assert_eq!(controller.set_turn_delay(0.0), Duration::from_millis(100));
        assert_eq!(controller.turn_delay(), Duration::from_millis(100));

        controller.set_turn_delay(2.5);
        assert_eq!(controller.turn_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_start_stop() {
        let (controller, _) = create_test_controller();
        let mut controller = controller.with_timing(fast_timing());
        controller.set_turn_delay(0.1);

        assert!(!controller.is_running());
        controller.start();
        controller.start(); // no-op
        assert!(controller.is_running());
        assert!(controller.status().auto_play_active);

        let started = Instant::now();
        controller.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!controller.is_running());

        // Idle 時 stop 不做事
        controller.stop();
        assert!(!controller.is_running());
    }

    #[test]
    fn test_background_loop_plays_cpu_turns() {
        let (controller, _) = create_test_controller();
        let mut controller = controller.with_timing(fast_timing());
        controller.set_turn_delay(0.1);
        controller.start();

        play_human_turn(&controller);

        // 三家 CPU 各 0.1 秒，等待輪回玩家
        let deadline = Instant::now() + Duration::from_secs(5);
        while !controller.is_human_turn() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }

        assert!(controller.is_human_turn());
        controller.stop();

        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
        let snapshot = controller.snapshot();
        for seat in &snapshot.seats {
            assert_eq!(seat.discards.len(), 1);
        }
    }

    #[test]
    fn test_loop_exits_when_game_over() {
        let (controller, _) = create_test_controller();
        let mut controller = controller.with_timing(fast_timing());
        {
            let game = controller.game();
            lock_game(&game).deactivate();
        }

        controller.start();
        let deadline = Instant::now() + Duration::from_secs(2);
        while controller.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!controller.is_running());

        // 重新開始後可再次 start
        controller.new_game();
        assert!(controller.is_running());
        assert!(controller.status().game_active);
        controller.stop();
    }

    #[test]
    fn test_new_game_resets_table() {
        let (controller, _) = create_test_controller();
        let mut controller = controller.with_timing(fast_timing());
        play_human_turn(&controller);
        controller.step();

        controller.new_game();
        controller.stop();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.deck_count, 84);
        assert_eq!(snapshot.current_seat, HUMAN_SEAT);
        assert!(snapshot.seats.iter().all(|s| s.discards.is_empty()));
        assert_eq!(
            controller.journal().get_recent_by_type(10, EventType::GameStart).len(),
            2
        );
    }

    /// 第一次通知時卡住 `hold`，模擬畫面層更新很慢
    fn slow_first_update(hold: Duration) -> (UpdateCallback, Arc<AtomicBool>, Arc<AtomicBool>) {
        let armed = Arc::new(AtomicBool::new(false));
        let entered = Arc::new(AtomicBool::new(false));
        let (a, e) = (Arc::clone(&armed), Arc::clone(&entered));
        let callback: UpdateCallback = Arc::new(move || {
            if a.swap(false, Ordering::SeqCst) {
                e.store(true, Ordering::SeqCst);
                thread::sleep(hold);
            }
        });
        (callback, armed, entered)
    }

    fn create_slow_controller(hold: Duration) -> (GameController, Arc<AtomicBool>, Arc<AtomicBool>) {
        let game = shared(GameState::new(Some(12345)));
        let cpus = CpuPlayer::create_opponents(DiscardPolicy::Basic, Some(1));
        let (callback, armed, entered) = slow_first_update(hold);
        let controller = GameController::new(game, cpus, Some(callback)).with_timing(LoopTiming {
            stop_timeout: Duration::from_millis(100),
            ..fast_timing()
        });
        controller.set_turn_delay(0.1);
        (controller, armed, entered)
    }

    fn discard_counts(controller: &GameController) -> Vec<usize> {
        let game = controller.game();
        let game = lock_game(&game);
        (0..NUM_SEATS).map(|s| game.discard_count(s).unwrap()).collect()
    }

    fn wait_until(flag: &AtomicBool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !flag.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        flag.load(Ordering::SeqCst)
    }

    #[test]
    fn test_stop_timeout_finishes_turn_in_flight_only() {
        let (mut controller, armed, entered) = create_slow_controller(Duration::from_millis(600));
        play_human_turn(&controller);

        armed.store(true, Ordering::SeqCst);
        controller.start();
        assert!(wait_until(&entered, Duration::from_secs(2)));

        // 通知卡住，stop 逾時但不會再開始新的回合
        controller.stop();
        assert!(!controller.is_running());

        thread::sleep(Duration::from_millis(800));
        assert_eq!(discard_counts(&controller), vec![1, 1, 0, 0]);
        assert_eq!(controller.status().current_seat, 2);
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_restart_after_stop_timeout_never_double_plays() {
        let (mut controller, armed, entered) = create_slow_controller(Duration::from_millis(600));
        play_human_turn(&controller);

        armed.store(true, Ordering::SeqCst);
        controller.start();
        assert!(wait_until(&entered, Duration::from_secs(2)));
        controller.stop();
        assert!(!controller.is_running());

        // 新的 thread 先等舊的結束，此時 CPU2 還沒動
        controller.start();
        assert!(controller.is_running());
        assert_eq!(discard_counts(&controller)[2], 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !controller.is_human_turn() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(controller.is_human_turn());

        // 舊 thread 結束時不會清掉新的執行
        assert!(controller.is_running());
        controller.stop();

        assert_eq!(discard_counts(&controller), vec![1, 1, 1, 1]);
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);
        let cpu_turns = controller
            .journal()
            .get_recent_by_type(20, EventType::Turn)
            .into_iter()
            .filter(|e| e.seat != Some(HUMAN_SEAT))
            .count();
        assert_eq!(cpu_turns, 3);
    }

    #[test]
    fn test_revoked_run_does_not_act() {
        let (controller, updates) = create_test_controller();
        play_human_turn(&controller);
        let before = updates.load(Ordering::SeqCst);
        let turns = controller.journal().get_recent_by_type(10, EventType::Turn).len();

        assert_eq!(controller.engine.step(Some(999)), Step::Skipped);

        assert_eq!(controller.status().current_seat, 1);
        assert_eq!(controller.snapshot().deck_count, 83);
        assert_eq!(discard_counts(&controller), vec![1, 0, 0, 0]);
        assert_eq!(updates.load(Ordering::SeqCst), before);
        assert_eq!(
            controller.journal().get_recent_by_type(10, EventType::Turn).len(),
            turns
        );
    }

    #[test]
    fn test_cpu_turn_skipped_when_seat_moved() {
        let (controller, _) = create_test_controller();

        // 輪次不在座位 1 時，不摸牌也不捨牌
        assert_eq!(controller.engine.play_cpu_turn(1, None).unwrap(), None);
        assert_eq!(hand_counts(&controller), vec![13, 13, 13, 13]);

        controller.engine.advance_from(1);
        assert_eq!(controller.status().current_seat, HUMAN_SEAT);
    }

    #[test]
    fn test_status_serializes() {
        let (controller, _) = create_test_controller();
        assert!(controller.process_human_turn());

        let value = serde_json::to_value(controller.status()).unwrap();
        assert_eq!(value["mountain_count"], 83);
        assert_eq!(value["current_seat"], 0);
        assert_eq!(value["is_human_turn"], true);
        assert_eq!(value["game_active"], true);
        assert_eq!(value["auto_play_active"], false);
        assert_eq!(value["can_human_discard"], true);
        assert_eq!(
            value["current_player_name"],
            controller.status().current_player_name.as_str()
        );
    }
}
