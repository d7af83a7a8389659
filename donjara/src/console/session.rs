//! Console Session - 文字介面主迴圈
//!
//! 從輸入逐行讀取指令，操作 controller，結果寫回輸出。

use super::commands::{
    ParsedCommand, format_images, format_logs, format_status, help_message, parse_command,
};
use super::render::{format_hand, format_table};
use crate::controller::{
    GameController, Journal, LogEntry, SharedGame, UpdateCallback, lock_game,
};
use crate::settings::Settings;
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 處理完一行後是否繼續
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 牌局更新通知：印出上次通知後的新事件，輪到玩家摸牌時提示
pub fn console_notifier(game: SharedGame, journal: Journal) -> UpdateCallback {
    let shown = AtomicU64::new(0);
    Arc::new(move || {
        for entry in unseen_entries(&journal, &shown) {
            println!("{}", entry.format());
        }

        let game = lock_game(&game);
        if game.current_player().is_human() && game.can_draw() && !game.human_player().can_discard()
        {
            println!("Your turn: DRAW, then DISCARD <n|tile>");
        }
    })
}

/// 序號大於 `shown` 的事件，並把 `shown` 推進到最後一筆
fn unseen_entries(journal: &Journal, shown: &AtomicU64) -> Vec<LogEntry> {
    let entries = journal.since(shown.load(Ordering::SeqCst));
    if let Some(last) = entries.last() {
        shown.fetch_max(last.seq, Ordering::SeqCst);
    }
    entries
}

/// 單一文字介面 session
pub struct ConsoleSession<W: Write> {
    controller: GameController,
    settings: Settings,
    out: W,
}

impl<W: Write> ConsoleSession<W> {
    pub fn new(controller: GameController, settings: Settings, out: W) -> Self {
        Self {
            controller,
            settings,
            out,
        }
    }

    fn send(&mut self, message: &str) {
        let msg = if message.ends_with('\n') {
            message.to_string()
        } else {
            format!("{}\n", message)
        };

        if let Err(e) = self.out.write_all(msg.as_bytes()) {
            warn!("[CONSOLE] Failed to write output: {}", e);
        }
        let _ = self.out.flush();
    }

    fn send_prompt(&mut self) {
        let _ = self.out.write_all(b"donjara> ");
        let _ = self.out.flush();
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 處理一行輸入
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match parse_command(line) {
            ParsedCommand::Help => {
                self.send(&help_message());
            }

            ParsedCommand::Status => {
                let status = self.controller.status();
                let delay = self.controller.turn_delay().as_secs_f64();
                self.send(&format_status(&status, delay));
            }

            ParsedCommand::Table => {
                let snapshot = self.controller.snapshot();
                self.send(&format_table(&snapshot));
            }

            ParsedCommand::Hand => {
                let snapshot = self.controller.snapshot();
                self.send(&format_hand(snapshot.human()));
            }

            ParsedCommand::Draw => {
                if self.controller.process_human_turn() {
                    let snapshot = self.controller.snapshot();
                    match snapshot.human().hand.last() {
                        Some(tile) => self.send(&format!("OK: Drew {}", tile.kind().label())),
                        None => self.send("OK: Drew a tile"),
                    }
                    self.send(&format_hand(snapshot.human()));
                } else if !self.controller.is_human_turn() {
                    self.send("ERROR: Not your turn");
                } else {
                    self.send("ERROR: Cannot draw now");
                }
            }

            ParsedCommand::Discard(arg) => {
                if !self.controller.can_human_discard() {
                    self.send("ERROR: Draw a tile on your turn first");
                } else {
                    let snapshot = self.controller.snapshot();
                    match arg.resolve(&snapshot.human().hand) {
                        Some(target) if self.controller.human_discard(target) => {
                            self.send("OK: Discarded");
                        }
                        Some(_) => self.send("ERROR: Discard failed"),
                        None => self.send("ERROR: No such tile in your hand"),
                    }
                }
            }

            ParsedCommand::Auto => {
                if self.controller.is_running() {
                    self.controller.stop();
                    self.send("OK: Auto-play stopped");
                } else {
                    self.controller.start();
                    self.send("OK: Auto-play started");
                }
            }

            ParsedCommand::Delay(secs) => {
                let delay = self.controller.set_turn_delay(secs);
                self.send(&format!("OK: Turn delay {:.1}s", delay.as_secs_f64()));
            }

            ParsedCommand::New => {
                self.controller.new_game();
                self.send("OK: New game dealt");
            }

            ParsedCommand::Logs(count, event_type) => {
                let text = format_logs(self.controller.journal(), count, event_type);
                self.send(&text);
            }

            ParsedCommand::Images => {
                let text = format_images(&self.settings);
                self.send(&text);
            }

            ParsedCommand::ImageSet(kind, path) => {
                match self.settings.set_custom_image(kind, path) {
                    Ok(()) => self.send(&format!("OK: Custom image set for {}", kind)),
                    Err(e) => self.send(&format!("ERROR: {}", e)),
                }
            }

            ParsedCommand::ImageClear(Some(kind)) => {
                match self.settings.remove_custom_image(kind) {
                    Ok(true) => self.send(&format!("OK: Custom image cleared for {}", kind)),
                    Ok(false) => self.send(&format!("ERROR: No custom image for {}", kind)),
                    Err(e) => self.send(&format!("ERROR: {}", e)),
                }
            }

            ParsedCommand::ImageClear(None) => match self.settings.clear_all_custom_images() {
                Ok(()) => self.send("OK: All custom images cleared"),
                Err(e) => self.send(&format!("ERROR: {}", e)),
            },

            ParsedCommand::Quit => {
                self.send("Goodbye!");
                return Flow::Quit;
            }

            ParsedCommand::Unknown(msg) => {
                if !msg.is_empty() {
                    self.send(&format!("ERROR: {}", msg));
                }
            }
        }

        Flow::Continue
    }

    /// 讀取輸入直到 QUIT 或 EOF，結束時停止自動進行
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        self.send("=== Donjara ===");
        self.send("Type 'HELP' for commands.");
        self.controller.start();
        self.send_prompt();

        for line in input.lines() {
            let line = line?;
            if self.handle_line(&line) == Flow::Quit {
                break;
            }
            self.send_prompt();
        }

        self.controller.stop();
        info!("[CONSOLE] Session ended");
        Ok(())
    }
}
