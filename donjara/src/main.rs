use donjara::config::AppConfig;
use donjara::console::{ConsoleSession, console_notifier};
use donjara::controller::{GameController, Journal, shared};
use donjara::game::GameState;
use donjara::settings::Settings;
use log::{error, info};
use std::io;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("[CONSOLE] Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "[CONSOLE] Difficulty {}, turn delay {:.1}s",
        config.difficulty,
        config.turn_delay.as_secs_f64()
    );

    let settings = Settings::load(&config.settings_path);
    let game = shared(GameState::new(config.seed));
    let journal = Journal::new();
    let notifier = console_notifier(game.clone(), journal.clone());
    let controller = GameController::from_config(game, &config, journal, Some(notifier));

    let mut session = ConsoleSession::new(controller, settings, io::stdout());
    if let Err(e) = session.run(io::stdin().lock()) {
        error!("[CONSOLE] Failed to read input: {}", e);
        std::process::exit(1);
    }
}
