// Keyboard teleop: WASD walk/turn, R/F speed, E/C stride, T/G lift,
// space stop, Q quit. Each key press publishes one command word.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use hexapod_zenoh_runtime::config::TOPIC_CMD_GAIT;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_GAIT).await?;

    info!("Controls: WASD=walk/turn, R/F=speed, E/C=stride, T/G=lift, space=stop, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        // Poll for a key with a short timeout so Ctrl+C stays responsive
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press && kind != KeyEventKind::Repeat {
            continue;
        }

        let word = match code {
            KeyCode::Char('w') => "forward",
            KeyCode::Char('s') => "back",
            KeyCode::Char('a') => "left",
            KeyCode::Char('d') => "right",
            KeyCode::Char('r') => "faster",
            KeyCode::Char('f') => "slower",
            KeyCode::Char('e') => "more",
            KeyCode::Char('c') => "less",
            KeyCode::Char('t') => "higher",
            KeyCode::Char('g') => "lower",
            KeyCode::Char(' ') => "stop",
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => continue,
        };

        info!("-> {}", word);
        publisher.put(word.to_string()).await?;
    }

    Ok(())
}
