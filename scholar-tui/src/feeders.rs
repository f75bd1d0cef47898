use crate::tui::TuiMsg;
use std::time::Duration;
use tokio::{sync::mpsc, time};

const INPUT_POLL: Duration = Duration::from_millis(100);
const TICK: Duration = Duration::from_millis(80);

/// Terminal events come from one dedicated thread; ticks from a tokio task.
/// Both stop once the receiving loop is gone.
pub fn spawn_tui_feeders(tx: mpsc::Sender<TuiMsg>) {
    let tx_in = tx.clone();
    let spawned = std::thread::Builder::new()
        .name("tui-input".into())
        .spawn(move || {
            while !tx_in.is_closed() {
                match crossterm::event::poll(INPUT_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        let _ = tx_in.blocking_send(TuiMsg::InputError(e.to_string()));
                        break;
                    }
                }
                let msg = match crossterm::event::read() {
                    Ok(ev) => TuiMsg::InputEvent(ev),
                    Err(e) => TuiMsg::InputError(e.to_string()),
                };
                if tx_in.blocking_send(msg).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "tui.input.spawn_failed");
    }

    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            interval.tick().await;
            // a full queue just means the loop is busy; drop the tick
            if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(TuiMsg::Tick) {
                break;
            }
        }
    });
}
