use crate::AppState;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Periodically writes the dataset back to disk once something has changed.
pub async fn flush(app_state: AppState, every: Duration) -> ! {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match do_tick(&app_state).await {
            Ok(true) => debug!("flush do_tick wrote dataset"),
            Ok(false) => trace!("flush do_tick: nothing to write"),
            Err(e) => error!("flush do_tick failed: {}", e),
        }
    }
}

async fn do_tick(app_state: &AppState) -> anyhow::Result<bool> {
    let store = app_state.store.clone();
    Ok(tokio::task::spawn_blocking(move || store.flush()).await??)
}
