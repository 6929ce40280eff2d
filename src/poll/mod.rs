use crate::AppState;
use tokio::task::spawn;
use tokio::time::Duration;

pub mod flush;
use flush::flush;

pub fn start(app_state: &AppState) -> anyhow::Result<()> {
    if app_state.store.persist_dir().is_some() {
        let every = Duration::from_secs(app_state.config.flush_secs.max(1));
        info!("flushing changes every {:?}", every);
        spawn(flush(app_state.clone(), every));
    } else {
        info!("persistence disabled; changes stay in memory");
    }
    Ok(())
}
