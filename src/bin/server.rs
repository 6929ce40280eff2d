extern crate geoql;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_state = geoql::init_env()?;
    geoql::run_server(&app_state).await
}
