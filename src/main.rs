use anyhow::Result;
use skycast_services::{Dashboard, PlaceStatus, WeatherState};
use skycast_weather::PlaceQuery;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    // Missing secrets or invalid config abort here
    let mut app = match skycast_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("{}", e.user_message());
            return Err(e.into());
        }
    };
    let dashboard = Dashboard::from_app(&app)?;

    tracing::info!("SkyCast started");
    tracing::info!("  Config directory: {}", app.config().config_dir.display());
    if let Some(user) = dashboard.auth().user() {
        tracing::info!("  Signed in as {}", user.email);
    }

    // Places named on the command line are shown for this session only
    for arg in std::env::args().skip(1) {
        dashboard.show_place(PlaceQuery::parse(&arg));
    }
    dashboard.start();

    let mut updates = dashboard.weather().subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                log_state(&dashboard, &state);
            }
        }
    }

    // Graceful shutdown
    dashboard.shutdown().await;
    app.shutdown()?;

    Ok(())
}

fn log_state(dashboard: &Dashboard, state: &WeatherState) {
    let mut keys: Vec<&String> = state.loading.keys().collect();
    keys.sort();

    for key in keys {
        match state.status(key) {
            PlaceStatus::Ready => {
                if let Some(record) = state.record(key) {
                    tracing::info!(
                        "{}: {} {} ({})",
                        key,
                        dashboard.display_temperature(record.temperature),
                        record.condition,
                        record.description
                    );
                    if let Some(air) = &record.air_quality {
                        tracing::info!("{}: air quality {}", key, air.category().label());
                    }
                    if let (Some(sunrise), Some(sunset)) = (record.sunrise_at(), record.sunset_at()) {
                        tracing::info!(
                            "{}: sunrise {} UTC, sunset {} UTC",
                            key,
                            sunrise.format("%H:%M"),
                            sunset.format("%H:%M")
                        );
                    }
                    tracing::debug!("{}: icon {}", key, record.icon_url());
                }
            }
            PlaceStatus::Failed => {
                tracing::warn!("{}: {}", key, state.error(key).unwrap_or_default());
            }
            PlaceStatus::Loading | PlaceStatus::Idle => {}
        }
    }
}
