use rocket::{
    figment::Figment,
    get,
    http::Status,
    launch,
    response::status::Custom,
    routes,
    serde::json::Json,
    tokio::task::spawn_blocking,
};
use serde_json::{Value, json};
use server_status::agent::{AgentSettings, HostStatus};
use tracing::{error, info, instrument, level_filters::LevelFilter};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[get("/status")]
#[instrument]
async fn status() -> Result<Json<HostStatus>, Custom<Json<Value>>> {
    match spawn_blocking(HostStatus::collect).await {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            error!("error fetching server status: {e}");
            Err(Custom(
                Status::InternalServerError,
                Json(json!({
                    "status": "error",
                    "message": "Failed to get server status",
                })),
            ))
        }
    }
}

#[get("/ping")]
fn ping() {}

fn log_filter() -> filter::Targets {
    filter::Targets::new().with_targets(vec![
        ("server_status", LevelFilter::DEBUG),
        (module_path!(), LevelFilter::DEBUG),
        ("rocket", LevelFilter::INFO),
    ])
}

fn init() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(true),
        )
        .with(log_filter())
        .init();
}

fn get_config(settings: AgentSettings) -> Figment {
    rocket::Config::figment()
        .merge(("port", settings.port))
        .merge(("address", settings.addr))
        .merge(("workers", 1))
}

#[launch]
fn rocket() -> _ {
    init();
    let settings = AgentSettings::from_env();
    info!(
        "status agent listening on {}:{}, endpoint /status",
        settings.addr, settings.port
    );

    rocket::custom(get_config(settings)).mount("/", routes![status, ping])
}
