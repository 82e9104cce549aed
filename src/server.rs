use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{routes, Build, Rocket};
use tracing::{error, info};

use crate::api::{disease, health, labels, load_model, model_info, predict};
use crate::app_state::AppState;
use crate::config::ServiceConfig;

/// Routes over an already constructed state; no startup loading.
pub fn build(figment: Figment, state: Arc<AppState>) -> Rocket<Build> {
    mount(rocket::custom(figment), state)
}

/// Server that reads its configuration and loads the model during ignition,
/// before any request is accepted. A failed load leaves the server up and
/// answering 503 until `POST /model/load` succeeds.
pub fn rocket() -> Rocket<Build> {
    rocket::custom(ServiceConfig::figment()).attach(AdHoc::try_on_ignite(
        "Diagnosis model",
        |rocket| async move {
            let config = match ServiceConfig::from_figment(rocket.figment()) {
                Ok(config) => config,
                Err(err) => {
                    error!(error = %err, "invalid service configuration");
                    return Err(rocket);
                }
            };
            info!(
                image_size = config.image_size,
                device = ?config.device,
                partial_weights = config.partial_weights,
                "service configured"
            );

            let state = AppState::new(config);
            // a failure is recorded in the state and served as 503
            let _ = state.load_model().await;

            Ok(mount(rocket, state))
        },
    ))
}

fn mount(rocket: Rocket<Build>, state: Arc<AppState>) -> Rocket<Build> {
    rocket.manage(state).mount(
        "/",
        routes![
            health,
            predict,
            model_info,
            load_model,
            labels,
            disease,
        ],
    )
}
