pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod message;
pub mod room;
pub mod types;
mod utils;
pub mod ws;

use actix_web::{web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws as actix_ws;
use uuid::Uuid;

use ai::DecisionProvider;
use config::Config;
use room::room::{decision_provider, Room};
use ws::client::WsClient;

async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    decisions: web::Data<DecisionProvider>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    let client = WsClient::new(id, Room::new(decisions.get_ref().clone()));
    actix_ws::start(client, &req, stream)
}

/// Binds the game server. Every `/ws` connection gets its own room.
pub async fn run_on(bind_addr: &str, config: &Config) -> std::io::Result<actix_web::dev::Server> {
    let decisions = web::Data::new(decision_provider(config));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(decisions.clone())
            .route("/ws", web::get().to(ws_handler))
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
