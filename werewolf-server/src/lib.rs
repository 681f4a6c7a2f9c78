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
use tracing::info;
use uuid::Uuid;

use room::{RoomRegistry, SharedRegistry};
use ws::client::WsClient;

async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<SharedRegistry>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!(player = %id, "connected");
    let client = WsClient::new(id, registry.get_ref().clone());
    actix_ws::start(client, &req, stream)
}

pub async fn run_on(bind_addr: &str) -> std::io::Result<actix_web::dev::Server> {
    let registry = RoomRegistry::shared();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .route("/ws", web::get().to(ws_handler))
    })
    .bind(bind_addr)?
    .run();

    info!(bind = %bind_addr, "listening");
    Ok(server)
}
