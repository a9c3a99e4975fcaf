use std::sync::Arc;

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::game::observer::{GameObserver, GameSummary, MessageCategory, StateSnapshot};
use crate::message::{encode, parse_frame, ClientEvent};
use crate::room::room::Room;

pub struct WsClient {
    pub id: String,
    room: Room,
}

impl WsClient {
    pub fn new(id: String, room: Room) -> Self {
        Self { id, room }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ServerText(pub String);

impl Handler<ServerText> for WsClient {
    type Result = ();
    fn handle(&mut self, msg: ServerText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Actor for WsClient {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(client = %self.id, "client connected");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.room.reset_game();
        info!(client = %self.id, "client disconnected");
    }
}

/// Turns engine notifications into frames for one socket.
pub struct WsObserver {
    addr: Addr<WsClient>,
}

impl WsObserver {
    pub fn new(addr: Addr<WsClient>) -> Self {
        Self { addr }
    }

    fn send<T: Serialize>(&self, target: &str, payload: T) {
        match encode(target, payload) {
            Ok(frame) => self.addr.do_send(ServerText(frame)),
            Err(e) => warn!(target, error = %e, "could not encode frame"),
        }
    }
}

impl GameObserver for WsObserver {
    fn on_state_change(&self, snapshot: &StateSnapshot) {
        self.send("state", snapshot);
    }

    fn on_question(&self, text: &str) {
        self.send("question", json!({ "text": text }));
    }

    fn on_options(&self, text: &str, options: &[String]) {
        self.send("options", json!({ "text": text, "options": options }));
    }

    fn on_game_message(&self, text: &str, category: MessageCategory) {
        self.send("message", json!({ "text": text, "category": category }));
    }

    fn on_game_end(&self, summary: &GameSummary) {
        self.send("gameEnd", summary);
    }
}

impl WsClient {
    fn reply<T: Serialize>(ctx: &mut ws::WebsocketContext<Self>, target: &str, payload: T) {
        match encode(target, payload) {
            Ok(frame) => ctx.text(frame),
            Err(e) => warn!(target, error = %e, "could not encode frame"),
        }
    }

    fn reject(ctx: &mut ws::WebsocketContext<Self>, reason: impl ToString) {
        Self::reply(ctx, "error", json!({ "reason": reason.to_string() }));
    }

    fn handle_text(&mut self, raw: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let event = match parse_frame(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(client = %self.id, error = %e, "bad frame");
                Self::reject(ctx, e);
                return;
            }
        };

        match event {
            ClientEvent::StartGame(payload) => {
                let observer = Arc::new(WsObserver::new(ctx.address()));
                let started = payload
                    .into_settings()
                    .and_then(|settings| self.room.start_game(&settings, observer));
                match started {
                    Ok(()) => info!(client = %self.id, "game started"),
                    Err(e) => {
                        warn!(client = %self.id, error = %e, "game setup rejected");
                        Self::reject(ctx, e);
                    }
                }
            }
            ClientEvent::Answer(value) => {
                if !self.room.submit_answer(value) {
                    debug!(client = %self.id, "answer with no pending question");
                    Self::reply(ctx, "answerRejected", json!({}));
                }
            }
            ClientEvent::Reset => self.room.reset_game(),
            ClientEvent::RawUnknown(target) => {
                debug!(client = %self.id, %target, "unhandled event");
                Self::reject(ctx, format!("unknown target `{target}`"));
            }
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsClient {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Text(raw)) => self.handle_text(&raw, ctx),
            Ok(ws::Message::Close(reason)) => {
                debug!(client = %self.id, ?reason, "close frame");
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!(client = %self.id, error = %e, "protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}
