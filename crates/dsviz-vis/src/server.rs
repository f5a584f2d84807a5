//! Axum web server with WebSocket streaming of animation frames.

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dsviz_engine::{Engine, StructureKind};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::animator::Frame;
use crate::config::VisConfig;
use crate::error::Error;
use crate::playback::{PlaybackSpeed, PlaybackStatus};
use crate::session::{Command, CommandReport, Session, SessionView};

/// Frames buffered per subscriber before it starts lagging.
const FRAME_BUFFER: usize = 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Shared application state.
pub struct AppState {
    session: RwLock<Session>,
    frames: broadcast::Sender<Frame>,
}

impl AppState {
    pub fn new(config: &VisConfig) -> Self {
        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        Self {
            session: RwLock::new(Session::new(config, frames.clone())),
            frames,
        }
    }
}

/// Visualization server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    pub fn new(config: &VisConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/status", get(status_handler))
            .route("/api/structures", get(structures_handler))
            .route("/api/session", post(session_handler))
            .route("/api/snapshot", get(snapshot_handler))
            .route("/api/command", post(command_handler))
            .route("/api/playback", get(playback_status_handler))
            .route("/api/playback/stop", post(stop_handler))
            .route("/api/playback/seek", post(seek_handler))
            .route("/api/playback/speed", post(speed_handler))
            .route("/api/playback/step", post(step_handler))
            // WebSocket for live frames
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the given port.
    pub async fn serve(self, port: u16) -> crate::Result<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Visualization server running on http://localhost:{}", port);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

fn reject(err: Error) -> (StatusCode, String) {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        debug!(error = %err, "request rejected");
    }
    (status, err.to_string())
}

/// Server status response.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    structure: StructureKind,
    size: usize,
    busy: bool,
    speed: PlaybackSpeed,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let session = state.session.read().await;
    Json(StatusResponse {
        status: "ok",
        structure: session.kind(),
        size: session.engine().len(),
        busy: session.is_busy(),
        speed: session.speed(),
    })
}

#[derive(Serialize)]
struct StructureInfo {
    key: StructureKind,
    numeric: bool,
}

async fn structures_handler() -> Json<Vec<StructureInfo>> {
    Json(
        StructureKind::ALL
            .into_iter()
            .map(|key| StructureInfo {
                key,
                numeric: key.is_numeric(),
            })
            .collect(),
    )
}

#[derive(Deserialize)]
struct SessionRequest {
    kind: String,
}

async fn session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<SessionView> {
    let kind: StructureKind = req.kind.parse().map_err(|e| reject(Error::from(e)))?;
    let mut session = state.session.write().await;
    session.switch(kind);
    Ok(Json(session.view()))
}

async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let session = state.session.read().await;
    Json(session.view())
}

async fn command_handler(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> ApiResult<CommandReport> {
    let mut session = state.session.write().await;
    session.apply(command).map(Json).map_err(reject)
}

async fn playback_status_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let session = state.session.read().await;
    Json(PlaybackStatus::from(session.playback()))
}

async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<PlaybackStatus> {
    let mut session = state.session.write().await;
    session.playback_mut().stop();
    Json(PlaybackStatus::from(session.playback()))
}

#[derive(Deserialize)]
struct SeekRequest {
    frame: usize,
}

async fn seek_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Json<PlaybackStatus> {
    let mut session = state.session.write().await;
    session.playback_mut().seek(req.frame);
    Json(PlaybackStatus::from(session.playback()))
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: PlaybackSpeed,
}

async fn speed_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Json<PlaybackStatus> {
    let mut session = state.session.write().await;
    session.set_speed(req.speed);
    Json(PlaybackStatus::from(session.playback()))
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum StepDirection {
    Forward,
    Backward,
}

#[derive(Deserialize)]
struct StepRequest {
    direction: StepDirection,
}

async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StepRequest>,
) -> Json<PlaybackStatus> {
    let mut session = state.session.write().await;
    match req.direction {
        StepDirection::Forward => {
            session.playback_mut().step_forward();
        }
        StepDirection::Backward => session.playback_mut().step_backward(),
    }
    Json(PlaybackStatus::from(session.playback()))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket client connected");
    let mut frames = state.frames.subscribe();

    let view = state.session.read().await.view();
    if let Err(e) = send_response(&mut socket, &WsResponse::Snapshot(view)).await {
        warn!("Failed to send initial snapshot: {}", e);
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<WsCommand>(&text) {
                            Ok(cmd) => handle_ws_command(&state, cmd).await,
                            Err(e) => {
                                debug!("Unparseable client message: {}", e);
                                WsResponse::Error { message: e.to_string() }
                            }
                        };
                        if let Err(e) = send_response(&mut socket, &response).await {
                            warn!("Failed to send response: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            frame = frames.recv() => {
                match frame {
                    Ok(frame) => {
                        if let Err(e) = send_response(&mut socket, &WsResponse::Frame(frame)).await {
                            warn!("Failed to send frame: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagging, frames dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send_response(socket: &mut WebSocket, response: &WsResponse) -> Result<(), axum::Error> {
    let json = serde_json::to_string(response).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WsCommand {
    #[serde(rename = "get_snapshot")]
    GetSnapshot,
    #[serde(rename = "get_status")]
    GetStatus,
    #[serde(rename = "seek")]
    Seek { frame: usize },
    #[serde(rename = "command")]
    Command { command: Command },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum WsResponse {
    #[serde(rename = "snapshot")]
    Snapshot(SessionView),
    #[serde(rename = "status")]
    Status(PlaybackStatus),
    #[serde(rename = "frame")]
    Frame(Frame),
    #[serde(rename = "report")]
    Report(CommandReport),
    #[serde(rename = "error")]
    Error { message: String },
}

async fn handle_ws_command(state: &Arc<AppState>, cmd: WsCommand) -> WsResponse {
    match cmd {
        WsCommand::GetSnapshot => {
            let session = state.session.read().await;
            WsResponse::Snapshot(session.view())
        }
        WsCommand::GetStatus => {
            let session = state.session.read().await;
            WsResponse::Status(PlaybackStatus::from(session.playback()))
        }
        WsCommand::Seek { frame } => {
            let mut session = state.session.write().await;
            session.playback_mut().seek(frame);
            WsResponse::Status(PlaybackStatus::from(session.playback()))
        }
        WsCommand::Command { command } => {
            let mut session = state.session.write().await;
            match session.apply(command) {
                Ok(report) => WsResponse::Report(report),
                Err(e) => WsResponse::Error {
                    message: e.to_string(),
                },
            }
        }
    }
}
