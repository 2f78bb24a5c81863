use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use editmesh_core::geometry::{Point3, Vector3, ViewState};
use editmesh_core::mesh::primitives::cube;
use editmesh_core::mesh::{EditMesh, SelectMode};
use editmesh_core::scene::{EditContext, EditObject};
use editmesh_core::EditSession;
use futures::{sink::SinkExt, stream::StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

mod commands;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

// Application State
struct AppState {
    session: Mutex<EditSession>,
}

impl AppState {
    fn session(&self) -> MutexGuard<'_, EditSession> {
        // A panic mid-command leaves the session usable; keep serving it.
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn initial_session() -> EditSession {
    let view = ViewState::perspective(
        Point3::new(7.0, -7.0, 5.0),
        Point3::origin(),
        Vector3::z(),
        std::f64::consts::FRAC_PI_4,
        1280.0,
        720.0,
    );
    let mut context = EditContext::default().with_view(view);
    match cube(2.0) {
        Ok(mut mesh) => {
            mesh.select_all();
            context.object = Some(EditObject::new("Cube", EditMesh::new(mesh, SelectMode::Vertex)));
        }
        Err(e) => warn!("Starting without a mesh: {}", e),
    }
    EditSession::new(context)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let shared_state = Arc::new(AppState {
        session: Mutex::new(initial_session()),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr_str = std::env::var("EDITMESH_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid EDITMESH_ADDR '{}': {}", addr_str, e);
            return;
        }
    };

    info!("listening on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

async fn root() -> &'static str {
    "Hello from EditMesh Backend!"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4();
    info!(%client_id, "Client connected");
    let (mut sender, mut receiver) = socket.split();

    // Initial state
    let greeting = commands::handle_command(&mut state.session(), "REFRESH");
    for msg in greeting {
        if sender.send(Message::Text(msg)).await.is_err() {
            return;
        }
    }

    while let Some(msg) = receiver.next().await {
        let msg = if let Ok(msg) = msg {
            msg
        } else {
            return;
        };

        if let Message::Text(text) = msg {
            info!(%client_id, "Received message: {}", text);

            // Lock only while the command runs, not across sends.
            let responses = commands::handle_command(&mut state.session(), &text);
            for response in responses {
                if sender.send(Message::Text(response)).await.is_err() {
                    return;
                }
            }
        }
    }
    info!(%client_id, "Client disconnected");
}
