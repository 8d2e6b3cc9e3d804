//! Convene CLI: join a simulated meeting and print what a renderer would show.

#![forbid(unsafe_code)]

mod render;

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use convene_common::Panel;
use convene_session::{
    MediaAccessError, ScriptedFeed, SessionConfig, SessionController, SessionHandle,
    SessionIdentity, SessionPhase, SyntheticBackend, UserAction,
};
use tokio::sync::{broadcast, oneshot};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "convene")]
#[command(about = "Join a simulated Convene meeting")]
struct Args {
    /// Meeting identifier
    #[arg(long, env = "CONVENE_MEETING_ID")]
    meeting_id: Option<String>,

    /// Session token
    #[arg(long, env = "CONVENE_TOKEN")]
    token: Option<String>,

    /// Meeting link carrying `meetingId` and `token` in its fragment or query
    #[arg(long)]
    url: Option<String>,

    /// Local display name
    #[arg(long, default_value = convene_session::types::DEFAULT_DISPLAY_NAME)]
    name: String,

    /// Leave after this many seconds
    #[arg(long, default_value_t = 8)]
    duration: u64,

    /// Decline the first capture request
    #[arg(long, default_value_t = false)]
    deny_permission: bool,

    /// Simulate an environment without capture devices
    #[arg(long, default_value_t = false)]
    unsupported: bool,

    /// Print notifications as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Read actions from stdin: audio, video, share, retry, chat <text>,
    /// panel <chat|participants>, close <chat|participants>, leave
    #[arg(long, default_value_t = false)]
    control_stdin: bool,
}

fn parse_panel(value: &str) -> Result<Panel, String> {
    match value {
        "chat" => Ok(Panel::Chat),
        "participants" | "people" => Ok(Panel::Participants),
        other => Err(format!("unknown panel `{other}`")),
    }
}

fn parse_action_line(line: &str) -> Result<UserAction, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err("empty command".into());
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command {
        "audio" | "mic" => Ok(UserAction::ToggleAudio),
        "video" | "camera" => Ok(UserAction::ToggleVideo),
        "share" => Ok(UserAction::ToggleScreenShare),
        "retry" => Ok(UserAction::RetryPermission),
        "leave" | "quit" => Ok(UserAction::Leave),
        "chat" if rest.is_empty() => Err("chat needs a message".into()),
        "chat" => Ok(UserAction::SendChat(rest.to_string())),
        "panel" => parse_panel(rest).map(UserAction::TogglePanel),
        "close" => parse_panel(rest).map(UserAction::ClosePanel),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn spawn_stdin_actions(handle: SessionHandle) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_action_line(&line) {
                Ok(action) => {
                    if !handle.send(action) {
                        break;
                    }
                }
                Err(e) => eprintln!("invalid command: {}", e),
            }
        }
    });
}

fn spawn_renderer(
    mut rx: broadcast::Receiver<convene_common::Notification>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    if json {
                        match notification.to_json() {
                            Ok(line) => println!("{}", line),
                            Err(e) => warn!("failed to encode notification: {}", e),
                        }
                    } else if let Some(text) = render::render_text(&notification) {
                        println!("{}", text);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn main() -> Result<()> {
    convene_common::init_tracing();

    let args = Args::parse();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let (meeting_id, token) = match SessionIdentity::resolve(
        args.meeting_id.clone(),
        args.token.clone(),
        args.url.as_deref(),
    ) {
        Ok(identity) => (identity.meeting_id().to_string(), identity.token().to_string()),
        Err(e) => {
            // The controller reports missing credentials itself.
            warn!("no usable meeting credentials: {}", e);
            (
                args.meeting_id.unwrap_or_default(),
                args.token.unwrap_or_default(),
            )
        }
    };

    let backend = SyntheticBackend::new();
    if args.unsupported {
        backend.fail_next_capture(MediaAccessError::Unsupported(
            "no capture devices".into(),
        ));
    } else if args.deny_permission {
        backend.fail_next_capture(MediaAccessError::PermissionDenied);
    }

    let config = SessionConfig {
        display_name: args.name,
        ..SessionConfig::default()
    };
    let controller =
        SessionController::new(config, Arc::new(backend), Box::new(ScriptedFeed::demo()));
    let handle = controller.handle();
    let renderer = spawn_renderer(controller.subscribe(), args.json);

    if args.control_stdin {
        spawn_stdin_actions(handle.clone());
    }

    let (stop_tx, stop_rx) = oneshot::channel();
    let duration = Duration::from_secs(args.duration);
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => info!("session duration reached"),
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }
        let _ = stop_tx.send(());
    });

    handle.join(meeting_id, token);
    let controller = controller.run_with_shutdown(stop_rx).await;
    let phase = controller.phase().clone();
    drop(controller);
    drop(handle);
    renderer.await?;

    match phase {
        SessionPhase::Failed { message } => Err(anyhow!(message)),
        _ => Ok(()),
    }
}
