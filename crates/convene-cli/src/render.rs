//! Terminal rendering of session notifications.

use convene_common::{DisplaySource, Notification, Participant};

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn roster_line(participant: &Participant) -> String {
    format!(
        "  [{}] {} ({}) mic {} / camera {}",
        participant.initials(),
        participant.name,
        participant.role_label(),
        on_off(participant.audio_enabled),
        on_off(participant.video_enabled),
    )
}

/// Human-readable rendering. Clock ticks are suppressed.
pub fn render_text(notification: &Notification) -> Option<String> {
    let line = match notification {
        Notification::SessionStarted { meeting_id } => format!("joined meeting {meeting_id}"),
        Notification::MediaStatusChanged(status) => format!(
            "mic {}, camera {}",
            on_off(status.audio_enabled),
            on_off(status.video_enabled)
        ),
        Notification::RosterChanged { participants } => {
            let mut out = format!("participants ({})", participants.len());
            for participant in participants {
                out.push('\n');
                out.push_str(&roster_line(participant));
            }
            out
        }
        Notification::ChatAppended(message) => format!(
            "[{}] {}: {}",
            message.timestamp_label(),
            message.sender,
            message.text
        ),
        Notification::PanelChanged { open: Some(panel) } => format!("{panel} panel open"),
        Notification::PanelChanged { open: None } => "panels closed".to_string(),
        Notification::ClockTick { .. } => return None,
        Notification::ShareStateChanged {
            sharing,
            display_source,
        } => {
            let source = match display_source {
                DisplaySource::ScreenShare => "screen",
                DisplaySource::Capture => "camera",
                DisplaySource::None => "nothing",
            };
            format!("screen share {}, showing {source}", on_off(*sharing))
        }
        Notification::PermissionRequired { message } => {
            format!("{message} (type `retry`)")
        }
        Notification::SessionEnded { elapsed } => format!("left meeting after {elapsed}"),
        Notification::Error { message, .. } => format!("error: {message}"),
    };
    Some(line)
}
