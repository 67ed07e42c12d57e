//! Texts of the system turns narrating the connection.

use std::time::Duration;

use palaver_transport::CloseInfo;

pub const CONNECTED: &str = "Connected to the assistant.";
pub const NOT_SENT: &str =
    "Message not sent: not connected to the assistant.";
pub const GAVE_UP: &str = "Could not reconnect to the assistant.";

pub fn closed(info: Option<&CloseInfo>) -> String {
    match info {
        Some(info) if !info.reason.is_empty() => {
            format!("Connection closed ({}: {}).", info.code, info.reason)
        }
        Some(info) => format!("Connection closed ({}).", info.code),
        None => "Connection closed.".to_owned(),
    }
}

pub fn errored(info: &str) -> String {
    format!("Connection error: {info}")
}

pub fn no_response(timeout: Duration) -> String {
    format!(
        "No response from the assistant within {}s.",
        timeout.as_secs_f32()
    )
}

pub fn reconnecting(delay: Duration, attempt: u32) -> String {
    format!(
        "Reconnecting in {:.1}s (attempt {attempt})...",
        delay.as_secs_f32()
    )
}
