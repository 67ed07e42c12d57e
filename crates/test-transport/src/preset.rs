use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the fake backend answers one submitted frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// Frames sent back, in order. Empty means the backend stays silent.
    pub frames: Vec<String>,
    /// Delay before the first frame, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PresetReply {
    /// Creates a reply made of the given frames.
    #[inline]
    pub fn with_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
            delay_ms: None,
        }
    }

    /// A reply that never arrives.
    #[inline]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Delays the reply.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }

    #[inline]
    pub(crate) fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_script() {
        let script: Vec<PresetReply> = serde_json::from_str(
            r#"[
                { "frames": ["Hi!", "What is your **name**?"] },
                { "frames": [], "delay_ms": 250 }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            script,
            vec![
                PresetReply::with_frames(["Hi!", "What is your **name**?"]),
                PresetReply::silent().with_delay(Duration::from_millis(250)),
            ]
        );
    }
}
