//! Share a watch link: through a configured native share program when
//! one is set, otherwise by copying the link to the clipboard.

use tracing::{info, warn};

use livetv_proto::channel::Channel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareRequest {
    pub fn for_channel(channel: Option<&Channel>, url: String) -> Self {
        let name = channel
            .map(|c| c.channel_name.as_str())
            .filter(|n| !n.is_empty());
        Self {
            title: name.unwrap_or("Live Stream").to_string(),
            text: format!("Watch {} live!", name.unwrap_or("this channel")),
            url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the native share program.
    Shared,
    /// Copied to the clipboard.
    Copied,
}

pub async fn share(request: ShareRequest, command: Option<String>) -> Result<ShareOutcome, String> {
    if let Some(program) = command.filter(|c| !c.trim().is_empty()) {
        match run_share_command(&program, &request).await {
            Ok(()) => return Ok(ShareOutcome::Shared),
            Err(e) => warn!("share: '{}' failed, copying instead: {}", program, e),
        }
    }
    copy_to_clipboard(request.url).await?;
    Ok(ShareOutcome::Copied)
}

async fn run_share_command(program: &str, request: &ShareRequest) -> Result<(), String> {
    let status = tokio::process::Command::new(program)
        .arg(&request.title)
        .arg(&request.text)
        .arg(&request.url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map_err(|e| e.to_string())?;
    if status.success() {
        info!("share: handed {} to {}", request.url, program);
        Ok(())
    } else {
        Err(format!("exited with {}", status))
    }
}

pub async fn copy_to_clipboard(text: String) -> Result<(), String> {
    tokio::task::spawn_blocking(move || {
        arboard::Clipboard::new()
            .and_then(|mut cb| cb.set_text(text))
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> Channel {
        Channel {
            channel_name: name.into(),
            logo: String::new(),
            category: "news".into(),
            url: "http://x/a.m3u8".into(),
            license_key: None,
        }
    }

    #[test]
    fn payload_names_the_channel() {
        let req = ShareRequest::for_channel(Some(&channel("Star Sports 1")), "u".into());
        assert_eq!(req.title, "Star Sports 1");
        assert_eq!(req.text, "Watch Star Sports 1 live!");
        assert_eq!(req.url, "u");
    }

    #[test]
    fn unnamed_channel_gets_generic_title() {
        let req = ShareRequest::for_channel(None, "u".into());
        assert_eq!(req.title, "Live Stream");
        let req = ShareRequest::for_channel(Some(&channel("")), "u".into());
        assert_eq!(req.title, "Live Stream");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn share_program_receives_payload() {
        let req = ShareRequest::for_channel(Some(&channel("A")), "https://t/watch/live/A".into());
        let outcome = share(req, Some("true".into())).await;
        assert_eq!(outcome, Ok(ShareOutcome::Shared));
    }
}
