use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::config::PlayerConfig;
use crate::manifest::VideoEntry;

pub const URL_PLACEHOLDER: &str = "%URL%";

// Characters that never appear raw in a fetchable URL. Already-encoded
// sequences pass through untouched because '%' is not in the set.
const URL_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub key: u64,
    pub target: Url,
}

pub fn playback_request(entry: &VideoEntry) -> Option<PlaybackRequest> {
    let cleaned = sanitize_url(&entry.stream_url);
    if cleaned.is_empty() {
        return None;
    }
    let encoded = utf8_percent_encode(&cleaned, URL_UNSAFE).to_string();
    let target = Url::parse(&encoded).ok()?;
    Some(PlaybackRequest {
        key: entry.key(),
        target,
    })
}

fn sanitize_url(raw: &str) -> String {
    raw.trim().replace("&amp;", "&")
}

fn expand_command(template: &[String], target: &str) -> Option<(String, Vec<String>)> {
    let mut parts = template
        .iter()
        .map(|part| part.replace(URL_PLACEHOLDER, target));
    let program = parts.next().filter(|program| !program.is_empty())?;
    Some((program, parts.collect()))
}

pub fn launch(cfg: &PlayerConfig, request: &PlaybackRequest) -> Result<()> {
    let (program, args) = expand_command(&cfg.video_command, request.target.as_str())
        .ok_or_else(|| anyhow!("player command not configured"))?;

    let mut command = Command::new(&program);
    command.args(&args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    if cfg.video_detach {
        command
            .spawn()
            .with_context(|| format!("launch {} for {}", program, request.target))?;
        return Ok(());
    }

    // Modal playback: block until the player is dismissed, then return
    // control to the catalog. Exit status is the player's business.
    command
        .status()
        .with_context(|| format!("run {} for {}", program, request.target))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(stream_url: &str) -> VideoEntry {
        VideoEntry {
            title: "Sample".into(),
            thumbnail: "https://cdn.test/thumb.jpg".into(),
            stream_url: stream_url.into(),
        }
    }

    #[test]
    fn encodes_spaces_in_stream_url() {
        let request = playback_request(&entry("https://host/path with space")).unwrap();
        assert_eq!(request.target.as_str(), "https://host/path%20with%20space");
    }

    #[test]
    fn empty_stream_url_produces_no_request() {
        assert!(playback_request(&entry("")).is_none());
        assert!(playback_request(&entry("   ")).is_none());
    }

    #[test]
    fn unparsable_stream_url_produces_no_request() {
        assert!(playback_request(&entry("not a url")).is_none());
    }

    #[test]
    fn unescapes_html_ampersands() {
        let request =
            playback_request(&entry("https://host/v.mp4?token=a&amp;expires=1")).unwrap();
        assert_eq!(
            request.target.as_str(),
            "https://host/v.mp4?token=a&expires=1"
        );
    }

    #[test]
    fn leaves_encoded_sequences_alone() {
        let request = playback_request(&entry("https://host/a%20b.mp4")).unwrap();
        assert_eq!(request.target.as_str(), "https://host/a%20b.mp4");
    }

    #[test]
    fn request_key_matches_entry_key() {
        let video = entry("https://host/v.mp4");
        let request = playback_request(&video).unwrap();
        assert_eq!(request.key, video.key());
    }

    #[test]
    fn expands_url_placeholder_into_command() {
        let template = vec!["mpv".to_string(), "--fs".to_string(), "%URL%".to_string()];
        let (program, args) = expand_command(&template, "https://host/v.mp4").unwrap();
        assert_eq!(program, "mpv");
        assert_eq!(args, ["--fs", "https://host/v.mp4"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(expand_command(&[], "https://host/v.mp4").is_none());
    }
}
