use std::sync::LazyLock;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::Deserialize;

use crate::Segment;
use crate::transcript::TranscriptProvider;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Caption provider backed by YouTube's InnerTube API
#[derive(Debug, Clone)]
pub struct YouTubeCaptions {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeCaptions {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, YOUTUBE_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let body = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn caption_tracks(&self, video_id: &str, lang: Option<&str>) -> Result<Vec<CaptionTrack>> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self.fetch_page(&watch_url).await?;
        let api_key = extract_api_key(&page_html)?;

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": lang.unwrap_or("en"),
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(title) = resp.video_details.as_ref().and_then(|vd| vd.title.as_deref()) {
            debug!("Video {video_id}: {title}");
        }

        Ok(resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TranscriptProvider for YouTubeCaptions {
    async fn fetch(&self, video_id: &str, lang: Option<&str>) -> Result<Vec<Segment>> {
        let tracks = self.caption_tracks(video_id, lang).await?;
        let track = select_track(&tracks, lang)?;
        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_xml = self.fetch_page(&track.base_url).await?;
        let segments = parse_caption_xml(&caption_xml)?;
        if segments.is_empty() {
            bail!("caption track '{}' is empty", track.language_code);
        }
        Ok(segments)
    }
}

/// Pick the track in `lang`, or the first track when no language is requested
fn select_track<'a>(tracks: &'a [CaptionTrack], lang: Option<&str>) -> Result<&'a CaptionTrack> {
    if tracks.is_empty() {
        bail!("no captions available");
    }
    match lang {
        Some(lang) => match tracks.iter().find(|t| t.language_code == lang) {
            Some(track) => Ok(track),
            None => bail!("no captions in language '{lang}'"),
        },
        None => Ok(&tracks[0]),
    }
}

static API_KEY_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("valid api key pattern"),
        // newer watch pages
        Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("valid api key pattern"),
    ]
});

fn extract_api_key(html: &str) -> Result<String> {
    match API_KEY_PATTERNS.iter().find_map(|re| re.captures(html)) {
        Some(caps) => Ok(caps[1].to_string()),
        None => bail!("could not extract InnerTube API key from watch page"),
    }
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    // (start, duration) of the <text> element whose body comes next
    let mut pending: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                    match attr.key.as_ref() {
                        b"start" => start = value,
                        b"dur" => dur = value,
                        _ => {}
                    }
                }
                pending = start.zip(dur);
            }
            Ok(Event::Text(ref e)) => {
                let Some((start, duration)) = pending.take() else {
                    continue;
                };
                let raw_text = e.unescape().unwrap_or_default();
                let text = html_escape::decode_html_entities(&raw_text).to_string();
                if !text.is_empty() {
                    segments.push(Segment { text, start, duration });
                }
            }
            Ok(Event::End(_)) => pending = None,
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML at byte {}: {e}", reader.buffer_position()),
            _ => {}
        }
    }

    Ok(segments)
}
