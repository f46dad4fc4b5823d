use std::future::Future;

use async_trait::async_trait;
use eyre::Result;
use log::debug;

use crate::{ScriptError, Segment, extract_video_id};

/// Source of timed transcript segments for a video
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch segments in `lang`, or from any available track when `lang` is `None`
    async fn fetch(&self, video_id: &str, lang: Option<&str>) -> Result<Vec<Segment>>;
}

/// Ordered language attempts: preferred, fallback, then any track
pub fn language_plan(preferred: &str, fallback: &str) -> Vec<Option<String>> {
    let mut plan = vec![Some(preferred.to_string())];
    if fallback != preferred {
        plan.push(Some(fallback.to_string()));
    }
    plan.push(None);
    plan
}

/// Run `attempt` over `attempts` in order and return the first success.
/// On exhaustion every attempt is returned with its error.
pub async fn first_success<A, T, F, Fut>(attempts: Vec<A>, mut attempt: F) -> Result<T, Vec<(A, eyre::Report)>>
where
    A: Clone,
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = Vec::with_capacity(attempts.len());
    for a in attempts {
        match attempt(a.clone()).await {
            Ok(val) => return Ok(val),
            Err(e) => failures.push((a, e)),
        }
    }
    Err(failures)
}

/// Transcript of one video flattened to newline-joined text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTranscript {
    pub video_id: String,
    pub text: String,
}

/// Resolve the video ID and fetch its transcript
pub async fn fetch_transcript(
    provider: &dyn TranscriptProvider,
    video_url: &str,
    preferred_lang: &str,
    fallback_lang: &str,
) -> Result<FetchedTranscript, ScriptError> {
    let video_id = extract_video_id(video_url)
        .ok_or_else(|| ScriptError::InvalidInput(format!("could not extract a YouTube video ID from: {video_url}")))?;

    let plan = language_plan(preferred_lang, fallback_lang);
    let video_id_ref = video_id.as_str();

    let segments = first_success(plan, move |lang: Option<String>| async move {
        debug!("Fetching transcript for {video_id_ref} (lang={})", lang.as_deref().unwrap_or("any"));
        let result = provider.fetch(video_id_ref, lang.as_deref()).await;
        if let Err(ref e) = result {
            debug!("Transcript attempt lang={} failed: {e}", lang.as_deref().unwrap_or("any"));
        }
        result
    })
    .await
    .map_err(|failures| {
        let detail = failures
            .iter()
            .map(|(lang, e)| format!("{}: {e}", lang.as_deref().unwrap_or("any")))
            .collect::<Vec<_>>()
            .join("; ");
        ScriptError::TranscriptUnavailable(format!("no transcript for video {video_id} ({detail})"))
    })?;

    Ok(FetchedTranscript {
        text: render_text(&segments),
        video_id,
    })
}

/// Render segments as plain text (one segment per line, no timestamps)
pub fn render_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Provider returning canned segments per language and recording every call
    #[derive(Default)]
    pub(crate) struct StubProvider {
        pub tracks: HashMap<Option<String>, Vec<Segment>>,
        pub calls: Mutex<Vec<Option<String>>>,
    }

    impl StubProvider {
        pub(crate) fn with_track(mut self, lang: Option<&str>, texts: &[&str]) -> Self {
            let segments = texts
                .iter()
                .enumerate()
                .map(|(i, t)| Segment {
                    text: t.to_string(),
                    start: i as f64,
                    duration: 1.0,
                })
                .collect();
            self.tracks.insert(lang.map(str::to_string), segments);
            self
        }

        pub(crate) fn calls(&self) -> Vec<Option<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscriptProvider for StubProvider {
        async fn fetch(&self, _video_id: &str, lang: Option<&str>) -> Result<Vec<Segment>> {
            let key = lang.map(str::to_string);
            self.calls.lock().unwrap().push(key.clone());
            match self.tracks.get(&key) {
                Some(segments) => Ok(segments.clone()),
                None => eyre::bail!("no captions in {}", lang.unwrap_or("any")),
            }
        }
    }

    #[test]
    fn test_language_plan() {
        assert_eq!(
            language_plan("ko", "en"),
            vec![Some("ko".to_string()), Some("en".to_string()), None]
        );
    }

    #[test]
    fn test_language_plan_dedupes_fallback() {
        assert_eq!(language_plan("en", "en"), vec![Some("en".to_string()), None]);
    }

    #[tokio::test]
    async fn test_preferred_language_wins() {
        let provider = StubProvider::default()
            .with_track(Some("ko"), &["안녕하세요", "반갑습니다"])
            .with_track(Some("en"), &["hello"]);

        let fetched = fetch_transcript(&provider, "dQw4w9WgXcQ", "ko", "en").await.unwrap();
        assert_eq!(fetched.text, "안녕하세요\n반갑습니다");
        assert_eq!(provider.calls(), vec![Some("ko".to_string())]);
    }

    #[tokio::test]
    async fn test_fallback_language_stops_before_any() {
        let provider = StubProvider::default()
            .with_track(Some("en"), &["hello", "world"])
            .with_track(None, &["should not be used"]);

        let fetched = fetch_transcript(&provider, "https://youtu.be/dQw4w9WgXcQ", "ko", "en")
            .await
            .unwrap();
        assert_eq!(
            fetched,
            FetchedTranscript {
                video_id: "dQw4w9WgXcQ".to_string(),
                text: "hello\nworld".to_string(),
            }
        );
        assert_eq!(provider.calls(), vec![Some("ko".to_string()), Some("en".to_string())]);
    }

    #[tokio::test]
    async fn test_any_language_is_last_resort() {
        let provider = StubProvider::default().with_track(None, &["bonjour"]);

        let fetched = fetch_transcript(&provider, "dQw4w9WgXcQ", "ko", "en").await.unwrap();
        assert_eq!(fetched.text, "bonjour");
        assert_eq!(
            provider.calls(),
            vec![Some("ko".to_string()), Some("en".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_all_attempts_fail() {
        let provider = StubProvider::default();

        let err = fetch_transcript(&provider, "dQw4w9WgXcQ", "ko", "en").await.unwrap_err();
        match err {
            ScriptError::TranscriptUnavailable(msg) => {
                assert!(msg.contains("dQw4w9WgXcQ"));
                assert!(msg.contains("ko: no captions in ko"));
                assert!(msg.contains("any: no captions in any"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_bad_url_fails_before_fetch() {
        let provider = StubProvider::default().with_track(None, &["unused"]);

        let err = fetch_transcript(&provider, "https://example.com/short", "ko", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::InvalidInput(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_success_returns_failures_in_order() {
        let failures = first_success(vec![1, 2, 3], |n: i32| async move {
            if n > 0 {
                eyre::bail!("attempt {n}")
            }
            Ok(n)
        })
        .await
        .unwrap_err();
        let order: Vec<i32> = failures.iter().map(|(n, _)| *n).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(failures[2].1.to_string(), "attempt 3");
    }

    #[test]
    fn test_render_text() {
        let segments = vec![
            Segment {
                text: "Hello world".to_string(),
                start: 0.0,
                duration: 1.5,
            },
            Segment {
                text: "Hello world".to_string(),
                start: 1.5,
                duration: 2.0,
            },
        ];
        assert_eq!(render_text(&segments), "Hello world\nHello world");
    }

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&[]), "");
    }
}
