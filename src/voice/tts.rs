use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{CONTENT_TYPE, REFERER};
use std::future::Future;
use std::pin::Pin;

use crate::config::AppConfig;
use crate::error::SynthesisError;

/// Longest piece of text the translate endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

const RPC_ID: &str = "jQ1olc";
const AUDIO_MARKER: &str = r#"jQ1olc","[\""#;
const AUDIO_END: &str = r#"\"]"#;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub type SynthesisResult = Result<Vec<u8>, SynthesisError>;

/// Turns text into encoded (MP3) audio.
pub trait Synthesizer: Send + Sync {
    fn synthesize(
        &self,
        text: String,
        slow: bool,
    ) -> Pin<Box<dyn Future<Output = SynthesisResult> + Send + '_>>;
}

/// Client for Google Translate's text-to-speech RPC.
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    language: &'static str,
}

impl GoogleTts {
    pub fn new(config: &AppConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
                config.tld
            ),
            language: config.language,
        })
    }

    async fn synthesize_chunk(&self, chunk: &str, slow: bool) -> SynthesisResult {
        let payload = encode_rpc(chunk, self.language, slow);

        let response = self
            .client
            .post(&self.endpoint)
            .header(REFERER, "http://translate.google.com/")
            .header(
                CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=utf-8",
            )
            .form(&[("f.req", payload)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Status(status));
        }

        let body = response.text().await?;
        extract_audio(&body)
    }
}

impl Synthesizer for GoogleTts {
    fn synthesize(
        &self,
        text: String,
        slow: bool,
    ) -> Pin<Box<dyn Future<Output = SynthesisResult> + Send + '_>> {
        Box::pin(async move {
            let chunks = split_text(&text, MAX_CHUNK_CHARS);
            tracing::debug!(chunks = chunks.len(), slow, "Requesting speech synthesis");

            let mut audio = Vec::new();
            for chunk in &chunks {
                audio.extend(self.synthesize_chunk(chunk, slow).await?);
            }
            if audio.is_empty() {
                return Err(SynthesisError::MissingAudio);
            }
            Ok(audio)
        })
    }
}

/// Build the `f.req` value for one chunk.
///
/// The inner parameter list is itself a JSON string inside the outer
/// envelope. Slow speech is `true`, normal speech is `null`.
fn encode_rpc(text: &str, language: &str, slow: bool) -> String {
    let speed = if slow { Some(true) } else { None };
    let parameter = serde_json::json!([text, language, speed, "null"]).to_string();
    serde_json::json!([[[RPC_ID, parameter, null, "generic"]]]).to_string()
}

/// Pull the base64 MP3 payload out of a batchexecute response.
fn extract_audio(body: &str) -> SynthesisResult {
    for line in body.lines().filter(|line| line.contains(RPC_ID)) {
        let Some(start) = line.find(AUDIO_MARKER) else {
            continue;
        };
        let rest = &line[start + AUDIO_MARKER.len()..];
        let Some(end) = rest.find(AUDIO_END) else {
            continue;
        };
        return Ok(STANDARD.decode(&rest[..end])?);
    }
    Err(SynthesisError::MissingAudio)
}

/// Collapse whitespace and cut the text into pieces of at most `max_chars`
/// characters. Cuts prefer sentence punctuation, then commas, then spaces.
/// A limit of zero is treated as one.
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chunks = Vec::new();
    let mut remaining = normalized.as_str();

    while let Some((limit, _)) = remaining.char_indices().nth(max_chars) {
        let window = &remaining[..limit];
        let cut = last_cut(window, |c| matches!(c, '.' | '!' | '?' | ';' | ':' | '…'))
            .or_else(|| last_cut(window, |c| c == ','))
            .or_else(|| last_cut(window, char::is_whitespace))
            .unwrap_or(limit);

        let piece = remaining[..cut].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        remaining = remaining[cut..].trim_start();
    }

    if !remaining.trim().is_empty() {
        chunks.push(remaining.trim().to_string());
    }
    chunks
}

/// Byte offset just after the last char in `window` matching `pred`.
fn last_cut(window: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    window
        .char_indices()
        .filter(|&(_, c)| pred(c))
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .filter(|&cut| cut > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(split_text("  Wie   heißt\n du? ", 100), vec!["Wie heißt du?"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_text(" \n\t ", 100).is_empty());
    }

    #[test]
    fn long_text_is_cut_at_sentence_ends() {
        let text = "Guten Morgen, ich heiße Anna. Ich wohne seit drei Jahren in München und \
                    arbeite dort als Lehrerin. Am Wochenende fahre ich gern in die Berge, \
                    weil ich die frische Luft liebe.";
        let chunks = split_text(text, MAX_CHUNK_CHARS);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert!(chunks[0].ends_with("als Lehrerin."));
        assert!(chunks[1].starts_with("Am Wochenende"));
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn falls_back_to_spaces_then_hard_cut() {
        let words = "Donaudampfschiff ".repeat(10);
        let chunks = split_text(&words, 40);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && !c.ends_with(' ')));

        let word = "ä".repeat(25);
        let chunks = split_text(&word, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].chars().count(), 5);
    }

    #[test]
    fn zero_limit_still_terminates() {
        assert_eq!(split_text("Ja!", 0), vec!["J", "a", "!"]);
    }

    #[test]
    fn rpc_payload_encodes_speed() {
        assert_eq!(
            encode_rpc("Hallo", "de", true),
            r#"[[["jQ1olc","[\"Hallo\",\"de\",true,\"null\"]",null,"generic"]]]"#
        );
        assert_eq!(
            encode_rpc("Hallo", "de", false),
            r#"[[["jQ1olc","[\"Hallo\",\"de\",null,\"null\"]",null,"generic"]]]"#
        );
    }

    #[test]
    fn audio_is_extracted_from_response() {
        let encoded = STANDARD.encode(b"ID3 fake mp3 frames");
        let body = format!(
            ")]}}'\n\n104\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{}\\\"]\",null,null,null,\"generic\"]]\n58\n[[\"di\",42]]",
            encoded
        );
        assert_eq!(extract_audio(&body).unwrap(), b"ID3 fake mp3 frames");
    }

    #[test]
    fn response_without_audio_is_an_error() {
        let body = ")]}'\n\n[[\"wrb.fr\",\"jQ1olc\",null,null,null,[3],\"generic\"]]";
        assert!(matches!(extract_audio(body), Err(SynthesisError::MissingAudio)));
    }
}
