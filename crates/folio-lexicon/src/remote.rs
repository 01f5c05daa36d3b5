use std::time::Duration;

use anyhow::Context;
use folio_types::Definition;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("dictionary request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("dictionary responded with status {0}")]
    Status(StatusCode),
    #[error("unexpected dictionary response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    word: String,
    #[serde(default)]
    meanings: Vec<ApiMeaning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMeaning {
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<ApiSense>,
}

#[derive(Debug, Deserialize)]
struct ApiSense {
    definition: String,
}

/// Client for a dictionaryapi.dev-style service.
#[derive(Clone, Debug)]
pub struct RemoteDictionary {
    client: Client,
    base_url: Url,
}

impl RemoteDictionary {
    /// `base_url` is the entries endpoint; the word is appended as a path
    /// segment. `timeout` bounds the whole request.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid dictionary url {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("dictionary url {base_url} cannot take a path");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client, base_url })
    }

    /// Single attempt. `Ok(None)` means the service does not know the word.
    pub async fn define(&self, word: &str) -> Result<Option<Definition>, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Malformed("base url cannot take a path".into()))?
            .pop_if_empty()
            .push(word);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response.bytes().await?;
        let entries: Vec<ApiEntry> =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        adapt(entries).map(Some)
    }
}

fn adapt(entries: Vec<ApiEntry>) -> Result<Definition, UpstreamError> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("empty entry list".into()))?;
    let meaning = entry
        .meanings
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed(format!("no meanings for {}", entry.word)))?;
    let sense = meaning
        .definitions
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed(format!("no definitions for {}", entry.word)))?;
    Ok(Definition {
        word: entry.word,
        definition: sense.definition,
        part_of_speech: meaning.part_of_speech,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapts_first_sense() {
        let body = r#"[{"word":"thee","meanings":[
            {"partOfSpeech":"pronoun","definitions":[{"definition":"Objective case of thou."},{"definition":"later"}]},
            {"partOfSpeech":"verb","definitions":[{"definition":"ignored"}]}]}]"#;
        let entries: Vec<ApiEntry> = serde_json::from_str(body).unwrap();
        let def = adapt(entries).unwrap();
        assert_eq!(def.word, "thee");
        assert_eq!(def.part_of_speech, "pronoun");
        assert_eq!(def.definition, "Objective case of thou.");
    }

    #[test]
    fn rejects_shapes_without_a_definition() {
        assert!(adapt(Vec::new()).is_err());
        let entries: Vec<ApiEntry> = serde_json::from_str(r#"[{"word":"x"}]"#).unwrap();
        assert!(matches!(adapt(entries), Err(UpstreamError::Malformed(_))));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(RemoteDictionary::new("not a url", DEFAULT_TIMEOUT).is_err());
        assert!(RemoteDictionary::new("mailto:someone@example.com", DEFAULT_TIMEOUT).is_err());
    }
}
