// src/config.rs

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const DEFAULT_TAPAS_URL: &str =
    "https://api-inference.huggingface.co/models/google/tapas-base-finetuned-wtq";
const DEFAULT_COMPLETION_URL: &str =
    "https://api-inference.huggingface.co/models/openai-community/gpt2";
const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DATA_PATH: &str = "data-series.csv";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "static";

/// A secret one of the remote services needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Credential {
    HuggingFace,
    Gemini,
}

impl Credential {
    /// Environment variable the credential is read from.
    pub fn env_var(&self) -> &'static str {
        match self {
            Credential::HuggingFace => "HUGGINGFACE_TOKEN",
            Credential::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// Service secrets, read once at startup. Blank values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    huggingface_token: Option<String>,
    gemini_api_key: Option<String>,
}

impl Credentials {
    pub fn new(huggingface_token: Option<String>, gemini_api_key: Option<String>) -> Self {
        let keep = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Credentials {
            huggingface_token: keep(huggingface_token),
            gemini_api_key: keep(gemini_api_key),
        }
    }

    pub fn get(&self, which: Credential) -> Option<&str> {
        match which {
            Credential::HuggingFace => self.huggingface_token.as_deref(),
            Credential::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn require(&self, which: Credential) -> Result<&str> {
        self.get(which)
            .ok_or(Error::MissingCredential(which.env_var()))
    }
}

// Never print the secrets themselves.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("huggingface_token", &self.huggingface_token.is_some())
            .field("gemini_api_key", &self.gemini_api_key.is_some())
            .finish()
    }
}

/// Which service, if any, writes the narrative recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrativeBackend {
    /// Structured answer only.
    None,
    /// Completion service prompted with the aggregated quantity.
    Completion,
    /// Gemini prompted with the raw query and the whole table.
    Gemini,
}

impl FromStr for NarrativeBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(NarrativeBackend::None),
            "completion" | "gpt2" => Ok(NarrativeBackend::Completion),
            "gemini" => Ok(NarrativeBackend::Gemini),
            _ => Err(Error::InvalidConfig {
                key: "NARRATIVE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub tapas: Url,
    pub completion: Url,
    pub gemini: Url,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    pub narrative: NarrativeBackend,
    pub data_path: PathBuf,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    /// Assemble the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Assemble the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = |key: &'static str, default: &str| -> Result<Url> {
            let raw = lookup(key).unwrap_or_else(|| default.to_string());
            Url::parse(&raw).map_err(|_| Error::InvalidConfig { key, value: raw })
        };
        let number = |key: &'static str| -> Result<Option<u64>> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| Error::InvalidConfig { key, value: raw }),
            }
        };

        let port = match number("PORT")? {
            None => DEFAULT_PORT,
            Some(p) => u16::try_from(p).map_err(|_| Error::InvalidConfig {
                key: "PORT",
                value: p.to_string(),
            })?,
        };

        let config = Config {
            credentials: Credentials::new(
                lookup(Credential::HuggingFace.env_var()),
                lookup(Credential::Gemini.env_var()),
            ),
            endpoints: Endpoints {
                tapas: url("TAPAS_URL", DEFAULT_TAPAS_URL)?,
                completion: url("COMPLETION_URL", DEFAULT_COMPLETION_URL)?,
                gemini: url("GEMINI_URL", DEFAULT_GEMINI_URL)?,
            },
            request_timeout: Duration::from_secs(
                number("REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            narrative: lookup("NARRATIVE_BACKEND")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(NarrativeBackend::Completion),
            data_path: lookup("DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            port,
            static_dir: lookup("STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
        };
        debug!(?config, "configuration assembled");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = config_from(&[]).unwrap();
        assert_eq!(c.endpoints.tapas.as_str(), DEFAULT_TAPAS_URL);
        assert_eq!(c.request_timeout, Duration::from_secs(60));
        assert_eq!(c.narrative, NarrativeBackend::Completion);
        assert_eq!(c.data_path, PathBuf::from("data-series.csv"));
        assert_eq!(c.port, 8080);
        assert_eq!(c.credentials.get(Credential::HuggingFace), None);
    }

    #[test]
    fn reads_overrides() {
        let c = config_from(&[
            ("HUGGINGFACE_TOKEN", "hf_abc"),
            ("GEMINI_API_KEY", "g-key"),
            ("TAPAS_URL", "http://127.0.0.1:9000/tapas"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("NARRATIVE_BACKEND", "Gemini"),
            ("PORT", "3000"),
        ])
        .unwrap();
        assert_eq!(c.credentials.require(Credential::HuggingFace).unwrap(), "hf_abc");
        assert_eq!(c.credentials.require(Credential::Gemini).unwrap(), "g-key");
        assert_eq!(c.endpoints.tapas.as_str(), "http://127.0.0.1:9000/tapas");
        assert_eq!(c.request_timeout, Duration::from_secs(5));
        assert_eq!(c.narrative, NarrativeBackend::Gemini);
        assert_eq!(c.port, 3000);
    }

    #[test]
    fn blank_credential_is_missing() {
        let c = config_from(&[("HUGGINGFACE_TOKEN", "  ")]).unwrap();
        match c.credentials.require(Credential::HuggingFace) {
            Err(Error::MissingCredential(name)) => assert_eq!(name, "HUGGINGFACE_TOKEN"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("PORT", "99999")]),
            Err(Error::InvalidConfig { key: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("REQUEST_TIMEOUT_SECS", "soon")]),
            Err(Error::InvalidConfig { key: "REQUEST_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            config_from(&[("NARRATIVE_BACKEND", "llama")]),
            Err(Error::InvalidConfig { key: "NARRATIVE_BACKEND", .. })
        ));
        assert!(matches!(
            config_from(&[("GEMINI_URL", "not a url")]),
            Err(Error::InvalidConfig { key: "GEMINI_URL", .. })
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = Credentials::new(Some("hf_secret".into()), None);
        assert!(!format!("{:?}", creds).contains("hf_secret"));
    }
}
