//! Share links to engine config and back.
//!
//! The engine owns the share-link grammar; this module only frames text
//! across the boundary and normalizes every failure to an empty result.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::abi::{EngineAbi, EngineCall};
use crate::framing::{self, ResponseEncoding};

/// One proxy server in URI form, e.g. `vless://id@host:443?security=tls#name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareLink(String);

impl ShareLink {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The protocol scheme, if the link has one.
    pub fn scheme(&self) -> Option<&str> {
        self.0
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .filter(|scheme| !scheme.is_empty())
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShareLink {
    fn from(link: &str) -> Self {
        Self::new(link)
    }
}

impl From<String> for ShareLink {
    fn from(link: String) -> Self {
        Self(link)
    }
}

impl AsRef<str> for ShareLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split share-link list text into links, one per non-blank line.
pub fn parse_link_list(text: &str) -> Vec<ShareLink> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ShareLink::from)
        .collect()
}

/// Join links into the newline-separated list text the engine expects.
pub fn join_link_list<L: AsRef<str>>(links: &[L]) -> String {
    links
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts between share links and engine config documents.
#[derive(Clone)]
pub struct ConfigTranslator {
    engine: Arc<dyn EngineAbi>,
    encoding: ResponseEncoding,
}

impl ConfigTranslator {
    /// Create a translator expecting base64-framed responses.
    pub fn new(engine: Arc<dyn EngineAbi>) -> Self {
        Self {
            engine,
            encoding: ResponseEncoding::Base64,
        }
    }

    /// Override the response encoding of the engine build.
    pub fn with_encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> ResponseEncoding {
        self.encoding
    }

    /// Build an engine config from share links. Returns `""` on any failure.
    pub fn links_to_config<L: AsRef<str>>(&self, links: &[L]) -> String {
        let text = join_link_list(links);
        if text.is_empty() {
            debug!("No share links to convert");
            return String::new();
        }
        self.links_text_to_config(&text)
    }

    /// Share links for every outbound in `config`. Empty on any failure.
    pub fn config_to_links(&self, config: &str) -> Vec<ShareLink> {
        parse_link_list(&self.config_to_links_text(config))
    }

    /// Text form of [`Self::links_to_config`]: newline-separated links in, JSON out.
    pub fn links_text_to_config(&self, links: &str) -> String {
        self.convert(EngineCall::LinksToConfig, links, |request| {
            self.engine.convert_links_to_config(request)
        })
    }

    /// Text form of [`Self::config_to_links`]: JSON in, newline-separated links out.
    pub fn config_to_links_text(&self, config: &str) -> String {
        self.convert(EngineCall::ConfigToLinks, config, |request| {
            self.engine.convert_config_to_links(request)
        })
    }

    fn convert(
        &self,
        call: EngineCall,
        input: &str,
        invoke: impl FnOnce(&str) -> Option<String>,
    ) -> String {
        let request = framing::encode_request(input);
        match framing::decode_response(invoke(&request), self.encoding) {
            Ok(text) => {
                debug!(call = %call, bytes = text.len(), "Engine conversion succeeded");
                text
            }
            Err(e) => {
                warn!(call = %call, error = %e, "Engine conversion failed");
                String::new()
            }
        }
    }
}

impl fmt::Debug for ConfigTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTranslator")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
