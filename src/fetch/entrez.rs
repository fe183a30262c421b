//! NCBI Entrez efetch lookup for gene summaries.
//!
//! The gene database only serves XML for full records; the summary is the
//! text of the first `Entrezgene_summary` element.

use crate::error::{Error, Result};
use crate::fetch::FetchClient;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Client for the NCBI Entrez E-utilities.
pub struct EntrezClient {
    client: FetchClient,
    base_url: String,
}

impl EntrezClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Point the client at an alternate endpoint (tests serve fixtures).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: FetchClient::new("Entrez", timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the summary paragraph for an NCBI gene id.
    pub fn gene_summary(&self, gene_id: &str) -> Result<String> {
        let url = format!("{}/efetch.fcgi", self.base_url);
        let xml = self.client.get_bytes(
            &url,
            &[("db", "gene"), ("id", gene_id), ("retmode", "xml")],
        )?;

        extract_gene_summary(&xml)?.ok_or(Error::MissingField {
            source_name: "Entrez",
            field: "Entrezgene_summary",
        })
    }
}

/// Text of the first `Entrezgene_summary` element, when present.
fn extract_gene_summary(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_summary = false;
    let mut summary = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Entrezgene_summary" => {
                in_summary = true;
            },
            Ok(Event::Text(t)) if in_summary => {
                let text =
                    std::str::from_utf8(t.as_ref()).map_err(|e| Error::Xml(e.to_string()))?;
                summary.push_str(text);
            },
            Ok(Event::GeneralRef(r)) if in_summary => match r.as_ref() {
                b"amp" => summary.push('&'),
                b"lt" => summary.push('<'),
                b"gt" => summary.push('>'),
                b"quot" => summary.push('"'),
                b"apos" => summary.push('\''),
                _ => {},
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Entrezgene_summary" => {
                return Ok(Some(summary));
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
}
