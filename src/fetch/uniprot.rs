//! UniProt REST lookup and the typed entry model.
//!
//! One GET against `uniprotkb/{accession}` yields everything the report
//! needs from UniProt: gene names, cross references into the other two data
//! sources, the sequence-similarity comment, and the sequence block.

use crate::error::{Error, Result};
use crate::fetch::FetchClient;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://rest.uniprot.org";

/// Client for the UniProtKB REST API.
pub struct UniprotClient {
    client: FetchClient,
    base_url: String,
}

impl UniprotClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Point the client at an alternate endpoint. Tests use this to serve
    /// fixtures from a local server instead of the live API.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: FetchClient::new("UniProt", timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the entry for an accession.
    pub fn entry(&self, accession: &str) -> Result<UniprotEntry> {
        let url = format!("{}/uniprotkb/{}", self.base_url, accession);
        self.client.get_json(&url, &[("format", "json")])
    }
}

/// The subset of a UniProtKB entry the report consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniprotEntry {
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default, rename = "uniProtKBCrossReferences")]
    pub cross_references: Vec<CrossReference>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub sequence: Option<Sequence>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gene {
    pub gene_name: Option<TextValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub database: String,
    pub id: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub key: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_type: String,
    #[serde(default)]
    pub texts: Vec<TextValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub value: String,
    pub length: u32,
    pub mol_weight: u64,
}

impl UniprotEntry {
    /// The primary gene name (first entry of the gene list).
    pub fn primary_gene_name(&self) -> Result<&str> {
        self.genes
            .first()
            .and_then(|gene| gene.gene_name.as_ref())
            .map(|name| name.value.as_str())
            .ok_or(Error::MissingField {
                source_name: "UniProt",
                field: "genes[0].geneName",
            })
    }

    /// The first cross reference into a given database.
    pub fn cross_reference(&self, database: &str) -> Option<&CrossReference> {
        self.cross_references
            .iter()
            .find(|xref| xref.database == database)
    }

    /// The official gene name recorded by the PANTHER cross reference.
    pub fn panther_name(&self) -> Result<&str> {
        self.cross_reference("PANTHER")
            .ok_or(Error::MissingCrossReference("PANTHER"))?
            .properties
            .first()
            .map(|prop| prop.value.as_str())
            .ok_or(Error::MissingField {
                source_name: "UniProt",
                field: "PANTHER properties",
            })
    }

    /// The Ensembl gene id carried by the OpenTargets cross reference.
    pub fn open_targets_id(&self) -> Result<&str> {
        self.cross_reference("OpenTargets")
            .map(|xref| xref.id.as_str())
            .ok_or(Error::MissingCrossReference("OpenTargets"))
    }

    /// The NCBI gene id carried by the GeneID cross reference.
    pub fn entrez_gene_id(&self) -> Result<&str> {
        self.cross_reference("GeneID")
            .map(|xref| xref.id.as_str())
            .ok_or(Error::MissingCrossReference("GeneID"))
    }

    /// The first SIMILARITY comment text.
    pub fn similarity(&self) -> Result<&str> {
        self.comments
            .iter()
            .find(|comment| comment.comment_type == "SIMILARITY")
            .and_then(|comment| comment.texts.first())
            .map(|text| text.value.as_str())
            .ok_or(Error::MissingField {
                source_name: "UniProt",
                field: "SIMILARITY comment",
            })
    }

    /// The sequence block.
    pub fn protein_sequence(&self) -> Result<&Sequence> {
        self.sequence.as_ref().ok_or(Error::MissingField {
            source_name: "UniProt",
            field: "sequence",
        })
    }
}
