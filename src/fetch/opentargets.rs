//! Open Targets GraphQL query for baseline tissue expression.

use crate::error::{Error, Result};
use crate::expression::TissueExpression;
use crate::fetch::FetchClient;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.platform.opentargets.org";

/// Baseline expression per tissue for a target.
const EXPRESSIONS_QUERY: &str = r#"
query TargetExpressions($ensemblId: String!) {
  target(ensemblId: $ensemblId) {
    id
    approvedName
    approvedSymbol
    expressions {
      tissue {
        id
        label
        anatomicalSystems
        organs
      }
      rna {
        zscore
        value
        unit
        level
      }
      protein {
        reliability
        level
        cellType {
          reliability
          name
          level
        }
      }
    }
  }
}
"#;

/// Client for the Open Targets Platform GraphQL API.
pub struct OpenTargetsClient {
    client: FetchClient,
    base_url: String,
}

impl OpenTargetsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Point the client at an alternate endpoint (tests serve fixtures).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: FetchClient::new("Open Targets", timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the tissue-expression rows for an Ensembl gene id.
    pub fn expressions(&self, ensembl_id: &str) -> Result<Vec<TissueExpression>> {
        let url = format!("{}/api/v4/graphql", self.base_url);
        let body = json!({
            "query": EXPRESSIONS_QUERY,
            "variables": { "ensemblId": ensembl_id },
        });

        let resp: GraphQlResponse = self.client.post_json(&url, &body)?;

        if !resp.errors.is_empty() {
            let messages: Vec<String> =
                resp.errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GraphQl(messages.join("; ")));
        }

        let target = resp
            .data
            .and_then(|data| data.target)
            .ok_or(Error::MissingField {
                source_name: "Open Targets",
                field: "data.target",
            })?;

        Ok(target
            .expressions
            .into_iter()
            .map(Expression::into_row)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    target: Option<Target>,
}

#[derive(Debug, Deserialize)]
struct Target {
    #[serde(default)]
    expressions: Vec<Expression>,
}

#[derive(Debug, Deserialize)]
struct Expression {
    tissue: Tissue,
    rna: Option<Rna>,
    protein: Option<Protein>,
}

#[derive(Debug, Deserialize)]
struct Tissue {
    label: String,
    #[serde(default)]
    organs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Rna {
    value: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Protein {
    reliability: Option<bool>,
    level: Option<i64>,
}

impl Expression {
    fn into_row(self) -> TissueExpression {
        let (rna_value, rna_unit) = match self.rna {
            Some(rna) => (rna.value, rna.unit.unwrap_or_default()),
            None => (None, String::new()),
        };
        let (protein_reliability, protein_level) = match self.protein {
            Some(protein) => (protein.reliability, protein.level),
            None => (None, None),
        };

        TissueExpression {
            tissue: self.tissue.label,
            organs: self.tissue.organs,
            rna_value,
            rna_unit,
            protein_reliability,
            protein_level,
        }
    }
}
