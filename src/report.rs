//! The batch job: fetch, substitute, chart, embed, save.
//!
//! Slide numbers and text-box ordinals below are the template's contract.
//! They mirror the deck shipped with the project: slide 1 is the cover,
//! slide 2 the identifier panel, slide 3 the function summary, slide 4 the
//! expression charts, slide 5 the sequence panel.

use crate::chart::{Bar, HBarChart, RenderOptions, SALMON, SKY_BLUE};
use crate::error::Result;
use crate::expression::{TissueExpression, top_by_rna, top_by_protein};
use crate::fetch::{EntrezClient, OpenTargetsClient, UniprotClient};
use crate::pptx::Package;
use crate::units::inches;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// How many tissues each chart shows.
const CHART_TOP_N: usize = 10;

/// Where the charts land: slide 4, two 8x6 inch frames side by side.
const CHART_SLIDE: usize = 4;
const RNA_CHART_POS: (f64, f64) = (11.0, 3.0);
const PROTEIN_CHART_POS: (f64, f64) = (1.0, 3.0);
const CHART_SIZE: (f64, f64) = (8.0, 6.0);

/// Options for one report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// UniProt accession naming the subject and the output file
    pub accession: String,
    /// Template deck to populate
    pub template: PathBuf,
    /// Directory receiving `<ACCESSION>_SUMMARY.pptx`
    pub out_dir: PathBuf,
    /// Directory receiving the intermediate chart PNGs
    pub scratch_dir: PathBuf,
}

/// The three upstream clients, bundled so tests can inject fixture servers.
pub struct DataSources {
    pub uniprot: UniprotClient,
    pub entrez: EntrezClient,
    pub open_targets: OpenTargetsClient,
}

impl DataSources {
    /// Clients against the live public endpoints.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            uniprot: UniprotClient::new(timeout)?,
            entrez: EntrezClient::new(timeout)?,
            open_targets: OpenTargetsClient::new(timeout)?,
        })
    }
}

/// Run the whole job. Returns the path of the generated deck.
pub fn generate(opts: &ReportOptions, sources: &DataSources) -> Result<PathBuf> {
    let accession = opts.accession.as_str();

    let mut deck = Package::open(&opts.template)?;
    info!(
        slides = deck.presentation().slide_count(),
        template = %opts.template.display(),
        "loaded template"
    );

    // Slide 1: cover
    deck.replace_text_box(1, 1, accession)?;

    // Slide 2: identifiers from the UniProt entry
    let entry = sources.uniprot.entry(accession)?;
    let gene_name = entry.primary_gene_name()?;
    let panther_name = entry.panther_name()?;
    let ensembl_id = entry.open_targets_id()?;
    let similarity = entry.similarity()?;
    info!(gene_name, ensembl_id, "fetched UniProt entry");

    deck.replace_text_box(2, 5, gene_name)?;
    deck.replace_text_box(2, 10, panther_name)?;
    deck.replace_text_box(2, 8, ensembl_id)?;
    deck.replace_text_box(2, 7, accession)?;
    deck.replace_text_box(2, 9, similarity)?;

    // Slide 3: function summary from Entrez
    let gene_id = entry.entrez_gene_id()?;
    let summary = sources.entrez.gene_summary(gene_id)?;
    info!(gene_id, chars = summary.len(), "fetched gene summary");
    deck.replace_text_box(3, 2, &summary)?;

    // Slide 5: sequence panel
    let sequence = entry.protein_sequence()?;
    deck.replace_text_box(5, 3, &sequence.value)?;
    deck.replace_text_box(5, 4, &sequence.length.to_string())?;
    deck.replace_text_box(5, 5, &sequence.mol_weight.to_string())?;

    // Slide 4: expression charts from Open Targets
    let rows = sources.open_targets.expressions(ensembl_id)?;
    info!(tissues = rows.len(), "fetched tissue expression");

    std::fs::create_dir_all(&opts.scratch_dir)?;
    let render = RenderOptions::default();

    let rna_chart = rna_chart(&top_by_rna(&rows, CHART_TOP_N));
    let rna_png = rna_chart.to_png(&render)?;
    std::fs::write(opts.scratch_dir.join("rna_plot.png"), &rna_png)?;

    let protein_chart = protein_chart(&top_by_protein(&rows, CHART_TOP_N));
    let protein_png = protein_chart.to_png(&render)?;
    std::fs::write(opts.scratch_dir.join("protein_plot.png"), &protein_png)?;

    embed_chart(&mut deck, &rna_png, &rna_chart.title, RNA_CHART_POS)?;
    embed_chart(&mut deck, &protein_png, &protein_chart.title, PROTEIN_CHART_POS)?;

    // Save under the accession's name
    std::fs::create_dir_all(&opts.out_dir)?;
    let output = opts.out_dir.join(format!("{accession}_SUMMARY.pptx"));
    deck.save(&output)?;
    info!(output = %output.display(), "wrote presentation");

    Ok(output)
}

/// Text boxes of every slide, for template inspection.
pub fn list_text_boxes<P: AsRef<Path>>(template: P) -> Result<Vec<(usize, Vec<String>)>> {
    let deck = Package::open(template)?;
    let mut slides = Vec::with_capacity(deck.presentation().slide_count());
    for number in 1..=deck.presentation().slide_count() {
        slides.push((number, deck.text_boxes(number)?));
    }
    Ok(slides)
}

fn rna_chart(rows: &[TissueExpression]) -> HBarChart {
    HBarChart {
        title: "Top 10 RNA expression by Tissue".to_string(),
        x_label: "RNA count".to_string(),
        y_label: "Tissue".to_string(),
        color: SKY_BLUE,
        bars: rows
            .iter()
            .map(|row| Bar {
                label: row.tissue.clone(),
                value: row.rna_value.unwrap_or(0.0),
            })
            .collect(),
    }
}

fn protein_chart(rows: &[TissueExpression]) -> HBarChart {
    HBarChart {
        title: "Top 10 Protein Levels by Tissue".to_string(),
        x_label: "Protein Level (arbitrary units)".to_string(),
        y_label: "Tissue".to_string(),
        color: SALMON,
        bars: rows
            .iter()
            .map(|row| Bar {
                label: row.tissue.clone(),
                value: row.adjusted_protein_level().unwrap_or(0) as f64,
            })
            .collect(),
    }
}

fn embed_chart(
    deck: &mut Package,
    png: &[u8],
    description: &str,
    position: (f64, f64),
) -> Result<()> {
    deck.add_picture(
        CHART_SLIDE,
        png,
        description,
        inches(position.0),
        inches(position.1),
        inches(CHART_SIZE.0),
        inches(CHART_SIZE.1),
    )
}
