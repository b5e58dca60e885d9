//! Cytoscape export
//!
//! Hands a learned tree off to graph visualization: a `.sif` file with
//! parent-to-child `trans` edges, a `.noa` node-attribute table (smoothed
//! distribution, frequency, depth, internal flag), and a node-chart script
//! that draws each node's next-symbol distribution as a pie. Writers are
//! generic over `io::Write` so tests can render to strings; path-based
//! wrappers create the three files together.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::alphabet::Alphabet;
use crate::tree::SuffixTree;

/// Knobs for a Cytoscape export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Root name for the generated files.
    pub basename: String,
    /// Minimum probability for a symbol to earn a pie slice.
    pub threshold: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            basename: "cytoscape_output_tree".to_string(),
            threshold: 1e-5,
        }
    }
}

/// Paths of the generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CytoscapeFiles {
    /// Edge list.
    pub sif: PathBuf,
    /// Node attributes.
    pub noa: PathBuf,
    /// Node-chart script.
    pub script: PathBuf,
}

/// Write the `trans` edge list: one line per node with children.
pub fn write_sif<W: Write>(writer: &mut W, tree: &SuffixTree) -> Result<()> {
    for (at, node) in tree.iter() {
        let children = tree.children(at);
        if children.is_empty() {
            continue;
        }
        write!(writer, "{} trans", node.label)?;
        for child in children {
            write!(writer, " {}", tree.node(child).label)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the node-attribute table: per node, the smoothed distribution, its
/// frequency, log frequency, depth, and internal flag.
pub fn write_noa<W: Write>(writer: &mut W, tree: &SuffixTree, alphabet: &Alphabet) -> Result<()> {
    write!(writer, "ID")?;
    for symbol in alphabet.symbols() {
        write!(writer, "\t{symbol}")?;
    }
    writeln!(writer, "\tFrequency\tLogFrequency\tDepth\tInternal")?;

    for (at, node) in tree.iter() {
        write!(writer, "{}", node.label)?;
        for &g in &node.smoothed_distribution {
            write!(writer, "\t{g:.2}")?;
        }
        let log_frequency = if node.occurrence_count > 0.0 {
            node.occurrence_count.ln()
        } else {
            0.0
        };
        writeln!(
            writer,
            "\t{}\t{:.4}\t{}\t{}",
            node.occurrence_count,
            log_frequency,
            at.depth,
            node.internal as u8
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the Cytoscape node-chart script: one `nodecharts pie` command per
/// node, listing symbols whose smoothed probability clears the threshold.
pub fn write_chart_script<W: Write>(
    writer: &mut W,
    tree: &SuffixTree,
    alphabet: &Alphabet,
    threshold: f64,
) -> Result<()> {
    for (_, node) in tree.iter() {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        let mut colors = Vec::new();
        for (index, &g) in node.smoothed_distribution.iter().enumerate() {
            if g > threshold {
                if let Some(symbol) = alphabet.symbol(index) {
                    labels.push(symbol.to_string());
                    values.push(format!("{g}"));
                    colors.push(slice_color(index).to_string());
                }
            }
        }
        writeln!(
            writer,
            "nodecharts pie nodelist=\"{}\" labellist=\"{}\" valuelist=\"{}\" colorlist=\"{}\"",
            node.label,
            labels.join(","),
            values.join(","),
            colors.join(",")
        )?;
    }
    writer.flush()?;
    Ok(())
}

// Stable per-symbol colors keep repeated exports diffable.
const PALETTE: [&str; 12] = [
    "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F",
    "#BCBD22", "#17BECF", "#AEC7E8", "#FFBB78",
];

fn slice_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Generate all three files under `output_dir`.
pub fn write_cytoscape(
    output_dir: &Path,
    tree: &SuffixTree,
    alphabet: &Alphabet,
    options: &ExportOptions,
) -> Result<CytoscapeFiles> {
    let files = CytoscapeFiles {
        sif: output_dir.join(format!("{}.sif", options.basename)),
        noa: output_dir.join(format!("{}.noa", options.basename)),
        script: output_dir.join(format!("{}_script.txt", options.basename)),
    };

    let mut sif = BufWriter::new(
        File::create(&files.sif)
            .with_context(|| format!("failed to create {}", files.sif.display()))?,
    );
    write_sif(&mut sif, tree)?;

    let mut noa = BufWriter::new(
        File::create(&files.noa)
            .with_context(|| format!("failed to create {}", files.noa.display()))?,
    );
    write_noa(&mut noa, tree, alphabet)?;

    let mut script = BufWriter::new(
        File::create(&files.script)
            .with_context(|| format!("failed to create {}", files.script.display()))?,
    );
    write_chart_script(&mut script, tree, alphabet, options.threshold)?;

    Ok(files)
}

/// Render the edge list to a string (useful for tests).
pub fn render_sif(tree: &SuffixTree) -> Result<String> {
    let mut buffer = Vec::new();
    write_sif(&mut buffer, tree)?;
    Ok(String::from_utf8(buffer)?)
}

/// Render the node-attribute table to a string.
pub fn render_noa(tree: &SuffixTree, alphabet: &Alphabet) -> Result<String> {
    let mut buffer = Vec::new();
    write_noa(&mut buffer, tree, alphabet)?;
    Ok(String::from_utf8(buffer)?)
}
