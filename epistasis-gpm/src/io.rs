//! TSV reader for genotype-phenotype maps.
//!
//! Expects a header naming a `genotype` and a `phenotype` column and,
//! optionally, a `stdev` column. Columns are tab or space delimited; the
//! delimiter is taken from the header line.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use crate::gpm::GenotypePhenotypeMap;

const GENOTYPE_COL: &str = "genotype";
const PHENOTYPE_COL: &str = "phenotype";
const STDEV_COLS: [&str; 2] = ["stdev", "stdeviations"];

/// Read a genotype-phenotype map from `path`.
pub fn read_gpm_tsv(path: &Path, wildtype: &str) -> Result<GenotypePhenotypeMap> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genotype-phenotype file: {}", path.display()))?;
    let gpm = parse_gpm(&contents, wildtype)
        .with_context(|| format!("Invalid genotype-phenotype file: {}", path.display()))?;
    info!(
        "Loaded {} genotypes over {} sites from {}",
        gpm.n(),
        gpm.n_sites(),
        path.display()
    );
    Ok(gpm)
}

/// Parse TSV contents into a genotype-phenotype map.
pub fn parse_gpm(contents: &str, wildtype: &str) -> Result<GenotypePhenotypeMap> {
    let mut lines = contents.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| anyhow!("Empty genotype-phenotype file"))?;

    let tab_delimited = header_line.contains('\t');
    let split = |line: &str| -> Vec<String> {
        if tab_delimited {
            line.split('\t').map(|f| f.trim().to_string()).collect()
        } else {
            line.split_whitespace().map(str::to_string).collect()
        }
    };
    let headers = split(header_line);

    let column = |name: &str| headers.iter().position(|h| h == name);
    let geno_idx =
        column(GENOTYPE_COL).ok_or_else(|| anyhow!("Column '{}' not found in header", GENOTYPE_COL))?;
    let pheno_idx = column(PHENOTYPE_COL)
        .ok_or_else(|| anyhow!("Column '{}' not found in header", PHENOTYPE_COL))?;
    let stdev_idx = STDEV_COLS.iter().find_map(|c| column(c));

    let mut genotypes = Vec::new();
    let mut phenotypes = Vec::new();
    let mut stdevs = Vec::new();

    for (line_num, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields = split(line);
        let needed = geno_idx.max(pheno_idx).max(stdev_idx.unwrap_or(0)) + 1;
        if fields.len() < needed {
            bail!(
                "Line {} has too few fields (expected at least {})",
                line_num + 2,
                needed
            );
        }

        genotypes.push(fields[geno_idx].clone());
        phenotypes.push(parse_value(&fields[pheno_idx], line_num + 2)?);
        if let Some(si) = stdev_idx {
            stdevs.push(parse_value(&fields[si], line_num + 2)?);
        }
    }

    let gpm = GenotypePhenotypeMap::new(wildtype, genotypes, phenotypes)?;
    if stdev_idx.is_some() {
        gpm.with_uncertainty(stdevs)
    } else {
        Ok(gpm)
    }
}

/// Parse a numeric field. Missing markers are rejected: a fit needs every
/// observed phenotype.
fn parse_value(s: &str, line: usize) -> Result<f64> {
    match s {
        "NA" | "na" | "Na" | "." | "-" | "NaN" | "nan" => {
            bail!("Line {} has a missing value '{}'", line, s)
        }
        _ => s
            .parse()
            .with_context(|| format!("Line {}: '{}' is not a number", line, s)),
    }
}
