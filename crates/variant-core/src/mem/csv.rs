//! Exemplar CSV
//!
//! `type,speaker_status,speaker_gender,closeness,phon_0..phon_{d-1}`, one
//! exemplar per row. Used for lexicon dumps and for prototype input.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use variant_events::{Gender, Variant};

use super::exemplar::{Exemplar, ExemplarTools};
use super::LexiconError;

pub fn exemplar_header(dims: usize) -> String {
    let mut header = String::from("type,speaker_status,speaker_gender,closeness");
    for d in 0..dims {
        header.push_str(&format!(",phon_{}", d));
    }
    header
}

pub fn write_exemplars<'a, W, I>(out: &mut W, dims: usize, exemplars: I) -> Result<(), LexiconError>
where
    W: Write,
    I: IntoIterator<Item = &'a Exemplar>,
{
    writeln!(out, "{}", exemplar_header(dims))?;
    for e in exemplars {
        write!(
            out,
            "{},{},{},{}",
            e.variant(),
            e.speaker_status(),
            e.speaker_gender(),
            e.closeness()
        )?;
        for x in e.features() {
            write!(out, ",{}", x)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Parses exemplars with `dims` phonetic columns; social scores are
/// recomputed from status and closeness.
pub fn read_exemplars<R: BufRead>(
    input: R,
    dims: usize,
    tools: &ExemplarTools,
) -> Result<Vec<Exemplar>, LexiconError> {
    let mut exemplars = Vec::new();
    for (idx, line) in input.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = idx + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 + dims {
            return Err(LexiconError::CsvParse {
                line: number,
                reason: format!("expected {} columns, found {}", 4 + dims, fields.len()),
            });
        }
        let bad = |what: &str, raw: &str| LexiconError::CsvParse {
            line: number,
            reason: format!("bad {} {:?}", what, raw),
        };

        let variant: Variant = fields[0].parse().map_err(|_| bad("type", fields[0]))?;
        let status: f64 = fields[1].parse().map_err(|_| bad("speaker_status", fields[1]))?;
        let gender: Gender = fields[2].parse().map_err(|_| bad("speaker_gender", fields[2]))?;
        let closeness: f64 = fields[3].parse().map_err(|_| bad("closeness", fields[3]))?;
        let features = fields[4..]
            .iter()
            .map(|raw| raw.parse::<f64>().map_err(|_| bad("phonetic value", *raw)))
            .collect::<Result<Vec<_>, _>>()?;

        exemplars.push(Exemplar::new(
            variant,
            status,
            gender,
            closeness,
            features,
            tools.social_score(status, closeness),
        ));
    }
    Ok(exemplars)
}

pub fn read_exemplars_file(
    path: &Path,
    dims: usize,
    tools: &ExemplarTools,
) -> Result<Vec<Exemplar>, LexiconError> {
    let file = File::open(path)?;
    read_exemplars(BufReader::new(file), dims, tools)
}
