//! # I/O
//!
//! Header-less CSV loading of return tables and persisting of weight vectors.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use csv::Trim;
use csv::WriterBuilder;
use ndarray::Array1;
use tracing::debug;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::quant::portfolio::data::ReturnMatrix;

/// Load a comma-separated `n x p` numeric table, one observation per line.
pub fn load_return_table<P: AsRef<Path>>(path: P) -> Result<ReturnMatrix> {
  let file = File::open(path.as_ref())?;
  let mut reader = ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(Trim::All)
    .from_reader(file);

  let mut rows = Vec::new();
  for (i, record) in reader.records().enumerate() {
    let record = record.map_err(|e| PortfolioError::MalformedTable(format!("row {i}: {e}")))?;
    let row = record
      .iter()
      .enumerate()
      .map(|(j, cell)| {
        cell.parse::<f64>().map_err(|_| {
          PortfolioError::MalformedTable(format!("row {i}, column {j}: cannot parse {cell:?}"))
        })
      })
      .collect::<Result<Vec<f64>>>()?;
    rows.push(row);
  }

  let table = ReturnMatrix::from_rows(&rows)?;
  debug!(
    path = %path.as_ref().display(),
    n = table.n_obs(),
    p = table.n_assets(),
    "loaded return table"
  );
  Ok(table)
}

/// Write one weight per line in index order.
pub fn save_weights<P: AsRef<Path>>(path: P, weights: &Array1<f64>) -> Result<()> {
  let mut writer = WriterBuilder::new()
    .has_headers(false)
    .from_path(path.as_ref())
    .map_err(std::io::Error::from)?;

  for w in weights {
    writer
      .write_record([w.to_string()])
      .map_err(std::io::Error::from)?;
  }
  writer.flush()?;
  Ok(())
}
