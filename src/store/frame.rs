use crate::Error;
use crate::features::Table;
use anyhow::Context;
use ndarray::Array2;
use std::ops::Range;
use std::path::Path;

/// A parsed CSV: header plus string cells, rectangular.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    /// Parses CSV bytes. Ragged rows and undecodable text are rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);
        let columns = reader
            .headers()
            .map_err(|e| Error::invalid(format!("Invalid CSV header: {}", e)))?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(String::from).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::invalid(format!("Invalid CSV: {}", e)))?;
        Ok(Self { columns, rows })
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("parse {}", path.display()))
    }

    /// Reads only the header line.
    pub fn header(path: &Path) -> anyhow::Result<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("open {}", path.display()))?;
        Ok(reader
            .headers()
            .with_context(|| format!("read header of {}", path.display()))?
            .iter()
            .map(String::from)
            .collect())
    }

    /// Drops the named column if present.
    pub fn without(self, name: &str) -> Self {
        match self.position(name) {
            None => self,
            Some(index) => Self {
                columns: self
                    .columns
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, c)| c)
                    .collect(),
                rows: self
                    .rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .enumerate()
                            .filter(|(i, _)| *i != index)
                            .map(|(_, c)| c)
                            .collect()
                    })
                    .collect(),
            },
        }
    }

    /// Parses a contiguous range of columns as finite f64. `inf` and `NaN`
    /// cells are rejected alongside text.
    pub fn numeric(&self, range: Range<usize>) -> anyhow::Result<Table> {
        anyhow::ensure!(
            range.end <= self.width(),
            "requested columns {}..{} of a {}-column table",
            range.start,
            range.end,
            self.width()
        );
        let mut values = Array2::<f64>::zeros((self.height(), range.len()));
        for (r, row) in self.rows.iter().enumerate() {
            for (c, cell) in row[range.clone()].iter().enumerate() {
                values[[r, c]] = cell
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "column '{}' row {}: '{}' is not a finite number",
                            self.columns[range.start + c],
                            r + 1,
                            cell
                        )
                    })?;
            }
        }
        Table::new(self.columns[range].to_vec(), values)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.position(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn height(&self) -> usize {
        self.rows.len()
    }
    pub fn width(&self) -> usize {
        self.columns.len()
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }
}
