use super::*;
use crate::*;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::s;

/// Named numeric columns over a dense row-major matrix.
///
/// Used for both feature matrices and target matrices; column names travel
/// with the values so that engineering can find columns by name and so that
/// bundles can record exactly what they were fit on.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Table {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            columns.len() == values.ncols(),
            "table has {} column names for {} value columns",
            columns.len(),
            values.ncols()
        );
        Ok(Self { columns, values })
    }

    /// Stacks one [`BlendSample::row`] per sample, preserving input order.
    pub fn assemble(samples: &[BlendSample]) -> Self {
        let rows = samples.iter().map(BlendSample::row).collect::<Vec<_>>();
        Self {
            columns: feature_columns(),
            values: Array2::from_shape_fn((rows.len(), N_FEATURES), |(r, c)| rows[r][c]),
        }
    }

    /// Appends `Weighted_Avg_Property{j} = Σ_i fraction_i × property_ij`.
    /// A fraction/property pair missing from the table contributes nothing.
    pub fn engineer(&self) -> Self {
        let width = self.width();
        let weighted = (1..=N_PROPERTIES)
            .map(|j| {
                (1..=N_COMPONENTS)
                    .filter_map(|i| {
                        let f = self.position(&fraction_column(i))?;
                        let p = self.position(&property_column(i, j))?;
                        Some((f, p))
                    })
                    .fold(Array1::zeros(self.height()), |sum, (f, p)| {
                        sum + &(&self.values.column(f) * &self.values.column(p))
                    })
            })
            .collect::<Vec<Array1<f64>>>();
        let mut values = Array2::<f64>::zeros((self.height(), width + N_PROPERTIES));
        values.slice_mut(s![.., ..width]).assign(&self.values);
        weighted
            .iter()
            .enumerate()
            .for_each(|(j, column)| values.column_mut(width + j).assign(column));
        Self {
            columns: self
                .columns
                .iter()
                .cloned()
                .chain((1..=N_PROPERTIES).map(weighted_column))
                .collect(),
            values,
        }
    }

    /// Relabels columns positionally, e.g. CSV headers to canonical names.
    pub fn rename(self, columns: Vec<String>) -> anyhow::Result<Self> {
        Self::new(columns, self.values)
    }

    /// Gathers the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }
    pub fn height(&self) -> usize {
        self.values.nrows()
    }
    pub fn width(&self) -> usize {
        self.values.ncols()
    }
}
