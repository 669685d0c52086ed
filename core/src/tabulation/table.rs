use super::{Range, RangeError, counts};

/// Jagged N-dimensional output of a tabulation. The innermost dimension is
/// always a [`Table::Row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Row(Vec<f64>),
    Nested(Vec<Table>),
}

impl Table {
    /// A zero-filled table with the given extent per dimension, outermost
    /// first.
    pub fn with_shape(shape: &[usize]) -> Self {
        match shape {
            [] => Table::Row(Vec::new()),
            [cells] => Table::Row(vec![0.0; *cells]),
            [outer, rest @ ..] => {
                Table::Nested((0..*outer).map(|_| Table::with_shape(rest)).collect())
            }
        }
    }

    /// A table sized for tabulating over `ranges`.
    pub fn for_ranges(ranges: &[Range]) -> Result<Self, RangeError> {
        Ok(Self::with_shape(&counts(ranges)?))
    }

    /// Whether every level matches `shape` exactly.
    pub fn has_shape(&self, shape: &[usize]) -> bool {
        match (self, shape) {
            (Table::Row(cells), [len]) => cells.len() == *len,
            (Table::Nested(tables), [len, rest @ ..]) if !rest.is_empty() => {
                tables.len() == *len && tables.iter().all(|table| table.has_shape(rest))
            }
            _ => false,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Table::Row(_) => 1,
            Table::Nested(tables) => 1 + tables.first().map_or(1, Table::dimensions),
        }
    }

    pub fn as_row(&self) -> Option<&[f64]> {
        match self {
            Table::Row(cells) => Some(cells),
            Table::Nested(_) => None,
        }
    }

    /// Cell at `index`, outermost dimension first.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        match (self, index) {
            (Table::Row(cells), [i]) => cells.get(*i).copied(),
            (Table::Nested(tables), [i, rest @ ..]) => tables.get(*i)?.get(rest),
            _ => None,
        }
    }

    /// All cells in row-major order.
    pub fn flatten(&self) -> Vec<f64> {
        let mut cells = Vec::new();
        self.for_each_row(&mut |row| cells.extend_from_slice(row));
        cells
    }

    pub fn for_each_row(&self, f: &mut impl FnMut(&[f64])) {
        match self {
            Table::Row(cells) => f(cells),
            Table::Nested(tables) => {
                for table in tables {
                    table.for_each_row(f);
                }
            }
        }
    }

    pub(crate) fn for_each_row_mut(&mut self, f: &mut impl FnMut(&mut [f64])) {
        match self {
            Table::Row(cells) => f(cells),
            Table::Nested(tables) => {
                for table in tables {
                    table.for_each_row_mut(f);
                }
            }
        }
    }

    /// Pointers to the first cell of every row, in row-major order. Valid
    /// until the table is next touched.
    pub(crate) fn row_pointers(&mut self) -> Vec<*mut f64> {
        let mut rows = Vec::new();
        self.for_each_row_mut(&mut |row| rows.push(row.as_mut_ptr()));
        rows
    }
}
