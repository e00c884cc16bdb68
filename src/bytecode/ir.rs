use serde::{Deserialize, Serialize};

/// A loaded IntCode program image.
///
/// The image is never executed in place: every interpreter instance
/// copies it into its own private memory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    cells: Vec<i64>,
}

impl Program {
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<i64>> for Program {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}

impl From<&[i64]> for Program {
    fn from(cells: &[i64]) -> Self {
        Self::new(cells.to_vec())
    }
}

impl std::fmt::Display for Program {
    /// Formats the image back into comma separated source.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", cell)?;
        }
        Ok(())
    }
}
