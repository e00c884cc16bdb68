/// Zero-initialized, logically infinite IntCode memory.
///
/// Reads past the end return 0 without growing. Writes past the end grow
/// the backing vector, filling the gap with zeros.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    pub fn read(&self, address: usize) -> i64 {
        self.cells.get(address).copied().unwrap_or(0)
    }

    pub fn write(&mut self, address: usize, value: i64) {
        if address >= self.cells.len() {
            self.cells.resize(address + 1, 0);
        }
        self.cells[address] = value;
    }

    /// Number of cells backed by storage. Addresses at or beyond this read as 0.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_is_zero() {
        let memory = Memory::new(vec![1, 2, 3]);
        assert_eq!(memory.read(2), 3);
        assert_eq!(memory.read(3), 0);
        assert_eq!(memory.read(1_000_000), 0);
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut memory = Memory::new(vec![7]);
        memory.write(4, 9);
        assert_eq!(memory.as_slice(), &[7, 0, 0, 0, 9]);
    }

    #[test]
    fn test_write_in_range_does_not_grow() {
        let mut memory = Memory::new(vec![1, 2, 3]);
        memory.write(1, -8);
        assert_eq!(memory.as_slice(), &[1, -8, 3]);
    }
}
