use std::cmp::Ordering;
use std::fmt;

/// A qubit identified by name.
///
/// Qubits sort in natural order, so `q_2` comes before `q_10`. The simulator
/// uses this order to lay out the state vector, first qubit most significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qubit {
    name: String,
}

impl Qubit {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `n` qubits named `{prefix}0` to `{prefix}{n-1}`.
    pub fn range(n: usize, prefix: &str) -> Vec<Qubit> {
        Self::range_from(0, n, prefix)
    }

    /// `n` qubits numbered from `start`, for registers split into batches.
    pub fn range_from(start: usize, n: usize, prefix: &str) -> Vec<Qubit> {
        (start..start + n)
            .map(|i| Qubit::named(format!("{prefix}{i}")))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn split_index(&self) -> (&str, Option<u64>) {
        let digits = self
            .name
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        let (prefix, suffix) = self.name.split_at(self.name.len() - digits);
        (prefix, suffix.parse().ok())
    }
}

impl Ord for Qubit {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lp, ln) = self.split_index();
        let (rp, rn) = other.split_index();
        lp.cmp(rp)
            .then(ln.cmp(&rn))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Qubit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
