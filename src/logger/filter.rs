use super::severity::Severity;

/// Severity predicate shared by every sink.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    min: Severity,
}

impl Filter {
    pub fn threshold(min: Severity) -> Self {
        Self { min }
    }

    pub fn min(&self) -> Severity {
        self.min
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        severity >= self.min
    }
}
