use std::fmt;

/// Outcome counts for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    pub attempted: usize,
    pub recovered: usize,
    pub still_defective: usize,
}

/// Outcome of a full reconciler run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub total: usize,
    pub failed: PassStats,
    pub incomplete: PassStats,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Retry Run Complete ===")?;
        writeln!(f, "Entries loaded:      {}", self.total)?;
        writeln!(f, "\nFailed entries:")?;
        writeln!(f, "  Retried:           {}", self.failed.attempted)?;
        writeln!(f, "  Recovered:         {}", self.failed.recovered)?;
        writeln!(f, "  Still failed:      {}", self.failed.still_defective)?;
        writeln!(f, "\nMissing-name entries:")?;
        writeln!(f, "  Retried:           {}", self.incomplete.attempted)?;
        writeln!(f, "  Recovered:         {}", self.incomplete.recovered)?;
        write!(f, "  Still missing:     {}", self.incomplete.still_defective)
    }
}

/// Outcome counts for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Batch Run Complete ===")?;
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Succeeded: {}", self.succeeded)?;
        writeln!(f, "Failed:    {}", self.failed)?;
        write!(f, "Skipped:   {}", self.skipped)
    }
}
