/// Stats from a refresh run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub processed: u32,
    pub published: u32,
    pub skipped_already_updated: u32,
    pub skipped_few_candidates: u32,
    pub skipped_few_references: u32,
    pub extraction_failures: u32,
}

impl RunStats {
    pub fn skipped(&self) -> u32 {
        self.skipped_already_updated + self.skipped_few_candidates + self.skipped_few_references
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Refresh Run Complete ===")?;
        writeln!(f, "Articles processed:  {}", self.processed)?;
        writeln!(f, "Articles published:  {}", self.published)?;
        writeln!(f, "Skipped (updated):   {}", self.skipped_already_updated)?;
        writeln!(f, "Skipped (search):    {}", self.skipped_few_candidates)?;
        writeln!(f, "Skipped (extract):   {}", self.skipped_few_references)?;
        writeln!(f, "Extraction failures: {}", self.extraction_failures)?;
        Ok(())
    }
}
