use std::fmt;
use time::OffsetDateTime;

/// A row of the changelog table: one applied sequence script
#[derive(Clone, Debug)]
pub struct Changelog {
    version: String,
    name: Option<String>,
    checksum: String,
    apply_by: Option<String>,
    applied_at: Option<OffsetDateTime>,
}

impl Changelog {
    pub fn new(
        version: String,
        name: Option<String>,
        checksum: String,
        apply_by: Option<String>,
        applied_at: Option<OffsetDateTime>,
    ) -> Self {
        Changelog {
            version,
            name,
            checksum,
            apply_by,
            applied_at,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn checksum32(&self) -> &str {
        self.checksum.get(0..8).unwrap_or(&self.checksum)
    }

    pub fn apply_by(&self) -> Option<&str> {
        self.apply_by.as_deref()
    }

    pub fn applied_at(&self) -> Option<OffsetDateTime> {
        self.applied_at
    }
}

impl fmt::Display for Changelog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "v: {} {} ({})",
            self.version,
            self.name.as_deref().unwrap_or("-"),
            self.checksum32(),
        )?;
        if let Some(ref applied_at) = self.applied_at {
            write!(f, ", applied: {:?}", applied_at)?;
        }
        Ok(())
    }
}
