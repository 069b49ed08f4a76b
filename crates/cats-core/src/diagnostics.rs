//! Non-fatal findings of a subsetting run.
//!
//! Most problems the pipeline meets abort the run (see [`crate::CatsError`]).
//! Three do not: import buses left without an `IMPORT` generator, corridors
//! whose impedance gives a non-finite susceptance, and islands dropped by the
//! area selector. Stages record those here so they reach the run summary and
//! its JSON form instead of only the log.
//!
//! ```
//! use cats_core::RunDiagnostics;
//!
//! let mut run = RunDiagnostics::new();
//! run.stats.buses = 4;
//! run.diagnostics
//!     .add_warning_with_entity("import", "import bus has no IMPORT generator", "Bus 7");
//! assert!(run.diagnostics.has_warnings());
//! assert!(run.summary().ends_with("1 warning"));
//! ```

use serde::Serialize;

/// One recorded warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Stage-level grouping: `topology`, `electrical`, `import` or `load`
    pub category: String,
    pub message: String,
    /// Element the warning is about, e.g. `Bus 7` or `Line 3 -> 9`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        Ok(())
    }
}

/// Warnings in the order the stages raised them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.warnings.push(Warning {
            category: category.to_string(),
            message: message.to_string(),
            entity: None,
        });
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.warnings.push(Warning {
            category: category.to_string(),
            message: message.to_string(),
            entity: Some(entity.to_string()),
        });
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        match self.warnings.len() {
            0 => "no warnings".to_string(),
            1 => "1 warning".to_string(),
            n => format!("{n} warnings"),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for warning in &self.warnings {
            writeln!(f, "  {warning}")?;
        }
        Ok(())
    }
}

/// Element counts of a reduced system.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReductionStats {
    pub buses: usize,
    pub import_buses: usize,
    pub isolated_buses: usize,
    pub lines: usize,
    pub generators: usize,
    pub import_generators: usize,
    pub load_rows: usize,
    pub variability_rows: usize,
}

/// Counts plus warnings for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunDiagnostics {
    pub stats: ReductionStats,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl RunDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} buses ({} import, {} isolated dropped), {} lines, {} gens, {} load rows | {}",
            self.stats.buses,
            self.stats.import_buses,
            self.stats.isolated_buses,
            self.stats.lines,
            self.stats.generators,
            self.stats.load_rows,
            self.diagnostics.summary()
        )
    }
}

impl std::fmt::Display for RunDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Subset: {}", self.summary())?;
        write!(f, "{}", self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded_run() -> RunDiagnostics {
        let mut run = RunDiagnostics::new();
        run.stats.buses = 4;
        run.stats.import_buses = 1;
        run.stats.isolated_buses = 2;
        run.stats.lines = 6;
        run.stats.generators = 3;
        run.stats.load_rows = 4;
        run.diagnostics
            .add_warning("topology", "dropped 2 isolated buses in 1 smaller components");
        run.diagnostics.add_warning_with_entity(
            "import",
            "import bus has no IMPORT generator",
            "Bus 7",
        );
        run
    }

    #[test]
    fn summary_counts_elements_and_warnings() {
        let run = recorded_run();
        assert_eq!(
            run.summary(),
            "4 buses (1 import, 2 isolated dropped), 6 lines, 3 gens, 4 load rows | 2 warnings"
        );
        assert_eq!(RunDiagnostics::new().diagnostics.summary(), "no warnings");
    }

    #[test]
    fn display_lists_each_warning_with_its_entity() {
        let text = recorded_run().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "  [topology] dropped 2 isolated buses in 1 smaller components"
        );
        assert_eq!(
            lines[2],
            "  [import] import bus has no IMPORT generator (Bus 7)"
        );
    }

    #[test]
    fn json_flattens_warnings_next_to_stats() {
        let mut run = recorded_run();
        run.diagnostics.add_warning_with_entity(
            "electrical",
            "susceptance is not finite (r = x = 0)",
            "Line 3 -> 9",
        );
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["stats"]["buses"], 4);
        let warnings = value["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[2]["category"], "electrical");
        assert_eq!(warnings[2]["entity"], "Line 3 -> 9");
        assert!(warnings[0].get("entity").is_none());

        let clean = serde_json::to_value(RunDiagnostics::new()).unwrap();
        assert!(clean.get("warnings").is_none());
    }
}
