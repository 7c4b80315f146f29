//! Configuration generation from a bound schema
//!
//! Per entry: `pending -> dependency check -> skipped | prompting -> resolved`.
//! There is no error state; every answer the prompt engine returns is usable.

use super::artifact::{write_atomic, ConfigValue, ConfigurationValues};
use super::schema::{BoundSchema, ConfigurationEntry, ValueKind};
use crate::error::{InstallError, Result};
use crate::prompt::PromptEngine;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Final state of one schema entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Its module flag resolved to false: not asked, not written
    Skipped,
    Resolved(ConfigValue),
}

/// Everything a generation run decided
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub values: ConfigurationValues,
    /// `(domain, key, outcome)` in the order entries were evaluated
    pub outcomes: Vec<(String, String, EntryOutcome)>,
}

impl GenerationReport {
    pub fn outcome(&self, domain: &str, key: &str) -> Option<&EntryOutcome> {
        self.outcomes
            .iter()
            .find(|(d, k, _)| d == domain && k == key)
            .map(|(_, _, o)| o)
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, o)| *o == EntryOutcome::Skipped)
            .count()
    }
}

/// Prompts for every active entry of a schema
pub struct Generator<'a> {
    schema: &'a BoundSchema,
}

impl<'a> Generator<'a> {
    pub fn new(schema: &'a BoundSchema) -> Self {
        Self { schema }
    }

    /// Default artifact location inside a configuration directory
    pub fn destination_in(&self, conf_dir: &Path) -> std::path::PathBuf {
        conf_dir.join(self.schema.file_name())
    }

    /// Ask every active entry, module flags first
    pub fn resolve<R: BufRead, W: Write>(
        &self,
        engine: &mut PromptEngine<R, W>,
    ) -> Result<GenerationReport> {
        let flags_domain = self.schema.flags_domain();
        let mut report = GenerationReport {
            values: ConfigurationValues::with_domains(self.schema.domains()),
            outcomes: Vec::new(),
        };
        let mut flags: HashMap<&str, bool> = HashMap::new();

        for entry in self.schema.entries().iter().filter(|e| e.domain == flags_domain) {
            let value = ask_entry(engine, entry)?;
            flags.insert(&entry.key, value == ConfigValue::Bool(true));
            record(&mut report, entry, value);
        }

        for entry in self.schema.entries().iter().filter(|e| e.domain != flags_domain) {
            let active = match &entry.depends_on {
                Some(flag) => flags.get(flag.as_str()).copied().unwrap_or(false),
                None => true,
            };

            if !active {
                report.outcomes.push((
                    entry.domain.clone(),
                    entry.key.clone(),
                    EntryOutcome::Skipped,
                ));
                continue;
            }

            let value = ask_entry(engine, entry)?;
            record(&mut report, entry, value);
        }

        Ok(report)
    }

    /// Ask every active entry then write the artifact in one atomic step
    ///
    /// If prompting stops early (cancellation, closed input) the destination
    /// is never touched.
    pub fn generate<R: BufRead, W: Write>(
        &self,
        engine: &mut PromptEngine<R, W>,
        destination: &Path,
    ) -> Result<GenerationReport> {
        let report = self.resolve(engine)?;
        write_atomic(destination, &report.values.render()).map_err(|cause| {
            InstallError::Step {
                step: "configure".to_string(),
                cause,
            }
        })?;
        Ok(report)
    }
}

fn ask_entry<R: BufRead, W: Write>(
    engine: &mut PromptEngine<R, W>,
    entry: &ConfigurationEntry,
) -> Result<ConfigValue> {
    let label = format!("[{}] {}", entry.domain, entry.name);
    match entry.kind {
        ValueKind::Bool => {
            let answer = engine.ask_bool(&label, entry.default == "y")?;
            Ok(ConfigValue::Bool(answer))
        }
        ValueKind::Text => {
            let answer = engine.ask_text(&label, &entry.default)?;
            Ok(ConfigValue::Text(answer))
        }
    }
}

fn record(report: &mut GenerationReport, entry: &ConfigurationEntry, value: ConfigValue) {
    report
        .values
        .insert(&entry.domain, &entry.key, value.clone());
    report.outcomes.push((
        entry.domain.clone(),
        entry.key.clone(),
        EntryOutcome::Resolved(value),
    ));
}
