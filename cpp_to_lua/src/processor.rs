use crate::config::Config;
use crate::database::Database;
use crate::diagnostics::DiagnosticsReport;
use crate::{
    cpp_ffi_generator, cpp_implicit_methods, cpp_parser, default_arguments, emitter,
    lua_generator, overload_resolver, ownership,
};
use cpp_to_lua_common::errors::{bail, Result, ResultExt};
use cpp_to_lua_common::file_utils::save_json;
use log::{error, info, trace};
use std::fmt;
use std::path::Path;
use std::time::Instant;

/// Returns `Err` if any input path in `config` is invalid or relative.
fn check_all_paths(config: &Config) -> Result<()> {
    let check_path = |path: &Path, must_be_dir: bool| -> Result<()> {
        if !path.is_absolute() {
            bail!(
                "Only absolute paths allowed. Relative path: {}",
                path.display()
            );
        }
        if !path.exists() {
            bail!("Path doesn't exist: {}", path.display());
        }
        if must_be_dir && !path.is_dir() {
            bail!("Path is not a directory: {}", path.display());
        }
        Ok(())
    };

    for path in config.include_paths() {
        check_path(path, true)?;
    }
    for path in config.target_include_paths() {
        check_path(path, false)?;
    }
    Ok(())
}

/// Shared state of the generation pipeline, threaded by reference
/// through every processing step.
pub struct ProcessorData<'a> {
    pub config: &'a Config,
    pub db: &'a mut Database,
}

struct ProcessingStep {
    name: String,
    function: Box<dyn Fn(&mut ProcessorData<'_>) -> Result<()>>,
}

impl fmt::Debug for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingStep")
            .field("name", &self.name)
            .finish()
    }
}

impl ProcessingStep {
    fn new<S: Into<String>, F: 'static + Fn(&mut ProcessorData<'_>) -> Result<()>>(
        name: S,
        function: F,
    ) -> Self {
        ProcessingStep {
            name: name.into(),
            function: Box::new(function),
        }
    }
}

fn main_procedure() -> Vec<ProcessingStep> {
    vec![
        ProcessingStep::new("cpp_parser", cpp_parser::run),
        ProcessingStep::new("add_implicit_methods", cpp_implicit_methods::run),
        ProcessingStep::new("cpp_ffi_generator", cpp_ffi_generator::run),
        ProcessingStep::new("resolve_overloads", overload_resolver::run),
        ProcessingStep::new("synthesize_default_arities", default_arguments::run),
        ProcessingStep::new("annotate_ownership", ownership::run),
        ProcessingStep::new("lua_generator", lua_generator::run),
        ProcessingStep::new("emitter", emitter::run),
    ]
}

/// Runs the whole generation pipeline over `config`.
/// Artifacts are written only if every step succeeds.
pub fn process(config: &Config) -> Result<()> {
    info!("Processing library: {}", config.library_name());
    check_all_paths(config)?;

    let mut database = Database::empty(config.library_name());

    for step in main_procedure() {
        info!("Running processing step: {}", step.name);

        let mut data = ProcessorData {
            config,
            db: &mut database,
        };

        let started_time = Instant::now();

        if let Err(err) = (step.function)(&mut data) {
            error!("Step failed! Aborting...");
            return Err(err
                .context(format!("processing step \"{}\" failed", step.name))
                .into());
        }

        trace!(
            "Step '{}' completed in {:?}",
            step.name,
            started_time.elapsed()
        );
    }

    let report = DiagnosticsReport::new(database.library_name(), database.diagnostics());
    if report.total == 0 {
        info!("Finished without diagnostics");
    } else {
        info!(
            "Finished with {} diagnostics ({} unmappable types, {} ambiguous overloads, \
             {} unresolvable defaults)",
            report.total,
            report.unmappable_types,
            report.ambiguous_overloads,
            report.unresolvable_defaults
        );
    }
    if let Some(path) = config.report_path() {
        save_json(path, &report)
            .with_context(|_| "failed to save diagnostics report")?;
        info!("Diagnostics report saved to {}", path.display());
    }

    Ok(())
}
