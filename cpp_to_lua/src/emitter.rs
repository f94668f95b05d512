//! Verification and writing of the rendered artifacts.
//!
//! The wrapper module trusts the declaration list blindly at runtime:
//! `ffi.C.<symbol>` aborts the host process if the symbol was never
//! declared. The consistency check catches that class of defect while
//! both texts are still in memory, before any file is created.

use crate::database::ArtifactKind;
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::{bail, err_msg, Result};
use cpp_to_lua_common::file_utils::{create_dir_all, create_file};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

/// Matches a symbol resolution (`C.<name>`) in the wrapper module.
static SYMBOL_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bC\.([A-Za-z_][A-Za-z0-9_]*)").expect("invalid symbol pattern"));

/// Matches one C identifier in the declaration list.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("invalid identifier pattern"));

/// Checks that every symbol the wrapper module resolves through `ffi.C`
/// is present verbatim, exactly once, in the declaration list. A failure
/// here is a defect of the generator, never of the input.
pub fn check_consistency(cdef: &str, wrapper: &str) -> Result<()> {
    let mut declared = HashMap::<&str, usize>::new();
    for identifier in IDENTIFIER.find_iter(cdef) {
        *declared.entry(identifier.as_str()).or_insert(0) += 1;
    }

    let referenced: BTreeSet<&str> = SYMBOL_REFERENCE
        .captures_iter(wrapper)
        .filter_map(|captures| captures.get(1))
        .map(|group| group.as_str())
        .collect();

    let mut problems = Vec::new();
    for symbol in &referenced {
        match declared.get(symbol).copied().unwrap_or(0) {
            1 => {}
            0 => problems.push(format!("`C.{}` is not declared", symbol)),
            count => problems.push(format!("`C.{}` is declared {} times", symbol, count)),
        }
    }
    if !problems.is_empty() {
        bail!("internal consistency fault: {}", problems.join("; "));
    }
    debug!(
        "consistency check passed ({} referenced symbols)",
        referenced.len()
    );
    Ok(())
}

pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let db = &*data.db;
    let cdef = db
        .find_rendered_artifact(ArtifactKind::Declarations)
        .ok_or_else(|| err_msg("declaration list was not rendered"))?;
    let wrapper = db
        .find_rendered_artifact(ArtifactKind::Wrapper)
        .ok_or_else(|| err_msg("wrapper module was not rendered"))?;
    check_consistency(&cdef.text, &wrapper.text)?;

    create_dir_all(data.config.output_dir())?;
    for artifact in db.rendered_artifacts() {
        let path = data.config.output_dir().join(&artifact.file_name);
        let mut file = create_file(&path)?;
        file.write_all(artifact.text.as_bytes())?;
        file.flush()?;
        info!("Artifact saved: {}", path.display());
    }
    Ok(())
}
