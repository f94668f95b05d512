//! Pipeline step that renders all output artifacts in memory.
//!
//! Rendering is separated from writing: the emitter step verifies the
//! rendered texts against each other and only then touches the output
//! directory, so a failed run leaves no files behind.

use crate::cdef_generator;
use crate::cpp_glue_generator;
use crate::database::{ArtifactKind, RenderedArtifact};
use crate::lua_code_generator;
use crate::processor::ProcessorData;
use cpp_to_lua_common::errors::Result;

pub fn run(data: &mut ProcessorData<'_>) -> Result<()> {
    let cdef = cdef_generator::generate_cdef(data)?;
    let wrapper = lua_code_generator::generate_wrapper(data.db)?;
    let glue = cpp_glue_generator::generate_glue(data.config, data.db)?;

    let library_name = data.db.library_name().to_string();
    data.db.add_rendered_artifact(RenderedArtifact {
        kind: ArtifactKind::Declarations,
        file_name: format!("{}_gen.h", library_name),
        text: cdef,
    });
    data.db.add_rendered_artifact(RenderedArtifact {
        kind: ArtifactKind::Wrapper,
        file_name: format!("{}_gen.lua", library_name),
        text: wrapper,
    });
    data.db.add_rendered_artifact(RenderedArtifact {
        kind: ArtifactKind::HostGlue,
        file_name: format!("{}_host_gen.cpp", library_name),
        text: glue,
    });
    Ok(())
}
