use crate::cpp_data::{CppItem, CppOriginLocation, CppPath};
use crate::cpp_ffi_data::CppFfiFunction;
use crate::diagnostics::Diagnostic;
use crate::lua_info::LuaOverloadSet;
use cpp_to_lua_common::errors::{format_err, Result};
use log::{debug, trace, warn};
use serde_derive::{Deserialize, Serialize};

/// Information about the place a C++ item was discovered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseItemSource {
    CppParser {
        /// File name of the include file (without full path)
        include_file: String,
        /// Exact location of the declaration
        origin_location: CppOriginLocation,
    },
    ImplicitConstructor,
    ImplicitDestructor,
}

impl DatabaseItemSource {
    pub fn is_parser(&self) -> bool {
        match *self {
            DatabaseItemSource::CppParser { .. } => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CppDatabaseItem {
    pub cpp_item: CppItem,
    pub source: DatabaseItemSource,
}

/// An FFI function with a link to the C++ item it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CppFfiDatabaseItem {
    pub function: CppFfiFunction,
    /// Index of the source item in `Database::cpp_items`.
    pub source_index: usize,
}

impl CppFfiDatabaseItem {
    pub fn from_function(function: CppFfiFunction, source_index: usize) -> Self {
        CppFfiDatabaseItem {
            function,
            source_index,
        }
    }
}

/// Name assigned to a C++ type declaration for use in `ffi.cdef` code.
/// Records without a usable layout are declared as opaque handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfiTypeName {
    pub path: CppPath,
    pub ffi_name: String,
    /// Only ever true for records. Opaque records are emitted as
    /// forward declarations, so they can only be used behind pointers.
    pub is_opaque: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// The flat declaration list (`<lib>_gen.h`).
    Declarations,
    /// The wrapper module (`<lib>_gen.lua`).
    Wrapper,
    /// The host glue translation unit (`<lib>_host_gen.cpp`).
    HostGlue,
}

/// Full text of one output file, rendered in memory. Files are created
/// only after every artifact is rendered and checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub text: String,
}

/// Represents all collected data related to a processed library.
#[derive(Debug, Serialize, Deserialize)]
pub struct Database {
    library_name: String,
    cpp_items: Vec<CppDatabaseItem>,
    ffi_items: Vec<CppFfiDatabaseItem>,
    ffi_type_names: Vec<FfiTypeName>,
    lua_items: Vec<LuaOverloadSet>,
    rendered_artifacts: Vec<RenderedArtifact>,
    diagnostics: Vec<Diagnostic>,
}

impl Database {
    pub fn empty(library_name: impl Into<String>) -> Self {
        Database {
            library_name: library_name.into(),
            cpp_items: Vec::new(),
            ffi_items: Vec::new(),
            ffi_type_names: Vec::new(),
            lua_items: Vec::new(),
            rendered_artifacts: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn cpp_items(&self) -> &[CppDatabaseItem] {
        &self.cpp_items
    }

    pub fn add_cpp_item(&mut self, source: DatabaseItemSource, item: CppItem) -> bool {
        if let Some(existing) = self
            .cpp_items
            .iter_mut()
            .find(|existing| existing.cpp_item.is_same(&item))
        {
            // parser data takes priority
            if source.is_parser() && !existing.source.is_parser() {
                existing.source = source;
            }
            return false;
        }
        debug!("added cpp item: {}, source: {:?}", item, source);
        trace!("cpp item data: {:?}", item);
        self.cpp_items.push(CppDatabaseItem {
            cpp_item: item,
            source,
        });
        true
    }

    pub fn ffi_items(&self) -> &[CppFfiDatabaseItem] {
        &self.ffi_items
    }

    pub fn ffi_items_mut(&mut self) -> &mut [CppFfiDatabaseItem] {
        &mut self.ffi_items
    }

    pub fn add_ffi_item(&mut self, item: CppFfiDatabaseItem) {
        debug!("added ffi item: {}", item.function.short_text());
        self.ffi_items.push(item);
    }

    /// Returns the C++ item an FFI function was generated from.
    pub fn source_cpp_item(&self, ffi_item: &CppFfiDatabaseItem) -> Result<&CppDatabaseItem> {
        self.cpp_items.get(ffi_item.source_index).ok_or_else(|| {
            format_err!(
                "ffi item {} refers to a missing source item",
                ffi_item.function.short_text()
            )
        })
    }

    pub fn ffi_type_names(&self) -> &[FfiTypeName] {
        &self.ffi_type_names
    }

    pub fn add_ffi_type_name(&mut self, name: FfiTypeName) {
        debug!(
            "assigned ffi name: {} -> {}{}",
            name.path.to_cpp_pseudo_code(),
            name.ffi_name,
            if name.is_opaque { " (opaque)" } else { "" }
        );
        self.ffi_type_names.push(name);
    }

    pub fn find_ffi_type_name(&self, path: &CppPath) -> Option<&FfiTypeName> {
        self.ffi_type_names.iter().find(|name| &name.path == path)
    }

    pub fn lua_items(&self) -> &[LuaOverloadSet] {
        &self.lua_items
    }

    pub fn lua_items_mut(&mut self) -> &mut [LuaOverloadSet] {
        &mut self.lua_items
    }

    pub fn add_lua_item(&mut self, item: LuaOverloadSet) {
        debug!("added lua item: {}", item.short_text());
        self.lua_items.push(item);
    }

    pub fn rendered_artifacts(&self) -> &[RenderedArtifact] {
        &self.rendered_artifacts
    }

    pub fn add_rendered_artifact(&mut self, artifact: RenderedArtifact) {
        debug!(
            "rendered artifact: {} ({} bytes)",
            artifact.file_name,
            artifact.text.len()
        );
        self.rendered_artifacts.push(artifact);
    }

    pub fn find_rendered_artifact(&self, kind: ArtifactKind) -> Option<&RenderedArtifact> {
        self.rendered_artifacts
            .iter()
            .find(|artifact| artifact.kind == kind)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
