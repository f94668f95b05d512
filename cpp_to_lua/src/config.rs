//! Interface for configuring and running the generator.

use crate::cpp_data::CppPath;
use crate::cpp_ffi_data::Ownership;
use crate::cpp_function::CppFunction;
use crate::cpp_type::TargetWidths;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;

/// Custom ownership classification rule.
///
/// The rule is consulted before the configured patterns and name lists.
/// Returning `None` passes the decision on to them.
pub struct OwnershipRule {
    name: String,
    function: Box<dyn Fn(&CppFunction) -> Option<Ownership>>,
}

impl OwnershipRule {
    pub fn new<S, F>(name: S, function: F) -> Self
    where
        S: Into<String>,
        F: Fn(&CppFunction) -> Option<Ownership> + 'static,
    {
        OwnershipRule {
            name: name.into(),
            function: Box::new(function),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, function: &CppFunction) -> Option<Ownership> {
        (self.function)(function)
    }
}

impl fmt::Debug for OwnershipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnershipRule {{ name = {:?} }}", self.name)
    }
}

/// A regex over the function's qualified source name, mapped to the
/// ownership assigned to matching functions.
#[derive(Debug, Clone)]
pub struct OwnershipPattern {
    pub pattern: Regex,
    pub ownership: Ownership,
}

/// The starting point of the `cpp_to_lua` API.
/// Create a `Config` object, set its properties,
/// and start the processing with `processor::process`.
#[derive(Debug)]
pub struct Config {
    // see setters documentation for information about these properties
    library_name: String,
    output_dir: PathBuf,
    include_directives: Vec<PathBuf>,
    include_paths: Vec<PathBuf>,
    target_include_paths: Vec<PathBuf>,
    cpp_parser_arguments: Vec<String>,
    cpp_parser_blocked_names: Vec<CppPath>,
    target_namespaces: Vec<CppPath>,
    symbol_prefix: Option<String>,
    ffi_widths: TargetWidths,
    ownership_patterns: Vec<OwnershipPattern>,
    owned_names: Vec<CppPath>,
    borrowed_names: Vec<CppPath>,
    ownership_rule: Option<OwnershipRule>,
    report_path: Option<PathBuf>,
}

impl Config {
    /// Creates a `Config`. `library_name` determines the names of the
    /// output artifacts and the default exported symbol prefix.
    pub fn new(library_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Config {
        Config {
            library_name: library_name.into(),
            output_dir: output_dir.into(),
            include_directives: Default::default(),
            include_paths: Default::default(),
            target_include_paths: Default::default(),
            cpp_parser_arguments: Default::default(),
            cpp_parser_blocked_names: Default::default(),
            target_namespaces: Default::default(),
            symbol_prefix: None,
            ffi_widths: Default::default(),
            ownership_patterns: Default::default(),
            owned_names: Default::default(),
            borrowed_names: Default::default(),
            ownership_rule: None,
            report_path: None,
        }
    }

    /// Adds an include directive. Each directive will be added
    /// as `#include <path>` to the input file for the C++ parser
    /// and to the generated host glue file.
    /// File name only paths or relative paths should be used in this method.
    pub fn add_include_directive<P: Into<PathBuf>>(&mut self, path: P) {
        self.include_directives.push(path.into());
    }

    /// Adds a header search path passed to the C++ parser as `-I`.
    pub fn add_include_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.include_paths.push(path.into());
    }

    /// Adds path to an include directory or an include file
    /// of the target library.
    /// Any C++ types and methods will be parsed and used only
    /// if they are declared within one of files or directories
    /// added with this method.
    ///
    /// If no target include paths are added, all types and methods
    /// will be used. Most libraries include system headers and
    /// other libraries' header files, so this mode is often unwanted.
    pub fn add_target_include_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.target_include_paths.push(path.into());
    }

    /// Adds a command line argument for the clang C++ parser.
    pub fn add_cpp_parser_argument<P: Into<String>>(&mut self, arg: P) {
        self.cpp_parser_arguments.push(arg.into());
    }

    /// Adds multiple command line arguments for the clang C++ parser.
    /// See `Config::add_cpp_parser_argument`.
    pub fn add_cpp_parser_arguments<Item, Iter>(&mut self, items: Iter)
    where
        Item: Into<String>,
        Iter: IntoIterator<Item = Item>,
    {
        for item in items {
            self.cpp_parser_arguments.push(item.into());
        }
    }

    /// Adds a C++ identifier that should be skipped
    /// by the C++ parser. Identifier can contain namespaces
    /// and nested classes, with `::` separator (like in
    /// C++ identifiers). Identifier may refer to a method,
    /// a class, a enum or a namespace. All entities inside blacklisted
    /// entity (e.g. the methods of a blocked class or
    /// the contents of a blocked namespace)
    /// will also be skipped.
    pub fn add_cpp_parser_blocked_name(&mut self, path: CppPath) {
        self.cpp_parser_blocked_names.push(path);
    }

    /// Adds multiple blocked names. See `Config::add_cpp_parser_blocked_name`.
    pub fn add_cpp_parser_blocked_names<Iter>(&mut self, items: Iter)
    where
        Iter: IntoIterator<Item = CppPath>,
    {
        for item in items {
            self.cpp_parser_blocked_names.push(item);
        }
    }

    /// Adds a namespace the generator should process. When at least one
    /// target namespace is configured, declarations outside all of them
    /// are ignored, and the namespace components are stripped from
    /// generated names.
    pub fn add_target_namespace(&mut self, namespace: CppPath) {
        self.target_namespaces.push(namespace);
    }

    /// Overrides the prefix prepended to every exported flat symbol.
    /// The default is the library name followed by an underscore.
    pub fn set_symbol_prefix<S: Into<String>>(&mut self, prefix: S) {
        self.symbol_prefix = Some(prefix.into());
    }

    /// Sets the integer width table used when lowering built-in C++ types
    /// to fixed-width FFI types.
    pub fn set_ffi_widths(&mut self, widths: TargetWidths) {
        self.ffi_widths = widths;
    }

    /// Adds a regex over qualified function names; pointer-to-record
    /// results of matching functions receive `ownership`.
    pub fn add_ownership_pattern(&mut self, pattern: Regex, ownership: Ownership) {
        self.ownership_patterns
            .push(OwnershipPattern { pattern, ownership });
    }

    /// Marks results of the function with this qualified name as owned.
    pub fn add_owned_name(&mut self, path: CppPath) {
        self.owned_names.push(path);
    }

    /// Marks results of the function with this qualified name as borrowed.
    pub fn add_borrowed_name(&mut self, path: CppPath) {
        self.borrowed_names.push(path);
    }

    /// Registers a custom ownership rule consulted before the patterns
    /// and name lists.
    pub fn set_ownership_rule(&mut self, rule: OwnershipRule) {
        self.ownership_rule = Some(rule);
    }

    /// Requests a JSON report of accumulated diagnostics at `path`.
    pub fn set_report_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.report_path = Some(path.into());
    }

    /// Returns the name passed to `Config::new`.
    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// Returns the directory the artifacts are written into.
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Returns values added by `Config::add_include_directive`.
    pub fn include_directives(&self) -> &[PathBuf] {
        &self.include_directives
    }

    /// Returns values added by `Config::add_include_path`.
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Returns values added by `Config::add_target_include_path`.
    pub fn target_include_paths(&self) -> &[PathBuf] {
        &self.target_include_paths
    }

    /// Returns names added with `Config::add_cpp_parser_argument`
    /// and similar methods.
    pub fn cpp_parser_arguments(&self) -> &[String] {
        &self.cpp_parser_arguments
    }

    /// Returns names added with `Config::add_cpp_parser_blocked_name`
    /// and similar methods.
    pub fn cpp_parser_blocked_names(&self) -> &[CppPath] {
        &self.cpp_parser_blocked_names
    }

    /// Returns values added by `Config::add_target_namespace`.
    pub fn target_namespaces(&self) -> &[CppPath] {
        &self.target_namespaces
    }

    /// Returns the effective exported symbol prefix.
    pub fn symbol_prefix(&self) -> String {
        match &self.symbol_prefix {
            Some(prefix) => prefix.clone(),
            None => format!("{}_", self.library_name),
        }
    }

    /// Returns the value set by `Config::set_ffi_widths`.
    pub fn ffi_widths(&self) -> &TargetWidths {
        &self.ffi_widths
    }

    /// Returns values added by `Config::add_ownership_pattern`.
    pub fn ownership_patterns(&self) -> &[OwnershipPattern] {
        &self.ownership_patterns
    }

    /// Returns values added by `Config::add_owned_name`.
    pub fn owned_names(&self) -> &[CppPath] {
        &self.owned_names
    }

    /// Returns values added by `Config::add_borrowed_name`.
    pub fn borrowed_names(&self) -> &[CppPath] {
        &self.borrowed_names
    }

    /// Returns the rule set by `Config::set_ownership_rule`.
    pub fn ownership_rule(&self) -> Option<&OwnershipRule> {
        self.ownership_rule.as_ref()
    }

    /// Returns the value set by `Config::set_report_path`.
    pub fn report_path(&self) -> Option<&PathBuf> {
        self.report_path.as_ref()
    }
}
