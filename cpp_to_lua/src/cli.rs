//! Command line interface of the generator.

use crate::config::Config;
use crate::cpp_data::CppPath;
use crate::cpp_ffi_data::Ownership;
use crate::cpp_type::TargetWidths;
use crate::processor;
use clap::Parser;
use cpp_to_lua_common::errors::Result;
use cpp_to_lua_common::file_utils::{canonicalize, create_dir_all, path_to_str};
use flexi_logger::{Duplicate, LevelFilter, LogSpecification, Logger};
use regex::Regex;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Parser)]
/// Generates LuaJIT FFI bindings for a C++ library.
pub struct Options {
    #[arg(short, long)]
    /// Name of the library; determines the artifact file names and the
    /// default exported symbol prefix
    pub lib_name: String,
    #[arg(long, required = true)]
    /// Header included by the generated translation unit and the host
    /// glue file (repeatable)
    pub header: Vec<PathBuf>,
    #[arg(short = 'I', long)]
    /// Header search path passed to the C++ parser (repeatable)
    pub include_path: Vec<PathBuf>,
    #[arg(long)]
    /// Use only declarations located under these files or directories
    /// (repeatable)
    pub target_include_path: Vec<PathBuf>,
    #[arg(long, allow_hyphen_values = true)]
    /// Extra command line argument for the C++ parser, e.g. `-std=c++17`
    /// (repeatable)
    pub parser_arg: Vec<String>,
    #[arg(short, long)]
    /// Directory the generated artifacts are written into
    pub output_dir: PathBuf,
    #[arg(long)]
    /// Namespace to process; declarations outside it are ignored
    /// (repeatable)
    pub namespace: Vec<String>,
    #[arg(long)]
    /// Qualified C++ name skipped by the parser (repeatable)
    pub blocked_name: Vec<String>,
    #[arg(long)]
    /// Regex over qualified function names whose pointer results are
    /// owned by the caller (repeatable)
    pub owned_pattern: Vec<String>,
    #[arg(long)]
    /// Regex over qualified function names whose pointer results are
    /// borrowed (repeatable)
    pub borrowed_pattern: Vec<String>,
    #[arg(long)]
    /// Qualified name of a function whose pointer result is owned by
    /// the caller (repeatable)
    pub owned_name: Vec<String>,
    #[arg(long)]
    /// Qualified name of a function whose pointer result is borrowed
    /// (repeatable)
    pub borrowed_name: Vec<String>,
    #[arg(long)]
    /// Width of `long` on the target, in bits
    pub long_bits: Option<usize>,
    #[arg(long)]
    /// Width of `wchar_t` on the target, in bits
    pub wchar_bits: Option<usize>,
    #[arg(long)]
    /// Overrides the prefix prepended to exported symbols
    pub symbol_prefix: Option<String>,
    #[arg(long)]
    /// Path the JSON diagnostics report is saved to
    pub report: Option<PathBuf>,
    #[arg(long)]
    /// Directory for log files; without it logs go to stderr only
    pub log_dir: Option<PathBuf>,
}

pub fn run_from_args() -> Result<()> {
    run(Options::parse())
}

pub fn run(options: Options) -> Result<()> {
    let mut logger = Logger::with(LogSpecification::default(LevelFilter::Debug).build());
    if let Some(log_dir) = &options.log_dir {
        if !log_dir.exists() {
            create_dir_all(log_dir)?;
        }
        logger = logger
            .log_to_file()
            .directory(path_to_str(log_dir)?)
            .suppress_timestamp()
            .append()
            .print_message()
            .duplicate_to_stderr(Duplicate::Info);
    }
    logger
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));

    if !options.output_dir.exists() {
        create_dir_all(&options.output_dir)?;
    }
    let mut config = Config::new(&options.lib_name, canonicalize(&options.output_dir)?);

    for header in &options.header {
        config.add_include_directive(header);
    }
    for path in &options.include_path {
        config.add_include_path(canonicalize(path)?);
    }
    for path in &options.target_include_path {
        config.add_target_include_path(canonicalize(path)?);
    }
    config.add_cpp_parser_arguments(&options.parser_arg);
    for name in &options.blocked_name {
        config.add_cpp_parser_blocked_name(CppPath::from_str(name)?);
    }
    for namespace in &options.namespace {
        config.add_target_namespace(CppPath::from_str(namespace)?);
    }
    for pattern in &options.owned_pattern {
        config.add_ownership_pattern(Regex::new(pattern)?, Ownership::Owned);
    }
    for pattern in &options.borrowed_pattern {
        config.add_ownership_pattern(Regex::new(pattern)?, Ownership::Borrowed);
    }
    for name in &options.owned_name {
        config.add_owned_name(CppPath::from_str(name)?);
    }
    for name in &options.borrowed_name {
        config.add_borrowed_name(CppPath::from_str(name)?);
    }

    let mut widths = TargetWidths::default();
    if let Some(bits) = options.long_bits {
        widths.long_bits = bits;
    }
    if let Some(bits) = options.wchar_bits {
        widths.wchar_bits = bits;
    }
    config.set_ffi_widths(widths);

    if let Some(prefix) = &options.symbol_prefix {
        config.set_symbol_prefix(prefix.clone());
    }
    if let Some(report) = &options.report {
        config.set_report_path(report.clone());
    }

    processor::process(&config)
}
