//! Command-line interface module
//!
//! This module contains the implementations for the CLI subcommands. The binary
//! plays the host: it loads a function dump, fires the same events a decompiler
//! would, and keeps the registry in a directory-backed store.

pub mod apply;
pub mod list;
pub mod mark;
pub mod print;
pub mod reset;
pub mod unmark;

pub use list::OutputFormat;

/// Options shared by every subcommand
#[derive(Debug, Clone)]
pub struct CommonArgs {
    pub store_dir: std::path::PathBuf,
    pub config_path: Option<std::path::PathBuf>,
    pub hide_superfluous: bool,
}

/// Common CLI utilities
pub mod utils {
    use super::CommonArgs;
    use crate::cfunc::CFunc;
    use crate::config::PluginConfig;
    use crate::error::{Error, Result};
    use crate::plugin::Session;
    use crate::registry::{FileStore, SuperfluousRegistry};
    use std::path::Path;

    /// Config file (if any) with command-line overrides applied
    pub fn load_config(args: &CommonArgs) -> Result<PluginConfig> {
        let mut config = PluginConfig::load_or_default(args.config_path.as_deref())?;
        if args.hide_superfluous {
            config.hide_superfluous = true;
        }
        Ok(config)
    }

    /// Start a session on the directory store
    pub fn open_session(args: &CommonArgs) -> Result<Session> {
        let config = load_config(args)?;
        let store = FileStore::open(&args.store_dir)?;
        Session::init(Box::new(store), config)
    }

    /// Open the registry directly, without session semantics
    pub fn open_registry(args: &CommonArgs) -> Result<SuperfluousRegistry> {
        let config = load_config(args)?;
        let store = FileStore::open(&args.store_dir)?;
        SuperfluousRegistry::open(Box::new(store), config.node_name)
    }

    /// Index of the variable called `name`
    pub fn resolve_var(cfunc: &CFunc, name: &str) -> Result<usize> {
        cfunc.lvars.find_by_name(name).ok_or_else(|| {
            Error::invalid_args(format!(
                "no variable named '{}' in function {:#x}",
                name, cfunc.entry_ea
            ))
        })
    }

    /// Write output to file or stdout
    pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
        match output_path {
            Some(path) => {
                std::fs::write(path, content)?;
                Ok(())
            }
            None => {
                println!("{}", content);
                Ok(())
            }
        }
    }

    /// Function dump as JSON when writing to a file, pseudo-C on stdout
    pub fn emit_function(cfunc: &CFunc, output_path: Option<&Path>) -> Result<()> {
        match output_path {
            Some(path) => write_output(&cfunc.to_json()?, Some(path)),
            None => write_output(&crate::ast::print_function(cfunc), None),
        }
    }
}
