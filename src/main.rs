// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! cjswrap CLI - inspect module id resolution and load JSON module trees
//! through the bundle runtime.

use anyhow::Context;
use cjswrap_runtime::{
    Factory, Runtime, RuntimeError, RuntimeOptions, VERSION, WrapOptions, normalize_id, resolve,
};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "cjswrap",
    about = "Synchronous CommonJS module runtime for wrapped bundles",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a module reference against the id of the requiring module
    Resolve {
        /// Id of the requiring module (e.g. ./lib/index)
        base: String,
        /// Reference passed to require (e.g. ../util)
        reference: String,
    },

    /// Strip the module extension from an id
    Normalize {
        /// Module id
        id: String,
    },

    /// Register every .json file under a root as a module and run entry ids
    Load {
        /// Project root module ids are relative to
        root: PathBuf,
        /// Entry modules, as paths relative to the root (e.g. ./config.json)
        main: Vec<String>,
        /// Bundle anchor for host cache keys
        #[arg(long)]
        anchor: Option<String>,
        /// Log runtime diagnostics
        #[arg(long)]
        debug: bool,
        /// JSON file with runtime options
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON file with wrap options (main, includeGlobal, debug)
        #[arg(long)]
        wrap: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cjswrap=debug,cjswrap_runtime=debug"
    } else {
        "cjswrap=warn,cjswrap_runtime=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Resolve { base, reference } => {
            println!("{}", resolve(&base, &reference));
        }
        Command::Normalize { id } => {
            let options = RuntimeOptions::default();
            println!("{}", normalize_id(&id, &options.extensions));
        }
        Command::Load {
            root,
            main,
            anchor,
            debug,
            config,
            wrap,
        } => {
            let mut options = match &config {
                Some(path) => RuntimeOptions::load(path)
                    .map_err(runtime_error)
                    .with_context(|| format!("reading options from {}", path.display()))?,
                None => RuntimeOptions::default(),
            };
            options.debug |= debug;
            if anchor.is_some() {
                options.anchor = anchor;
            }

            let wrap = match &wrap {
                Some(path) => WrapOptions::load(path)
                    .map_err(runtime_error)
                    .with_context(|| format!("reading wrap options from {}", path.display()))?,
                None => WrapOptions::default(),
            };
            let mut mains = wrap.mains();
            mains.extend(main);
            if mains.is_empty() {
                anyhow::bail!("no entry modules given on the command line or in wrap options");
            }
            let ids = entry_ids(&root, &mains)?;

            // The CLI has no surrounding loader to bind
            let runtime = Runtime::from_wrap_options(&wrap, options, None);
            let count = register_json_modules(&runtime, &root)?;
            tracing::debug!("Registered {} modules from {}", count, root.display());

            for exports in runtime.run_main(&ids).map_err(runtime_error)? {
                println!("{}", serde_json::to_string_pretty(&exports.to_json())?);
            }
        }
    }
    Ok(())
}

/// Runtime errors may carry `Rc` values, so only their message crosses into anyhow.
fn runtime_error(err: RuntimeError) -> anyhow::Error {
    anyhow::anyhow!("{}", err)
}

/// Module id the build step would give `path`: `./` + path relative to `root`.
fn module_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("./{}", parts.join("/")))
}

/// Module ids for entry paths given relative to `root`.
fn entry_ids(root: &Path, mains: &[String]) -> anyhow::Result<Vec<String>> {
    mains
        .iter()
        .map(|main| {
            module_id(root, &root.join(main))
                .with_context(|| format!("entry {} is outside {}", main, root.display()))
        })
        .collect()
}

/// Register each `.json` file under `root` as `module.exports = <contents>`.
fn register_json_modules(runtime: &Runtime, root: &Path) -> anyhow::Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(id) = module_id(root, path) else {
            continue;
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        runtime.register(&id, Factory::json(json));
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjswrap_runtime::Value;

    #[test]
    fn test_module_id() {
        let root = Path::new("/project");
        assert_eq!(
            module_id(root, Path::new("/project/lib/data.json")).as_deref(),
            Some("./lib/data.json")
        );
        assert!(module_id(root, Path::new("/elsewhere/x.json")).is_none());
    }

    #[test]
    fn test_entry_ids() {
        let root = Path::new("/project");
        let mains = vec![
            "config.json".to_string(),
            "./lib/data.json".to_string(),
            "lib/nested/x.json".to_string(),
        ];
        assert_eq!(
            entry_ids(root, &mains).unwrap(),
            vec![
                "./config.json".to_string(),
                "./lib/data.json".to_string(),
                "./lib/nested/x.json".to_string(),
            ]
        );
        assert!(entry_ids(root, &["/elsewhere/x.json".to_string()]).is_err());
    }

    #[test]
    fn test_entry_paths_load_registered_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"port": 8080}"#).unwrap();

        let runtime = Runtime::default();
        register_json_modules(&runtime, dir.path()).unwrap();
        let ids = entry_ids(dir.path(), &["config.json".to_string()]).unwrap();
        let exports = runtime.run_main(&ids).unwrap();
        assert_eq!(
            exports[0].as_object().and_then(|o| o.get("port")),
            Some(Value::Number(8080.0))
        );
    }

    #[test]
    fn test_register_json_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/data.json"), r#"{"name": "data"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let runtime = Runtime::default();
        let count = register_json_modules(&runtime, dir.path()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(runtime.module_ids(), vec!["./lib/data.json".to_string()]);

        let exports = runtime.require("./lib/data.json").unwrap();
        assert_eq!(
            exports.as_object().and_then(|o| o.get("name")),
            Some(Value::from("data"))
        );
    }

    #[test]
    fn test_register_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let runtime = Runtime::default();
        assert!(register_json_modules(&runtime, dir.path()).is_err());
    }
}
