use super::{
    colorize_mode, json_pretty, spin_fail, spin_ok, spinner, CommandError, EXIT_FAILURE,
    EXIT_SUCCESS,
};
use repack_core::{RepackMode, RepackOptions, Repacker};
use repack_runtime::{check_host_tools, format_missing, select_toolchain, SigningKeys, ToolConfig};
use std::path::PathBuf;
use tracing::debug;

pub struct RepackArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub tmpdir: PathBuf,
    pub key: PathBuf,
    pub pubkey: PathBuf,
    pub pk8key: PathBuf,
    pub x509key: PathBuf,
    pub mode: RepackMode,
    pub libs: Vec<String>,
    pub namespace: String,
    pub keep_scratch: bool,
    pub toolchain: String,
    pub tools_dir: Option<PathBuf>,
    pub tool_config: Option<PathBuf>,
    pub java: Option<PathBuf>,
}

/// Merge the config file with command-line overrides.
fn resolve_tool_config(args: &RepackArgs) -> Result<ToolConfig, CommandError> {
    let mut config = match (&args.tool_config, &args.tools_dir) {
        (Some(path), _) => ToolConfig::load(path)?,
        (None, Some(dir)) => ToolConfig::new(dir),
        (None, None) if args.toolchain != "host" => ToolConfig::new("."),
        (None, None) => {
            return Err(CommandError::new(
                EXIT_FAILURE,
                "no tools directory: pass --tools-dir, set SHARED_LIBS_REPACK_TOOLS_DIR \
                 or give --tool-config",
            ));
        }
    };
    if let Some(dir) = &args.tools_dir {
        config.tools_dir.clone_from(dir);
    }
    if let Some(java) = &args.java {
        config.java = Some(java.clone());
    }
    Ok(config)
}

pub fn run(args: RepackArgs, json: bool) -> Result<u8, CommandError> {
    let config = resolve_tool_config(&args)?;
    debug!("tool config: {config:?}");

    if args.toolchain == "host"
        && std::env::var("SHARED_LIBS_REPACK_SKIP_PREREQS").as_deref() != Ok("1")
    {
        let missing = check_host_tools(&config);
        if !missing.is_empty() {
            return Err(CommandError::new(EXIT_FAILURE, format_missing(&missing)));
        }
    }

    let toolchain = select_toolchain(&args.toolchain, &config)?;

    let mut opts = RepackOptions::new(
        args.input,
        args.output,
        args.tmpdir,
        SigningKeys {
            key: args.key,
            pubkey: args.pubkey,
            pk8key: args.pk8key,
            x509key: args.x509key,
        },
    );
    opts.mode = args.mode;
    opts.libs = args.libs;
    opts.namespace = args.namespace;
    opts.keep_scratch = args.keep_scratch;

    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "repacking {} ({})",
            opts.input.display(),
            colorize_mode(opts.mode.as_str())
        )))
    };

    let report = match Repacker::new(toolchain.as_ref()).run(&opts) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "container repacked");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "repack failed");
            }
            return Err(e.into());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for lib in &report.libraries {
            let arrow = if lib.symlink { "->" } else { "=>" };
            println!("{} {arrow} {}", lib.original_path, lib.final_path);
        }
        println!("wrote {}", report.output.display());
    }
    Ok(EXIT_SUCCESS)
}
