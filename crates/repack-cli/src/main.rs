mod commands;

use clap::{Parser, ValueEnum};
use commands::{CommandError, EXIT_FAILURE};
use repack_core::{RepackMode, DEFAULT_APEX_NAMESPACE, DEFAULT_TARGET_LIBS};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Replace libraries with symlinks into the shared-libs container.
    Strip,
    /// Move libraries into hash-addressed directories inside the payload.
    #[value(name = "sharedlibs")]
    SharedLibs,
}

impl From<Mode> for RepackMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Strip => RepackMode::Strip,
            Mode::SharedLibs => RepackMode::SharedLibs,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "shared_libs_repack",
    version,
    about = "Repack a test APEX for shared-library extraction scenarios"
)]
struct Cli {
    /// Input container.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the re-signed container.
    #[arg(long)]
    output: PathBuf,

    /// Payload image signer private key.
    #[arg(long)]
    key: PathBuf,

    /// Payload image signer public key.
    #[arg(long)]
    pubkey: PathBuf,

    /// Container signer PKCS8 private key.
    #[arg(long)]
    pk8key: PathBuf,

    /// Container signer x509 certificate.
    #[arg(long)]
    x509key: PathBuf,

    /// Directory for scratch files.
    #[arg(long)]
    tmpdir: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Strip)]
    mode: Mode,

    /// Host tools bin/ directory holding debugfs_static and apexer.
    #[arg(long, env = "SHARED_LIBS_REPACK_TOOLS_DIR")]
    tools_dir: Option<PathBuf>,

    /// JSON tool configuration. Command-line flags take precedence.
    #[arg(long)]
    tool_config: Option<PathBuf>,

    /// Java launcher used to run signapk.jar.
    #[arg(long)]
    java: Option<PathBuf>,

    /// Target library basename (repeatable). Defaults to libc++.so and libsharedlibtest.so.
    #[arg(long = "lib", value_name = "NAME")]
    libs: Vec<String>,

    /// Mount namespace used in strip symlink targets.
    #[arg(long, default_value = DEFAULT_APEX_NAMESPACE)]
    namespace: String,

    /// Leave scratch directories in --tmpdir after the run.
    #[arg(long, default_value_t = false)]
    keep_scratch: bool,

    #[arg(long, hide = true, env = "SHARED_LIBS_REPACK_TOOLCHAIN", default_value = "host")]
    toolchain: String,

    /// Output the run report as structured JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false)]
    trace: bool,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SHARED_LIBS_REPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let libs = if cli.libs.is_empty() {
        DEFAULT_TARGET_LIBS.iter().map(|s| (*s).to_owned()).collect()
    } else {
        cli.libs
    };

    let args = commands::repack::RepackArgs {
        input: cli.input,
        output: cli.output,
        tmpdir: cli.tmpdir,
        key: cli.key,
        pubkey: cli.pubkey,
        pk8key: cli.pk8key,
        x509key: cli.x509key,
        mode: cli.mode.into(),
        libs,
        namespace: cli.namespace,
        keep_scratch: cli.keep_scratch,
        toolchain: cli.toolchain,
        tools_dir: cli.tools_dir,
        tool_config: cli.tool_config,
        java: cli.java,
    };

    match commands::repack::run(args, cli.json) {
        Ok(code) => ExitCode::from(code),
        Err(CommandError { code, message }) => {
            eprintln!("error: {message}");
            ExitCode::from(if code == 0 { EXIT_FAILURE } else { code })
        }
    }
}
