use crate::backend::{PackageRequest, SigningKeys, Toolchain};
use crate::config::ToolConfig;
use crate::container::PayloadKind;
use crate::exec::run_and_check_output;
use crate::RuntimeError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

pub const DEBUGFS: &str = "debugfs_static";
pub const APEXER: &str = "apexer";

/// Toolchain backed by the host build tools.
pub struct HostToolchain {
    config: ToolConfig,
}

impl HostToolchain {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn dump_command(&self, image: &Path, dest: &Path) -> Command {
        let mut cmd = Command::new(self.config.tool(DEBUGFS));
        cmd.arg("-R")
            .arg(format!("rdump ./ {}", dest.display()))
            .arg(image);
        cmd
    }

    fn package_command(&self, req: &PackageRequest<'_>, output: &Path) -> Command {
        let mut args: Vec<OsString> = vec![
            "--force".into(),
            "--include_build_info".into(),
            "--do_not_check_keyname".into(),
            "--apexer_tool_path".into(),
            self.config.apexer_tool_path().into(),
            "--manifest".into(),
            req.manifest_pb.into(),
        ];
        if let Some(json) = req.manifest_json {
            args.push("--manifest_json".into());
            args.push(json.into());
        }
        args.push("--build_info".into());
        args.push(req.build_info.into());
        if let Some(assets) = req.assets {
            args.push("--assets_dir".into());
            args.push(assets.into());
        }
        if req.payload_kind == PayloadKind::Zip {
            args.push("--payload_type".into());
            args.push(req.payload_kind.as_str().into());
        }
        args.push("--key".into());
        args.push(req.keys.key.as_os_str().to_owned());
        args.push("--pubkey".into());
        args.push(req.keys.pubkey.as_os_str().to_owned());
        args.push(req.payload_dir.into());
        args.push(output.into());

        let mut cmd = Command::new(self.config.tool(APEXER));
        cmd.args(args);
        cmd
    }

    fn sign_command(&self, unsigned: &Path, keys: &SigningKeys, output: &Path) -> Command {
        let mut cmd = Command::new(self.config.java());
        cmd.arg(format!(
            "-Djava.library.path={}",
            self.config.java_library_path()
        ))
        .arg("-jar")
        .arg(self.config.signapk_jar())
        .arg("-a")
        .arg(self.config.signature_modulus.to_string())
        .arg(&keys.x509key)
        .arg(&keys.pk8key)
        .arg(unsigned)
        .arg(output);
        cmd
    }
}

impl Toolchain for HostToolchain {
    fn name(&self) -> &'static str {
        "host"
    }

    fn dump_image(&self, image: &Path, dest: &Path) -> Result<(), RuntimeError> {
        run_and_check_output(&mut self.dump_command(image, dest))?;
        Ok(())
    }

    fn package(&self, request: &PackageRequest<'_>, output: &Path) -> Result<(), RuntimeError> {
        run_and_check_output(&mut self.package_command(request, output))?;
        Ok(())
    }

    fn sign(
        &self,
        unsigned: &Path,
        keys: &SigningKeys,
        output: &Path,
    ) -> Result<(), RuntimeError> {
        run_and_check_output(&mut self.sign_command(unsigned, keys, output))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::display_command;
    use std::path::PathBuf;

    fn keys() -> SigningKeys {
        SigningKeys {
            key: PathBuf::from("/keys/avb.pem"),
            pubkey: PathBuf::from("/keys/avb.avbpubkey"),
            pk8key: PathBuf::from("/keys/apk.pk8"),
            x509key: PathBuf::from("/keys/apk.x509.pem"),
        }
    }

    fn toolchain() -> HostToolchain {
        HostToolchain::new(ToolConfig::new("/host/bin").with_java("java"))
    }

    #[test]
    fn dump_command_line() {
        let cmd = toolchain().dump_command(Path::new("/t/apex_payload.img"), Path::new("/t/out"));
        assert_eq!(
            display_command(&cmd),
            "/host/bin/debugfs_static -R rdump ./ /t/out /t/apex_payload.img"
        );
    }

    #[test]
    fn package_command_line_full() {
        let keys = keys();
        let req = PackageRequest {
            manifest_pb: Path::new("/c/apex_manifest.pb"),
            manifest_json: Some(Path::new("/c/apex_manifest.json")),
            build_info: Path::new("/c/apex_build_info.pb"),
            assets: Some(Path::new("/c/assets")),
            payload_dir: Path::new("/p"),
            payload_kind: PayloadKind::Image,
            keys: &keys,
        };
        let cmd = toolchain().package_command(&req, Path::new("/t/repacked.apex.unsigned"));
        assert_eq!(
            display_command(&cmd),
            "/host/bin/apexer --force --include_build_info --do_not_check_keyname \
             --apexer_tool_path /host/bin:prebuilts/sdk/tools/linux/bin \
             --manifest /c/apex_manifest.pb --manifest_json /c/apex_manifest.json \
             --build_info /c/apex_build_info.pb --assets_dir /c/assets \
             --key /keys/avb.pem --pubkey /keys/avb.avbpubkey /p /t/repacked.apex.unsigned"
        );
    }

    #[test]
    fn package_command_line_minimal_zip_payload() {
        let keys = keys();
        let req = PackageRequest {
            manifest_pb: Path::new("/c/apex_manifest.pb"),
            manifest_json: None,
            build_info: Path::new("/c/apex_build_info.pb"),
            assets: None,
            payload_dir: Path::new("/p"),
            payload_kind: PayloadKind::Zip,
            keys: &keys,
        };
        let line = display_command(&toolchain().package_command(&req, Path::new("/o")));
        assert!(!line.contains("--manifest_json"));
        assert!(!line.contains("--assets_dir"));
        assert!(line.contains("--payload_type zip"));
    }

    #[test]
    fn sign_command_line() {
        let cmd = toolchain().sign_command(
            Path::new("/t/in.apex.unsigned"),
            &keys(),
            Path::new("/t/out.apex"),
        );
        assert_eq!(
            display_command(&cmd),
            "java -Djava.library.path=/host/lib64:/host/lib -jar /host/framework/signapk.jar \
             -a 4096 /keys/apk.x509.pem /keys/apk.pk8 /t/in.apex.unsigned /t/out.apex"
        );
    }

    #[test]
    fn missing_tool_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = HostToolchain::new(ToolConfig::new(dir.path().join("bin")));
        let err = toolchain
            .dump_image(Path::new("/nonexistent.img"), dir.path())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }
}
