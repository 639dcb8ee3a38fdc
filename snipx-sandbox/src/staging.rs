//! Scoped temporary script files

use crate::encoding::EncodingNormalizer;
use crate::error::SandboxError;
use crate::platform::ScriptPlan;
use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A staged script that is deleted when dropped
///
/// Names combine the process id with random characters from `tempfile`, so
/// concurrent invocations sharing one directory never collide.
#[derive(Debug)]
pub struct TempScript {
    path: TempPath,
}

impl TempScript {
    /// Write `code` into a fresh script file under `dir`
    pub fn stage(
        dir: &Path,
        plan: &ScriptPlan,
        code: &str,
        normalizer: &EncodingNormalizer,
    ) -> Result<Self> {
        let staging_err = |source| SandboxError::Staging {
            dir: dir.to_path_buf(),
            source,
        };

        let prefix = format!("snipx_{}_", std::process::id());
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(plan.extension)
            .tempfile_in(dir)
            .map_err(staging_err)?;

        file.write_all(&script_body(plan, code, normalizer))
            .and_then(|_| file.flush())
            .map_err(staging_err)?;

        // Closes the handle; the path still deletes itself on drop.
        let path = file.into_temp_path();

        #[cfg(unix)]
        if plan.executable {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700))
                .map_err(staging_err)?;
        }

        tracing::debug!(path = %path.display(), "Staged script");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the script now, reporting any error
    pub fn close(self) -> std::io::Result<()> {
        let path: PathBuf = self.path.to_path_buf();
        let result = self.path.close();
        if let Err(e) = &result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged script");
        }
        result
    }
}

/// Prologue lines, then the snippet with a guaranteed trailing newline
fn script_body(plan: &ScriptPlan, code: &str, normalizer: &EncodingNormalizer) -> Vec<u8> {
    let mut body = Vec::with_capacity(code.len() + 64);
    for line in &plan.prologue {
        body.extend_from_slice(line.as_bytes());
        body.push(b'\n');
    }
    if plan.narrow_payload {
        body.extend(normalizer.to_native(code));
    } else {
        body.extend_from_slice(code.as_bytes());
    }
    if !code.ends_with('\n') {
        body.push(b'\n');
    }
    body
}
