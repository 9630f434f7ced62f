//! Shared pieces of the demo binaries: shader locations, vertex data and the
//! common `main` body.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use trigon_engine::device::GpuInit;
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::render::{ExitStatus, FrameConfig, SceneDesc};
use trigon_engine::shader::{ShaderSource, StageKind};
use trigon_engine::window::{Runtime, RuntimeConfig};

mod mesh;

pub use mesh::{CUBE, TRIANGLE};

/// Directory holding the demo WGSL files.
///
/// The first existing of: `shaders/` next to the executable, `shaders/` in
/// the working directory, this crate's `shaders/` (for `cargo run`). Falls
/// back to the working directory so a missing file is reported there.
pub fn shader_dir() -> PathBuf {
    shader_dir_candidates()
        .into_iter()
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(SHADER_DIR_NAME))
}

const SHADER_DIR_NAME: &str = "shaders";

fn shader_dir_candidates() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::env::current_dir().ok())
        .chain(Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))))
        .map(|dir| dir.join(SHADER_DIR_NAME))
        .collect()
}

/// Loads `<name>.vert.wgsl` and `<name>.frag.wgsl` from [`shader_dir`].
///
/// A missing file yields an empty source, which fails to compile.
pub fn load_stages(name: &str) -> (ShaderSource, ShaderSource) {
    let dir = shader_dir();
    (
        ShaderSource::load(StageKind::Vertex, dir.join(format!("{name}.vert.wgsl"))),
        ShaderSource::load(StageKind::Fragment, dir.join(format!("{name}.frag.wgsl"))),
    )
}

/// Runs one window titled `title` with `scene` and maps the outcome to a
/// process exit code.
pub fn run(title: &str, scene: Option<SceneDesc>) -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: title.to_owned(),
        ..RuntimeConfig::default()
    };

    let result = Runtime::run(config, GpuInit::default(), FrameConfig::default(), scene);
    exit_status(title, result).into()
}

/// Logs a runtime error with its context chain and turns it into a failure.
fn exit_status(title: &str, result: anyhow::Result<ExitStatus>) -> ExitStatus {
    match result.with_context(|| format!("running `{title}`")) {
        Ok(status) => status,
        Err(err) => {
            log::error!("{err:#}");
            ExitStatus::Failure
        }
    }
}
