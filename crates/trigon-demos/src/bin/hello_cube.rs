//! Draws a cube spinning about +Y, depth tested.

use std::process::ExitCode;

use trigon_engine::render::SceneDesc;
use trigon_engine::transform::SpinningCamera;

fn main() -> ExitCode {
    let (vertex, fragment) = trigon_demos::load_stages("cube");
    let scene = SceneDesc::new(vertex, fragment, trigon_demos::CUBE)
        .with_depth_test()
        .with_transform(SpinningCamera::default());

    trigon_demos::run("3D Cube", Some(scene))
}
