//! Draws one orange triangle, untransformed.

use std::process::ExitCode;

use trigon_engine::render::SceneDesc;

fn main() -> ExitCode {
    let (vertex, fragment) = trigon_demos::load_stages("basic");
    let scene = SceneDesc::new(vertex, fragment, trigon_demos::TRIANGLE);

    trigon_demos::run("Hello Triangle", Some(scene))
}
