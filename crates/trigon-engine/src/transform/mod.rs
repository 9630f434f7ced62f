//! Time-varying model-view-projection transforms.

mod composer;

pub use composer::{
    SpinningCamera, TransformComposer, CAMERA_DISTANCE, FAR_PLANE, FIELD_OF_VIEW_Y, NEAR_PLANE,
};
