use slotmap::new_key_type;

new_key_type! {
    /// A compiled shader stage owned by a backend.
    pub struct StageId;

    /// A linked shader program owned by a backend.
    pub struct ProgramId;

    /// A vertex buffer owned by a backend.
    pub struct BufferId;
}
