pub mod credential_holder;
pub mod data_wipe;
pub mod generate_sketch;
pub mod history;
pub mod preferences;
pub mod prompt_enhancer;
pub mod result_actions;
pub mod sketch_pipeline;
