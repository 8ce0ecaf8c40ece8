pub mod use_cases;

pub use use_cases::credential_holder::CredentialHolder;
pub use use_cases::data_wipe::DataWipeUseCase;
pub use use_cases::generate_sketch::GenerateSketchUseCase;
pub use use_cases::history::HistoryStore;
pub use use_cases::preferences::PreferencesService;
pub use use_cases::result_actions::ResultActions;
pub use use_cases::sketch_pipeline::SketchPipeline;
