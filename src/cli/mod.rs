mod args;
mod config;

pub use args::{Args, CollectArgs, Command, EvalArgs, InitArgs, ProjectArgs, RunArgs, SubmitArgs};
pub use config::{
    get_student_info, Credentials, MainContributor, ModelSettings, StudentInfo, CONTEXT_LENGTH,
    DEFAULT_ASSIGNMENT_ID, DEPTH_PERCENT, DEFAULT_LEADERBOARD_URL, DEFAULT_MODEL, HAYSTACK_DIR, MANIFEST_FILE,
    NUM_TEST_CASES, TEST_CASES_FILE,
};
