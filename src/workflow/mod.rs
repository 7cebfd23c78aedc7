pub mod quiz_ctx;
pub mod quiz_flow;

pub use quiz_ctx::{parse_process_json, AnswerEntry, QuizCtx};
pub use quiz_flow::{QuizFlow, QuizFlowOptions, RunState, SubmitOutcome, SubmitTrigger};
