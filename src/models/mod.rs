pub mod answer;
pub mod attempt;
pub mod item;

pub use answer::{count_blank_markers, parse_rational, Answer, AnswerError};
pub use attempt::{
    AttemptUp, AttemptsBulkResp, EvalPolicy, EvalRequest, EvalResp, HealthResp, ItemsResp,
    StepsMeta, StepsPayload,
};
pub use item::{Item, ItemKind, ItemStatus};
