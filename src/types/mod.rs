pub mod merge_request;
pub mod report;

pub use merge_request::{
    Author, ChangeRecord, MergeRequestDetails, MergeRequestState, MergeRequestSummary, Project,
};
pub use report::{AnalysisReport, FileStat};
