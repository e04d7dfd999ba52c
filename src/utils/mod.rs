pub mod names;
pub mod text;
pub mod timestamps;

pub use names::reduce_to_dict;
pub use text::normalize_text;
pub use timestamps::to_slack_ts;
