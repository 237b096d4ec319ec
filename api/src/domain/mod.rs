pub mod export;
pub mod normalize;
pub mod parser;
pub mod prompts;
pub mod quick_edit;
pub mod sanitize;
pub mod validation;
