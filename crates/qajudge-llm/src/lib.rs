pub mod limit;
pub mod openai;
pub mod retry;
