use regqa_core::error::AppError;

pub mod openai_llm;

/// External "prompt -> text" function.
pub trait Llm: Send + Sync {
    fn generate(&self, system: &str, user: &str) -> Result<String, AppError>;
}
