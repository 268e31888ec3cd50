pub mod export;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod scenario;
pub mod validator;
