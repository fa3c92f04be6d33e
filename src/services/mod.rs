pub mod config_service;
pub mod llm_client;
pub mod prompt_service;
