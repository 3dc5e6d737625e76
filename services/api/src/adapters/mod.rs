pub mod chat_llm;
pub mod db;
pub mod description_llm;
pub mod github;
pub mod html;
pub mod memory;
pub mod publisher;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use description_llm::OpenAiDescriptionAdapter;
pub use github::{GitHubContentsClient, GitHubSettings};
pub use memory::InMemorySessionStore;
pub use publisher::PortfolioPublisher;
