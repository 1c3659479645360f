//! 服务层模块

pub mod date_actions;
pub mod idea_generator;
mod idea_parser;
mod prompt_service;
pub mod quiz;
pub mod storage;

pub use idea_generator::IdeaGenerator;
pub use idea_parser::parse_idea;
