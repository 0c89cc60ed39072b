pub mod ast;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod paths;
pub mod plan;
pub mod project;
pub mod query_api;

pub use error::{Error, Result};
pub use executor::Value;
pub use paths::{PathEdge, PathMatch};
pub use plan::DEFAULT_MAX_HOPS;
pub use query_api::{
    MatchOptions, PreparedPattern, match_groups, match_groups_many, match_paths,
    match_paths_many, match_rows, match_rows_many, prepare,
};

pub fn parse(pattern: &str) -> Result<ast::Pattern> {
    parser::Parser::parse(pattern)
}
