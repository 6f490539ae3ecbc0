mod crawl_rules;
mod page_analyzer;
mod page_fetching;
mod page_parser;
mod url_data_proc;
pub use crawl_rules::*;
pub use page_analyzer::*;
pub use page_fetching::*;
pub use page_parser::*;
pub use url_data_proc::*;
