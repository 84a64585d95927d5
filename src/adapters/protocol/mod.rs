pub mod dto;
pub mod kraft_record_parser;
pub mod kraft_record_writer;
pub mod parser;

pub use kraft_record_parser::KraftRecordParser;
pub use kraft_record_writer::MetadataLogWriter;
