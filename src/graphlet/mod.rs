pub mod class;
pub mod codec;
pub mod occurrence;

pub use class::GraphletClass;
pub use codec::{
    decode_frequency_table, decode_occurrence_line, decode_occurrences, encode_occurrence_line,
    OccurrenceReader,
};
pub use occurrence::{class_frequencies, group_by_class, GraphletOccurrence};
