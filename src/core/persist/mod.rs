//! Writing converted entities inside a store transaction

pub mod event_writer;

pub use event_writer::EventWriter;
