pub mod document_client;
pub mod outcome;
pub mod serializer;
