pub mod decode;
pub mod document;
pub mod value;

pub use decode::{decode_reply, decode_rows, DecodeError, Decoded, Row};
pub use document::{
    decode_documents, from_row, schema_of, Document, FieldKind, FieldMeta, Schema,
};
pub use value::Reply;
