//! Trailer dictionary assembly and file identifier generation.

use super::device::OutputDevice;
use super::object_serializer::ObjectSerializer;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};
use crate::store::ObjectStore;
use md5::{Digest, Md5};

/// Creator and producer recorded when a document has no `Info` dictionary.
pub const PRODUCER: &str = "pdf_assembly";

/// Current time as a PDF date string.
pub fn pdf_date_now() -> String {
    chrono::Utc::now().format("D:%Y%m%d%H%M%S+00'00").to_string()
}

/// Build a fresh file identifier.
///
/// Hashes the document information dictionary (or a synthesized one with a
/// creation date, creator and producer) together with `location`. Both
/// halves of the returned `ID` array are the same digest, as befits a file
/// written from scratch.
pub fn create_file_identifier(
    objects: &ObjectStore,
    trailer: &Dictionary,
    location: &str,
) -> Result<Object> {
    let existing_info = trailer
        .get("Info")
        .and_then(Object::as_reference)
        .and_then(|r| objects.get_dict(r));

    let mut info = match existing_info {
        Some(dict) => dict.clone(),
        None => {
            let now = pdf_date_now();
            let mut dict = Dictionary::new();
            dict.insert("CreationDate".to_string(), Object::String(now.into_bytes()));
            dict.insert("Creator".to_string(), Object::String(PRODUCER.as_bytes().to_vec()));
            dict.insert("Producer".to_string(), Object::String(PRODUCER.as_bytes().to_vec()));
            dict
        },
    };
    info.insert("Location".to_string(), Object::String(location.as_bytes().to_vec()));
    let info = Object::Dictionary(info);

    let serializer = ObjectSerializer::new();
    let mut counter = OutputDevice::new(std::io::sink());
    serializer.write_object(&mut counter, &info)?;
    let length = counter.length() as usize;

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(length)
        .map_err(|_| Error::OutOfMemory(length))?;
    serializer.write_object(&mut buffer, &info)?;

    let digest = Object::String(Md5::digest(&buffer).to_vec());
    Ok(Object::Array(vec![digest.clone(), digest]))
}

/// Assemble the trailer dictionary for a cross-reference section.
///
/// With `only_size` set only `Size` is written, as in the main section of a
/// linearized file. Otherwise `Root` is required, `Encrypt` and `Info` are
/// carried over when present, and a fresh `ID` is generated.
pub fn fill_trailer_object(
    objects: &ObjectStore,
    trailer: &Dictionary,
    size: u32,
    only_size: bool,
    location: &str,
) -> Result<Dictionary> {
    let mut out = Dictionary::new();
    out.insert("Size".to_string(), Object::Integer(size as i64));
    if only_size {
        return Ok(out);
    }

    let root = match trailer.get("Root") {
        Some(Object::Reference(r)) => *r,
        other => {
            return Err(Error::InvalidObjectType {
                expected: "Reference (trailer /Root)".to_string(),
                found: other.map_or("nothing", Object::type_name).to_string(),
            })
        },
    };
    out.insert("Root".to_string(), root.into());

    for key in ["Encrypt", "Info"] {
        if let Some(value) = trailer.get(key) {
            out.insert(key.to_string(), value.clone());
        }
    }

    out.insert(
        "ID".to_string(),
        create_file_identifier(objects, trailer, location)?,
    );
    Ok(out)
}

/// Serialize `trailer` compactly with a zero-padded `Prev` entry, so the
/// result keeps its length when `prev` is rewritten later.
pub fn serialize_with_prev(trailer: &Dictionary, prev: u64) -> Result<Vec<u8>> {
    let mut without_prev = trailer.clone();
    without_prev.remove("Prev");

    let mut bytes = ObjectSerializer::new().serialize(&Object::Dictionary(without_prev))?;
    // drop the closing ">>" and append Prev in its place
    bytes.truncate(bytes.len().saturating_sub(2));
    bytes.extend_from_slice(format!("/Prev {:010}>>", prev).as_bytes());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::object::ObjectRef;

    fn trailer_with_root(objects: &mut ObjectStore) -> Dictionary {
        let catalog = objects.create_object(Object::dict(vec![("Type", Object::name("Catalog"))]));
        let mut trailer = Dictionary::new();
        trailer.insert("Root".to_string(), catalog.into());
        trailer
    }

    #[test]
    fn test_identifier_halves_are_identical() {
        let mut objects = ObjectStore::new();
        let trailer = trailer_with_root(&mut objects);

        let id = create_file_identifier(&objects, &trailer, "out.pdf").unwrap();
        let halves = id.as_array().unwrap();
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0], halves[1]);
        assert_eq!(halves[0].as_string().unwrap().len(), 16);
    }

    #[test]
    fn test_identifier_uses_existing_info() {
        let mut objects = ObjectStore::new();
        let mut trailer = trailer_with_root(&mut objects);
        let info = objects.create_object(Object::dict(vec![(
            "Title",
            Object::String(b"Quarterly".to_vec()),
        )]));
        trailer.insert("Info".to_string(), info.into());

        // deterministic: no timestamp is synthesized when Info exists
        let a = create_file_identifier(&objects, &trailer, "a.pdf").unwrap();
        let b = create_file_identifier(&objects, &trailer, "a.pdf").unwrap();
        let c = create_file_identifier(&objects, &trailer, "c.pdf").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let expected = Md5::digest(b"<</Location (a.pdf)/Title (Quarterly)>>").to_vec();
        assert_eq!(a.as_array().unwrap()[0], Object::String(expected));
    }

    #[test]
    fn test_fill_trailer_carries_optional_keys() {
        let mut objects = ObjectStore::new();
        let mut trailer = trailer_with_root(&mut objects);
        trailer.insert("Encrypt".to_string(), ObjectRef::new(40, 0).into());
        trailer.insert("Unrelated".to_string(), Object::Integer(1));

        let out = fill_trailer_object(&objects, &trailer, 12, false, "x").unwrap();
        assert_eq!(out["Size"].as_integer(), Some(12));
        assert_eq!(out["Root"], trailer["Root"]);
        assert_eq!(out["Encrypt"].as_reference(), Some(ObjectRef::new(40, 0)));
        assert!(out.contains_key("ID"));
        assert!(!out.contains_key("Info"));
        assert!(!out.contains_key("Unrelated"));
    }

    #[test]
    fn test_fill_trailer_only_size() {
        let objects = ObjectStore::new();
        let out = fill_trailer_object(&objects, &Dictionary::new(), 5, true, "x").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["Size"].as_integer(), Some(5));
    }

    #[test]
    fn test_fill_trailer_requires_root() {
        let objects = ObjectStore::new();
        let err = fill_trailer_object(&objects, &Dictionary::new(), 5, false, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDataType);
    }

    #[test]
    fn test_serialize_with_prev_is_fixed_width() {
        let mut trailer = Dictionary::new();
        trailer.insert("Size".to_string(), Object::Integer(4));
        let short = serialize_with_prev(&trailer, 0).unwrap();
        let long = serialize_with_prev(&trailer, 987_654).unwrap();
        assert_eq!(short.len(), long.len());
        assert_eq!(long, b"<</Size 4/Prev 0000987654>>");
    }
}
