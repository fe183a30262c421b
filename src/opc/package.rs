//! ZIP-backed OPC package: read, mutate, write.
//!
//! The whole archive is read into memory up front; parts are mutated in
//! place and the archive is rewritten on save. Template decks are a few
//! megabytes at most, so there is nothing to stream.

use crate::error::{Error, Result};
use crate::opc::constants::relationship_type as rt;
use crate::opc::content_types::ContentTypes;
use crate::opc::packuri::{CONTENT_TYPES_URI, PackUri};
use crate::opc::rel::Relationships;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// An OPC package held fully in memory.
///
/// Parts (including `.rels` parts) are keyed by absolute partname. The
/// `[Content_Types].xml` stream is parsed into its own index and serialized
/// first on save, ahead of every part, matching how Office writes packages.
#[derive(Debug, Clone)]
pub struct OpcPackage {
    parts: BTreeMap<PackUri, Vec<u8>>,
    content_types: ContentTypes,
}

impl OpcPackage {
    /// Open an OPC package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::PartNotFound(format!(
                "package not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Open an OPC package from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open an OPC package from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let mut parts = BTreeMap::new();
        let mut content_types = None;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;

            if format!("/{name}") == CONTENT_TYPES_URI {
                content_types = Some(ContentTypes::from_xml(&blob)?);
            } else {
                parts.insert(PackUri::new(format!("/{name}"))?, blob);
            }
        }

        let content_types = content_types.ok_or_else(|| {
            Error::PartNotFound(format!("{CONTENT_TYPES_URI} missing; not an OPC package"))
        })?;

        Ok(Self {
            parts,
            content_types,
        })
    }

    /// The blob for a part.
    pub fn part(&self, partname: &PackUri) -> Result<&[u8]> {
        self.parts
            .get(partname)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::PartNotFound(partname.to_string()))
    }

    /// Whether a part exists.
    #[inline]
    pub fn contains(&self, partname: &PackUri) -> bool {
        self.parts.contains_key(partname)
    }

    /// Replace a part's blob. The part must already exist.
    pub fn set_part(&mut self, partname: &PackUri, blob: Vec<u8>) -> Result<()> {
        match self.parts.get_mut(partname) {
            Some(existing) => {
                *existing = blob;
                Ok(())
            },
            None => Err(Error::PartNotFound(partname.to_string())),
        }
    }

    /// Add a new part with an Override content type.
    pub fn add_part(&mut self, partname: PackUri, content_type: &str, blob: Vec<u8>) {
        self.content_types.set_override(&partname, content_type);
        self.parts.insert(partname, blob);
    }

    /// Add a new part whose content type is covered by an extension Default.
    pub fn add_part_with_default(
        &mut self,
        partname: PackUri,
        content_type: &str,
        blob: Vec<u8>,
    ) {
        self.content_types
            .ensure_default(partname.ext(), content_type);
        self.parts.insert(partname, blob);
    }

    /// Iterate over all parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = (&PackUri, &[u8])> {
        self.parts.iter().map(|(uri, blob)| (uri, blob.as_slice()))
    }

    /// The content type index.
    #[inline]
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Package-level relationships (`/_rels/.rels`).
    pub fn package_rels(&self) -> Result<Relationships> {
        let rels_uri = PackUri::new("/_rels/.rels")?;
        match self.parts.get(&rels_uri) {
            Some(xml) => Relationships::from_xml("/", xml),
            None => Ok(Relationships::new("/".to_string())),
        }
    }

    /// Relationships of one part. Empty collection if the part has none.
    pub fn part_rels(&self, partname: &PackUri) -> Result<Relationships> {
        let rels_uri = partname.rels_uri()?;
        match self.parts.get(&rels_uri) {
            Some(xml) => Relationships::from_xml(partname.base_uri(), xml),
            None => Ok(Relationships::new(partname.base_uri().to_string())),
        }
    }

    /// Write a part's relationships back into the package.
    pub fn set_part_rels(&mut self, partname: &PackUri, rels: &Relationships) -> Result<()> {
        let rels_uri = partname.rels_uri()?;
        self.parts.insert(rels_uri, rels.to_xml().into_bytes());
        Ok(())
    }

    /// The main document part (target of the officeDocument relationship)
    /// and its content type.
    pub fn main_document_part(&self) -> Result<(PackUri, String)> {
        let rels = self.package_rels()?;
        let rel = rels.part_with_reltype(rt::OFFICE_DOCUMENT)?;
        let partname = rel.target_partname()?;
        let content_type = self.content_types.content_type_for(&partname)?.to_string();
        Ok((partname, content_type))
    }

    /// Next free index for a tuple partname family, e.g. the `image` parts
    /// under `/ppt/media`. Returns 1 for an empty family.
    pub fn next_partname_idx(&self, base_uri: &str, stem: &str) -> u32 {
        self.parts
            .keys()
            .filter(|uri| uri.base_uri() == base_uri && uri.filename().starts_with(stem))
            .filter_map(|uri| uri.idx())
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(&CONTENT_TYPES_URI[1..], options)?;
        zip.write_all(self.content_types.to_xml().as_bytes())?;

        for (partname, blob) in &self.parts {
            zip.start_file(partname.membername(), options)?;
            zip.write_all(blob)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::opc::constants::content_type as ct;

    /// Build a miniature package in memory for tests.
    pub(crate) fn mini_package(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn sample() -> Vec<u8> {
        mini_package(&[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#,
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#,
            ),
            ("ppt/presentation.xml", "<p:presentation/>"),
        ])
    }

    #[test]
    fn test_open_and_main_part() {
        let pkg = OpcPackage::from_bytes(sample()).unwrap();
        let (partname, content_type) = pkg.main_document_part().unwrap();
        assert_eq!(partname.as_str(), "/ppt/presentation.xml");
        assert_eq!(content_type, ct::PML_PRESENTATION_MAIN);
    }

    #[test]
    fn test_missing_content_types_rejected() {
        let data = mini_package(&[("ppt/presentation.xml", "<p:presentation/>")]);
        assert!(OpcPackage::from_bytes(data).is_err());
    }

    #[test]
    fn test_round_trip_preserves_parts() {
        let mut pkg = OpcPackage::from_bytes(sample()).unwrap();
        let media = PackUri::new("/ppt/media/image1.png").unwrap();
        pkg.add_part_with_default(media.clone(), ct::PNG, vec![0x89, b'P', b'N', b'G']);

        let reopened = OpcPackage::from_bytes(pkg.to_bytes().unwrap()).unwrap();
        assert!(reopened.contains(&media));
        assert_eq!(reopened.part(&media).unwrap(), &[0x89, b'P', b'N', b'G']);
        assert_eq!(
            reopened.content_types().content_type_for(&media).unwrap(),
            ct::PNG
        );
    }

    #[test]
    fn test_next_partname_idx() {
        let mut pkg = OpcPackage::from_bytes(sample()).unwrap();
        assert_eq!(pkg.next_partname_idx("/ppt/media", "image"), 1);
        pkg.add_part_with_default(
            PackUri::new("/ppt/media/image3.png").unwrap(),
            ct::PNG,
            vec![],
        );
        assert_eq!(pkg.next_partname_idx("/ppt/media", "image"), 4);
    }

    #[test]
    fn test_set_part_requires_existing() {
        let mut pkg = OpcPackage::from_bytes(sample()).unwrap();
        let missing = PackUri::new("/ppt/slides/slide9.xml").unwrap();
        assert!(pkg.set_part(&missing, vec![]).is_err());
    }
}
