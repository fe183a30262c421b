//! The PackURI value type: a part name within an OPC package.
//!
//! Pack URIs always begin with a forward slash and use forward slashes as
//! separators, per the Open Packaging Conventions specification.

use crate::error::{Error, Result};

/// A part name within an OPC package (e.g. `/ppt/slides/slide1.xml`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackUri {
    uri: String,
}

impl PackUri {
    /// Create a new PackUri. The URI must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(Error::InvalidPackUri(format!(
                "pack URI must begin with slash, got '{uri}'"
            )));
        }
        Ok(PackUri { uri })
    }

    /// Resolve a relative reference (like `../media/image1.png`) against a
    /// base URI (like `/ppt/slides`) into an absolute part name.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if base_uri.ends_with('/') {
            format!("{base_uri}{relative_ref}")
        } else {
            format!("{base_uri}/{relative_ref}")
        };

        let mut parts: Vec<&str> = Vec::new();
        for part in joined.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        Self::new(format!("/{}", parts.join("/")))
    }

    /// The directory portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// The filename portion, e.g. `slide1.xml`.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// The extension without its leading period, e.g. `xml`.
    pub fn ext(&self) -> &str {
        match self.filename().rfind('.') {
            Some(pos) => &self.filename()[pos + 1..],
            None => "",
        }
    }

    /// The numeric suffix of a tuple partname, e.g. 3 for
    /// `/ppt/media/image3.png`. None for singleton partnames.
    pub fn idx(&self) -> Option<u32> {
        let stem = match self.filename().rfind('.') {
            Some(pos) => &self.filename()[..pos],
            None => self.filename(),
        };
        let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        // No trailing digits, or a bare number with no name prefix
        if prefix.len() == stem.len() || prefix.is_empty() {
            return None;
        }
        stem[prefix.len()..].parse().ok()
    }

    /// The ZIP member name: the URI with its leading slash stripped.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// The relative reference from `base_uri` to this part, e.g.
    /// `../media/image1.png` from `/ppt/slides`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut rel = "../".repeat(from.len() - common);
        rel.push_str(&to[common..].join("/"));
        rel
    }

    /// The partname of the corresponding `.rels` part, e.g.
    /// `/ppt/_rels/presentation.xml.rels` for `/ppt/presentation.xml`.
    pub fn rels_uri(&self) -> Result<PackUri> {
        let base = self.base_uri();
        if base == "/" {
            Self::new(format!("/_rels/{}.rels", self.filename()))
        } else {
            Self::new(format!("{}/_rels/{}.rels", base, self.filename()))
        }
    }

    /// The full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackUri {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The URI for the [Content_Types].xml stream.
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// The package pseudo-partname. Its rels part is `/_rels/.rels`.
pub const PACKAGE_URI: &str = "/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_leading_slash() {
        assert!(PackUri::new("/ppt/presentation.xml").is_ok());
        assert!(PackUri::new("ppt/presentation.xml").is_err());
    }

    #[test]
    fn test_base_uri_and_filename() {
        let uri = PackUri::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(uri.base_uri(), "/ppt/slides");
        assert_eq!(uri.filename(), "slide1.xml");
        assert_eq!(uri.ext(), "xml");
    }

    #[test]
    fn test_idx() {
        let uri = PackUri::new("/ppt/media/image12.png").unwrap();
        assert_eq!(uri.idx(), Some(12));
        let uri = PackUri::new("/ppt/presentation.xml").unwrap();
        assert_eq!(uri.idx(), None);
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackUri::from_rel_ref("/ppt/slides", "../media/image1.png").unwrap();
        assert_eq!(uri.as_str(), "/ppt/media/image1.png");

        let uri = PackUri::from_rel_ref("/", "ppt/presentation.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/presentation.xml");

        let uri = PackUri::from_rel_ref("/ppt", "slides/slide2.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/slides/slide2.xml");
    }

    #[test]
    fn test_relative_ref() {
        let uri = PackUri::new("/ppt/media/image1.png").unwrap();
        assert_eq!(uri.relative_ref("/ppt/slides"), "../media/image1.png");
        assert_eq!(uri.relative_ref("/ppt"), "media/image1.png");
        assert_eq!(uri.relative_ref("/"), "ppt/media/image1.png");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackUri::new("/ppt/presentation.xml").unwrap();
        assert_eq!(uri.rels_uri().unwrap().as_str(), "/ppt/_rels/presentation.xml.rels");

        let root = PackUri::new("/some.xml").unwrap();
        assert_eq!(root.rels_uri().unwrap().as_str(), "/_rels/some.xml.rels");
    }
}
