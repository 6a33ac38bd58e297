/// Part names inside an OPC package.
///
/// A PackURI is the absolute, slash-prefixed name of a part
/// (`/ppt/slides/slide3.xml`). Archive members carry the same name without
/// the leading slash; relationship parts refer to targets relative to the
/// directory of their source part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI. The string must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Build a PackURI from an archive member name (`ppt/slides/slide1.xml`).
    pub fn from_member(member: &str) -> Self {
        PackURI {
            uri: format!("/{}", member.trim_start_matches('/')),
        }
    }

    /// Resolve a relationship target against the directory of its source part.
    ///
    /// Absolute targets (`/ppt/media/image1.png`) are taken as they are;
    /// relative ones (`../media/image1.png`) are joined onto `base_uri` and
    /// normalized.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(Self::normalize_path(relative_ref));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Directory portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Final path segment, e.g. `slide1.xml`.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or("")
    }

    /// Extension without the leading period, lowercased by the caller if needed.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename.rfind('.').map(|pos| &filename[pos + 1..]).unwrap_or("")
    }

    /// Numeric suffix of the filename stem (`slide21.xml` -> 21).
    pub fn idx(&self) -> Option<u32> {
        trailing_number(file_stem(self.filename()))
    }

    /// Archive member name (the URI without its leading slash).
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part, as written into a
    /// relationship `Target` attribute.
    ///
    /// `/ppt/charts/chart2.xml` seen from `/ppt/slides` is `../charts/chart2.xml`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from_parts
            .iter()
            .zip(to_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = "../".repeat(from_parts.len() - common);
        result.push_str(&to_parts[common..].join("/"));
        result
    }

    /// The relationships part belonging to this part.
    ///
    /// `/ppt/slides/_rels/slide1.xml.rels` for `/ppt/slides/slide1.xml`.
    pub fn rels_uri(&self) -> PackURI {
        let base_uri = self.base_uri();
        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        PackURI { uri }
    }

    /// Same directory and extension, different number
    /// (`/ppt/charts/chart3.xml` -> `/ppt/charts/chart9.xml`).
    pub fn with_number(&self, number: u32) -> PackURI {
        let filename = self.filename();
        let stem = file_stem(filename);
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let prefix = &stem[..stem.len() - digits];
        let ext = &filename[stem.len()..];
        let base = self.base_uri().trim_end_matches('/');
        PackURI {
            uri: format!("{}/{}{}{}", base, prefix, number, ext),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }
        format!("/{}", parts.join("/"))
    }
}

/// Filename without its final extension.
pub(crate) fn file_stem(filename: &str) -> &str {
    filename.rfind('.').map(|pos| &filename[..pos]).unwrap_or(filename)
}

/// Parse the run of ASCII digits at the end of `s`.
pub(crate) fn trailing_number(s: &str) -> Option<u32> {
    let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    atoi_simd::parse::<u32, false, false>(&s.as_bytes()[s.len() - digits..]).ok()
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";
