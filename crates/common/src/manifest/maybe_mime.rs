use std::path::Path;
use std::str::FromStr;

use mime::Mime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Optional content type on an entry. Serialized as a plain string or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaybeMime(pub Option<Mime>);

impl MaybeMime {
    /// Coarse classification from the file extension. Unknown extensions
    ///  classify as `application/octet-stream`, so files always get a type.
    pub fn classify(path: &Path) -> Mime {
        mime_guess::from_path(path).first_or_octet_stream()
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_mime(&self) -> Option<&Mime> {
        self.0.as_ref()
    }
}

impl Serialize for MaybeMime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.0 {
            Some(mime) => serializer.serialize_str(mime.as_ref()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for MaybeMime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let mime = Mime::from_str(&s).map_err(serde::de::Error::custom)?;
                Ok(MaybeMime(Some(mime)))
            }
            None => Ok(MaybeMime(None)),
        }
    }
}
