//! Content-Type parsing, payload classification and charset decoding.

use std::fmt;

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

/// Errors raised while interpreting a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentTypeError {
    #[error("malformed Content-Type '{0}'")]
    Malformed(String),

    #[error("unsupported charset '{0}'")]
    UnsupportedCharset(String),

    #[error("body is not valid {0}")]
    Undecodable(&'static str),
}

/// A parsed media type. Type, subtype and parameter names are lowercased;
/// parameter values keep their original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    main: String,
    sub: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// The type assumed for requests that carry no Content-Type.
    pub fn text_plain() -> Self {
        Self {
            main: "text".into(),
            sub: "plain".into(),
            params: Vec::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ContentTypeError> {
        let malformed = || ContentTypeError::Malformed(raw.to_string());

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (main, sub) = essence.split_once('/').ok_or_else(malformed)?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || sub.contains('/') {
            return Err(malformed());
        }

        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param.split_once('=').ok_or_else(malformed)?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            if name.is_empty() {
                return Err(malformed());
            }
            params.push((name, value));
        }

        Ok(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// `text/*` and `application/json` carry text; everything else is binary.
    pub fn is_text(&self) -> bool {
        self.main == "text" || (self.main == "application" && self.sub == "json")
    }

    /// Replace the charset parameter, moving it to the end.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.params.retain(|(n, _)| n != "charset");
        self.params.push(("charset".into(), charset.name().into()));
        self
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)?;
        for (name, value) in &self.params {
            if value.contains([';', ',', ' ', '"', '=']) {
                write!(f, ";{}=\"{}\"", name, value.replace('"', "\\\""))?;
            } else {
                write!(f, ";{}={}", name, value)?;
            }
        }
        Ok(())
    }
}

/// A character set known to the WHATWG encoding registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    /// The charset assumed when a text type declares none.
    pub fn utf8() -> Self {
        Charset(UTF_8)
    }

    /// Look up a charset by label, case-insensitively (`utf8`, `latin1`,
    /// `UTF-16LE`, `windows-1252`, ...).
    pub fn lookup(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Charset)
    }

    /// Canonical name, e.g. `UTF-8` or `windows-1252`.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decode strictly: no BOM sniffing, no replacement characters.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ContentTypeError> {
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or(ContentTypeError::Undecodable(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_classify() {
        let ct = ContentType::parse("Application/JSON").unwrap();
        assert_eq!(ct.essence(), "application/json");
        assert!(ct.is_text());

        let ct = ContentType::parse("text/csv; charset=\"iso-8859-1\"").unwrap();
        assert!(ct.is_text());
        assert_eq!(ct.charset(), Some("iso-8859-1"));

        let ct = ContentType::parse("application/octet-stream").unwrap();
        assert!(!ct.is_text());

        let ct = ContentType::parse("application/vnd.api+json").unwrap();
        assert!(!ct.is_text());
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(ContentType::parse("json"), Err(ContentTypeError::Malformed(_))));
        assert!(matches!(ContentType::parse("/json"), Err(ContentTypeError::Malformed(_))));
        assert!(matches!(
            ContentType::parse("text/plain; charset"),
            Err(ContentTypeError::Malformed(_))
        ));
    }

    #[test]
    fn test_canonical_form() {
        let ct = ContentType::parse("APPLICATION/JSON").unwrap().with_charset(Charset::utf8());
        assert_eq!(ct.to_string(), "application/json;charset=UTF-8");

        let ct = ContentType::parse("text/plain; charset=utf-8; format=flowed")
            .unwrap()
            .with_charset(Charset::utf8());
        assert_eq!(ct.to_string(), "text/plain;format=flowed;charset=UTF-8");

        let ct = ContentType::parse("multipart/mixed; boundary=\"a b\"").unwrap();
        assert_eq!(ct.to_string(), "multipart/mixed;boundary=\"a b\"");
    }

    #[test]
    fn test_charsets() {
        assert_eq!(Charset::lookup("UTF8"), Some(Charset::utf8()));
        assert_eq!(Charset::lookup("Latin1").map(|c| c.name()), Some("windows-1252"));
        assert_eq!(Charset::lookup(" UTF-16le ").map(|c| c.name()), Some("UTF-16LE"));
        assert_eq!(Charset::lookup("Shift_JIS").map(|c| c.name()), Some("Shift_JIS"));
        assert_eq!(Charset::lookup("ebcdic"), None);

        assert_eq!(Charset::utf8().decode("héllo".as_bytes()).unwrap(), "héllo");
        let utf16 = Charset::lookup("utf-16le").unwrap();
        assert_eq!(utf16.decode(&[0x68, 0x00, 0x69, 0x00]).unwrap(), "hi");
        let cp1252 = Charset::lookup("windows-1252").unwrap();
        assert_eq!(cp1252.decode(&[0x68, 0x80]).unwrap(), "h€");
        assert_eq!(
            Charset::utf8().decode(&[0xff, 0xfe]),
            Err(ContentTypeError::Undecodable("UTF-8"))
        );
        assert_eq!(
            utf16.decode(&[0x68]),
            Err(ContentTypeError::Undecodable("UTF-16LE"))
        );
    }
}
