//! I define the [`Literal`] type.
use super::{is_valid_language_tag, TermError};
use crate::ns::{rdf, xsd};

/// An RDF literal.
///
/// Every literal has a datatype;
/// language-tagged strings have datatype `rdf:langString`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Literal {
    lexical_form: String,
    datatype: String,
    language_tag: Option<String>,
}

impl Literal {
    /// Build a literal with the given lexical form and datatype.
    pub fn new_dt<T: Into<String>, U: Into<String>>(lex: T, datatype: U) -> Self {
        Literal {
            lexical_form: lex.into(),
            datatype: datatype.into(),
            language_tag: None,
        }
    }

    /// Build a simple literal (with datatype `xsd:string`).
    pub fn new_simple<T: Into<String>>(lex: T) -> Self {
        Self::new_dt(lex, xsd::string)
    }

    /// Build a language-tagged string, checking that `tag` is a valid BCP47 tag.
    pub fn new_lang<T: Into<String>, U: Into<String>>(lex: T, tag: U) -> Result<Self, TermError> {
        let tag = tag.into();
        if is_valid_language_tag(&tag) {
            Ok(Self::new_lang_unchecked(lex, tag))
        } else {
            Err(TermError::InvalidLanguageTag(tag))
        }
    }

    /// Build a language-tagged string without checking the language tag.
    pub fn new_lang_unchecked<T: Into<String>, U: Into<String>>(lex: T, tag: U) -> Self {
        Literal {
            lexical_form: lex.into(),
            datatype: rdf::langString.to_string(),
            language_tag: Some(tag.into()),
        }
    }

    /// The lexical form of this literal.
    pub fn lexical_form(&self) -> &str {
        &self.lexical_form
    }

    /// The datatype IRI of this literal.
    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    /// The language tag of this literal, if any.
    pub fn language_tag(&self) -> Option<&str> {
        self.language_tag.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple() {
        let lit = Literal::new_simple("hello");
        assert_eq!(lit.lexical_form(), "hello");
        assert_eq!(lit.datatype(), xsd::string);
        assert_eq!(lit.language_tag(), None);
    }

    #[test]
    fn lang() {
        let lit = Literal::new_lang("bonjour", "fr").unwrap();
        assert_eq!(lit.datatype(), rdf::langString);
        assert_eq!(lit.language_tag(), Some("fr"));
        assert!(Literal::new_lang("bonjour", "f r").is_err());
    }
}
