//! JSON-LD [keywords](https://www.w3.org/TR/json-ld11/#keywords).

use std::fmt;
use std::str::FromStr;

macro_rules! keywords {
    ($($variant: ident => $txt: literal,)*) => {
        /// The closed set of JSON-LD keywords, including framing keywords.
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum Keyword {
            $(
                #[doc = concat!("`", $txt, "`")]
                $variant,
            )*
        }

        impl Keyword {
            /// All keywords, in lexicographic order.
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant,)*];

            /// The textual form of this keyword.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $txt,)*
                }
            }
        }

        impl FromStr for Keyword {
            type Err = NotAKeyword;

            fn from_str(txt: &str) -> Result<Self, Self::Err> {
                match txt {
                    $($txt => Ok(Keyword::$variant),)*
                    _ => Err(NotAKeyword(txt.to_string())),
                }
            }
        }
    };
}

keywords! {
    Base => "@base",
    Container => "@container",
    Context => "@context",
    Default => "@default",
    Direction => "@direction",
    Embed => "@embed",
    Explicit => "@explicit",
    Graph => "@graph",
    Id => "@id",
    Import => "@import",
    Included => "@included",
    Index => "@index",
    Json => "@json",
    Language => "@language",
    List => "@list",
    Nest => "@nest",
    None => "@none",
    OmitDefault => "@omitDefault",
    Prefix => "@prefix",
    Preserve => "@preserve",
    Propagate => "@propagate",
    Protected => "@protected",
    RequireAll => "@requireAll",
    Reverse => "@reverse",
    Set => "@set",
    Type => "@type",
    Value => "@value",
    Version => "@version",
    Vocab => "@vocab",
}

impl Keyword {
    /// Whether this keyword is only meaningful in frames.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Keyword::Default
                | Keyword::Embed
                | Keyword::Explicit
                | Keyword::OmitDefault
                | Keyword::RequireAll
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Keyword {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<Keyword> for str {
    fn eq(&self, other: &Keyword) -> bool {
        self == other.as_str()
    }
}

/// Error raised when parsing a [`Keyword`] from a string that is not one.
#[derive(Clone, Debug, thiserror::Error)]
#[error("not a JSON-LD keyword: {0:?}")]
pub struct NotAKeyword(pub String);

/// Whether `txt` is a JSON-LD keyword.
pub fn is_keyword(txt: &str) -> bool {
    txt.starts_with('@') && Keyword::from_str(txt).is_ok()
}

/// Whether `txt` has the form of a keyword (`@` followed by ASCII letters only).
///
/// Such strings are reserved for future use,
/// and are ignored by JSON-LD processors when they are not actual keywords.
pub fn is_keyword_like(txt: &str) -> bool {
    txt.len() > 1
        && txt.starts_with('@')
        && txt[1..].bytes().all(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test]
    fn all_is_sorted_and_round_trips() {
        for pair in Keyword::ALL.windows(2) {
            assert!(pair[0].as_str() < pair[1].as_str(), "{} {}", pair[0], pair[1]);
        }
        for kw in Keyword::ALL {
            assert_eq!(kw.as_str().parse::<Keyword>().unwrap(), *kw);
        }
    }

    #[test_case("@id", true, true)]
    #[test_case("@omitDefault", true, true)]
    #[test_case("@ignoreMe", false, true)]
    #[test_case("@", false, false)]
    #[test_case("@foo.bar", false, false)]
    #[test_case("id", false, false)]
    fn classification(txt: &str, keyword: bool, keyword_like: bool) {
        assert_eq!(is_keyword(txt), keyword);
        assert_eq!(is_keyword_like(txt), keyword_like);
    }
}
