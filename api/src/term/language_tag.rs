//! Validation of [BCP47](https://tools.ietf.org/search/bcp47) language tags.
//!
//! NB: the check is slightly more permissive than BCP47,
//! as it does not check that the different subtags are registered (language, country...) codes.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LANG_TAG: Regex = Regex::new(LANG_TAG_SRC).unwrap();
}

/// Check whether `tag` is a well-formed BCP47 language tag.
pub fn is_valid_language_tag(tag: &str) -> bool {
    LANG_TAG.is_match(tag)
}

/// Match a valid BCP47 language tag
pub static LANG_TAG_SRC: &str = r"(?xi-u)^
(
  (?:
    (?: #language
      (?:
        [A-Z]{2,3}
        (?: #extlang
          (?:
            -[A-Z]{3}
          ){0,3}
        )
      )
    |
      [A-Z]{4,8}
    )
    (?: #script
      -[A-Z]{4}
    )?
    (?: #region
      -
      (?:
        [A-Z]{2}
      |
        [0-9]{3}
      )
    )?
    (?: #variant
      -
      (?:
        [A-Z0-9]{5,8}
      |
        [0-9][A-Z0-9]{3}
      )
    )*
    (?: #extension
      -[0-9A-WY-Z]
      (?:
        -[A-Z0-9]{2,8}
      )+
    )*
    (?: #privateUse
      -X
      (?:
        -[A-Z0-9]{1,8}
      )+
    )?
  )
|
  (?: #privateUse
    X
    (?:
      -[A-Z0-9]{1,8}
    )+
  )
|
  (?: #grandfathered
    en-GB-oed|i-ami|i-bnn|i-default|i-enochian|i-hak|i-klingon|i-lux|i-mingo|i-navajo|i-pwn|i-tao|i-tay|i-tsu|sgn-BE-FR|sgn-BE-NL|sgn-CH-DE
    # NB regular grandfathered tags are not included,
    # as they will be matched by the normal case
  )
)$";

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("en")]
    #[test_case("en-US")]
    #[test_case("EN-us"; "mixed case")]
    #[test_case("zh-Hant-TW")]
    #[test_case("de-CH-1996")]
    #[test_case("x-private")]
    #[test_case("i-klingon")]
    #[test_case("ar-EG-u-nu-latn")]
    fn valid(tag: &str) {
        assert!(is_valid_language_tag(tag));
    }

    #[test_case(""; "empty")]
    #[test_case("e"; "too short")]
    #[test_case("en-"; "trailing dash")]
    #[test_case("en US"; "with space")]
    #[test_case("abcdefghi"; "too long")]
    fn invalid(tag: &str) {
        assert!(!is_valid_language_tag(tag));
    }
}
