//! JSON-LD errors.
//!
//! Each variant of [`JsonLdError`] corresponds to one of the
//! [error codes](https://www.w3.org/TR/json-ld11-api/#jsonlderrorcode)
//! defined by the JSON-LD API, which is returned by [`JsonLdError::code`].
//! The `String` carried by most variants is a human-readable detail.

use ldtk_c14n::{C14nError, InvalidNumber};

use crate::loader::LoaderError;

/// JSON-LD error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JsonLdError {
    /// Two properties which expand to the same keyword have been detected.
    #[error("colliding keywords: {0}")]
    CollidingKeywords(String),
    /// Multiple conflicting indexes have been found for the same node.
    #[error("conflicting indexes: {0}")]
    ConflictingIndexes(String),
    /// The maximum number of nested remote contexts has been exceeded.
    #[error("context overflow: {0}")]
    ContextOverflow(String),
    /// A remote context includes itself, directly or indirectly.
    #[error("recursive context inclusion: {0}")]
    ContextCycle(String),
    /// A cycle in IRI mappings has been detected.
    #[error("cyclic IRI mapping: {0}")]
    CyclicIriMapping(String),
    /// An `@id` entry was not a string.
    #[error("invalid @id value: {0}")]
    InvalidIdValue(String),
    /// An invalid value for `@import` has been found.
    #[error("invalid @import value: {0}")]
    InvalidImportValue(String),
    /// An included block contains an invalid value.
    #[error("invalid @included value: {0}")]
    InvalidIncludedValue(String),
    /// An `@index` entry was not a string.
    #[error("invalid @index value: {0}")]
    InvalidIndexValue(String),
    /// An invalid value for `@nest` has been found.
    #[error("invalid @nest value: {0}")]
    InvalidNestValue(String),
    /// An invalid value for `@prefix` has been found.
    #[error("invalid @prefix value: {0}")]
    InvalidPrefixValue(String),
    /// An invalid value for `@propagate` has been found.
    #[error("invalid @propagate value: {0}")]
    InvalidPropagateValue(String),
    /// An invalid value for `@protected` has been found.
    #[error("invalid @protected value: {0}")]
    InvalidProtectedValue(String),
    /// An invalid value for an `@reverse` entry has been detected.
    #[error("invalid @reverse value: {0}")]
    InvalidReverseValue(String),
    /// The `@version` entry was used in a context with an out of range value.
    #[error("invalid @version value: {0}")]
    InvalidVersionValue(String),
    /// The value of `@direction` is not `"ltr"`, `"rtl"`, or null.
    #[error("invalid base direction: {0}")]
    InvalidBaseDirection(String),
    /// An invalid base IRI has been detected.
    #[error("invalid base IRI: {0}")]
    InvalidBaseIri(String),
    /// An `@container` entry was encountered in a term definition with an invalid value.
    #[error("invalid container mapping: {0}")]
    InvalidContainerMapping(String),
    /// An entry in a context is invalid due to processing mode incompatibility.
    #[error("invalid context entry: {0}")]
    InvalidContextEntry(String),
    /// An attempt was made to nullify a context containing protected term definitions.
    #[error("invalid context nullification: {0}")]
    InvalidContextNullification(String),
    /// The value of the default language is not a string or null.
    #[error("invalid default language: {0}")]
    InvalidDefaultLanguage(String),
    /// A local context contains a term that has an invalid or missing IRI mapping.
    #[error("invalid IRI mapping: {0}")]
    InvalidIriMapping(String),
    /// An invalid JSON literal was detected.
    #[error("invalid JSON literal: {0}")]
    InvalidJsonLiteral(String),
    /// An invalid keyword alias definition has been encountered.
    #[error("invalid keyword alias: {0}")]
    InvalidKeywordAlias(String),
    /// An invalid value in a language map has been detected.
    #[error("invalid language map value: {0}")]
    InvalidLanguageMapValue(String),
    /// An `@language` entry in a term definition is not a string or null.
    #[error("invalid language mapping: {0}")]
    InvalidLanguageMapping(String),
    /// A language-tagged string with an invalid language value was detected.
    #[error("invalid language-tagged string: {0}")]
    InvalidLanguageTaggedString(String),
    /// A number, `true`, or `false` with an associated language tag was detected.
    #[error("invalid language-tagged value: {0}")]
    InvalidLanguageTaggedValue(String),
    /// An invalid local context was detected.
    #[error("invalid local context: {0}")]
    InvalidLocalContext(String),
    /// No valid context document has been found for a referenced remote context.
    #[error("invalid remote context: {0}")]
    InvalidRemoteContext(String),
    /// An invalid reverse property definition has been detected.
    #[error("invalid reverse property: {0}")]
    InvalidReverseProperty(String),
    /// An invalid reverse property map has been detected.
    #[error("invalid reverse property map: {0}")]
    InvalidReversePropertyMap(String),
    /// An invalid value for a reverse property has been detected.
    #[error("invalid reverse property value: {0}")]
    InvalidReversePropertyValue(String),
    /// The local context defined within a term definition is invalid.
    #[error("invalid scoped context: {0}")]
    InvalidScopedContext(String),
    /// A set object or list object with disallowed entries has been detected.
    #[error("invalid set or list object: {0}")]
    InvalidSetOrListObject(String),
    /// An invalid term definition has been detected.
    #[error("invalid term definition: {0}")]
    InvalidTermDefinition(String),
    /// An `@type` entry in a term definition is not valid.
    #[error("invalid type mapping: {0}")]
    InvalidTypeMapping(String),
    /// An invalid value for an `@type` entry has been detected.
    #[error("invalid type value: {0}")]
    InvalidTypeValue(String),
    /// A typed value with an invalid type was detected.
    #[error("invalid typed value: {0}")]
    InvalidTypedValue(String),
    /// A value object with disallowed entries has been detected.
    #[error("invalid value object: {0}")]
    InvalidValueObject(String),
    /// An invalid value for the `@value` entry of a value object has been detected.
    #[error("invalid value object value: {0}")]
    InvalidValueObjectValue(String),
    /// An invalid vocabulary mapping has been detected.
    #[error("invalid vocab mapping: {0}")]
    InvalidVocabMapping(String),
    /// A frame is invalid.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// An invalid value for `@embed` has been found in a frame.
    #[error("invalid @embed value: {0}")]
    InvalidEmbedValue(String),
    /// An IRI could be confused with a compact IRI.
    #[error("IRI confused with prefix: {0}")]
    IriConfusedWithPrefix(String),
    /// A keyword redefinition has been detected.
    #[error("keyword redefinition: {0}")]
    KeywordRedefinition(String),
    /// A list of lists was detected.
    #[error("list of lists: {0}")]
    ListOfLists(String),
    /// The document could not be loaded or parsed as JSON.
    #[error("loading document failed: {0}")]
    LoadingDocumentFailed(String),
    /// There was a problem encountered loading a remote context.
    #[error("loading remote context failed: {0}")]
    LoadingRemoteContextFailed(String),
    /// A document could not be parsed as JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// An attempt was made to change the processing mode which is incompatible with the previous specified version.
    #[error("processing mode conflict: {0}")]
    ProcessingModeConflict(String),
    /// An attempt was made to redefine a protected term.
    #[error("protected term redefinition: {0}")]
    ProtectedTermRedefinition(String),
    /// A number had no canonical representation (NaN or infinite).
    #[error("{0}")]
    InvalidNumberFormat(#[from] InvalidNumber),
    /// The canonicalization of the RDF dataset was deemed too complex.
    #[error("canonicalization complexity exceeded: {0}")]
    CanonicalizationComplexityExceeded(String),
    /// The RDF dataset could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

impl JsonLdError {
    /// The JSON-LD error code of this error,
    /// as defined in <https://www.w3.org/TR/json-ld11-api/#jsonlderrorcode>
    /// (or in the framing and canonicalization recommendations).
    pub fn code(&self) -> &'static str {
        use JsonLdError::*;
        match self {
            CollidingKeywords(_) => "colliding keywords",
            ConflictingIndexes(_) => "conflicting indexes",
            ContextOverflow(_) => "context overflow",
            ContextCycle(_) => "recursive context inclusion",
            CyclicIriMapping(_) => "cyclic IRI mapping",
            InvalidIdValue(_) => "invalid @id value",
            InvalidImportValue(_) => "invalid @import value",
            InvalidIncludedValue(_) => "invalid @included value",
            InvalidIndexValue(_) => "invalid @index value",
            InvalidNestValue(_) => "invalid @nest value",
            InvalidPrefixValue(_) => "invalid @prefix value",
            InvalidPropagateValue(_) => "invalid @propagate value",
            InvalidProtectedValue(_) => "invalid @protected value",
            InvalidReverseValue(_) => "invalid @reverse value",
            InvalidVersionValue(_) => "invalid @version value",
            InvalidBaseDirection(_) => "invalid base direction",
            InvalidBaseIri(_) => "invalid base IRI",
            InvalidContainerMapping(_) => "invalid container mapping",
            InvalidContextEntry(_) => "invalid context entry",
            InvalidContextNullification(_) => "invalid context nullification",
            InvalidDefaultLanguage(_) => "invalid default language",
            InvalidIriMapping(_) => "invalid IRI mapping",
            InvalidJsonLiteral(_) => "invalid JSON literal",
            InvalidKeywordAlias(_) => "invalid keyword alias",
            InvalidLanguageMapValue(_) => "invalid language map value",
            InvalidLanguageMapping(_) => "invalid language mapping",
            InvalidLanguageTaggedString(_) => "invalid language-tagged string",
            InvalidLanguageTaggedValue(_) => "invalid language-tagged value",
            InvalidLocalContext(_) => "invalid local context",
            InvalidRemoteContext(_) => "invalid remote context",
            InvalidReverseProperty(_) => "invalid reverse property",
            InvalidReversePropertyMap(_) => "invalid reverse property map",
            InvalidReversePropertyValue(_) => "invalid reverse property value",
            InvalidScopedContext(_) => "invalid scoped context",
            InvalidSetOrListObject(_) => "invalid set or list object",
            InvalidTermDefinition(_) => "invalid term definition",
            InvalidTypeMapping(_) => "invalid type mapping",
            InvalidTypeValue(_) => "invalid type value",
            InvalidTypedValue(_) => "invalid typed value",
            InvalidValueObject(_) => "invalid value object",
            InvalidValueObjectValue(_) => "invalid value object value",
            InvalidVocabMapping(_) => "invalid vocab mapping",
            InvalidFrame(_) => "invalid frame",
            InvalidEmbedValue(_) => "invalid @embed value",
            IriConfusedWithPrefix(_) => "IRI confused with prefix",
            KeywordRedefinition(_) => "keyword redefinition",
            ListOfLists(_) => "list of lists",
            LoadingDocumentFailed(_) => "loading document failed",
            LoadingRemoteContextFailed(_) => "loading remote context failed",
            InvalidJson(_) => "loading document failed",
            ProcessingModeConflict(_) => "processing mode conflict",
            ProtectedTermRedefinition(_) => "protected term redefinition",
            InvalidNumberFormat(_) => "invalid number format",
            CanonicalizationComplexityExceeded(_) => "canonicalization complexity exceeded",
            Canonicalization(_) => "canonicalization failed",
        }
    }

    pub(crate) fn loading_document(url: &str, err: LoaderError) -> Self {
        JsonLdError::LoadingDocumentFailed(format!("{url}: {err}"))
    }

    pub(crate) fn loading_context(url: &str, err: LoaderError) -> Self {
        JsonLdError::LoadingRemoteContextFailed(format!("{url}: {err}"))
    }
}

impl From<C14nError> for JsonLdError {
    fn from(value: C14nError) -> Self {
        match value {
            C14nError::ComplexityExceeded(msg) => Self::CanonicalizationComplexityExceeded(msg),
            other => Self::Canonicalization(other.to_string()),
        }
    }
}

/// Type alias for [`Result`](std::result::Result) with [`JsonLdError`] as the default error type.
pub type Result<T, E = JsonLdError> = std::result::Result<T, E>;
