//! Active contexts, and the
//! [context processing algorithm](https://www.w3.org/TR/json-ld11-api/#context-processing-algorithms).
//!
//! An [`ActiveContext`] is obtained by processing a local context
//! (the value of an `@context` entry) against another active context.
//! Processing never modifies its input: each step produces a new context,
//! which shares its term definitions with its ancestors until they are modified.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::str::FromStr;

use ldtk_api::term::BaseDirection;
use ldtk_iri::resolve::BaseIri;
use ldtk_iri::{ends_with_gen_delim, is_absolute_iri};
use serde_json::Value;

use crate::error::{JsonLdError, Result};
use crate::keyword::{is_keyword, is_keyword_like, Keyword};
use crate::loader::{DocumentLoader, RemoteDocument};
use crate::options::{JsonLdOptions, ProcessingMode};
use crate::util::{as_array, is_blank_node_id, is_node_id, split_prefix, Map};

/// The maximum number of remote contexts that can be chained.
pub const MAX_CONTEXT_URLS: usize = 10;

const CONTEXT_ENTRIES: &[&str] = &[
    "@base",
    "@direction",
    "@import",
    "@language",
    "@propagate",
    "@protected",
    "@version",
    "@vocab",
];

const TERM_DEFINITION_ENTRIES: &[&str] = &[
    "@container",
    "@context",
    "@direction",
    "@id",
    "@index",
    "@language",
    "@nest",
    "@prefix",
    "@protected",
    "@reverse",
    "@type",
];

/// The result of processing a chain of local contexts.
#[derive(Clone, Debug)]
pub struct ActiveContext {
    terms: Rc<BTreeMap<String, TermDefinition>>,
    base_iri: Option<BaseIri>,
    original_base_url: Option<BaseIri>,
    vocab: Option<String>,
    default_language: Option<String>,
    default_direction: Option<BaseDirection>,
    processing_mode: ProcessingMode,
    previous_context: Option<Rc<ActiveContext>>,
}

impl ActiveContext {
    /// A new empty context, whose base IRI is `base`.
    pub fn new(base: Option<BaseIri>, processing_mode: ProcessingMode) -> Self {
        ActiveContext {
            terms: Rc::default(),
            original_base_url: base.clone(),
            base_iri: base,
            vocab: None,
            default_language: None,
            default_direction: None,
            processing_mode,
            previous_context: None,
        }
    }

    /// The empty context corresponding to `options`.
    pub fn from_options<L: ?Sized>(options: &JsonLdOptions<L>) -> Self {
        Self::new(options.base().cloned(), options.processing_mode())
    }

    /// The term definition of `term`, if any.
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// Iterate over all the term definitions of this context, in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The base IRI against which relative IRIs are resolved, if any.
    pub fn base_iri(&self) -> Option<&BaseIri> {
        self.base_iri.as_ref()
    }

    /// The vocabulary mapping set by `@vocab`, if any.
    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    /// The default language set by `@language`, if any.
    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    /// The default base direction set by `@direction`, if any.
    pub fn default_direction(&self) -> Option<BaseDirection> {
        self.default_direction
    }

    /// The processing mode, possibly set by `@version`.
    pub fn processing_mode(&self) -> ProcessingMode {
        self.processing_mode
    }

    /// The context to revert to when leaving a node object,
    /// if this context was obtained from a non-propagated context.
    pub fn previous_context(&self) -> Option<&ActiveContext> {
        self.previous_context.as_deref()
    }

    pub(crate) fn without_previous(&self) -> ActiveContext {
        ActiveContext {
            previous_context: None,
            ..self.clone()
        }
    }

    pub(crate) fn has_protected_terms(&self) -> bool {
        self.terms.values().any(|def| def.protected)
    }

    /// Process `local_context` against this context.
    ///
    /// Remote contexts are fetched with the document loader of `options`;
    /// each one is fetched at most once during this call.
    pub fn process<L: DocumentLoader>(
        &self,
        local_context: &Value,
        options: &JsonLdOptions<L>,
    ) -> Result<ActiveContext> {
        let env = Env::new(options);
        let base_url = self.base_iri.as_ref().map(|b| b.as_str().to_string());
        self.process_with(
            local_context,
            base_url.as_deref(),
            &[],
            ProcessingFlags::default(),
            &env,
        )
    }

    pub(crate) fn process_with(
        &self,
        local_context: &Value,
        base_url: Option<&str>,
        remote_contexts: &[String],
        flags: ProcessingFlags,
        env: &Env,
    ) -> Result<ActiveContext> {
        let mut result = self.clone();
        let mut propagate = flags.propagate;
        if let Some(value) = local_context.get("@propagate") {
            propagate = value
                .as_bool()
                .ok_or_else(|| JsonLdError::InvalidPropagateValue(value.to_string()))?;
        }
        if !propagate && result.previous_context.is_none() {
            result.previous_context = Some(Rc::new(self.clone()));
        }
        for context in as_array(local_context) {
            match context {
                Value::Null => {
                    if !flags.override_protected && result.has_protected_terms() {
                        return Err(JsonLdError::InvalidContextNullification(
                            "cannot nullify a context with protected terms".into(),
                        ));
                    }
                    let previous = result;
                    result = ActiveContext::new(
                        self.original_base_url.clone(),
                        self.processing_mode,
                    );
                    if !propagate {
                        result.previous_context = Some(Rc::new(previous));
                    }
                }
                Value::String(reference) => {
                    result = result.process_remote(
                        reference,
                        base_url,
                        remote_contexts,
                        flags,
                        env,
                    )?;
                }
                Value::Object(map) => {
                    result.process_map(map, base_url, remote_contexts, flags, env)?;
                }
                other => return Err(JsonLdError::InvalidLocalContext(other.to_string())),
            }
        }
        Ok(result)
    }

    fn process_remote(
        self,
        reference: &str,
        base_url: Option<&str>,
        remote_contexts: &[String],
        flags: ProcessingFlags,
        env: &Env,
    ) -> Result<ActiveContext> {
        let url = resolve_url(base_url, reference)
            .map_err(JsonLdError::LoadingDocumentFailed)?;
        if remote_contexts.contains(&url) {
            if !flags.validate_scoped {
                return Ok(self);
            }
            return Err(JsonLdError::ContextCycle(url));
        }
        if remote_contexts.len() >= MAX_CONTEXT_URLS {
            return Err(JsonLdError::ContextOverflow(url));
        }
        let loaded = env.load_context(&url)?;
        let mut chain = remote_contexts.to_vec();
        chain.push(url);
        let flags = ProcessingFlags {
            validate_scoped: flags.validate_scoped,
            ..ProcessingFlags::default()
        };
        self.process_with(
            &loaded.context,
            Some(&loaded.document_url),
            &chain,
            flags,
            env,
        )
    }

    fn process_map(
        &mut self,
        map: &Map,
        base_url: Option<&str>,
        remote_contexts: &[String],
        flags: ProcessingFlags,
        env: &Env,
    ) -> Result<()> {
        let mode = self.processing_mode;
        if let Some(version) = map.get("@version") {
            if version.as_f64() != Some(1.1) {
                return Err(JsonLdError::InvalidVersionValue(version.to_string()));
            }
            if mode == ProcessingMode::JsonLd1_0 {
                return Err(JsonLdError::ProcessingModeConflict(
                    "@version 1.1 in json-ld-1.0 mode".into(),
                ));
            }
        }
        let map = match map.get("@import") {
            None => Cow::Borrowed(map),
            Some(import) => Cow::Owned(self.import(map, import, base_url, env)?),
        };
        if remote_contexts.is_empty() {
            if let Some(base) = map.get("@base") {
                self.base_iri = match base {
                    Value::Null => None,
                    Value::String(iri) if is_absolute_iri(iri) => Some(new_base(iri)?),
                    Value::String(iri) => match &self.base_iri {
                        Some(current) => Some(new_base(
                            current
                                .resolve(iri)
                                .map_err(|e| JsonLdError::InvalidBaseIri(e.to_string()))?,
                        )?),
                        None => {
                            return Err(JsonLdError::InvalidBaseIri(format!(
                                "relative @base {iri} with no base IRI"
                            )))
                        }
                    },
                    other => return Err(JsonLdError::InvalidBaseIri(other.to_string())),
                };
            }
        }
        if let Some(vocab) = map.get("@vocab") {
            self.vocab = match vocab {
                Value::Null => None,
                Value::String(txt) => match self.expand_iri(txt, true, true) {
                    Some(iri) if is_node_id(&iri) || (iri.is_empty() && txt.is_empty()) => {
                        Some(iri)
                    }
                    _ => return Err(JsonLdError::InvalidVocabMapping(txt.clone())),
                },
                other => return Err(JsonLdError::InvalidVocabMapping(other.to_string())),
            };
        }
        if let Some(language) = map.get("@language") {
            self.default_language = match language {
                Value::Null => None,
                Value::String(tag) => {
                    if !is_well_formed_language(tag) {
                        log::warn!("ill-formed default language {tag}");
                    }
                    Some(tag.to_lowercase())
                }
                other => return Err(JsonLdError::InvalidDefaultLanguage(other.to_string())),
            };
        }
        if let Some(direction) = map.get("@direction") {
            if mode == ProcessingMode::JsonLd1_0 {
                return Err(JsonLdError::InvalidContextEntry("@direction".into()));
            }
            self.default_direction = match direction {
                Value::Null => None,
                other => Some(parse_direction(other)?),
            };
        }
        if map.contains_key("@propagate") && mode == ProcessingMode::JsonLd1_0 {
            return Err(JsonLdError::InvalidContextEntry("@propagate".into()));
        }
        let protected = match map.get("@protected") {
            None => false,
            Some(_) if mode == ProcessingMode::JsonLd1_0 => {
                return Err(JsonLdError::InvalidContextEntry("@protected".into()))
            }
            Some(Value::Bool(b)) => *b,
            Some(other) => return Err(JsonLdError::InvalidProtectedValue(other.to_string())),
        };
        let mut definer = Definer {
            local: &map,
            defined: HashMap::new(),
            base_url,
            protected,
            override_protected: flags.override_protected,
            remote_contexts,
            env,
        };
        for key in map.keys() {
            if !CONTEXT_ENTRIES.contains(&key.as_str()) {
                definer.define(self, key)?;
            }
        }
        Ok(())
    }

    fn import(
        &self,
        map: &Map,
        import: &Value,
        base_url: Option<&str>,
        env: &Env,
    ) -> Result<Map> {
        if self.processing_mode == ProcessingMode::JsonLd1_0 {
            return Err(JsonLdError::InvalidContextEntry("@import".into()));
        }
        let Value::String(reference) = import else {
            return Err(JsonLdError::InvalidImportValue(import.to_string()));
        };
        let url = resolve_url(base_url, reference).map_err(JsonLdError::InvalidImportValue)?;
        let loaded = env.load_context(&url)?;
        let Value::Object(imported) = &loaded.context else {
            return Err(JsonLdError::InvalidRemoteContext(format!(
                "{url} does not contain a context map"
            )));
        };
        if imported.contains_key("@import") {
            return Err(JsonLdError::InvalidContextEntry(format!(
                "{url} contains @import"
            )));
        }
        let mut merged = imported.clone();
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
        Ok(merged)
    }

    /// [IRI expansion](https://www.w3.org/TR/json-ld11-api/#iri-expansion)
    ///
    /// `None` means that `value` can not be expanded
    /// (either because it is mapped to `null`, or because it looks like a keyword).
    /// If `document_relative` is set, relative IRIs are resolved against the base IRI;
    /// if `vocab` is set, terms and the vocabulary mapping are used.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if is_keyword_like(value) {
            log::warn!("ignoring keyword-like value {value}");
            return None;
        }
        let definition = self.terms.get(value);
        if let Some(iri) = definition.and_then(|def| def.iri.as_deref()) {
            if is_keyword(iri) {
                return Some(iri.to_string());
            }
        }
        if vocab {
            if let Some(def) = definition {
                return def.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = split_prefix(value) {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(def) = self.terms.get(prefix) {
                if let (Some(iri), true) = (&def.iri, def.prefix) {
                    return Some(format!("{iri}{suffix}"));
                }
            }
            if is_absolute_iri(value) {
                return Some(value.to_string());
            }
        }
        if vocab {
            if let Some(vocab) = &self.vocab {
                return Some(format!("{vocab}{value}"));
            }
        }
        if document_relative {
            if let Some(base) = &self.base_iri {
                return Some(base.resolve(value).unwrap_or_else(|_| value.to_string()));
            }
        }
        Some(value.to_string())
    }

    /// The context to use for the value of a property whose definition carries a scoped context.
    pub(crate) fn with_property_scope(
        &self,
        definition: Option<&TermDefinition>,
        env: &Env,
    ) -> Result<ActiveContext> {
        match definition.and_then(|def| def.context.as_ref().map(|c| (c, def))) {
            None => Ok(self.clone()),
            Some((context, def)) => self.process_with(
                context,
                def.base_url.as_deref(),
                &[],
                ProcessingFlags {
                    override_protected: true,
                    ..ProcessingFlags::default()
                },
                env,
            ),
        }
    }
}

/// Flags of the context processing algorithm.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProcessingFlags {
    pub override_protected: bool,
    pub propagate: bool,
    pub validate_scoped: bool,
}

impl Default for ProcessingFlags {
    fn default() -> Self {
        ProcessingFlags {
            override_protected: false,
            propagate: true,
            validate_scoped: true,
        }
    }
}

/// The definition of a term in an [`ActiveContext`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermDefinition {
    pub(crate) iri: Option<String>,
    pub(crate) prefix: bool,
    pub(crate) protected: bool,
    pub(crate) reverse: bool,
    pub(crate) base_url: Option<String>,
    pub(crate) context: Option<Value>,
    pub(crate) container: Container,
    pub(crate) direction: Option<Option<BaseDirection>>,
    pub(crate) index: Option<String>,
    pub(crate) language: Option<Option<String>>,
    pub(crate) nest: Option<String>,
    pub(crate) type_mapping: Option<String>,
}

impl TermDefinition {
    /// The IRI (or keyword) this term maps to; `None` if it is mapped to `null`.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Whether this term may be used as the prefix of a compact IRI.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Whether this term was defined with `@protected`,
    /// and can therefore not be redefined (except identically).
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Whether this term was defined with `@reverse`.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// The container mapping of this term (empty if none).
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The scoped context of this term, if any.
    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// `None` if this term has no language mapping,
    /// `Some(None)` if it is explicitly mapped to no language.
    pub fn language(&self) -> Option<Option<&str>> {
        self.language.as_ref().map(Option::as_deref)
    }

    /// `None` if this term has no direction mapping,
    /// `Some(None)` if it is explicitly mapped to no direction.
    pub fn direction(&self) -> Option<Option<BaseDirection>> {
        self.direction
    }

    /// The property used to index values of an `@index` container, if any.
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// The `@nest` term under which values of this term are nested, if any.
    pub fn nest(&self) -> Option<&str> {
        self.nest.as_deref()
    }

    /// The type mapping of this term: an IRI, or one of `@id`, `@vocab`, `@json`, `@none`.
    pub fn type_mapping(&self) -> Option<&str> {
        self.type_mapping.as_deref()
    }

    fn same_as_ignoring_protection(&self, other: &TermDefinition) -> bool {
        TermDefinition {
            protected: other.protected,
            ..self.clone()
        } == *other
    }
}

/// The container mapping of a term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container(BTreeSet<Keyword>);

impl Container {
    /// Whether `keyword` (e.g. `@set`, `@list`, `@language`) is part of this container mapping.
    pub fn contains(&self, keyword: Keyword) -> bool {
        self.0.contains(&keyword)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keywords of this container mapping, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Keyword> + '_ {
        self.0.iter().copied()
    }

    /// The concatenation of the container keywords, in lexicographic order.
    ///
    /// This is the key used for this container in the inverse context.
    pub fn key(&self) -> String {
        self.0.iter().map(Keyword::as_str).collect()
    }

    fn parse(value: &Value, mode: ProcessingMode) -> Result<Self> {
        let err = || JsonLdError::InvalidContainerMapping(value.to_string());
        let items = match value {
            Value::String(_) => std::slice::from_ref(value),
            Value::Array(items) if mode == ProcessingMode::JsonLd1_1 => items.as_slice(),
            _ => return Err(err()),
        };
        let mut set = BTreeSet::new();
        for item in items {
            let keyword = item
                .as_str()
                .and_then(|txt| Keyword::from_str(txt).ok())
                .ok_or_else(err)?;
            match keyword {
                Keyword::Graph | Keyword::Id | Keyword::Type if mode == ProcessingMode::JsonLd1_0 => {
                    return Err(err())
                }
                Keyword::Graph
                | Keyword::Id
                | Keyword::Index
                | Keyword::Language
                | Keyword::List
                | Keyword::Set
                | Keyword::Type => {
                    set.insert(keyword);
                }
                _ => return Err(err()),
            }
        }
        let container = Container(set);
        let valid = if container.contains(Keyword::List) {
            container.0.len() == 1
        } else if container.contains(Keyword::Graph) {
            container.iter().all(|k| {
                matches!(k, Keyword::Graph | Keyword::Id | Keyword::Index | Keyword::Set)
            }) && !(container.contains(Keyword::Id) && container.contains(Keyword::Index))
        } else {
            container.iter().filter(|k| *k != Keyword::Set).count() <= 1
        };
        if valid {
            Ok(container)
        } else {
            Err(err())
        }
    }
}

/// State of the [create term definition](https://www.w3.org/TR/json-ld11-api/#create-term-definition)
/// algorithm, shared by all the terms of a local context.
struct Definer<'c, 'e> {
    local: &'c Map,
    defined: HashMap<String, bool>,
    base_url: Option<&'c str>,
    protected: bool,
    override_protected: bool,
    remote_contexts: &'c [String],
    env: &'c Env<'e>,
}

impl Definer<'_, '_> {
    fn define(&mut self, ctx: &mut ActiveContext, term: &str) -> Result<()> {
        match self.defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => return Err(JsonLdError::CyclicIriMapping(term.into())),
            None => {}
        }
        if term.is_empty() {
            return Err(JsonLdError::InvalidTermDefinition("empty term".into()));
        }
        self.defined.insert(term.to_string(), false);
        let local = self.local;
        let value = &local[term];
        let mode = ctx.processing_mode;

        if term == "@type" {
            let valid = mode == ProcessingMode::JsonLd1_1
                && match value {
                    Value::Object(map) => {
                        !map.is_empty()
                            && map.iter().all(|(k, v)| match k.as_str() {
                                "@container" => v == "@set",
                                "@protected" => true,
                                _ => false,
                            })
                    }
                    _ => false,
                };
            if !valid {
                return Err(JsonLdError::KeywordRedefinition(term.into()));
            }
        } else if is_keyword(term) {
            return Err(JsonLdError::KeywordRedefinition(term.into()));
        } else if is_keyword_like(term) {
            log::warn!("ignoring keyword-like term {term}");
            self.defined.insert(term.to_string(), true);
            return Ok(());
        }

        let previous = Rc::make_mut(&mut ctx.terms).remove(term);
        let (value, simple_term) = match value {
            Value::Null => (Cow::Owned(id_only(Value::Null)), false),
            Value::String(_) => (Cow::Owned(id_only(value.clone())), true),
            Value::Object(map) => (Cow::Borrowed(map), false),
            other => return Err(JsonLdError::InvalidTermDefinition(format!("{term}: {other}"))),
        };

        let mut def = TermDefinition {
            protected: self.protected,
            ..TermDefinition::default()
        };
        if let Some(protected) = value.get("@protected") {
            if mode == ProcessingMode::JsonLd1_0 {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: @protected in json-ld-1.0 mode"
                )));
            }
            def.protected = protected
                .as_bool()
                .ok_or_else(|| JsonLdError::InvalidProtectedValue(protected.to_string()))?;
        }

        if let Some(type_) = value.get("@type") {
            let Value::String(type_) = type_ else {
                return Err(JsonLdError::InvalidTypeMapping(type_.to_string()));
            };
            let expanded = self
                .expand_iri(ctx, type_, false, true)?
                .ok_or_else(|| JsonLdError::InvalidTypeMapping(type_.clone()))?;
            let valid = match expanded.as_str() {
                "@json" | "@none" => mode == ProcessingMode::JsonLd1_1,
                "@id" | "@vocab" => true,
                iri => is_absolute_iri(iri),
            };
            if !valid {
                return Err(JsonLdError::InvalidTypeMapping(expanded));
            }
            def.type_mapping = Some(expanded);
        }

        if let Some(reverse) = value.get("@reverse") {
            if value.contains_key("@id") || value.contains_key("@nest") {
                return Err(JsonLdError::InvalidReverseProperty(term.into()));
            }
            let Value::String(reverse) = reverse else {
                return Err(JsonLdError::InvalidIriMapping(reverse.to_string()));
            };
            if is_keyword_like(reverse) {
                log::warn!("ignoring keyword-like @reverse {reverse}");
                self.defined.insert(term.to_string(), true);
                return Ok(());
            }
            match self.expand_iri(ctx, reverse, false, true)? {
                Some(iri) if is_node_id(&iri) => def.iri = Some(iri),
                _ => return Err(JsonLdError::InvalidIriMapping(reverse.clone())),
            }
            if let Some(container) = value.get("@container") {
                def.container = match container {
                    Value::Null => Container::default(),
                    Value::String(txt) if txt == "@set" || txt == "@index" => {
                        Container::parse(container, mode)?
                    }
                    other => return Err(JsonLdError::InvalidReverseProperty(other.to_string())),
                };
            }
            def.reverse = true;
            return self.finish(ctx, term, def, previous);
        }

        match value.get("@id") {
            Some(id) if id.as_str() != Some(term) => match id {
                Value::Null => {}
                Value::String(id) => {
                    if !is_keyword(id) && is_keyword_like(id) {
                        log::warn!("ignoring keyword-like @id {id}");
                        self.defined.insert(term.to_string(), true);
                        return Ok(());
                    }
                    let iri = match self.expand_iri(ctx, id, false, true)? {
                        Some(iri) if is_keyword(&iri) || is_node_id(&iri) => iri,
                        _ => return Err(JsonLdError::InvalidIriMapping(id.clone())),
                    };
                    if iri == "@context" {
                        return Err(JsonLdError::InvalidKeywordAlias(term.into()));
                    }
                    let inner_colon = term
                        .char_indices()
                        .any(|(i, c)| c == ':' && i > 0 && i + 1 < term.len());
                    if inner_colon || term.contains('/') {
                        self.defined.insert(term.to_string(), true);
                        let expanded = self.expand_iri(ctx, term, false, true)?;
                        if expanded.as_deref() != Some(iri.as_str()) {
                            return Err(JsonLdError::InvalidIriMapping(format!(
                                "{term} does not expand to {iri}"
                            )));
                        }
                    }
                    if !term.contains(':')
                        && !term.contains('/')
                        && simple_term
                        && (ends_with_gen_delim(&iri) || is_blank_node_id(&iri))
                    {
                        def.prefix = true;
                    }
                    def.iri = Some(iri);
                }
                other => return Err(JsonLdError::InvalidIriMapping(other.to_string())),
            },
            _ => {
                let compact = term
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| *c == ':')
                    .map(|(i, _)| (&term[..i], &term[i + 1..]));
                if let Some((prefix, suffix)) = compact {
                    if local.contains_key(prefix) {
                        self.define(ctx, prefix)?;
                    }
                    def.iri = match ctx.terms.get(prefix).and_then(|d| d.iri.as_ref()) {
                        Some(prefix_iri) => Some(format!("{prefix_iri}{suffix}")),
                        None => Some(term.to_string()),
                    };
                } else if term.contains('/') {
                    match self.expand_iri(ctx, term, false, true)? {
                        Some(iri) if is_absolute_iri(&iri) => def.iri = Some(iri),
                        _ => return Err(JsonLdError::InvalidIriMapping(term.into())),
                    }
                } else if term == "@type" {
                    def.iri = Some("@type".into());
                } else if let Some(vocab) = &ctx.vocab {
                    def.iri = Some(format!("{vocab}{term}"));
                } else {
                    return Err(JsonLdError::InvalidIriMapping(format!(
                        "{term} can not be expanded"
                    )));
                }
            }
        }

        if let Some(container) = value.get("@container") {
            def.container = Container::parse(container, mode)?;
            if def.container.contains(Keyword::Type) {
                match def.type_mapping.as_deref() {
                    None => def.type_mapping = Some("@id".into()),
                    Some("@id" | "@vocab") => {}
                    Some(other) => return Err(JsonLdError::InvalidTypeMapping(other.into())),
                }
            }
        }

        if let Some(index) = value.get("@index") {
            if mode == ProcessingMode::JsonLd1_0 || !def.container.contains(Keyword::Index) {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: @index without @index container"
                )));
            }
            let Value::String(index) = index else {
                return Err(JsonLdError::InvalidTermDefinition(index.to_string()));
            };
            match self.expand_iri(ctx, index, false, true)? {
                Some(iri) if !is_keyword(index) && is_absolute_iri(&iri) => {}
                _ => return Err(JsonLdError::InvalidTermDefinition(index.clone())),
            }
            def.index = Some(index.clone());
        }

        if let Some(context) = value.get("@context") {
            if mode == ProcessingMode::JsonLd1_0 {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: scoped context in json-ld-1.0 mode"
                )));
            }
            let flags = ProcessingFlags {
                override_protected: true,
                propagate: true,
                validate_scoped: false,
            };
            ctx.process_with(context, self.base_url, self.remote_contexts, flags, self.env)
                .map_err(|err| match err {
                    JsonLdError::LoadingRemoteContextFailed(_)
                    | JsonLdError::ContextOverflow(_)
                    | JsonLdError::ContextCycle(_) => err,
                    other => JsonLdError::InvalidScopedContext(format!("{term}: {other}")),
                })?;
            def.context = Some(context.clone());
            def.base_url = self.base_url.map(String::from);
        }

        if !value.contains_key("@type") {
            if let Some(language) = value.get("@language") {
                def.language = match language {
                    Value::Null => Some(None),
                    Value::String(tag) => {
                        if !is_well_formed_language(tag) {
                            log::warn!("ill-formed language {tag} for {term}");
                        }
                        Some(Some(tag.to_lowercase()))
                    }
                    other => return Err(JsonLdError::InvalidLanguageMapping(other.to_string())),
                };
            }
            if let Some(direction) = value.get("@direction") {
                def.direction = match direction {
                    Value::Null => Some(None),
                    other => Some(Some(parse_direction(other)?)),
                };
            }
        }

        if let Some(nest) = value.get("@nest") {
            if mode == ProcessingMode::JsonLd1_0 {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: @nest in json-ld-1.0 mode"
                )));
            }
            match nest {
                Value::String(nest) if !is_keyword(nest) || nest == "@nest" => {
                    def.nest = Some(nest.clone())
                }
                other => return Err(JsonLdError::InvalidNestValue(other.to_string())),
            }
        }

        if let Some(prefix) = value.get("@prefix") {
            if mode == ProcessingMode::JsonLd1_0 || term.contains(':') || term.contains('/') {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: @prefix not allowed"
                )));
            }
            def.prefix = prefix
                .as_bool()
                .ok_or_else(|| JsonLdError::InvalidPrefixValue(prefix.to_string()))?;
            if def.prefix && def.iri.as_deref().is_some_and(is_keyword) {
                return Err(JsonLdError::InvalidTermDefinition(format!(
                    "{term}: a keyword alias can not be a prefix"
                )));
            }
        }

        if let Some(key) = value
            .keys()
            .find(|k| !TERM_DEFINITION_ENTRIES.contains(&k.as_str()))
        {
            return Err(JsonLdError::InvalidTermDefinition(format!(
                "{term}: unexpected entry {key}"
            )));
        }

        self.finish(ctx, term, def, previous)
    }

    fn finish(
        &mut self,
        ctx: &mut ActiveContext,
        term: &str,
        def: TermDefinition,
        previous: Option<TermDefinition>,
    ) -> Result<()> {
        let def = match previous {
            Some(previous) if !self.override_protected && previous.protected => {
                if !def.same_as_ignoring_protection(&previous) {
                    return Err(JsonLdError::ProtectedTermRedefinition(term.into()));
                }
                previous
            }
            _ => def,
        };
        Rc::make_mut(&mut ctx.terms).insert(term.to_string(), def);
        self.defined.insert(term.to_string(), true);
        Ok(())
    }

    /// IRI expansion, defining the terms of the local context on demand.
    fn expand_iri(
        &mut self,
        ctx: &mut ActiveContext,
        value: &str,
        document_relative: bool,
        vocab: bool,
    ) -> Result<Option<String>> {
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        if is_keyword_like(value) {
            log::warn!("ignoring keyword-like value {value}");
            return Ok(None);
        }
        let local = self.local;
        if local.contains_key(value) && self.defined.get(value) != Some(&true) {
            self.define(ctx, value)?;
        }
        if let Some((prefix, suffix)) = split_prefix(value) {
            if prefix != "_"
                && !suffix.starts_with("//")
                && local.contains_key(prefix)
                && self.defined.get(prefix) != Some(&true)
            {
                self.define(ctx, prefix)?;
            }
        }
        Ok(ctx.expand_iri(value, document_relative, vocab))
    }
}

fn id_only(id: Value) -> Map {
    let mut map = Map::new();
    map.insert("@id".into(), id);
    map
}

fn new_base<T: Into<String>>(iri: T) -> Result<BaseIri> {
    BaseIri::new(iri).map_err(|e| JsonLdError::InvalidBaseIri(e.to_string()))
}

fn resolve_url(base_url: Option<&str>, reference: &str) -> Result<String, String> {
    if is_absolute_iri(reference) {
        return Ok(reference.to_string());
    }
    let base = base_url.ok_or_else(|| format!("relative URL {reference} with no base"))?;
    BaseIri::new(base)
        .and_then(|base| base.resolve(reference))
        .map_err(|e| format!("{reference}: {e}"))
}

pub(crate) fn parse_direction(value: &Value) -> Result<BaseDirection> {
    value
        .as_str()
        .and_then(|txt| txt.parse().ok())
        .ok_or_else(|| JsonLdError::InvalidBaseDirection(value.to_string()))
}

/// Loose check of [BCP47](https://www.rfc-editor.org/rfc/bcp/bcp47.txt) well-formedness.
pub(crate) fn is_well_formed_language(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    (1..=8).contains(&primary.len())
        && primary.bytes().all(|b| b.is_ascii_alphabetic())
        && subtags.all(|sub| (1..=8).contains(&sub.len()) && sub.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// A remote context, as loaded by the [`DocumentLoader`].
#[derive(Debug)]
pub(crate) struct LoadedContext {
    pub document_url: String,
    pub context: Value,
}

/// Environment shared by all the steps of one API call:
/// the options, and the remote contexts loaded so far.
pub(crate) struct Env<'a> {
    pub options: &'a JsonLdOptions<dyn DocumentLoader + 'a>,
    contexts: RefCell<HashMap<String, Rc<LoadedContext>>>,
}

impl<'a> Env<'a> {
    pub fn new<L: DocumentLoader + 'a>(options: &'a JsonLdOptions<L>) -> Self {
        Env {
            options,
            contexts: RefCell::default(),
        }
    }

    pub fn load_document(&self, url: &str) -> Result<RemoteDocument> {
        log::debug!("loading document {url}");
        self.options
            .document_loader()
            .load(url)
            .map_err(|err| JsonLdError::loading_document(url, err))
    }

    pub fn load_context(&self, url: &str) -> Result<Rc<LoadedContext>> {
        if let Some(loaded) = self.contexts.borrow().get(url) {
            return Ok(loaded.clone());
        }
        log::debug!("loading remote context {url}");
        let doc = self
            .options
            .document_loader()
            .load(url)
            .map_err(|err| JsonLdError::loading_context(url, err))?;
        let json = doc
            .json()
            .map_err(|err| JsonLdError::LoadingRemoteContextFailed(format!("{url}: {err}")))?;
        let context = match json {
            Value::Object(mut map) => map.remove("@context"),
            _ => None,
        }
        .ok_or_else(|| {
            JsonLdError::InvalidRemoteContext(format!("{url} has no top-level @context"))
        })?;
        let loaded = Rc::new(LoadedContext {
            document_url: doc.document_url,
            context,
        });
        self.contexts
            .borrow_mut()
            .insert(url.to_string(), loaded.clone());
        Ok(loaded)
    }
}
