//! Defines types for configuring JSON-LD processing.

use std::fmt;
use std::str::FromStr;

use ldtk_c14n::rdfc10::{DEFAULT_DEPTH_FACTOR, DEFAULT_PERMUTATION_LIMIT};
use ldtk_iri::resolve::BaseIri;
use serde_json::Value;

use crate::loader::{DocumentLoader, NoLoader};

/// JSON-LD options, as defined by <https://www.w3.org/TR/json-ld11-api/#the-jsonldoptions-type>.
///
/// NB: this type slightly differs from the standard [`JsonLdOptions`] type:
/// * the standard parameters that are not relevant for this implementation are not present;
/// * some non-standard parameters have been added
///   (framing defaults, canonicalization limits, [`keep_free_floating_nodes`](Self::keep_free_floating_nodes)).
///
/// ## Developers
///
/// * the generic parameter `L` is the type of the [document loader](DocumentLoader).
///   It is the last field of the struct, so that `&JsonLdOptions<L>`
///   can be coerced to `&JsonLdOptions<dyn DocumentLoader>`.
///
/// [`JsonLdOptions`]: https://www.w3.org/TR/json-ld11-api/#the-jsonldoptions-type
pub struct JsonLdOptions<L: ?Sized = NoLoader> {
    base: Option<BaseIri>,
    compact_arrays: bool,
    compact_to_relative: bool,
    expand_context: Option<Value>,
    ordered: bool,
    processing_mode: ProcessingMode,
    produce_generalized_rdf: bool,
    rdf_direction: Option<RdfDirection>,
    use_native_types: bool,
    use_rdf_type: bool,
    // non standard:
    keep_free_floating_nodes: bool,
    embed: Embed,
    explicit: bool,
    omit_default: bool,
    require_all: bool,
    omit_graph: Option<bool>,
    prune_blank_node_identifiers: bool,
    c14n_depth_factor: f32,
    c14n_permutation_limit: usize,
    document_loader: L,
}

impl<L: Default> Default for JsonLdOptions<L> {
    fn default() -> Self {
        JsonLdOptions {
            base: None,
            compact_arrays: true,
            compact_to_relative: true,
            expand_context: None,
            ordered: false,
            processing_mode: ProcessingMode::JsonLd1_1,
            produce_generalized_rdf: false,
            rdf_direction: None,
            use_native_types: false,
            use_rdf_type: false,
            keep_free_floating_nodes: false,
            embed: Embed::Once,
            explicit: false,
            omit_default: false,
            require_all: false,
            omit_graph: None,
            prune_blank_node_identifiers: true,
            c14n_depth_factor: DEFAULT_DEPTH_FACTOR,
            c14n_permutation_limit: DEFAULT_PERMUTATION_LIMIT,
            document_loader: L::default(),
        }
    }
}

impl JsonLdOptions<NoLoader> {
    /// Build a new JSON-LD options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: ?Sized> JsonLdOptions<L> {
    /// The [`base`] IRI against which to resolve relative IRIs.
    ///
    /// [`base`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-base
    pub fn base(&self) -> Option<&BaseIri> {
        self.base.as_ref()
    }

    /// [`compactArrays`] instructs the JSON-LD processor to replace arrays of one element with that element during [compaction].
    ///
    /// [`compactArrays`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-compactarrays
    /// [compaction]: https://www.w3.org/TR/json-ld11-api/#dfn-compact
    pub fn compact_arrays(&self) -> bool {
        self.compact_arrays
    }

    /// [`compactToRelative`] instructs the JSON-LD processor to produce IRIs references relative to the base when [compacting].
    ///
    /// [`compactToRelative`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-compacttorelative
    /// [compacting]: https://www.w3.org/TR/json-ld11-api/#dfn-compact
    pub fn compact_to_relative(&self) -> bool {
        self.compact_to_relative
    }

    /// The [`documentLoader`] is used to retrieve remote documents and contexts.
    ///
    /// [`documentLoader`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-documentloader
    pub fn document_loader(&self) -> &L {
        &self.document_loader
    }

    /// [`expandContext`] is a context that is used to initialize the active context when expanding a document.
    ///
    /// [`expandContext`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-expandcontext
    pub fn expand_context(&self) -> Option<&Value> {
        self.expand_context.as_ref()
    }

    /// When [`ordered`] is true,
    /// certain algorithm processing steps where indicated are ordered lexicographically.
    /// If false, order is not considered in processing.
    ///
    /// [`ordered`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-ordered
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// The [`processingMode`] indicates which JSON-LD version to use during processing,
    /// which can be:
    /// * [`JsonLd1_0`] for [JSON-LD 1.0]
    /// * [`JsonLd1_1`] for [JSON-LD 1.1].
    ///
    /// [`processingMode`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-processingmode
    /// [`JsonLd1_0`]: ProcessingMode::JsonLd1_0
    /// [`JsonLd1_1`]: ProcessingMode::JsonLd1_1
    /// [JSON-LD 1.0]: https://json-ld.org/spec/FCGS/json-ld-syntax/20130222/
    /// [JSON-LD 1.1]: https://www.w3.org/TR/json-ld11/
    pub fn processing_mode(&self) -> ProcessingMode {
        self.processing_mode
    }

    /// [`produceGeneralizedRdf`] authorizes the JSON-LD to emit blank nodes for triple predicates, otherwise they will be omitted.
    ///
    /// [`produceGeneralizedRdf`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-producegeneralizedrdf
    pub fn produce_generalized_rdf(&self) -> bool {
        self.produce_generalized_rdf
    }

    /// The [`rdfDirection`] flag, which determines how value objects containing
    /// a base direction are transformed to and from RDF.
    ///
    /// [`rdfDirection`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-rdfdirection
    pub fn rdf_direction(&self) -> Option<RdfDirection> {
        self.rdf_direction
    }

    /// The [`useNativeTypes`] flag, which causes the `Serialize RDF as JSON-LD Algorithm`
    /// to use native JSON values in value objects avoiding the need for an explicit `@type`.
    ///
    /// [`useNativeTypes`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-usenativetypes
    pub fn use_native_types(&self) -> bool {
        self.use_native_types
    }

    /// The [`useRdfType`] flag, which enables special rules for the `Serialize RDF as JSON-LD
    /// Algorithm` causing `rdf:type` properties to be kept as IRIs in the output, rather than use
    /// `@type`.
    ///
    /// [`useRdfType`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-userdftype
    pub fn use_rdf_type(&self) -> bool {
        self.use_rdf_type
    }

    /// Whether top-level node objects containing only `@id`,
    /// top-level value objects and top-level list objects,
    /// are kept by expansion (they are dropped by default).
    ///
    /// NB: this is not a standard option of JSON-LD.
    pub fn keep_free_floating_nodes(&self) -> bool {
        self.keep_free_floating_nodes
    }

    /// The default [`@embed`] flag used when framing.
    ///
    /// [`@embed`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-embed
    pub fn embed(&self) -> Embed {
        self.embed
    }

    /// The default [`@explicit`] flag used when framing.
    ///
    /// [`@explicit`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-explicit
    pub fn explicit(&self) -> bool {
        self.explicit
    }

    /// The default [`@omitDefault`] flag used when framing.
    ///
    /// [`@omitDefault`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-omitdefault
    pub fn omit_default(&self) -> bool {
        self.omit_default
    }

    /// The default [`@requireAll`] flag used when framing.
    ///
    /// [`@requireAll`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-requireall
    pub fn require_all(&self) -> bool {
        self.require_all
    }

    /// The [`omitGraph`] flag, determining if framing output is always wrapped in `@graph`.
    ///
    /// If not explicitly set, it is `true` in JSON-LD 1.1 [processing mode](Self::processing_mode)
    /// and `false` in JSON-LD 1.0.
    ///
    /// [`omitGraph`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-omitgraph
    pub fn omit_graph(&self) -> bool {
        self.omit_graph
            .unwrap_or(self.processing_mode == ProcessingMode::JsonLd1_1)
    }

    /// The [`pruneBlankNodeIdentifiers`] flag,
    /// removing from framing output the blank node identifiers that are used only once.
    ///
    /// [`pruneBlankNodeIdentifiers`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldoptions-pruneblanknodeidentifiers
    pub fn prune_blank_node_identifiers(&self) -> bool {
        self.prune_blank_node_identifiers && self.processing_mode == ProcessingMode::JsonLd1_1
    }

    /// The depth factor used by [RDFC-1.0](ldtk_c14n::rdfc10::relabel_with)
    /// when [normalizing](crate::normalize).
    ///
    /// NB: this is not a standard option of JSON-LD.
    pub fn c14n_depth_factor(&self) -> f32 {
        self.c14n_depth_factor
    }

    /// The permutation limit used by [RDFC-1.0](ldtk_c14n::rdfc10::relabel_with)
    /// when [normalizing](crate::normalize).
    ///
    /// NB: this is not a standard option of JSON-LD.
    pub fn c14n_permutation_limit(&self) -> usize {
        self.c14n_permutation_limit
    }
}

impl<L> JsonLdOptions<L> {
    // Creating Options

    /// Change the [`base`](Self::base) IRI
    ///
    /// See also [`with_no_base`](Self::with_no_base)
    pub fn with_base(mut self, base: BaseIri) -> Self {
        self.base = Some(base);
        self
    }

    /// Change the [`base`](Self::base) IRI
    ///
    /// See also [`with_base`](Self::with_base)
    pub fn with_no_base(mut self) -> Self {
        self.base = None;
        self
    }

    /// Change the [`compact_arrays`](Self::compact_arrays) flag
    pub fn with_compact_arrays(mut self, compact_arrays: bool) -> Self {
        self.compact_arrays = compact_arrays;
        self
    }

    /// Change the [`compact_to_relative`](Self::compact_to_relative) flag
    pub fn with_compact_to_relative(mut self, compact_to_relative: bool) -> Self {
        self.compact_to_relative = compact_to_relative;
        self
    }

    /// Change the [`document_loader`](Self::document_loader)
    pub fn with_document_loader<L2: DocumentLoader>(self, document_loader: L2) -> JsonLdOptions<L2> {
        JsonLdOptions {
            base: self.base,
            compact_arrays: self.compact_arrays,
            compact_to_relative: self.compact_to_relative,
            expand_context: self.expand_context,
            ordered: self.ordered,
            processing_mode: self.processing_mode,
            produce_generalized_rdf: self.produce_generalized_rdf,
            rdf_direction: self.rdf_direction,
            use_native_types: self.use_native_types,
            use_rdf_type: self.use_rdf_type,
            keep_free_floating_nodes: self.keep_free_floating_nodes,
            embed: self.embed,
            explicit: self.explicit,
            omit_default: self.omit_default,
            require_all: self.require_all,
            omit_graph: self.omit_graph,
            prune_blank_node_identifiers: self.prune_blank_node_identifiers,
            c14n_depth_factor: self.c14n_depth_factor,
            c14n_permutation_limit: self.c14n_permutation_limit,
            document_loader,
        }
    }

    /// Change the [`expand_context`](Self::expand_context)
    ///
    /// See also [`with_no_expand_context`](Self::with_no_expand_context)
    pub fn with_expand_context(mut self, expand_context: Value) -> Self {
        self.expand_context = Some(expand_context);
        self
    }

    /// Change the [`expand_context`](Self::expand_context)
    ///
    /// See also [`with_expand_context`](Self::with_expand_context)
    pub fn with_no_expand_context(mut self) -> Self {
        self.expand_context = None;
        self
    }

    /// Change the [`ordered`](Self::ordered) flag
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Change the [`processing_mode`](Self::processing_mode)
    pub fn with_processing_mode(mut self, version: ProcessingMode) -> Self {
        self.processing_mode = version;
        self
    }

    /// Change the [`produce_generalized_rdf`](Self::produce_generalized_rdf) flag
    pub fn with_produce_generalized_rdf(mut self, produce_generalized_rdf: bool) -> Self {
        self.produce_generalized_rdf = produce_generalized_rdf;
        self
    }

    /// Change the [`rdf_direction`](Self::rdf_direction)
    ///
    /// See also [`with_no_rdf_direction`](Self::with_no_rdf_direction).
    pub fn with_rdf_direction(mut self, rdf_direction: RdfDirection) -> Self {
        self.rdf_direction = Some(rdf_direction);
        self
    }

    /// Change the [`rdf_direction`](Self::rdf_direction)
    ///
    /// See also [`with_rdf_direction`](Self::with_rdf_direction).
    pub fn with_no_rdf_direction(mut self) -> Self {
        self.rdf_direction = None;
        self
    }

    /// Change the [`use_native_types`](Self::use_native_types) flag
    pub fn with_use_native_types(mut self, flag: bool) -> Self {
        self.use_native_types = flag;
        self
    }

    /// Change the [`use_rdf_type`](Self::use_rdf_type) flag
    pub fn with_use_rdf_type(mut self, flag: bool) -> Self {
        self.use_rdf_type = flag;
        self
    }

    /// Change the [`keep_free_floating_nodes`](Self::keep_free_floating_nodes) flag
    pub fn with_keep_free_floating_nodes(mut self, flag: bool) -> Self {
        self.keep_free_floating_nodes = flag;
        self
    }

    /// Change the [`embed`](Self::embed) flag
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = embed;
        self
    }

    /// Change the [`explicit`](Self::explicit) flag
    pub fn with_explicit(mut self, flag: bool) -> Self {
        self.explicit = flag;
        self
    }

    /// Change the [`omit_default`](Self::omit_default) flag
    pub fn with_omit_default(mut self, flag: bool) -> Self {
        self.omit_default = flag;
        self
    }

    /// Change the [`require_all`](Self::require_all) flag
    pub fn with_require_all(mut self, flag: bool) -> Self {
        self.require_all = flag;
        self
    }

    /// Change the [`omit_graph`](Self::omit_graph) flag
    pub fn with_omit_graph(mut self, flag: bool) -> Self {
        self.omit_graph = Some(flag);
        self
    }

    /// Change the [`prune_blank_node_identifiers`](Self::prune_blank_node_identifiers) flag
    pub fn with_prune_blank_node_identifiers(mut self, flag: bool) -> Self {
        self.prune_blank_node_identifiers = flag;
        self
    }

    /// Change the [`c14n_depth_factor`](Self::c14n_depth_factor)
    pub fn with_c14n_depth_factor(mut self, depth_factor: f32) -> Self {
        self.c14n_depth_factor = depth_factor;
        self
    }

    /// Change the [`c14n_permutation_limit`](Self::c14n_permutation_limit)
    pub fn with_c14n_permutation_limit(mut self, permutation_limit: usize) -> Self {
        self.c14n_permutation_limit = permutation_limit;
        self
    }
}

impl<L: ?Sized> fmt::Debug for JsonLdOptions<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLdOptions")
            .field("base", &self.base.as_ref().map(BaseIri::as_str))
            .field("compact_arrays", &self.compact_arrays)
            .field("compact_to_relative", &self.compact_to_relative)
            .field("expand_context", &self.expand_context)
            .field("ordered", &self.ordered)
            .field("processing_mode", &self.processing_mode)
            .field("produce_generalized_rdf", &self.produce_generalized_rdf)
            .field("rdf_direction", &self.rdf_direction)
            .field("use_native_types", &self.use_native_types)
            .field("use_rdf_type", &self.use_rdf_type)
            .finish_non_exhaustive()
    }
}

/// The JSON-LD [processing mode](https://www.w3.org/TR/json-ld11/#dfn-processing-mode).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ProcessingMode {
    /// [`JSON-LD 1.0`](https://json-ld.org/spec/FCGS/json-ld-syntax/20130222/)
    JsonLd1_0,
    /// [`JSON-LD 1.1`](https://www.w3.org/TR/json-ld11/)
    #[default]
    JsonLd1_1,
}

impl ProcessingMode {
    /// The textual form of this processing mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::JsonLd1_0 => "json-ld-1.0",
            ProcessingMode::JsonLd1_1 => "json-ld-1.1",
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = UnknownOptionValue;

    fn from_str(txt: &str) -> Result<Self, Self::Err> {
        match txt {
            "json-ld-1.0" => Ok(ProcessingMode::JsonLd1_0),
            "json-ld-1.1" => Ok(ProcessingMode::JsonLd1_1),
            _ => Err(UnknownOptionValue(txt.to_string())),
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The possible values of the [`rdfDirection`] option.
///
/// [`rdfDirection`]: https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-rdfdirection
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RdfDirection {
    /// Base direction is encoded in the datatype IRI, using the `https://www.w3.org/ns/i18n#` namespace.
    I18nDatatype,
    /// Base direction is encoded with a blank node having `rdf:value`, `rdf:language` and `rdf:direction`.
    CompoundLiteral,
}

impl FromStr for RdfDirection {
    type Err = UnknownOptionValue;

    fn from_str(txt: &str) -> Result<Self, Self::Err> {
        match txt {
            "i18n-datatype" => Ok(RdfDirection::I18nDatatype),
            "compound-literal" => Ok(RdfDirection::CompoundLiteral),
            _ => Err(UnknownOptionValue(txt.to_string())),
        }
    }
}

/// The possible values of the [`@embed`] framing flag.
///
/// [`@embed`]: https://www.w3.org/TR/json-ld11-framing/#dom-jsonldembed
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Embed {
    /// Always embed node objects as property values, unless this would cause a circular reference.
    Always,
    /// Only a single value within a given node object should be embedded,
    /// other values of other properties use a node reference.
    #[default]
    Once,
    /// Always use a node reference when serializing matching values.
    Never,
}

impl FromStr for Embed {
    type Err = UnknownOptionValue;

    fn from_str(txt: &str) -> Result<Self, Self::Err> {
        match txt {
            "@always" => Ok(Embed::Always),
            "@once" => Ok(Embed::Once),
            "@never" => Ok(Embed::Never),
            _ => Err(UnknownOptionValue(txt.to_string())),
        }
    }
}

/// Error raised when parsing an option value from an unknown string.
#[derive(Clone, Debug, thiserror::Error)]
#[error("unknown option value: {0:?}")]
pub struct UnknownOptionValue(pub String);
