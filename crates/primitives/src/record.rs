/// Record classes announced by the lexicon store's change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
	LexEntry,
	MorphForm,
	MorphoSyntaxAnalysis,
	InflectionType,
	InflectionClass,
	InflAffixTemplate,
	AffixSlot,
	PhonologicalRule,
	PhonologicalEnvironment,
	NaturalClass,
	Phoneme,
	GrammaticalCategory,
	FeatureSystem,
	AdhocProhibition,
	CompoundRule,
	ParserParameters,
	Wordform,
	Analysis,
	Segment,
	Annotation,
}

impl RecordClass {
	/// Returns true if a change to this class invalidates compiled engine state.
	///
	/// Wordforms, analyses, text segments and annotations are parser output or
	/// text data; everything else feeds the grammar or the lexicon.
	pub const fn affects_engine(self) -> bool {
		!matches!(self, Self::Wordform | Self::Analysis | Self::Segment | Self::Annotation)
	}
}
