//! Structure-name to layout table.
//!
//! Each known structure name maps to a [`Rule`] describing how its flat child
//! sequence is consumed. Names sharing a layout share a table row.

/// How one named structure consumes its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
    /// The single child, unwrapped
    Single,
    /// The single child, routed through the position decoder
    Position,
    /// Count, then that many (string key, value) pairs
    KeyValues,
    /// `lpr`: legacy position string, or version + position + time
    LastReadPosition,
    /// Count, then (annotation type, interval tree) pairs grouped by class
    AnnotationCache,
    /// Count, then that many elements
    List(Element),
    /// Fixed positional fields
    Record(&'static Layout),
}

/// Element of a count-prefixed list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    Value,
    /// Nested `{name: value}` object reduced to its value
    Unwrap(&'static str),
}

/// Positional record layout.
///
/// `optional` fields are read front to back only while children remain.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) required: &'static [Field],
    pub(crate) optional: &'static [Field],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) key: &'static str,
    pub(crate) kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Value,
    Position,
    /// Epoch millis, always present
    Time,
    /// Epoch millis with `-1` meaning absent
    OptionalTime,
    /// Any value with `-1` meaning absent
    OptionalInt,
    Unwrap(&'static str),
    List(Element),
}

macro_rules! field {
    ($key:literal) => {
        Field {
            key: $key,
            kind: FieldKind::Value,
        }
    };
    ($key:literal, $kind:expr $(,)?) => {
        Field {
            key: $key,
            kind: $kind,
        }
    };
}

macro_rules! record {
    ($($field:expr),* $(,)?) => {
        Layout {
            required: &[$($field),*],
            optional: &[],
        }
    };
}

pub(crate) const BOOKMARK: &str = "annotation.personal.bookmark";
pub(crate) const HIGHLIGHT: &str = "annotation.personal.highlight";
pub(crate) const NOTE: &str = "annotation.personal.note";
pub(crate) const CLIP_ARTICLE: &str = "annotation.personal.clip_article";
pub(crate) const HANDWRITTEN_NOTE: &str = "annotation.personal.handwritten_note";
pub(crate) const STICKY_NOTE: &str = "annotation.personal.sticky_note";

pub(crate) const INTERVAL_TREE: &str = "saved.avl.interval.tree";

/// Annotation type code to annotation class name
const ANNOTATION_CLASSES: &[(i64, &str)] = &[
    (0, BOOKMARK),
    (1, HIGHLIGHT),
    (2, NOTE),
    // code not confirmed against device data
    (3, CLIP_ARTICLE),
    (10, HANDWRITTEN_NOTE),
    (11, STICKY_NOTE),
];

pub(crate) fn annotation_class(code: i64) -> Option<&'static str> {
    ANNOTATION_CLASSES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

static POSITION_TIME_LOCALE: Layout = record![
    field!("position", FieldKind::Position),
    field!("time", FieldKind::OptionalTime),
    field!("timeZoneOffset", FieldKind::OptionalInt),
    field!("country"),
    field!("device"),
];

static ANNOTATION: Layout = record![
    field!("startPosition", FieldKind::Position),
    field!("endPosition", FieldKind::Position),
    field!("creationTime", FieldKind::Time),
    field!("lastModificationTime", FieldKind::Time),
    field!("template"),
];

static ANNOTATION_NOTE: Layout = record![
    field!("startPosition", FieldKind::Position),
    field!("endPosition", FieldKind::Position),
    field!("creationTime", FieldKind::Time),
    field!("lastModificationTime", FieldKind::Time),
    field!("template"),
    field!("note"),
];

static ANNOTATION_HANDWRITTEN: Layout = record![
    field!("startPosition", FieldKind::Position),
    field!("endPosition", FieldKind::Position),
    field!("creationTime", FieldKind::Time),
    field!("lastModificationTime", FieldKind::Time),
    field!("template"),
    field!("handwritten_note_nbk_ref"),
];

static ANNOTATION_STICKY: Layout = record![
    field!("startPosition", FieldKind::Position),
    field!("endPosition", FieldKind::Position),
    field!("creationTime", FieldKind::Time),
    field!("lastModificationTime", FieldKind::Time),
    field!("template"),
    field!("sticky_note_nbk_ref"),
];

static APNX_KEY: Layout = record![
    field!("asin"),
    field!("cdeType"),
    field!("sidecarAvailable"),
    field!("oPNToPosition", FieldKind::List(Element::Value)),
    field!("first"),
    field!("unknown1"),
    field!("unknown2"),
    field!("pageMap"),
];

static FIXED_LAYOUT_DATA: Layout = record![
    field!("unknown1"),
    field!("unknown2"),
    field!("unknown3"),
];

static SHARING_LIMITS: Layout = record![field!("accumulated")];

static LANGUAGE_STORE: Layout = record![field!("language"), field!("unknown1")];

static PERIODICALS_VIEW_STATE: Layout = record![field!("unknown1"), field!("unknown2")];

static FONT_PREFS: Layout = Layout {
    required: &[
        field!("typeface"),
        field!("lineSp"),
        field!("size"),
        field!("align"),
        field!("insetTop"),
        field!("insetLeft"),
        field!("insetBottom"),
        field!("insetRight"),
        field!("unknown1"),
    ],
    optional: &[
        field!("bold"),
        field!("userSideloadableFont"),
        field!("customFontIndex"),
        field!("mobi7SystemFont"),
        field!("mobi7RestoreFont"),
        field!("readingPresetSelected"),
        field!("unknown2"),
    ],
};

static PURCHASE_STATE_DATA: Layout = record![field!("state"), field!("time", FieldKind::Time)];

static TIMER_DATA_STORE: Layout = record![
    field!("on"),
    field!("readingTimerModel"),
    field!("version"),
];

static TIMER_DATA_STORE_V2: Layout = record![
    field!("on"),
    field!("readingTimerModel"),
    field!("version"),
    field!("lastOption"),
];

static TIMER_MODEL: Layout = record![
    field!("version"),
    field!("totalTime"),
    field!("totalWords"),
    field!("totalPercent"),
    field!("averageCalculator", FieldKind::Unwrap("timer.average.calculator")),
];

static TIMER_AVERAGE_CALCULATOR: Layout = record![
    field!("samples1", FieldKind::List(Element::Value)),
    field!("samples2", FieldKind::List(Element::Value)),
    field!(
        "normalDistributions",
        FieldKind::List(Element::Unwrap("timer.average.calculator.distribution.normal"))
    ),
    field!(
        "outliers",
        FieldKind::List(Element::Unwrap("timer.average.calculator.outliers"))
    ),
];

static DISTRIBUTION_NORMAL: Layout = record![
    field!("count"),
    field!("sum"),
    field!("sumOfSquares"),
];

static BOOK_INFO_STORE: Layout = record![field!("numberOfWords"), field!("percentOfBook")];

static PAGE_HISTORY_RECORD: Layout = record![
    field!("position", FieldKind::Position),
    field!("time", FieldKind::Time),
];

static READER_STATE_PREFERENCES: Layout = record![
    field!("fontPreferences"),
    field!("leftMargin"),
    field!("rightMargin"),
    field!("topMargin"),
    field!("bottomMargin"),
    field!("unknown1"),
];

/// Known structures, grouped by shared rule
static SCHEMA: &[(&[&str], Rule)] = &[
    (
        &[
            "clock.data.store",
            "dictionary",
            "lpu",
            "pdf.contrast",
            "sync_lpr",
            "tpz.line.spacing",
            "XRAY_OTA_UPDATE_STATE",
            "XRAY_SHOWING_SPOILERS",
            "XRAY_SORTING_STATE",
            "XRAY_TAB_STATE",
        ],
        Rule::Single,
    ),
    (
        &[
            "buy.asin.response.data",
            "next.in.series.info.data",
            "price.info.data",
        ],
        Rule::Single,
    ),
    (
        &[
            "dict.prefs.v2",
            "EndActions",
            "ReaderMetrics",
            "StartActions",
            "Translator",
            "Wikipedia",
        ],
        Rule::KeyValues,
    ),
    (&["erl"], Rule::Position),
    (&["lpr"], Rule::LastReadPosition),
    (&["fpr", "updated_lpr"], Rule::Record(&POSITION_TIME_LOCALE)),
    (&["annotation.cache.object"], Rule::AnnotationCache),
    (&[INTERVAL_TREE], Rule::List(Element::Value)),
    (&[BOOKMARK, HIGHLIGHT, CLIP_ARTICLE], Rule::Record(&ANNOTATION)),
    (&[NOTE], Rule::Record(&ANNOTATION_NOTE)),
    (&[HANDWRITTEN_NOTE], Rule::Record(&ANNOTATION_HANDWRITTEN)),
    (&[STICKY_NOTE], Rule::Record(&ANNOTATION_STICKY)),
    (&["apnx.key"], Rule::Record(&APNX_KEY)),
    (&["fixed.layout.data"], Rule::Record(&FIXED_LAYOUT_DATA)),
    (&["sharing.limits"], Rule::Record(&SHARING_LIMITS)),
    (&["language.store"], Rule::Record(&LANGUAGE_STORE)),
    (
        &["periodicals.view.state"],
        Rule::Record(&PERIODICALS_VIEW_STATE),
    ),
    (&["font.prefs"], Rule::Record(&FONT_PREFS)),
    (&["purchase.state.data"], Rule::Record(&PURCHASE_STATE_DATA)),
    (&["timer.data.store"], Rule::Record(&TIMER_DATA_STORE)),
    (&["timer.data.store.v2"], Rule::Record(&TIMER_DATA_STORE_V2)),
    (&["timer.model"], Rule::Record(&TIMER_MODEL)),
    (
        &["timer.average.calculator"],
        Rule::Record(&TIMER_AVERAGE_CALCULATOR),
    ),
    (
        &["timer.average.calculator.distribution.normal"],
        Rule::Record(&DISTRIBUTION_NORMAL),
    ),
    (
        &["timer.average.calculator.outliers"],
        Rule::List(Element::Value),
    ),
    (&["book.info.store"], Rule::Record(&BOOK_INFO_STORE)),
    (
        &["page.history.store"],
        Rule::List(Element::Unwrap("page.history.record")),
    ),
    (&["page.history.record"], Rule::Record(&PAGE_HISTORY_RECORD)),
    (
        &["reader.state.preferences"],
        Rule::Record(&READER_STATE_PREFERENCES),
    ),
];

/// Looks up the rule for a structure name
pub(crate) fn rule_for(name: &str) -> Option<Rule> {
    SCHEMA
        .iter()
        .find(|(names, _)| names.iter().any(|n| *n == name))
        .map(|(_, rule)| *rule)
}
