//! Character entity resolution.
//!
//! Maps named (`amp`) and numeric (`#39`, `#x27`) entity tokens to text.
//! A curated table of typographic characters is "unified" to plain-ASCII
//! approximations unless Unicode output is requested, so `&mdash;` becomes
//! `--` and `&rsquo;` becomes `'` in the default configuration.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// HTML 4.01 named character entities, name to Unicode codepoint.
///
/// `apos` is XML rather than HTML 4, but real-world markup uses it enough
/// to warrant an entry.
static NAMED_ENTITIES: &[(&str, u32)] = &[
    // Markup-significant and Latin-1.
    ("quot", 34),
    ("amp", 38),
    ("apos", 39),
    ("lt", 60),
    ("gt", 62),
    ("nbsp", 160),
    ("iexcl", 161),
    ("cent", 162),
    ("pound", 163),
    ("curren", 164),
    ("yen", 165),
    ("brvbar", 166),
    ("sect", 167),
    ("uml", 168),
    ("copy", 169),
    ("ordf", 170),
    ("laquo", 171),
    ("not", 172),
    ("shy", 173),
    ("reg", 174),
    ("macr", 175),
    ("deg", 176),
    ("plusmn", 177),
    ("sup2", 178),
    ("sup3", 179),
    ("acute", 180),
    ("micro", 181),
    ("para", 182),
    ("middot", 183),
    ("cedil", 184),
    ("sup1", 185),
    ("ordm", 186),
    ("raquo", 187),
    ("frac14", 188),
    ("frac12", 189),
    ("frac34", 190),
    ("iquest", 191),
    ("Agrave", 192),
    ("Aacute", 193),
    ("Acirc", 194),
    ("Atilde", 195),
    ("Auml", 196),
    ("Aring", 197),
    ("AElig", 198),
    ("Ccedil", 199),
    ("Egrave", 200),
    ("Eacute", 201),
    ("Ecirc", 202),
    ("Euml", 203),
    ("Igrave", 204),
    ("Iacute", 205),
    ("Icirc", 206),
    ("Iuml", 207),
    ("ETH", 208),
    ("Ntilde", 209),
    ("Ograve", 210),
    ("Oacute", 211),
    ("Ocirc", 212),
    ("Otilde", 213),
    ("Ouml", 214),
    ("times", 215),
    ("Oslash", 216),
    ("Ugrave", 217),
    ("Uacute", 218),
    ("Ucirc", 219),
    ("Uuml", 220),
    ("Yacute", 221),
    ("THORN", 222),
    ("szlig", 223),
    ("agrave", 224),
    ("aacute", 225),
    ("acirc", 226),
    ("atilde", 227),
    ("auml", 228),
    ("aring", 229),
    ("aelig", 230),
    ("ccedil", 231),
    ("egrave", 232),
    ("eacute", 233),
    ("ecirc", 234),
    ("euml", 235),
    ("igrave", 236),
    ("iacute", 237),
    ("icirc", 238),
    ("iuml", 239),
    ("eth", 240),
    ("ntilde", 241),
    ("ograve", 242),
    ("oacute", 243),
    ("ocirc", 244),
    ("otilde", 245),
    ("ouml", 246),
    ("divide", 247),
    ("oslash", 248),
    ("ugrave", 249),
    ("uacute", 250),
    ("ucirc", 251),
    ("uuml", 252),
    ("yacute", 253),
    ("thorn", 254),
    ("yuml", 255),
    // Latin Extended and punctuation.
    ("OElig", 338),
    ("oelig", 339),
    ("Scaron", 352),
    ("scaron", 353),
    ("Yuml", 376),
    ("fnof", 402),
    ("circ", 710),
    ("tilde", 732),
    ("ensp", 8194),
    ("emsp", 8195),
    ("thinsp", 8201),
    ("zwnj", 8204),
    ("zwj", 8205),
    ("lrm", 8206),
    ("rlm", 8207),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("sbquo", 8218),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bdquo", 8222),
    ("dagger", 8224),
    ("Dagger", 8225),
    ("bull", 8226),
    ("hellip", 8230),
    ("permil", 8240),
    ("prime", 8242),
    ("Prime", 8243),
    ("lsaquo", 8249),
    ("rsaquo", 8250),
    ("oline", 8254),
    ("frasl", 8260),
    ("euro", 8364),
    // Greek.
    ("Alpha", 913),
    ("Beta", 914),
    ("Gamma", 915),
    ("Delta", 916),
    ("Epsilon", 917),
    ("Zeta", 918),
    ("Eta", 919),
    ("Theta", 920),
    ("Iota", 921),
    ("Kappa", 922),
    ("Lambda", 923),
    ("Mu", 924),
    ("Nu", 925),
    ("Xi", 926),
    ("Omicron", 927),
    ("Pi", 928),
    ("Rho", 929),
    ("Sigma", 931),
    ("Tau", 932),
    ("Upsilon", 933),
    ("Phi", 934),
    ("Chi", 935),
    ("Psi", 936),
    ("Omega", 937),
    ("alpha", 945),
    ("beta", 946),
    ("gamma", 947),
    ("delta", 948),
    ("epsilon", 949),
    ("zeta", 950),
    ("eta", 951),
    ("theta", 952),
    ("iota", 953),
    ("kappa", 954),
    ("lambda", 955),
    ("mu", 956),
    ("nu", 957),
    ("xi", 958),
    ("omicron", 959),
    ("pi", 960),
    ("rho", 961),
    ("sigmaf", 962),
    ("sigma", 963),
    ("tau", 964),
    ("upsilon", 965),
    ("phi", 966),
    ("chi", 967),
    ("psi", 968),
    ("omega", 969),
    ("thetasym", 977),
    ("upsih", 978),
    ("piv", 982),
    // Letterlike symbols, arrows, operators.
    ("weierp", 8472),
    ("image", 8465),
    ("real", 8476),
    ("trade", 8482),
    ("alefsym", 8501),
    ("larr", 8592),
    ("uarr", 8593),
    ("rarr", 8594),
    ("darr", 8595),
    ("harr", 8596),
    ("crarr", 8629),
    ("lArr", 8656),
    ("uArr", 8657),
    ("rArr", 8658),
    ("dArr", 8659),
    ("hArr", 8660),
    ("forall", 8704),
    ("part", 8706),
    ("exist", 8707),
    ("empty", 8709),
    ("nabla", 8711),
    ("isin", 8712),
    ("notin", 8713),
    ("ni", 8715),
    ("prod", 8719),
    ("sum", 8721),
    ("minus", 8722),
    ("lowast", 8727),
    ("radic", 8730),
    ("prop", 8733),
    ("infin", 8734),
    ("ang", 8736),
    ("and", 8743),
    ("or", 8744),
    ("cap", 8745),
    ("cup", 8746),
    ("int", 8747),
    ("there4", 8756),
    ("sim", 8764),
    ("cong", 8773),
    ("asymp", 8776),
    ("ne", 8800),
    ("equiv", 8801),
    ("le", 8804),
    ("ge", 8805),
    ("sub", 8834),
    ("sup", 8835),
    ("nsub", 8836),
    ("sube", 8838),
    ("supe", 8839),
    ("oplus", 8853),
    ("otimes", 8855),
    ("perp", 8869),
    ("sdot", 8901),
    ("lceil", 8968),
    ("rceil", 8969),
    ("lfloor", 8970),
    ("rfloor", 8971),
    ("lang", 9001),
    ("rang", 9002),
    ("loz", 9674),
    ("spades", 9824),
    ("clubs", 9827),
    ("hearts", 9829),
    ("diams", 9830),
];

/// Typographic entities replaced by plain-ASCII approximations unless
/// Unicode output is requested.
static UNIFIABLE: &[(&str, &str)] = &[
    ("rsquo", "'"),
    ("lsquo", "'"),
    ("rdquo", "\""),
    ("ldquo", "\""),
    ("copy", "(C)"),
    ("mdash", "--"),
    ("nbsp", " "),
    ("rarr", "->"),
    ("larr", "<-"),
    ("middot", "*"),
    ("oelig", "oe"),
    ("aelig", "ae"),
    ("agrave", "a"),
    ("aacute", "a"),
    ("acirc", "a"),
    ("atilde", "a"),
    ("auml", "a"),
    ("aring", "a"),
    ("egrave", "e"),
    ("eacute", "e"),
    ("ecirc", "e"),
    ("euml", "e"),
    ("igrave", "i"),
    ("iacute", "i"),
    ("icirc", "i"),
    ("iuml", "i"),
    ("ograve", "o"),
    ("oacute", "o"),
    ("ocirc", "o"),
    ("otilde", "o"),
    ("ouml", "o"),
    ("ugrave", "u"),
    ("uacute", "u"),
    ("ucirc", "u"),
    ("uuml", "u"),
];

static NAMED_BY_NAME: Lazy<HashMap<&'static str, u32>> =
    Lazy::new(|| NAMED_ENTITIES.iter().copied().collect());

static UNIFIABLE_BY_NAME: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| UNIFIABLE.iter().copied().collect());

/// Codepoint-keyed view of [`UNIFIABLE`], derived through the named table
/// so the two stay consistent.
static UNIFIABLE_BY_CODEPOINT: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    UNIFIABLE
        .iter()
        .filter_map(|(name, replacement)| named_codepoint(name).map(|cp| (cp, *replacement)))
        .collect()
});

/// Look up the codepoint of a named HTML entity.
pub(crate) fn named_codepoint(name: &str) -> Option<u32> {
    NAMED_BY_NAME.get(name).copied()
}

/// Resolve an entity token to its replacement text.
///
/// The token is the body of a `&...;` reference: a name such as `amp`, or a
/// numeric form such as `#39` or `#x27`. With `unicode` off, codepoints in
/// the unifiable table come back as their ASCII approximations.
///
/// Malformed numeric tokens and unknown names are passed through literally
/// (`&token`); resolution never fails.
///
/// # Examples
///
/// ```
/// use html_to_text::entities::resolve_entity;
///
/// assert_eq!(resolve_entity("mdash", false), "--");
/// assert_eq!(resolve_entity("mdash", true), "\u{2014}");
/// assert_eq!(resolve_entity("#x27", false), "'");
/// assert_eq!(resolve_entity("nosuchentity", false), "&nosuchentity");
/// ```
#[must_use]
pub fn resolve_entity(token: &str, unicode: bool) -> String {
    match token.strip_prefix('#') {
        Some(digits) => resolve_numeric(token, digits, unicode),
        None => resolve_named(token, unicode),
    }
}

fn resolve_numeric(token: &str, digits: &str, unicode: bool) -> String {
    let parsed = match digits.as_bytes().first() {
        Some(b'x' | b'X') => u32::from_str_radix(&digits[1..], 16),
        Some(_) => digits.parse::<u32>(),
        None => return format!("&{token}"),
    };
    let Ok(codepoint) = parsed else {
        return format!("&{token}");
    };
    if !unicode {
        if let Some(replacement) = UNIFIABLE_BY_CODEPOINT.get(&codepoint) {
            return (*replacement).to_string();
        }
    }
    match char::from_u32(codepoint) {
        Some(c) => c.to_string(),
        None => format!("&{token}"),
    }
}

fn resolve_named(name: &str, unicode: bool) -> String {
    if !unicode {
        if let Some(replacement) = UNIFIABLE_BY_NAME.get(name) {
            return (*replacement).to_string();
        }
    }
    match named_codepoint(name).and_then(char::from_u32) {
        Some(c) => c.to_string(),
        None => format!("&{name}"),
    }
}

/// Replace unifiable codepoints in already-decoded text with their ASCII
/// approximations.
///
/// The tokenizer resolves character references before the converter sees
/// them, so typographic substitution has to run over the decoded stream.
pub(crate) fn unify_text(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|c| UNIFIABLE_BY_CODEPOINT.contains_key(&(c as u32)))
    {
        return Cow::Borrowed(text);
    }
    let mut unified = String::with_capacity(text.len());
    for c in text.chars() {
        match UNIFIABLE_BY_CODEPOINT.get(&(c as u32)) {
            Some(replacement) => unified.push_str(replacement),
            None => unified.push(c),
        }
    }
    Cow::Owned(unified)
}
