// Text utils: tokenization and stopword handling for the frequency analyzer.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// Portuguese stopwords
pub const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às", "até",
    "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do", "dos", "e",
    "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "éramos", "essa", "essas",
    "esse", "esses", "esta", "está", "estamos", "estão", "estar", "estas", "estava", "estavam",
    "estávamos", "este", "esteja", "estejam", "estejamos", "estes", "esteve", "estive",
    "estivemos", "estiver", "estivera", "estiveram", "estivéramos", "estiverem", "estivermos",
    "estivesse", "estivessem", "estivéssemos", "estou", "eu", "foi", "fomos", "for", "fora",
    "foram", "fôramos", "forem", "formos", "fosse", "fossem", "fôssemos", "fui", "há", "haja",
    "hajam", "hajamos", "hão", "havemos", "haver", "hei", "houve", "houvemos", "houver", "houvera",
    "houverá", "houveram", "houvéramos", "houverão", "houverei", "houverem", "houveremos",
    "houveria", "houveriam", "houveríamos", "houvermos", "houvesse", "houvessem", "houvéssemos",
    "isso", "isto", "já", "lhe", "lhes", "mais", "mas", "me", "mesmo", "meu", "meus", "minha",
    "minhas", "muito", "na", "não", "nas", "nem", "no", "nos", "nós", "nossa", "nossas", "nosso",
    "nossos", "num", "numa", "o", "os", "ou", "para", "pela", "pelas", "pelo", "pelos", "por",
    "qual", "quando", "que", "quem", "são", "se", "seja", "sejam", "sejamos", "sem", "ser", "será",
    "serão", "serei", "seremos", "seria", "seriam", "seríamos", "seu", "seus", "só", "somos",
    "sou", "sua", "suas", "também", "te", "tem", "têm", "temos", "tenha", "tenham", "tenhamos",
    "tenho", "terá", "terão", "terei", "teremos", "teria", "teriam", "teríamos", "teu", "teus",
    "teve", "tinha", "tinham", "tínhamos", "tive", "tivemos", "tiver", "tivera", "tiveram",
    "tivéramos", "tiverem", "tivermos", "tivesse", "tivessem", "tivéssemos", "tu", "tua", "tuas",
    "um", "uma", "você", "vocês", "vos",
];

/// Boundary between tokens: any run of characters that is neither a Unicode
/// letter nor a digit.
static TOKEN_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("token boundary regex is valid"));

/// Lower-case `text` and split it into tokens at non-alphanumeric boundaries.
/// Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_BOUNDARY
        .split(&lowered)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// A token exclusion set: the built-in Portuguese list, optionally disabled,
/// plus caller-supplied domain noise words.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: HashSet<String>,
}

impl StopwordFilter {
    /// Build from the builtin list plus `extra` noise words. Comparison is
    /// over lower-cased tokens, so `extra` entries are lower-cased here.
    pub fn new(use_builtin: bool, extra: &[String]) -> Self {
        let mut words: HashSet<String> = if use_builtin {
            PORTUGUESE_STOP_WORDS.iter().map(|w| w.to_string()).collect()
        } else {
            HashSet::new()
        };
        words.extend(extra.iter().map(|w| w.to_lowercase()));
        StopwordFilter { words }
    }

    /// Exactly the caller-supplied set, nothing builtin.
    pub fn from_set(words: HashSet<String>) -> Self {
        StopwordFilter {
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopwordFilter {
    fn default() -> Self {
        StopwordFilter::new(true, &[])
    }
}
