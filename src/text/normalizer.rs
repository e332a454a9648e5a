//! 单词规范化
//!
//! 把原始文本拆成单词，去掉停用词，按词形还原规则归并到同一个词根，
//! 每个词根只保留一个（最短的）表面形式，输出顺序即原文中首次出现的顺序。

use phf::{phf_map, phf_set};
use std::collections::HashMap;

/// 默认最短单词长度，更短的 token 直接丢弃
pub const DEFAULT_MIN_WORD_LEN: usize = 2;

/// 不规则变化表，优先于后缀规则
static IRREGULAR_FORMS: phf::Map<&'static str, &'static str> = phf_map! {
    "children" => "child",
    "mice" => "mouse",
    "feet" => "foot",
    "teeth" => "tooth",
    "geese" => "goose",
    "men" => "man",
    "women" => "woman",
    "lives" => "life",
    "leaves" => "leaf",
    "wolves" => "wolf",
    "knives" => "knife",
    "goes" => "go",
    "people" => "person",
    "phenomena" => "phenomenon",
    "criteria" => "criterion",
};

/// 停用词
static STOPWORDS: phf::Set<&'static str> = phf_set! {
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
    "by", "from", "up", "about", "into", "over", "after", "beneath", "under",
    "above", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must", "ought", "i", "you", "he", "she", "it",
    "we", "they", "them", "their", "this", "that", "these", "those", "as", "if",
    "when", "where", "why", "how", "all", "any", "some", "no", "not", "yes",
    "him", "his", "her", "mine", "yours", "ours", "theirs",
    "my", "your", "our", "its", "here", "there", "now", "then",
};

/// 双写辅音中不合并的字母（fall、kiss、buzz、stuff 的词根本身就是双写）
const KEEP_DOUBLED: [char; 4] = ['l', 's', 'z', 'f'];

/// 规范化后的单词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedWord {
    /// 原文中的形式（小写、去标点）
    pub surface: String,
    /// 词根
    pub base: String,
}

/// 单词规范化器
#[derive(Debug, Clone)]
pub struct WordNormalizer {
    min_word_len: usize,
}

impl WordNormalizer {
    pub fn new() -> Self {
        Self {
            min_word_len: DEFAULT_MIN_WORD_LEN,
        }
    }

    pub fn with_min_word_len(min_word_len: usize) -> Self {
        Self { min_word_len }
    }

    /// 规范化文本
    ///
    /// # 返回
    /// 每个词根一个条目，按首次出现顺序排列；同一词根保留最短的表面形式，长度相同取先出现者
    pub fn normalize(&self, raw_text: &str) -> Vec<NormalizedWord> {
        let mut words: Vec<NormalizedWord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for token in raw_text.split_whitespace() {
            let surface = clean_token(token);
            if surface.chars().count() < self.min_word_len || is_stopword(&surface) {
                continue;
            }

            let base = base_form(&surface);
            match positions.get(&base) {
                Some(&idx) => {
                    if surface.chars().count() < words[idx].surface.chars().count() {
                        words[idx].surface = surface;
                    }
                }
                None => {
                    positions.insert(base.clone(), words.len());
                    words.push(NormalizedWord { surface, base });
                }
            }
        }

        words
    }
}

impl Default for WordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 取出词根列表
pub fn base_forms(words: &[NormalizedWord]) -> Vec<&str> {
    words.iter().map(|w| w.base.as_str()).collect()
}

/// 取出表面形式列表
pub fn surface_forms(words: &[NormalizedWord]) -> Vec<&str> {
    words.iter().map(|w| w.surface.as_str()).collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// 小写并去掉所有非字母字符
fn clean_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 计算一个已清洗单词的词根
///
/// 先查不规则表，再按顺序套用后缀规则，第一条命中的规则生效。
pub fn base_form(word: &str) -> String {
    if let Some(base) = IRREGULAR_FORMS.get(word) {
        return (*base).to_string();
    }

    let len = word.chars().count();

    if len > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    if ["sses", "shes", "ches", "xes"].iter().any(|s| word.ends_with(s)) {
        return word[..word.len() - 2].to_string();
    }
    if len > 4 && word.ends_with("oes") {
        return word[..word.len() - 2].to_string();
    }
    if len > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    if len > 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            return collapse_doubled_consonant(stem);
        }
    }
    if len > 4 {
        if let Some(stem) = word.strip_suffix("ed") {
            return collapse_doubled_consonant(stem);
        }
    }
    if len > 4 {
        if let Some(stem) = word.strip_suffix("ly") {
            return stem.to_string();
        }
    }

    word.to_string()
}

/// running -> runn -> run；合并后词根不足 3 个字母时保持原样（added -> add）
fn collapse_doubled_consonant(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 4 {
        let last = chars[n - 1];
        if last == chars[n - 2] && is_consonant(last) && !KEEP_DOUBLED.contains(&last) {
            return chars[..n - 1].iter().collect();
        }
    }
    stem.to_string()
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_reduces_to_base_forms() {
        let normalizer = WordNormalizer::new();
        let words = normalizer.normalize("The cats are running and jumped quickly");
        assert_eq!(base_forms(&words), vec!["cat", "run", "jump", "quick"]);
        assert_eq!(
            surface_forms(&words),
            vec!["cats", "running", "jumped", "quickly"]
        );
    }

    #[test]
    fn test_irregular_and_sibilant_plurals() {
        let normalizer = WordNormalizer::new();
        assert_eq!(base_forms(&normalizer.normalize("children")), vec!["child"]);
        assert_eq!(base_forms(&normalizer.normalize("boxes")), vec!["box"]);
        assert_eq!(base_forms(&normalizer.normalize("phenomena")), vec!["phenomenon"]);
        assert_eq!(base_forms(&normalizer.normalize("mice")), vec!["mouse"]);
    }

    #[test]
    fn test_short_words_are_not_overstemmed() {
        let normalizer = WordNormalizer::new();
        assert_eq!(base_forms(&normalizer.normalize("gas")), vec!["gas"]);
        assert_eq!(base_form("bus"), "bus");
        assert_eq!(base_form("glass"), "glass");
        assert_eq!(base_form("ring"), "ring");
        assert_eq!(base_form("red"), "red");
        assert_eq!(base_form("fly"), "fly");
        assert_eq!(base_form("goes"), "go");
        assert_eq!(base_form("toes"), "toe");
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(base_form("stories"), "story");
        assert_eq!(base_form("wishes"), "wish");
        assert_eq!(base_form("churches"), "church");
        assert_eq!(base_form("classes"), "class");
        // 咝音复数不设长度下限
        assert_eq!(base_form("axes"), "ax");
        assert_eq!(base_form("foxes"), "fox");
        assert_eq!(base_form("heroes"), "hero");
        assert_eq!(base_form("makes"), "make");
        assert_eq!(base_form("bonus"), "bonus");
        assert_eq!(base_form("slowly"), "slow");
    }

    #[test]
    fn test_doubled_consonant_policy() {
        // 双写辅音合并
        assert_eq!(base_form("running"), "run");
        assert_eq!(base_form("stopped"), "stop");
        assert_eq!(base_form("planned"), "plan");
        // l/s/z/f 的双写属于词根
        assert_eq!(base_form("falling"), "fall");
        assert_eq!(base_form("kissed"), "kiss");
        assert_eq!(base_form("buzzing"), "buzz");
        // 合并后不足 3 个字母则保留
        assert_eq!(base_form("added"), "add");
        // 元音双写不算
        assert_eq!(base_form("seeing"), "see");
    }

    #[test]
    fn test_shortest_surface_form_kept_in_first_position() {
        let normalizer = WordNormalizer::new();
        let words = normalizer.normalize("Dogs jumping, dog! jumps over cats.");
        assert_eq!(base_forms(&words), vec!["dog", "jump", "cat"]);
        assert_eq!(surface_forms(&words), vec!["dog", "jumps", "cats"]);
    }

    #[test]
    fn test_tie_keeps_first_seen_surface() {
        let normalizer = WordNormalizer::new();
        // wolves / wolf 之外，再验证等长时不替换
        let words = normalizer.normalize("hopped hopes");
        assert_eq!(base_forms(&words), vec!["hop", "hope"]);
        let words = normalizer.normalize("cats cat's");
        assert_eq!(surface_forms(&words), vec!["cats"]);
    }

    #[test]
    fn test_stopwords_punctuation_and_min_length() {
        let normalizer = WordNormalizer::new();
        let words = normalizer.normalize("I saw (a) \"Bird\"... x, y z; and THE END");
        assert_eq!(base_forms(&words), vec!["saw", "bird", "end"]);
        assert!(normalizer.normalize("the and of").is_empty());
        assert!(normalizer.normalize("   ").is_empty());
    }

    #[test]
    fn test_custom_min_length() {
        let normalizer = WordNormalizer::with_min_word_len(4);
        let words = normalizer.normalize("big elephants ran");
        assert_eq!(base_forms(&words), vec!["elephant"]);
    }
}
