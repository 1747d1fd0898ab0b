//! Feature-string construction shared by training and serving.
//!
//! Both paths go through [`join_feature_parts`]; any divergence between the
//! text a model was fitted on and the text it is queried with degrades
//! predictions without raising an error.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::domain::model::{PredictionRequest, TrainingRow};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is a valid regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
    "beside", "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could",
    "did", "do", "does", "doing", "done", "down", "due", "during", "each", "eg", "either",
    "else", "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "for", "former", "formerly", "from", "further", "get",
    "give", "go", "had", "has", "have", "he", "hence", "her", "here", "hereafter", "hereby",
    "herein", "hers", "herself", "him", "himself", "his", "how", "however", "ie", "if", "in",
    "indeed", "into", "is", "it", "its", "itself", "just", "keep", "last", "latter",
    "latterly", "least", "less", "made", "many", "may", "me", "meanwhile", "might", "mine",
    "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely", "neither",
    "never", "nevertheless", "next", "no", "nobody", "none", "noone", "nor", "not", "nothing",
    "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per",
    "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seeming",
    "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though",
    "through", "throughout", "thru", "thus", "to", "together", "too", "toward", "towards",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
    "you", "your", "yours", "yourself", "yourselves",
];

/// `education skills interests`, single-space separated, in that order.
pub fn join_feature_parts(education: &str, skills: &str, interests: &str) -> String {
    format!("{} {} {}", education, skills, interests)
}

pub fn request_feature_text(request: &PredictionRequest) -> String {
    join_feature_parts(
        &request.education,
        &request.skills.join(" "),
        &request.interests,
    )
}

pub fn row_feature_text(row: &TrainingRow) -> String {
    join_feature_parts(&row.education, &row.skills, &row.interests)
}

/// Lowercased word tokens of two or more characters with English stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_row_build_identical_text() {
        let request = PredictionRequest {
            education: "BSc".to_string(),
            skills: vec!["python".to_string(), "sql".to_string()],
            interests: "data".to_string(),
        };
        let row = TrainingRow {
            education: "BSc".to_string(),
            skills: "python sql".to_string(),
            interests: "data".to_string(),
            career_label: "Data Analyst".to_string(),
        };

        assert_eq!(request_feature_text(&request), "BSc python sql data");
        assert_eq!(request_feature_text(&request), row_feature_text(&row));
    }

    #[test]
    fn test_empty_parts_keep_separators() {
        let request = PredictionRequest {
            education: String::new(),
            skills: vec![],
            interests: "art".to_string(),
        };
        assert_eq!(request_feature_text(&request), "  art");
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("I am into Machine Learning and C++ with R");
        assert_eq!(tokens, vec!["machine", "learning"]);
    }
}
