use super::dictionary::Dictionary;

const COMMON_REPLACEMENTS: [(char, char); 11] = [
    ('a', 'e'),
    ('e', 'i'),
    ('i', 'o'),
    ('o', 'u'),
    ('b', 'v'),
    ('c', 'k'),
    ('f', 'v'),
    ('g', 'j'),
    ('m', 'n'),
    ('s', 'z'),
    ('t', 'd'),
];

/// Suggestions for a lowercase word, best first, at most `max` of them.
pub fn generate(word: &str, dictionary: &Dictionary, max: usize) -> Vec<String> {
    let mut suggestions = Vec::new();
    if max == 0 {
        return suggestions;
    }
    let len = word.chars().count();

    // 1. Words sharing the first three letters
    if len >= 3 {
        let mut candidates = dictionary.words_with_prefix(&prefix(word, 3));
        candidates.sort_by_key(|w| edit_distance(word, w));
        for candidate in candidates.into_iter().take(max) {
            if edit_distance(word, &candidate) <= 2 && candidate != word {
                suggestions.push(candidate);
            }
        }
    }
    if suggestions.len() >= max {
        suggestions.truncate(max);
        return suggestions;
    }

    // 2. Single-edit typos: dropped letters, swaps, common substitutions
    for candidate in transformations(word) {
        if dictionary.contains(&candidate) && push_unique(&mut suggestions, candidate, max) {
            return suggestions;
        }
    }

    // 3. Looser match on a two-letter prefix
    if len >= 2 {
        let mut candidates = dictionary.words_with_prefix(&prefix(word, 2));
        candidates.sort_by_key(|w| edit_distance(word, w));
        for candidate in candidates {
            if edit_distance(word, &candidate) <= 3
                && candidate != word
                && push_unique(&mut suggestions, candidate, max)
            {
                return suggestions;
            }
        }
    }

    // 4. Short words only: bounded scan of similar-length entries
    if len <= 3 {
        let mut candidates: Vec<(usize, String)> = dictionary
            .words_near_length(word.len(), 100)
            .into_iter()
            .map(|w| (edit_distance(word, &w), w))
            .filter(|(dist, w)| *dist <= 2 && w != word)
            .collect();
        candidates.sort_by_key(|(dist, _)| *dist);

        for (_, candidate) in candidates {
            if push_unique(&mut suggestions, candidate, max) {
                return suggestions;
            }
        }
    }

    suggestions.truncate(max);
    suggestions
}

/// Returns true once `suggestions` is full.
fn push_unique(suggestions: &mut Vec<String>, candidate: String, max: usize) -> bool {
    if !suggestions.contains(&candidate) {
        suggestions.push(candidate);
    }
    suggestions.len() >= max
}

fn prefix(word: &str, chars: usize) -> String {
    word.chars().take(chars).collect()
}

/// Levenshtein distance
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

fn transformations(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = Vec::new();

    for i in 0..chars.len() {
        let mut candidate = chars.clone();
        candidate.remove(i);
        out.push(candidate.iter().collect());
    }

    for i in 0..chars.len().saturating_sub(1) {
        let mut candidate = chars.clone();
        candidate.swap(i, i + 1);
        out.push(candidate.iter().collect());
    }

    for (i, &ch) in chars.iter().enumerate() {
        for &(from, to) in &COMMON_REPLACEMENTS {
            if ch == from {
                let mut candidate = chars.clone();
                candidate[i] = to;
                out.push(candidate.iter().collect());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("hello", "hello"), 0);
        assert_eq!(edit_distance("hello", "hallo"), 1);
        assert_eq!(edit_distance("hello", "world"), 4);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_transformations() {
        let transforms = transformations("hello");
        assert!(transforms.contains(&"hllo".to_string()));
        assert!(transforms.contains(&"ehllo".to_string()));
    }

    #[test]
    fn test_generate_finds_close_words() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("en.dict");
        let words: Vec<String> = ["receive", "recipe", "world", "word", "would"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Dictionary::build_from_words(&words, &path).unwrap();
        let dict = Dictionary::load_from_path(&path).unwrap();

        let suggestions = generate("recieve", &dict, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("receive"));

        let suggestions = generate("wrold", &dict, 5);
        assert!(suggestions.contains(&"world".to_string()));
        assert!(generate("wrold", &dict, 0).is_empty());
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("de.dict");
        Dictionary::build_from_words(&["über".to_string()], &path).unwrap();
        let dict = Dictionary::load_from_path(&path).unwrap();

        assert_eq!(generate("übr", &dict, 2), vec!["über"]);
    }
}
