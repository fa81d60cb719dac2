//! Fuzzy similarity scoring: a sequence-similarity ratio plus a keyword bonus.
//!
//! The ratio is the Ratcliff/Obershelp "gestalt" measure: `2 * M / T`, where `M`
//! counts characters in matching blocks found by repeatedly taking the longest
//! common substring and recursing on both sides, and `T` is the total length of
//! both strings. For targets of 200+ characters, characters occurring in more
//! than 1% of positions are not used to seed matches (they can still extend one).

use std::collections::HashMap;

use crate::constants::KEYWORD_BONUS;

/// `(query keyword, template name fragment)`, checked in order.
const KEYWORD_RULES: &[(&str, &str)] = &[
    ("follow up", "follow_up"),
    ("meeting", "meeting"),
    ("thank", "thank"),
    ("apolog", "apology"),
];

/// Minimum target length at which popular characters are ignored as seeds.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity ratio in `[0, 1]` between `a` and `b`. Two empty strings score 1.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = SequenceMatcher::new(&a, &b).matching_chars();
    2.0 * matched as f64 / total as f64
}

/// Bonus for the first rule whose keyword is in the (lower-cased) query and
/// whose fragment is in the template name.
pub fn keyword_bonus(query_lower: &str, template_name: &str) -> f64 {
    KEYWORD_RULES
        .iter()
        .find(|(keyword, fragment)| {
            query_lower.contains(keyword) && template_name.contains(fragment)
        })
        .map_or(0.0, |_| KEYWORD_BONUS)
}

/// Relevance of a template as a percentage rounded to one decimal.
pub fn fuzzy_score(query: &str, template_name: &str, content: &str) -> f64 {
    let query_lower = query.to_lowercase();
    let similarity = similarity_ratio(&query_lower, &content.to_lowercase());
    let score = (similarity + keyword_bonus(&query_lower, template_name)).min(1.0);
    (score * 1000.0).round() / 10.0
}

struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each usable character in `b`, ascending
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block within `a[alo..ahi]` and `b[blo..bhi]` as
    /// `(i, j, size)`; earliest in `a`, then earliest in `b`, on ties.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // Length of the match ending at a[i-1], b[j], keyed by j
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Extend across characters that were excluded from seeding
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total size of all matching blocks.
    fn matching_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            total += size;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                queue.push((i + size, ahi, j + size, bhi));
            }
        }

        total
    }
}
